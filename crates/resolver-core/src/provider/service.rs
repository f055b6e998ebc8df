//! A configured, user-editable binding of a provider to an API key.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::debug;

use resolver_types::{ProviderConfig, ProviderSnapshot};

use crate::util::mask_api_key;

use super::{CaptchaProvider, ProviderStatistics};

/// How long a fetched balance stays fresh before the next solve pass may
/// kick off another fetch.
const BALANCE_CACHE_TTL: Duration = Duration::from_secs(20);

/// Consistent per-pass view of an instance's mutable fields.
///
/// Selection reads each field exactly once through this view, so the five
/// filter/sort steps of a pass never observe a torn configuration edit.
#[derive(Debug, Clone)]
pub struct ServiceView {
    pub enabled: bool,
    pub api_key: String,
    pub priority: u32,
    pub balance: Option<f64>,
}

/// Runtime state for one configured provider instance: API key, enabled
/// flag, priority, cached balance, and embedded statistics.
///
/// Configuration edits race with selection reads; every mutable field is
/// individually synchronized and selection takes a [`ServiceView`] snapshot
/// per pass.
pub struct ProviderService {
    provider: Arc<dyn CaptchaProvider>,
    api_key: RwLock<String>,
    enabled: AtomicBool,
    priority: AtomicU32,
    cached_balance: RwLock<Option<f64>>,
    balance_fetched_at: RwLock<Option<Instant>>,
    statistics: ProviderStatistics,
    checking_balance: AtomicBool,
}

impl ProviderService {
    pub fn new(provider: Arc<dyn CaptchaProvider>, priority: u32) -> Self {
        Self {
            provider,
            api_key: RwLock::new(String::new()),
            enabled: AtomicBool::new(false),
            priority: AtomicU32::new(priority),
            cached_balance: RwLock::new(None),
            balance_fetched_at: RwLock::new(None),
            statistics: ProviderStatistics::new(),
            checking_balance: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &str {
        self.provider.id()
    }

    pub fn display_name(&self) -> &str {
        self.provider.display_name()
    }

    pub fn provider(&self) -> &Arc<dyn CaptchaProvider> {
        &self.provider
    }

    pub fn api_key(&self) -> String {
        self.api_key.read().clone()
    }

    pub fn set_api_key(&self, api_key: impl Into<String>) {
        *self.api_key.write() = api_key.into();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn priority(&self) -> u32 {
        self.priority.load(Ordering::Relaxed)
    }

    pub fn set_priority(&self, priority: u32) {
        self.priority.store(priority, Ordering::Relaxed);
    }

    /// Last known balance without triggering a refresh. `None` means the
    /// balance has never been fetched (or the key is unset).
    pub fn cached_balance(&self) -> Option<f64> {
        *self.cached_balance.read()
    }

    pub fn statistics(&self) -> &ProviderStatistics {
        &self.statistics
    }

    /// Enabled, has a non-empty key, and the key passes the provider's
    /// format validation.
    pub fn is_configured(&self) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let key = self.api_key.read();
        !key.is_empty() && self.provider.is_valid_key_format(&key)
    }

    /// Snapshot of the mutable fields for one selection pass.
    pub fn selection_view(&self) -> ServiceView {
        ServiceView {
            enabled: self.is_enabled(),
            api_key: self.api_key(),
            priority: self.priority(),
            balance: self.cached_balance(),
        }
    }

    /// Kick off an asynchronous balance fetch if the cached value has gone
    /// stale. Never blocks the solve path: the stale value stays in place
    /// until the fetch lands, and a failed fetch keeps it.
    pub fn refresh_balance(self: &Arc<Self>) {
        {
            let key = self.api_key.read();
            if key.is_empty() {
                return;
            }
        }
        let fresh = self
            .balance_fetched_at
            .read()
            .map(|at| at.elapsed() < BALANCE_CACHE_TTL)
            .unwrap_or(false);
        if fresh {
            return;
        }
        self.spawn_balance_fetch();
    }

    /// Force a fetch regardless of cache age (user-initiated refresh).
    pub fn force_refresh_balance(self: &Arc<Self>) {
        {
            let key = self.api_key.read();
            if key.is_empty() {
                return;
            }
        }
        *self.balance_fetched_at.write() = None;
        self.spawn_balance_fetch();
    }

    fn spawn_balance_fetch(self: &Arc<Self>) {
        // Only one fetch in flight per instance.
        if self
            .checking_balance
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let api_key = service.api_key();
            match service.provider.fetch_balance(&api_key).await {
                Ok(balance) => {
                    *service.cached_balance.write() = Some(balance);
                    *service.balance_fetched_at.write() = Some(Instant::now());
                    debug!(provider_id = %service.id(), balance, "Balance refreshed");
                }
                Err(err) => {
                    // Keep the stale cached value on failure.
                    debug!(provider_id = %service.id(), error = %err, "Balance fetch failed");
                }
            }
            service.checking_balance.store(false, Ordering::Release);
        });
    }

    /// Apply a persisted configuration record.
    pub fn apply_config(&self, config: &ProviderConfig) {
        self.set_api_key(config.api_key.clone());
        self.set_enabled(config.enabled);
        self.set_priority(config.priority);
    }

    /// Current configuration as a persistable record.
    pub fn to_config(&self) -> ProviderConfig {
        ProviderConfig {
            api_key: self.api_key(),
            enabled: self.is_enabled(),
            priority: self.priority(),
        }
    }

    /// Read-only view for the UI; secrets are masked.
    pub fn snapshot(&self, consecutive_failures: u32, circuit_open: bool) -> ProviderSnapshot {
        ProviderSnapshot {
            id: self.id().to_string(),
            display_name: self.display_name().to_string(),
            masked_api_key: mask_api_key(&self.api_key()),
            enabled: self.is_enabled(),
            priority: self.priority(),
            balance: self.cached_balance(),
            statistics: self.statistics.snapshot(),
            consecutive_failures,
            circuit_open,
        }
    }

    #[cfg(test)]
    pub(crate) fn set_cached_balance(&self, balance: Option<f64>) {
        *self.cached_balance.write() = balance;
        *self.balance_fetched_at.write() = Some(Instant::now());
    }
}
