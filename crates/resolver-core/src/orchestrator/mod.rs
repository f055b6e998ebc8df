//! The solve orchestrator: admission, selection, sequential fallback.
//!
//! One [`SolveOrchestrator`] owns the whole engine: the configured provider
//! instances, the selector with its circuit breakers, the bounded solve
//! pool, the high-load detector, and the live settings. The traffic layer
//! calls [`SolveOrchestrator::solve`] with a raw type code and site
//! parameters and gets back either a token or a typed error.
//!
//! Statistics and breaker bookkeeping happen here, after an attempt's
//! outcome has been awaited. Outcomes that were cancelled or discarded by a
//! timeout are never recorded, so a provider is only ever judged on calls
//! that actually ran to completion on its behalf.


use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use resolver_types::{
    AdmissionPolicy, AttemptFailure, CaptchaType, ConfigError, EngineConfig, EngineSnapshot,
    ProviderConfig, SolveError, SolveRequest, SolvedToken,
};

use crate::dispatch::{HighLoadDetector, SolveHandle, SolvePool};
use crate::provider::{CaptchaProvider, ProviderRegistry, ProviderService};
use crate::selection::{CircuitState, ProviderSelector};
use crate::settings::{Settings, SettingsStore, StoredSettings};

/// Orchestrates solve requests across the configured provider instances.
pub struct SolveOrchestrator {
    services: RwLock<Vec<Arc<ProviderService>>>,
    selector: ProviderSelector,
    pool: Arc<SolvePool>,
    load: HighLoadDetector,
    settings: Arc<Settings>,
    store: Arc<dyn SettingsStore>,
    shutting_down: AtomicBool,
}

impl SolveOrchestrator {
    /// Build the engine from the registered providers and the persisted
    /// settings. Provider records in the store that match no registered
    /// provider are ignored (they stay in the document untouched).
    ///
    /// Must be called from within a tokio runtime; the pool spawns its
    /// workers here.
    pub fn bootstrap(
        registry: &ProviderRegistry,
        store: Arc<dyn SettingsStore>,
    ) -> resolver_types::Result<Self> {
        let stored = store.load()?;
        let settings = Arc::new(Settings::new(&stored.engine));

        let services: Vec<Arc<ProviderService>> = registry
            .all()
            .into_iter()
            .map(|provider| {
                let service = Arc::new(ProviderService::new(provider, 0));
                if let Some(config) = stored.providers.get(service.id()) {
                    service.apply_config(config);
                }
                service
            })
            .collect();

        let pool = Arc::new(SolvePool::new(settings.pool_size(), settings.queue_size()));
        let load = HighLoadDetector::new(Arc::clone(&settings));

        info!(
            providers = services.len(),
            pool_size = settings.pool_size(),
            queue_size = settings.queue_size(),
            "Solve orchestrator ready"
        );

        Ok(Self {
            services: RwLock::new(services),
            selector: ProviderSelector::new(),
            pool,
            load,
            settings,
            store,
            shutting_down: AtomicBool::new(false),
        })
    }

    /// Solve a detected challenge.
    ///
    /// The flow is: canonicalize the type code, admit (or reject) under the
    /// current load, select and order the eligible instances, then try them
    /// sequentially until one produces a token. Each attempt runs on the
    /// bounded pool under the per-attempt timeout.
    pub async fn solve(
        &self,
        type_code: &str,
        site_key: &str,
        page_url: &str,
    ) -> Result<SolvedToken, SolveError> {
        self.solve_with_params(type_code, site_key, page_url, HashMap::new()).await
    }

    /// [`solve`](Self::solve) with extra vendor-opaque site parameters
    /// (action names, enterprise flags, challenge blobs).
    pub async fn solve_with_params(
        &self,
        type_code: &str,
        site_key: &str,
        page_url: &str,
        params: HashMap<String, String>,
    ) -> Result<SolvedToken, SolveError> {
        if self.shutting_down.load(Ordering::Acquire) {
            return Err(SolveError::ShuttingDown);
        }

        let captcha_type = CaptchaType::from_code(type_code)
            .ok_or_else(|| SolveError::UnsupportedType { code: type_code.to_string() })?;
        let request_id = Uuid::new_v4();

        self.load.register_request();
        let degraded = if self.load.is_high_load() {
            match self.settings.admission_policy() {
                AdmissionPolicy::Reject => {
                    return Err(SolveError::Overloaded {
                        requests_last_minute: self.load.requests_in_last_minute(),
                        threshold: self.settings.high_load_threshold(),
                    });
                }
                AdmissionPolicy::Degrade => true,
            }
        } else {
            false
        };

        let services = self.services.read().clone();
        if !degraded {
            // Best-effort; the solve path never waits on balance fetches.
            for service in &services {
                service.refresh_balance();
            }
        }

        let mut candidates = self.selector.select_ordered(captcha_type, &services);
        if candidates.is_empty() {
            warn!(%request_id, captcha_type = %captcha_type, "No eligible provider");
            return Err(SolveError::NoEligibleProvider {
                captcha_type: captcha_type.code().to_string(),
            });
        }
        if degraded {
            // Under high load only the best candidate is tried; a full
            // fallback chain would multiply the pressure.
            candidates.truncate(1);
        }

        debug!(
            %request_id,
            captcha_type = %captcha_type,
            candidates = candidates.len(),
            degraded,
            "Starting fallback chain"
        );

        let timeout = Duration::from_millis(self.settings.attempt_timeout_ms());
        let mut attempts: Vec<AttemptFailure> = Vec::new();

        for service in candidates {
            let provider_id = service.id().to_string();
            let request = SolveRequest {
                api_key: service.api_key(),
                captcha_type,
                site_key: site_key.to_string(),
                page_url: page_url.to_string(),
                params: params.clone(),
            };

            let outcome = match self.run_attempt(&provider_id, service.provider(), request) {
                Ok(handle) => handle.outcome_within(timeout).await,
                // Saturation is backpressure against the engine, not a fault
                // of the candidate that happened to be next; abort the whole
                // chain without touching any provider's record.
                Err(err @ (SolveError::PoolSaturated | SolveError::ShuttingDown)) => {
                    warn!(%request_id, error = %err, "Attempt not admitted to pool");
                    return Err(err);
                }
                Err(err) => return Err(err),
            };

            match outcome {
                Some(Ok(token)) => {
                    service.statistics().record_success(token.solve_time_ms);
                    self.selector.breaker(&provider_id).record_success();
                    info!(
                        %request_id,
                        %provider_id,
                        solve_time_ms = token.solve_time_ms,
                        "Solved"
                    );
                    return Ok(token);
                }
                Some(Err(SolveError::Cancelled)) => {
                    // Cancelled attempts tell us nothing about the provider.
                    debug!(%request_id, %provider_id, "Attempt cancelled");
                    return Err(SolveError::Cancelled);
                }
                Some(Err(err)) => {
                    if err.penalizes_provider() {
                        service.statistics().record_failure();
                        self.selector.breaker(&provider_id).record_failure();
                    }
                    warn!(%request_id, %provider_id, error = %err, "Attempt failed");
                    attempts
                        .push(AttemptFailure { provider_id, error: err.to_string() });
                }
                None => {
                    // Timed out; the attempt was cancelled on the way out and
                    // its late result, if any, is discarded.
                    let err = SolveError::Timeout {
                        provider_id: provider_id.clone(),
                        timeout_ms: timeout.as_millis() as u64,
                    };
                    service.statistics().record_failure();
                    self.selector.breaker(&provider_id).record_failure();
                    warn!(%request_id, %provider_id, timeout_ms = timeout.as_millis() as u64, "Attempt timed out");
                    attempts
                        .push(AttemptFailure { provider_id, error: err.to_string() });
                }
            }
        }

        warn!(%request_id, captcha_type = %captcha_type, tried = attempts.len(), "All providers failed");
        Err(SolveError::AllProvidersFailed {
            captcha_type: captcha_type.code().to_string(),
            attempts,
        })
    }

    fn run_attempt(
        &self,
        provider_id: &str,
        provider: &Arc<dyn CaptchaProvider>,
        request: SolveRequest,
    ) -> Result<SolveHandle, SolveError> {
        let provider = Arc::clone(provider);
        let provider_id = provider_id.to_string();
        self.pool.submit(async move {
            let started = Instant::now();
            let token = provider.solve(&request).await?;
            Ok(SolvedToken {
                token,
                provider_id,
                solve_time_ms: started.elapsed().as_millis() as u64,
            })
        })
    }

    // ---- configuration ----

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    /// The configured provider instance for an identifier.
    pub fn service(&self, provider_id: &str) -> Option<Arc<ProviderService>> {
        self.services.read().iter().find(|s| s.id() == provider_id).cloned()
    }

    /// All configured provider instances, in registration order.
    pub fn services(&self) -> Vec<Arc<ProviderService>> {
        self.services.read().clone()
    }

    /// Apply a configuration record to one provider instance and persist.
    pub fn configure_provider(
        &self,
        provider_id: &str,
        config: &ProviderConfig,
    ) -> Result<(), ConfigError> {
        let service = self.service(provider_id).ok_or_else(|| ConfigError::UnknownProvider {
            provider_id: provider_id.to_string(),
        })?;
        service.apply_config(config);
        info!(%provider_id, enabled = config.enabled, priority = config.priority, "Provider reconfigured");
        self.persist()
    }

    /// Apply engine tunables live and persist. Pool and queue size take
    /// effect for the next engine start; the rest apply immediately.
    pub fn configure_engine(&self, config: &EngineConfig) -> Result<(), ConfigError> {
        self.settings.apply(config);
        info!(?config, "Engine reconfigured");
        self.persist()
    }

    fn persist(&self) -> Result<(), ConfigError> {
        let mut stored = StoredSettings { engine: self.settings.to_config(), ..Default::default() };
        for service in self.services.read().iter() {
            stored.providers.insert(service.id().to_string(), service.to_config());
        }
        self.store.save(&stored)
    }

    /// Force a balance fetch on every configured instance (user refresh).
    pub fn refresh_all_balances(&self) {
        for service in self.services.read().iter() {
            service.force_refresh_balance();
        }
    }

    // ---- observability ----

    /// Point-in-time view of the whole engine for the UI.
    pub fn snapshot(&self) -> EngineSnapshot {
        let providers = self
            .services
            .read()
            .iter()
            .map(|service| {
                // Passive read: observing the engine must not perform the
                // lazy open -> half-open transition.
                let breaker = self.selector.breaker(service.id());
                service.snapshot(
                    breaker.consecutive_failures(),
                    breaker.current_state() == CircuitState::Open,
                )
            })
            .collect();

        EngineSnapshot {
            providers,
            requests_last_minute: self.load.requests_in_last_minute(),
            high_load: self.load.is_high_load(),
            active_tasks: self.pool.active_count(),
            queued_tasks: self.pool.queued_count(),
        }
    }

    // ---- lifecycle ----

    /// Cancel every in-flight and queued solve attempt. Returns the number
    /// of tasks actually cancelled.
    pub fn cancel_all_tasks(&self) -> usize {
        self.pool.cancel_all()
    }

    /// Stop accepting solves, cancel outstanding work, and join the pool.
    /// Idempotent.
    pub async fn shutdown(&self) {
        if self.shutting_down.swap(true, Ordering::AcqRel) {
            return;
        }
        info!("Orchestrator shutting down");
        self.pool.shutdown().await;
        self.load.shutdown();
    }
}
