//! Scored, filtered provider selection.

use std::sync::Arc;

use dashmap::DashMap;
use resolver_types::CaptchaType;
use tracing::trace;

use crate::provider::{ProviderService, ProviderStatistics, ServiceView};

use super::CircuitBreaker;

/// Selects and orders provider instances for a solve request based on
/// priority, success rate, speed, and circuit breaker state.
///
/// Owns one [`CircuitBreaker`] per provider identifier, created lazily on
/// first reference and kept for the process lifetime. Breakers are
/// independent per provider, so failure bookkeeping on one never contends
/// with selection over the others.
#[derive(Default)]
pub struct ProviderSelector {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
}

impl ProviderSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the circuit breaker for a provider.
    pub fn breaker(&self, provider_id: &str) -> Arc<CircuitBreaker> {
        if let Some(breaker) = self.breakers.get(provider_id) {
            return Arc::clone(&breaker);
        }
        Arc::clone(
            &self
                .breakers
                .entry(provider_id.to_string())
                .or_insert_with(|| Arc::new(CircuitBreaker::new()))
                .downgrade(),
        )
    }

    /// Select and order instances that can handle `captcha_type`.
    ///
    /// Filters out disabled instances, malformed keys, unsupported types,
    /// known non-positive balances, and open circuits; the survivors are
    /// scored and returned best first. An empty result is valid and means
    /// "no eligible provider".
    ///
    /// An unknown balance (`None`) deliberately passes the filter: balance
    /// fetching is best-effort and a provider must not be dropped just
    /// because its balance has not loaded yet (fail open on unknown).
    ///
    /// Evaluating an open circuit may itself perform the lazy
    /// open → half-open transition, letting one probe attempt through.
    pub fn select_ordered(
        &self,
        captcha_type: CaptchaType,
        services: &[Arc<ProviderService>],
    ) -> Vec<Arc<ProviderService>> {
        let mut scored: Vec<(f64, Arc<ProviderService>)> = services
            .iter()
            .filter_map(|service| {
                let view = service.selection_view();
                if !view.enabled || !service.provider().is_valid_key_format(&view.api_key) {
                    return None;
                }
                if !service.provider().supported_types().contains(&captcha_type) {
                    return None;
                }
                if matches!(view.balance, Some(balance) if balance <= 0.0) {
                    return None;
                }
                if self.breaker(service.id()).is_open() {
                    trace!(provider_id = %service.id(), "Skipping provider, circuit open");
                    return None;
                }
                let score = Self::score(&view, service.statistics());
                Some((score, Arc::clone(service)))
            })
            .collect();

        // Stable sort: equal scores keep their post-filter order, so the
        // result is deterministic for identical inputs.
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.into_iter().map(|(_, service)| service).collect()
    }

    /// Weighted score: 0.4 priority + 0.4 success rate + 0.2 speed.
    fn score(view: &ServiceView, statistics: &ProviderStatistics) -> f64 {
        let priority_score = 1.0 / (1.0 + f64::from(view.priority));
        let success_rate_score = statistics.success_rate() / 100.0;
        let speed_score = 1.0 / (1.0 + statistics.avg_solve_time_ms() / 1000.0);
        0.4 * priority_score + 0.4 * success_rate_score + 0.2 * speed_score
    }
}
