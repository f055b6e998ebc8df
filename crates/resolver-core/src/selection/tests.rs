//! Tests for circuit breaking and provider selection.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use resolver_types::{CaptchaType, SolveError, SolveRequest};

use crate::provider::{CaptchaProvider, ProviderService};

use super::{CircuitBreaker, CircuitState, ProviderSelector};

struct StubProvider {
    id: String,
    types: Vec<CaptchaType>,
}

impl StubProvider {
    fn new(id: &str) -> Self {
        Self { id: id.to_string(), types: vec![CaptchaType::RecaptchaV2] }
    }

    fn with_types(id: &str, types: Vec<CaptchaType>) -> Self {
        Self { id: id.to_string(), types }
    }
}

#[async_trait]
impl CaptchaProvider for StubProvider {
    fn id(&self) -> &str {
        &self.id
    }
    fn display_name(&self) -> &str {
        &self.id
    }
    fn supported_types(&self) -> &[CaptchaType] {
        &self.types
    }
    fn is_valid_key_format(&self, api_key: &str) -> bool {
        api_key.len() >= 8
    }
    async fn solve(&self, _request: &SolveRequest) -> Result<String, SolveError> {
        Ok("token".to_string())
    }
    async fn fetch_balance(&self, _api_key: &str) -> Result<f64, SolveError> {
        Ok(1.0)
    }
}

fn configured(id: &str, priority: u32) -> Arc<ProviderService> {
    let service = Arc::new(ProviderService::new(Arc::new(StubProvider::new(id)), priority));
    service.set_api_key("valid-key-123");
    service.set_enabled(true);
    service
}

// ---- CircuitBreaker ----

#[test]
fn four_failures_stay_closed_five_open() {
    let breaker = CircuitBreaker::new();
    for _ in 0..4 {
        breaker.record_failure();
    }
    assert!(!breaker.is_open());
    assert_eq!(breaker.current_state(), CircuitState::Closed);

    breaker.record_failure();
    assert!(breaker.is_open());
    assert_eq!(breaker.current_state(), CircuitState::Open);
    assert_eq!(breaker.consecutive_failures(), 5);
}

#[test]
fn success_from_any_state_closes_and_resets() {
    let breaker = CircuitBreaker::new();
    for _ in 0..5 {
        breaker.record_failure();
    }
    assert!(breaker.is_open());

    breaker.record_success();
    assert!(!breaker.is_open());
    assert_eq!(breaker.current_state(), CircuitState::Closed);
    assert_eq!(breaker.consecutive_failures(), 0);
}

#[test]
fn cooldown_transitions_to_half_open_lazily() {
    let breaker = CircuitBreaker::with_policy(5, Duration::from_millis(50));
    for _ in 0..5 {
        breaker.record_failure();
    }
    assert!(breaker.is_open());

    thread::sleep(Duration::from_millis(60));
    // No further record_* calls: the query itself performs the transition.
    assert!(!breaker.is_open());
    assert_eq!(breaker.current_state(), CircuitState::HalfOpen);
}

#[test]
fn half_open_failure_reopens() {
    let breaker = CircuitBreaker::with_policy(5, Duration::from_millis(10));
    for _ in 0..5 {
        breaker.record_failure();
    }
    thread::sleep(Duration::from_millis(20));
    assert!(!breaker.is_open()); // now half-open

    // The probe fails; the streak is already past the threshold.
    breaker.record_failure();
    assert_eq!(breaker.current_state(), CircuitState::Open);
    assert!(breaker.is_open());
}

#[test]
fn half_open_success_closes() {
    let breaker = CircuitBreaker::with_policy(5, Duration::from_millis(10));
    for _ in 0..5 {
        breaker.record_failure();
    }
    thread::sleep(Duration::from_millis(20));
    assert!(!breaker.is_open());

    breaker.record_success();
    assert_eq!(breaker.current_state(), CircuitState::Closed);
    assert_eq!(breaker.consecutive_failures(), 0);
}

#[test]
fn reset_restores_initial_state() {
    let breaker = CircuitBreaker::new();
    for _ in 0..7 {
        breaker.record_failure();
    }
    breaker.reset();
    assert_eq!(breaker.current_state(), CircuitState::Closed);
    assert_eq!(breaker.consecutive_failures(), 0);
    assert!(!breaker.is_open());
}

#[test]
fn concurrent_failures_open_exactly_once() {
    let breaker = Arc::new(CircuitBreaker::new());

    let mut handles = vec![];
    for _ in 0..10 {
        let b = Arc::clone(&breaker);
        handles.push(thread::spawn(move || {
            for _ in 0..10 {
                b.record_failure();
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(breaker.current_state(), CircuitState::Open);
    assert_eq!(breaker.consecutive_failures(), 100);
    assert!(breaker.is_open());
}

// ---- ProviderSelector ----

#[test]
fn breaker_map_is_per_provider_and_stable() {
    let selector = ProviderSelector::new();
    let first = selector.breaker("alpha");
    let again = selector.breaker("alpha");
    let other = selector.breaker("beta");

    assert!(Arc::ptr_eq(&first, &again));
    assert!(!Arc::ptr_eq(&first, &other));
}

#[test]
fn disabled_instances_are_filtered() {
    let selector = ProviderSelector::new();
    let service = configured("alpha", 0);
    service.set_enabled(false);

    let ordered = selector.select_ordered(CaptchaType::RecaptchaV2, &[service]);
    assert!(ordered.is_empty());
}

#[test]
fn malformed_keys_are_filtered() {
    let selector = ProviderSelector::new();
    let service = configured("alpha", 0);
    service.set_api_key("short");

    let ordered = selector.select_ordered(CaptchaType::RecaptchaV2, &[service]);
    assert!(ordered.is_empty());
}

#[test]
fn unsupported_types_are_filtered() {
    let selector = ProviderSelector::new();
    let service = Arc::new(ProviderService::new(
        Arc::new(StubProvider::with_types("alpha", vec![CaptchaType::HCaptcha])),
        0,
    ));
    service.set_api_key("valid-key-123");
    service.set_enabled(true);

    assert!(selector.select_ordered(CaptchaType::RecaptchaV2, &[Arc::clone(&service)]).is_empty());
    assert_eq!(selector.select_ordered(CaptchaType::HCaptcha, &[service]).len(), 1);
}

#[test]
fn known_non_positive_balance_is_filtered_unknown_passes() {
    let selector = ProviderSelector::new();

    let broke = configured("broke", 0);
    broke.set_cached_balance(Some(0.0));
    let negative = configured("negative", 0);
    negative.set_cached_balance(Some(-0.5));
    let unknown = configured("unknown", 0);
    let funded = configured("funded", 0);
    funded.set_cached_balance(Some(2.5));

    let ordered =
        selector.select_ordered(CaptchaType::RecaptchaV2, &[broke, negative, unknown, funded]);
    let ids: Vec<&str> = ordered.iter().map(|s| s.id()).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&"unknown"));
    assert!(ids.contains(&"funded"));
}

#[test]
fn open_circuit_is_filtered() {
    let selector = ProviderSelector::new();
    let service = configured("alpha", 0);

    for _ in 0..5 {
        selector.breaker("alpha").record_failure();
    }
    assert!(selector.select_ordered(CaptchaType::RecaptchaV2, &[Arc::clone(&service)]).is_empty());

    selector.breaker("alpha").record_success();
    assert_eq!(selector.select_ordered(CaptchaType::RecaptchaV2, &[service]).len(), 1);
}

#[test]
fn lower_priority_number_scores_higher() {
    let selector = ProviderSelector::new();
    let preferred = configured("preferred", 0);
    let fallback = configured("fallback", 5);

    // Identical statistics, only priority differs.
    let ordered = selector.select_ordered(CaptchaType::RecaptchaV2, &[fallback, preferred]);
    let ids: Vec<&str> = ordered.iter().map(|s| s.id()).collect();
    assert_eq!(ids, vec!["preferred", "fallback"]);
}

#[test]
fn success_rate_orders_equal_priority_providers() {
    let selector = ProviderSelector::new();

    let strong = configured("strong", 0);
    let middling = configured("middling", 0);
    let weak = configured("weak", 0);

    // 90% / 50% / 10% success, identical solve times.
    for _ in 0..9 {
        strong.statistics().record_success(1000);
    }
    strong.statistics().record_failure();
    for _ in 0..5 {
        middling.statistics().record_success(1000);
        middling.statistics().record_failure();
    }
    weak.statistics().record_success(1000);
    for _ in 0..9 {
        weak.statistics().record_failure();
    }

    let ordered = selector.select_ordered(CaptchaType::RecaptchaV2, &[weak, middling, strong]);
    let ids: Vec<&str> = ordered.iter().map(|s| s.id()).collect();
    assert_eq!(ids, vec!["strong", "middling", "weak"]);
}

#[test]
fn faster_provider_wins_all_else_equal() {
    let selector = ProviderSelector::new();
    let fast = configured("fast", 0);
    let slow = configured("slow", 0);

    fast.statistics().record_success(500);
    slow.statistics().record_success(8000);

    let ordered = selector.select_ordered(CaptchaType::RecaptchaV2, &[slow, fast]);
    assert_eq!(ordered[0].id(), "fast");
}

#[test]
fn equal_scores_keep_deterministic_order() {
    let selector = ProviderSelector::new();
    let first = configured("first", 1);
    let second = configured("second", 1);

    let ordered = selector.select_ordered(
        CaptchaType::RecaptchaV2,
        &[Arc::clone(&first), Arc::clone(&second)],
    );
    let again = selector.select_ordered(CaptchaType::RecaptchaV2, &[first, second]);

    let ids: Vec<&str> = ordered.iter().map(|s| s.id()).collect();
    let ids_again: Vec<&str> = again.iter().map(|s| s.id()).collect();
    assert_eq!(ids, vec!["first", "second"]);
    assert_eq!(ids, ids_again);
}
