//! Process-wide catalog of provider implementations.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::CaptchaProvider;

/// Registry of available providers, keyed by stable identifier.
///
/// Registration happens once at startup; afterwards the registry only serves
/// concurrent reads. Re-registering an id replaces the implementation in
/// place, so registration order is preserved and the size does not change.
/// There is no removal.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<Vec<Arc<dyn CaptchaProvider>>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a provider by its identifier.
    pub fn register(&self, provider: Arc<dyn CaptchaProvider>) {
        let mut providers = self.providers.write();
        if let Some(existing) = providers.iter_mut().find(|p| p.id() == provider.id()) {
            debug!(provider_id = %provider.id(), "Replacing registered provider");
            *existing = provider;
        } else {
            debug!(provider_id = %provider.id(), "Registered provider");
            providers.push(provider);
        }
    }

    /// Look up a provider by identifier.
    pub fn get(&self, id: &str) -> Option<Arc<dyn CaptchaProvider>> {
        self.providers.read().iter().find(|p| p.id() == id).cloned()
    }

    /// All registered providers, in registration order.
    pub fn all(&self) -> Vec<Arc<dyn CaptchaProvider>> {
        self.providers.read().clone()
    }

    pub fn len(&self) -> usize {
        self.providers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }
}
