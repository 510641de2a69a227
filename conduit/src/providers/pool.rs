//! The primary/fallback provider pool consumed by the executor.

use std::collections::HashMap;
use std::sync::Arc;

use super::circuit_breaker::CircuitBreaker;
use super::traits::Provider;

const AUTO_MODEL: &str = "auto";

/// An ordered set of zero-marginal-cost ("primary") providers, an ordered
/// set of paid ("fallback") providers, and the model name to use per
/// provider id.
#[derive(Clone)]
pub struct ProviderPool {
    primary: Vec<Arc<dyn Provider>>,
    fallback: Vec<Arc<dyn Provider>>,
    models: HashMap<String, String>,
    circuit_breaker: CircuitBreaker,
}

impl std::fmt::Debug for ProviderPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderPool")
            .field("primary", &self.primary.iter().map(|p| p.id()).collect::<Vec<_>>())
            .field("fallback", &self.fallback.iter().map(|p| p.id()).collect::<Vec<_>>())
            .finish()
    }
}

impl ProviderPool {
    /// Builds a pool from explicit primary/fallback lists.
    #[must_use]
    pub fn new(
        primary: Vec<Arc<dyn Provider>>,
        fallback: Vec<Arc<dyn Provider>>,
        models: HashMap<String, String>,
        circuit_breaker: CircuitBreaker,
    ) -> Self {
        Self {
            primary,
            fallback,
            models,
            circuit_breaker,
        }
    }

    /// Builds a pool from a flat, unclassified provider list, matching the
    /// legacy compatibility entry point's convention: a provider whose id
    /// contains `"free"` or equals `"google"` is primary, everything else is
    /// fallback. If that yields an empty primary list, every provider
    /// becomes primary.
    #[must_use]
    pub fn from_flat(
        providers: Vec<Arc<dyn Provider>>,
        models: HashMap<String, String>,
        circuit_breaker: CircuitBreaker,
    ) -> Self {
        let (mut primary, mut fallback) = (Vec::new(), Vec::new());
        for provider in providers {
            if provider.id().contains("free") || provider.id() == "google" {
                primary.push(provider);
            } else {
                fallback.push(provider);
            }
        }
        if primary.is_empty() {
            primary.append(&mut fallback);
        }
        Self::new(primary, fallback, models, circuit_breaker)
    }

    /// Primary providers, in declared order.
    #[must_use]
    pub fn primary(&self) -> &[Arc<dyn Provider>] {
        &self.primary
    }

    /// Fallback providers, in declared order.
    #[must_use]
    pub fn fallback(&self) -> &[Arc<dyn Provider>] {
        &self.fallback
    }

    /// True if no providers are configured at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.fallback.is_empty()
    }

    /// The model name configured for `provider_id`, or `"auto"` when unset.
    #[must_use]
    pub fn model_for(&self, provider_id: &str) -> &str {
        self.models
            .get(provider_id)
            .map_or(AUTO_MODEL, String::as_str)
    }

    /// The shared circuit breaker guarding every provider in this pool.
    #[must_use]
    pub const fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }
}
