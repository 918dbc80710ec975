//! In-memory caching using moka
//!
//! Caches external estimator opinions keyed by a fingerprint of the quoted
//! job. Identical quotes within the TTL reuse the stored opinion instead of
//! paying for another external call.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::pricing::models::PricingInput;
use crate::validation::ValidationResult;

/// Application cache holding external validation opinions
#[derive(Clone)]
pub struct ValidationCache {
    /// Opinions (fingerprint -> ValidationResult)
    opinions: Cache<String, Arc<ValidationResult>>,
}

impl ValidationCache {
    /// Create a new cache instance with the given TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            // Opinions: 1000 entries, caller-configured TTL, 5 min idle
            opinions: Cache::builder()
                .max_capacity(1000)
                .time_to_live(ttl)
                .time_to_idle(Duration::from_secs(5 * 60))
                .build(),
        }
    }

    pub async fn get(&self, fingerprint: &str) -> Option<Arc<ValidationResult>> {
        self.opinions.get(fingerprint).await
    }

    pub async fn insert(&self, fingerprint: String, result: Arc<ValidationResult>) {
        self.opinions.insert(fingerprint, result).await;
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            opinions_size: self.opinions.entry_count(),
        }
    }

    /// Invalidate all cached opinions
    pub fn invalidate_all(&self) {
        self.opinions.invalidate_all();
        info!("Validation cache invalidated");
    }

    /// Fingerprint for a quote: the facts the external estimator sees.
    ///
    /// Two inputs with the same fingerprint would produce the same external
    /// request, so the opinion is shared.
    pub fn fingerprint(input: &PricingInput, engine_total: Decimal) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}|{}",
            input.category,
            input.distance_km.normalize(),
            input.item_count(),
            input.pickup_floor,
            input.delivery_floor,
            input.scheduled_date,
            engine_total.normalize(),
        )
    }
}

impl Default for ValidationCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(15 * 60))
    }
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub opinions_size: u64,
}
