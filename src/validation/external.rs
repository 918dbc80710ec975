//! Network-backed quote validator.
//!
//! Posts a structured summary of the job and the engine's figures to an
//! external estimator and parses its opinion. Every failure mode - missing
//! configuration, timeout, non-2xx, malformed body - degrades to "absent";
//! the enclosing quote request never fails because of this call.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use crate::cache::ValidationCache;
use crate::error::QuoteError;
use crate::pricing::models::{ItemTotals, PricingInput};
use crate::pricing::responses::PricingResult;
use crate::validation::{DisabledValidator, QuoteValidator, ValidationResult};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(15 * 60);
const USER_AGENT: &str = concat!("movequote/", env!("CARGO_PKG_VERSION"));

/// Configuration for the external estimator, typically sourced from the
/// embedding application's settings.
#[derive(Debug, Clone, Default)]
pub struct ValidatorConfig {
    pub enabled: bool,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Option<Duration>,
    pub cache_ttl: Option<Duration>,
}

/// Build the validator the configuration calls for.
///
/// Disabled, or missing an endpoint or credential, yields the no-op
/// validator; quote requests then skip validation at zero cost.
pub fn build_validator(config: ValidatorConfig) -> Arc<dyn QuoteValidator> {
    if !config.enabled {
        return Arc::new(DisabledValidator);
    }
    let (endpoint, api_key) = match (config.endpoint, config.api_key) {
        (Some(endpoint), Some(api_key)) => (endpoint, api_key),
        _ => {
            info!("external validation enabled but not configured, running without it");
            return Arc::new(DisabledValidator);
        }
    };
    match ExternalValidator::new(
        endpoint,
        api_key,
        config.timeout.unwrap_or(DEFAULT_TIMEOUT),
        config.cache_ttl.unwrap_or(DEFAULT_CACHE_TTL),
    ) {
        Ok(validator) => Arc::new(validator),
        Err(e) => {
            warn!(error = %e, "could not build external validator, running without it");
            Arc::new(DisabledValidator)
        }
    }
}

/// The structured job summary sent to the estimator.
#[derive(Debug, Serialize)]
struct EstimateRequest<'a> {
    category: &'a str,
    #[serde(with = "rust_decimal::serde::str")]
    distance_km: Decimal,
    item_count: u32,
    #[serde(with = "rust_decimal::serde::str")]
    total_volume_m3: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    total_weight_kg: Decimal,
    pickup_floor: i32,
    delivery_floor: i32,
    scheduled_date: NaiveDate,
    vehicle: &'a str,
    trips: u32,
    #[serde(with = "rust_decimal::serde::str")]
    engine_subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    engine_total: Decimal,
    currency: &'a str,
}

/// Validator backed by an external estimator endpoint.
pub struct ExternalValidator {
    http: Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
    cache: ValidationCache,
}

impl ExternalValidator {
    pub fn new(
        endpoint: String,
        api_key: String,
        timeout: Duration,
        cache_ttl: Duration,
    ) -> Result<Self, QuoteError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| QuoteError::InvalidConfig(format!("http client: {}", e)))?;
        Ok(Self {
            http,
            endpoint,
            api_key,
            timeout,
            cache: ValidationCache::new(cache_ttl),
        })
    }

    pub fn cache(&self) -> &ValidationCache {
        &self.cache
    }

    async fn request_opinion(
        &self,
        input: &PricingInput,
        engine_result: &PricingResult,
    ) -> Option<ValidationResult> {
        let totals = ItemTotals::from_items(&input.items);
        let request = EstimateRequest {
            category: &input.category,
            distance_km: input.distance_km,
            item_count: totals.count,
            total_volume_m3: totals.volume_m3,
            total_weight_kg: totals.weight_kg,
            pickup_floor: input.pickup_floor,
            delivery_floor: input.delivery_floor,
            scheduled_date: input.scheduled_date,
            vehicle: &engine_result.vehicle,
            trips: engine_result.trips,
            engine_subtotal: engine_result.subtotal,
            engine_total: engine_result.total,
            currency: &engine_result.currency,
        };

        let send = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send();

        let response = match tokio::time::timeout(self.timeout, send).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!(error = %e, "external validation request failed");
                return None;
            }
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "external validation timed out");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "external validation returned an error status");
            return None;
        }

        // A malformed opinion must never corrupt the quote; schema mismatch
        // is treated the same as no opinion at all.
        let opinion: ValidationResult = match response.json().await {
            Ok(opinion) => opinion,
            Err(e) => {
                warn!(error = %e, "external validation response was malformed");
                return None;
            }
        };
        if opinion.confidence > 100 {
            warn!(confidence = opinion.confidence, "external validation confidence out of range");
            return None;
        }

        Some(opinion)
    }
}

#[async_trait]
impl QuoteValidator for ExternalValidator {
    async fn validate(
        &self,
        input: &PricingInput,
        engine_result: &PricingResult,
    ) -> Option<ValidationResult> {
        let fingerprint = ValidationCache::fingerprint(input, engine_result.total);
        if let Some(cached) = self.cache.get(&fingerprint).await {
            return Some((*cached).clone());
        }

        let opinion = self.request_opinion(input, engine_result).await?;
        self.cache
            .insert(fingerprint, Arc::new(opinion.clone()))
            .await;
        Some(opinion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_config_builds_noop_validator() {
        let validator = build_validator(ValidatorConfig::default());
        // The returned validator is the no-op; nothing to assert beyond the
        // build succeeding without configuration.
        let _ = validator;
    }

    #[test]
    fn test_enabled_but_unconfigured_falls_back_to_noop() {
        let validator = build_validator(ValidatorConfig {
            enabled: true,
            endpoint: Some("https://estimator.example/quote".to_string()),
            api_key: None,
            timeout: None,
            cache_ttl: None,
        });
        let _ = validator;
    }

    #[test]
    fn test_malformed_opinion_is_rejected_by_schema() {
        // Missing required `confidence` field.
        let malformed = r#"{"reasonable": true, "rationale": "ok"}"#;
        assert!(serde_json::from_str::<ValidationResult>(malformed).is_err());

        // Wrong type for `reasonable`.
        let wrong_type =
            r#"{"reasonable": "yes", "confidence": 50, "rationale": "ok", "warnings": []}"#;
        assert!(serde_json::from_str::<ValidationResult>(wrong_type).is_err());

        let valid = r#"{
            "reasonable": false,
            "suggested_total": 310.0,
            "confidence": 64,
            "rationale": "distance rate looks low",
            "warnings": ["verify mileage"]
        }"#;
        let opinion: ValidationResult = serde_json::from_str(valid).unwrap();
        assert_eq!(opinion.confidence, 64);
        assert_eq!(opinion.warnings.len(), 1);
    }
}
