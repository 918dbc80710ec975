//! External validation and estimate blending.
//!
//! A second, independent opinion on an engine quote. The opinion is never
//! authoritative on its own: a close-enough external estimate is surfaced as
//! information only, and a diverging one is blended under a fixed
//! engine-weighted policy. Everything here degrades to "absent" rather than
//! failing a quote.

pub mod external;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::RateConfig;
use crate::pricing::calculators::{round_money, round_to_nearest_five};
use crate::pricing::models::PricingInput;
use crate::pricing::responses::{BreakdownLine, PricingResult};

pub use external::{build_validator, ExternalValidator, ValidatorConfig};

/// An external estimator's opinion of a quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub reasonable: bool,
    #[serde(default)]
    pub suggested_total: Option<Decimal>,
    /// 0-100.
    pub confidence: u8,
    pub rationale: String,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// The optional second estimator.
///
/// `None` means "no opinion" - feature disabled, estimator unreachable, or a
/// malformed response. Callers must treat `None` as business as usual.
#[async_trait]
pub trait QuoteValidator: Send + Sync {
    async fn validate(
        &self,
        input: &PricingInput,
        engine_result: &PricingResult,
    ) -> Option<ValidationResult>;
}

/// No-op validator used when the feature is disabled or unconfigured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledValidator;

#[async_trait]
impl QuoteValidator for DisabledValidator {
    async fn validate(
        &self,
        _input: &PricingInput,
        _engine_result: &PricingResult,
    ) -> Option<ValidationResult> {
        None
    }
}

/// A quote after the external opinion has been applied.
#[derive(Debug, Clone)]
pub struct BlendOutcome {
    pub result: PricingResult,
    /// True when the totals were recomputed from both estimates.
    pub blended: bool,
}

/// Apply the blending policy to an engine result.
///
/// When the external suggestion diverges from the engine total by strictly
/// more than the configured threshold, the total is recomputed as the
/// engine-weighted average and subtotal, VAT, and range bounds are re-derived
/// from it with the same rounding rules the engine uses. Within the
/// threshold, the engine's figures are kept unchanged.
///
/// Pure and independent of which validator produced the opinion.
pub fn apply_validation(
    config: &RateConfig,
    include_tax: bool,
    engine_result: &PricingResult,
    validation: &ValidationResult,
) -> BlendOutcome {
    let suggested = match validation.suggested_total {
        Some(s) if s > Decimal::ZERO => s,
        _ => {
            return BlendOutcome {
                result: engine_result.clone(),
                blended: false,
            }
        }
    };

    let engine_total = engine_result.total;
    let divergence = (suggested - engine_total).abs();
    if divergence <= config.blending.threshold * engine_total {
        return BlendOutcome {
            result: engine_result.clone(),
            blended: false,
        };
    }

    let policy = &config.blending;
    let total = round_money(
        policy.engine_weight * engine_total + policy.external_weight * suggested,
        2,
    );
    let (subtotal, vat) = if include_tax {
        let subtotal = round_money(total / (Decimal::ONE + config.vat_rate), 2);
        (subtotal, total - subtotal)
    } else {
        (total, Decimal::ZERO)
    };

    let mut result = engine_result.clone();
    let old_subtotal = result.subtotal;
    result.subtotal = subtotal;
    result.vat = vat;
    result.total = total;
    result.platform_fee = round_money(total * config.platform_fee_rate, 2);
    result.price_min = round_to_nearest_five(total * (Decimal::ONE - config.range_spread));
    result.price_max = round_to_nearest_five(total * (Decimal::ONE + config.range_spread));

    // Keep the breakdown summing to the new total: the VAT line tracks the
    // re-derived VAT, and the subtotal shift gets its own explanatory line.
    let vat_index = result
        .breakdown
        .iter()
        .position(|line| line.label.starts_with("VAT"));
    if let Some(index) = vat_index {
        result.breakdown[index].amount = vat;
    }
    let adjustment_line = BreakdownLine::new(
        format!("External estimate adjustment (suggested {})", suggested.normalize()),
        subtotal - old_subtotal,
    );
    match vat_index {
        Some(index) => result.breakdown.insert(index, adjustment_line),
        None => result.breakdown.push(adjustment_line),
    }

    BlendOutcome {
        result,
        blended: true,
    }
}
