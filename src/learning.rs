//! Historical learning hooks.
//!
//! Strategy seam for post-scaling engine output from observed outcomes. The
//! engine multiplies the two adjustments together and rescales subtotal, VAT,
//! total and range bounds as one unit, so a statistical implementation can be
//! dropped in without touching the orchestrator.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// A finished quote's fate, recorded for future training.
#[derive(Debug, Clone)]
pub struct QuoteOutcome {
    pub category: String,
    pub quoted_total: Decimal,
    pub accepted: bool,
    /// Price the job actually closed at, when it differs from the quote.
    pub final_total: Option<Decimal>,
    pub scheduled_date: NaiveDate,
}

/// Pluggable multiplier sources applied after quote composition.
///
/// Both adjustments are multiplicative with a neutral value of 1.0. The
/// default methods keep the contract satisfied with no behavior, which is
/// what [`NeutralLearning`] ships.
pub trait LearningHooks: Send + Sync {
    /// Adjustment from historical acceptance rates for this category,
    /// optionally narrowed by a locality hint.
    fn acceptance_adjustment(&self, _category: &str, _locality: Option<&str>) -> Decimal {
        Decimal::ONE
    }

    /// Seasonal correction keyed by calendar month (1-12).
    fn seasonal_correction(&self, _month: u32) -> Decimal {
        Decimal::ONE
    }

    /// Record a completed/accepted/quoted price tuple.
    fn record_outcome(&self, _outcome: &QuoteOutcome) {}
}

/// The neutral implementation: multipliers of 1.0 and a no-op recorder.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralLearning;

impl LearningHooks for NeutralLearning {}
