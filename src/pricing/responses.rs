//! Result DTOs produced by the pricing engine.

use rust_decimal::Decimal;
use serde::Serialize;

/// Money value for JSON responses
#[derive(Debug, Clone, Serialize)]
pub struct Money {
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: String,
}

/// One line of the itemized quote. Insertion order is display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownLine {
    pub label: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
}

impl BreakdownLine {
    pub fn new(label: impl Into<String>, amount: Decimal) -> Self {
        Self {
            label: label.into(),
            amount,
        }
    }
}

/// The full computed quote.
///
/// Produced fresh on every calculation; a pure function of the input and the
/// rate configuration, never persisted as mutable state. All monetary fields
/// are rounded to 2 decimal places except the range bounds, which round to
/// the nearest 5 currency units.
#[derive(Debug, Clone, Serialize)]
pub struct PricingResult {
    #[serde(with = "rust_decimal::serde::str")]
    pub base_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub distance_cost: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub floor_cost: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub extras_cost: Decimal,
    pub vehicle: String,
    pub trips: u32,
    #[serde(with = "rust_decimal::serde::str")]
    pub vehicle_multiplier: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub demand_multiplier: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub vat: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
    /// Informational platform share; not charged to the customer.
    #[serde(with = "rust_decimal::serde::str")]
    pub platform_fee: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub estimated_hours: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub price_min: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub price_max: Decimal,
    pub currency: String,
    pub breakdown: Vec<BreakdownLine>,
    /// Version tag of the rate configuration the quote was computed under.
    pub config_version: String,
}

impl PricingResult {
    /// Sum of all breakdown line amounts. Reproduces `total` within
    /// rounding tolerance.
    pub fn breakdown_sum(&self) -> Decimal {
        self.breakdown.iter().map(|line| line.amount).sum()
    }
}
