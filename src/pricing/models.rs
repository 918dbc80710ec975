//! Input types for quote calculation.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::QuoteError;

/// Cover level for goods in transit. Fixed enumeration; anything else is a
/// validation error, not a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsuranceTier {
    Basic,
    Standard,
    Premium,
}

impl InsuranceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsuranceTier::Basic => "basic",
            InsuranceTier::Standard => "standard",
            InsuranceTier::Premium => "premium",
        }
    }
}

impl FromStr for InsuranceTier {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "basic" => Ok(InsuranceTier::Basic),
            "standard" => Ok(InsuranceTier::Standard),
            "premium" => Ok(InsuranceTier::Premium),
            other => Err(QuoteError::UnknownInsuranceTier(other.to_string())),
        }
    }
}

/// One line of goods to move. Weight and volume are per unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::str")]
    pub weight_kg: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub volume_m3: Decimal,
}

impl LineItem {
    fn validate(&self) -> Result<(), QuoteError> {
        if self.quantity == 0 {
            return Err(QuoteError::InvalidItem {
                name: self.name.clone(),
                reason: "quantity must be at least 1".to_string(),
            });
        }
        if self.weight_kg < Decimal::ZERO {
            return Err(QuoteError::InvalidItem {
                name: self.name.clone(),
                reason: "weight must be non-negative".to_string(),
            });
        }
        if self.volume_m3 < Decimal::ZERO {
            return Err(QuoteError::InvalidItem {
                name: self.name.clone(),
                reason: "volume must be non-negative".to_string(),
            });
        }
        Ok(())
    }
}

/// The facts a quote is computed from. Immutable per calculation call.
///
/// An empty item list is a valid job (zero volume and weight), and an
/// unrecognized category falls back to the configured default base price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingInput {
    pub category: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub distance_km: Decimal,
    #[serde(default)]
    pub items: Vec<LineItem>,
    pub pickup_floor: i32,
    pub pickup_has_lift: bool,
    pub delivery_floor: i32,
    pub delivery_has_lift: bool,
    #[serde(default)]
    pub needs_packing: bool,
    #[serde(default)]
    pub needs_assembly: bool,
    #[serde(default)]
    pub needs_disassembly: bool,
    #[serde(default)]
    pub needs_cleaning: bool,
    pub insurance: InsuranceTier,
    pub scheduled_date: NaiveDate,
    pub requested_at: DateTime<Utc>,
}

impl PricingInput {
    /// Reject type/range violations. Unusual-but-valid inputs (zero distance,
    /// no items) pass.
    pub fn validate(&self) -> Result<(), QuoteError> {
        if self.distance_km < Decimal::ZERO {
            return Err(QuoteError::NegativeDistance(self.distance_km));
        }
        if self.pickup_floor < 0 {
            return Err(QuoteError::NegativeFloor {
                location: "pickup",
                floor: self.pickup_floor,
            });
        }
        if self.delivery_floor < 0 {
            return Err(QuoteError::NegativeFloor {
                location: "delivery",
                floor: self.delivery_floor,
            });
        }
        for item in &self.items {
            item.validate()?;
        }
        Ok(())
    }

    /// Total unit count across all lines.
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

/// Quantity-weighted totals across all line items.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemTotals {
    pub count: u32,
    pub volume_m3: Decimal,
    pub weight_kg: Decimal,
}

impl ItemTotals {
    pub fn from_items(items: &[LineItem]) -> Self {
        let mut totals = ItemTotals {
            count: 0,
            volume_m3: Decimal::ZERO,
            weight_kg: Decimal::ZERO,
        };
        for item in items {
            let quantity = Decimal::from(item.quantity);
            totals.count += item.quantity;
            totals.volume_m3 += item.volume_m3 * quantity;
            totals.weight_kg += item.weight_kg * quantity;
        }
        totals
    }
}
