//! Rate configuration for the pricing engine.
//!
//! All tables are plain data, deserializable from JSON, and injected into the
//! engine at construction. Nothing here is global or mutable: swapping rate
//! profiles for a test (or auditing a rate change) means constructing a new
//! `RateConfig`.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::QuoteError;

/// One contiguous distance band with its own per-km rate.
///
/// `upper_km = None` marks the final, unbounded tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceTier {
    pub upper_km: Option<Decimal>,
    pub rate_per_km: Decimal,
}

/// Distance pricing for one rate profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceProfile {
    pub tiers: Vec<DistanceTier>,
    /// Models the driver's return leg.
    pub round_trip_factor: Decimal,
    pub minimum_charge: Decimal,
}

/// A named capacity bucket with its cost multiplier.
///
/// Classes are declared smallest to largest; the resolver walks them in
/// declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleClass {
    pub name: String,
    pub volume_capacity_m3: Decimal,
    pub weight_capacity_kg: Decimal,
    pub rate_multiplier: Decimal,
}

/// Access-difficulty pricing for walk-ups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorRates {
    pub per_floor: Decimal,
    /// Cap applied independently at each end of the job.
    pub max_per_location: Decimal,
}

/// Base + per-item pricing for one opt-in service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRate {
    pub base: Decimal,
    pub per_item: Decimal,
}

/// Add-on service price list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtrasRates {
    pub packing: ServiceRate,
    pub assembly: ServiceRate,
    pub disassembly: ServiceRate,
    pub cleaning: ServiceRate,
    /// Flat charge per insurance tier; the lowest tier is zero.
    pub insurance_tiers: BTreeMap<String, Decimal>,
}

/// Urgency factor for one lead-time breakpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrgencyBand {
    /// Inclusive upper bound on lead time in days.
    pub max_lead_days: i64,
    pub factor: Decimal,
}

/// Demand multiplier tables: day-of-week, seasonal, and urgency pressure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandRates {
    /// Monday through Sunday.
    pub weekday_factors: [Decimal; 7],
    /// January through December.
    pub month_factors: [Decimal; 12],
    /// Ordered by ascending lead time; first match wins.
    pub urgency_bands: Vec<UrgencyBand>,
    /// Applied when no urgency band matches.
    pub standard_factor: Decimal,
}

/// Constants of the estimated-duration formula.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DurationRates {
    pub loading_minutes_per_item: Decimal,
    pub minutes_per_floor: Decimal,
    pub average_speed_kmh: Decimal,
}

/// Parameters of the external-estimate blending policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlendPolicy {
    /// Relative divergence above which the estimates are blended.
    pub threshold: Decimal,
    pub engine_weight: Decimal,
    pub external_weight: Decimal,
}

/// Complete, versioned rate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateConfig {
    pub version: String,
    pub currency: String,
    pub base_prices: BTreeMap<String, Decimal>,
    /// Fallback for categories not yet in `base_prices`.
    pub default_base_price: Decimal,
    pub distance_profiles: BTreeMap<String, DistanceProfile>,
    pub vehicle_classes: Vec<VehicleClass>,
    pub floor_rates: FloorRates,
    pub extras: ExtrasRates,
    pub demand: DemandRates,
    pub vat_rate: Decimal,
    /// Informational only; never charged to the customer.
    pub platform_fee_rate: Decimal,
    pub duration: DurationRates,
    /// Half-width of the quoted price range, as a fraction of total.
    pub range_spread: Decimal,
    pub blending: BlendPolicy,
}

impl RateConfig {
    /// Load a configuration from JSON and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, QuoteError> {
        let config: RateConfig = serde_json::from_str(json)
            .map_err(|e| QuoteError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check structural invariants the calculators rely on.
    ///
    /// Distance tiers must be contiguous and strictly increasing with an
    /// unbounded final tier; vehicle classes need positive capacities.
    pub fn validate(&self) -> Result<(), QuoteError> {
        if self.distance_profiles.is_empty() {
            return Err(QuoteError::InvalidConfig(
                "at least one distance profile is required".to_string(),
            ));
        }

        for (name, profile) in &self.distance_profiles {
            if profile.tiers.is_empty() {
                return Err(QuoteError::InvalidConfig(format!(
                    "profile '{}' has no distance tiers",
                    name
                )));
            }

            let mut previous = Decimal::ZERO;
            for (i, tier) in profile.tiers.iter().enumerate() {
                let last = i == profile.tiers.len() - 1;
                match tier.upper_km {
                    Some(upper) if last => {
                        return Err(QuoteError::InvalidConfig(format!(
                            "profile '{}': final tier must be unbounded, got upper bound {}",
                            name, upper
                        )));
                    }
                    Some(upper) => {
                        if upper <= previous {
                            return Err(QuoteError::InvalidConfig(format!(
                                "profile '{}': tier bounds must be strictly increasing ({} after {})",
                                name, upper, previous
                            )));
                        }
                        previous = upper;
                    }
                    None if !last => {
                        return Err(QuoteError::InvalidConfig(format!(
                            "profile '{}': only the final tier may be unbounded",
                            name
                        )));
                    }
                    None => {}
                }
                if tier.rate_per_km < Decimal::ZERO {
                    return Err(QuoteError::InvalidConfig(format!(
                        "profile '{}': negative tier rate",
                        name
                    )));
                }
            }

            if profile.round_trip_factor <= Decimal::ZERO {
                return Err(QuoteError::InvalidConfig(format!(
                    "profile '{}': round trip factor must be positive",
                    name
                )));
            }
        }

        if self.vehicle_classes.is_empty() {
            return Err(QuoteError::InvalidConfig(
                "at least one vehicle class is required".to_string(),
            ));
        }
        for class in &self.vehicle_classes {
            if class.volume_capacity_m3 <= Decimal::ZERO || class.weight_capacity_kg <= Decimal::ZERO {
                return Err(QuoteError::InvalidConfig(format!(
                    "vehicle class '{}' must have positive capacities",
                    class.name
                )));
            }
        }

        for tier in ["basic", "standard", "premium"] {
            if !self.extras.insurance_tiers.contains_key(tier) {
                return Err(QuoteError::InvalidConfig(format!(
                    "missing insurance tier '{}'",
                    tier
                )));
            }
        }

        if self.blending.engine_weight + self.blending.external_weight != Decimal::ONE {
            return Err(QuoteError::InvalidConfig(
                "blending weights must sum to 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Look up a distance profile by name.
    pub fn distance_profile(&self, name: &str) -> Result<&DistanceProfile, QuoteError> {
        self.distance_profiles
            .get(name)
            .ok_or_else(|| QuoteError::UnknownProfile(name.to_string()))
    }
}

impl Default for RateConfig {
    /// Built-in GBP rate card so the engine is usable without external files.
    fn default() -> Self {
        let mut base_prices = BTreeMap::new();
        base_prices.insert("house_move".to_string(), dec!(120));
        base_prices.insert("flat_move".to_string(), dec!(90));
        base_prices.insert("office_move".to_string(), dec!(160));
        base_prices.insert("single_item".to_string(), dec!(40));
        base_prices.insert("student_move".to_string(), dec!(60));

        let mut distance_profiles = BTreeMap::new();
        distance_profiles.insert(
            "standard".to_string(),
            DistanceProfile {
                tiers: vec![
                    DistanceTier { upper_km: Some(dec!(10)), rate_per_km: dec!(2.00) },
                    DistanceTier { upper_km: Some(dec!(50)), rate_per_km: dec!(1.50) },
                    DistanceTier { upper_km: Some(dec!(200)), rate_per_km: dec!(1.00) },
                    DistanceTier { upper_km: None, rate_per_km: dec!(0.80) },
                ],
                round_trip_factor: dec!(1.4),
                minimum_charge: dec!(25),
            },
        );
        distance_profiles.insert(
            "long_distance".to_string(),
            DistanceProfile {
                tiers: vec![
                    DistanceTier { upper_km: Some(dec!(50)), rate_per_km: dec!(1.20) },
                    DistanceTier { upper_km: Some(dec!(300)), rate_per_km: dec!(0.90) },
                    DistanceTier { upper_km: None, rate_per_km: dec!(0.70) },
                ],
                round_trip_factor: dec!(1.2),
                minimum_charge: dec!(60),
            },
        );

        let mut insurance_tiers = BTreeMap::new();
        insurance_tiers.insert("basic".to_string(), Decimal::ZERO);
        insurance_tiers.insert("standard".to_string(), dec!(25));
        insurance_tiers.insert("premium".to_string(), dec!(60));

        Self {
            version: "2026-08".to_string(),
            currency: "GBP".to_string(),
            base_prices,
            default_base_price: dec!(100),
            distance_profiles,
            vehicle_classes: vec![
                VehicleClass {
                    name: "Van".to_string(),
                    volume_capacity_m3: dec!(10),
                    weight_capacity_kg: dec!(800),
                    rate_multiplier: dec!(1.0),
                },
                VehicleClass {
                    name: "Luton Van".to_string(),
                    volume_capacity_m3: dec!(20),
                    weight_capacity_kg: dec!(1200),
                    rate_multiplier: dec!(1.25),
                },
                VehicleClass {
                    name: "7.5t Truck".to_string(),
                    volume_capacity_m3: dec!(35),
                    weight_capacity_kg: dec!(2600),
                    rate_multiplier: dec!(1.6),
                },
                VehicleClass {
                    name: "18t Lorry".to_string(),
                    volume_capacity_m3: dec!(55),
                    weight_capacity_kg: dec!(9000),
                    rate_multiplier: dec!(2.1),
                },
            ],
            floor_rates: FloorRates {
                per_floor: dec!(15),
                max_per_location: dec!(75),
            },
            extras: ExtrasRates {
                packing: ServiceRate { base: dec!(45), per_item: dec!(3) },
                assembly: ServiceRate { base: dec!(25), per_item: dec!(6) },
                disassembly: ServiceRate { base: dec!(20), per_item: dec!(4) },
                cleaning: ServiceRate { base: dec!(60), per_item: dec!(0) },
                insurance_tiers,
            },
            demand: DemandRates {
                weekday_factors: [
                    dec!(1.00), // Monday
                    dec!(0.95),
                    dec!(0.95),
                    dec!(1.00),
                    dec!(1.15), // Friday
                    dec!(1.30), // Saturday peak
                    dec!(1.10),
                ],
                month_factors: [
                    dec!(0.90), // January
                    dec!(0.90),
                    dec!(1.00),
                    dec!(1.00),
                    dec!(1.10),
                    dec!(1.20),
                    dec!(1.25), // July peak
                    dec!(1.25),
                    dec!(1.10),
                    dec!(1.00),
                    dec!(1.00),
                    dec!(1.15), // December
                ],
                urgency_bands: vec![
                    UrgencyBand { max_lead_days: 0, factor: dec!(1.5) },
                    UrgencyBand { max_lead_days: 1, factor: dec!(1.3) },
                    UrgencyBand { max_lead_days: 3, factor: dec!(1.2) },
                    UrgencyBand { max_lead_days: 7, factor: dec!(1.1) },
                ],
                standard_factor: dec!(1.0),
            },
            vat_rate: dec!(0.20),
            platform_fee_rate: dec!(0.15),
            duration: DurationRates {
                loading_minutes_per_item: dec!(5),
                minutes_per_floor: dec!(10),
                average_speed_kmh: dec!(45),
            },
            range_spread: dec!(0.15),
            blending: BlendPolicy {
                threshold: dec!(0.20),
                engine_weight: dec!(0.6),
                external_weight: dec!(0.4),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RateConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.currency, "GBP");
        assert!(config.distance_profiles.contains_key("standard"));
        assert!(config.distance_profiles.contains_key("long_distance"));
    }

    #[test]
    fn test_rejects_bounded_final_tier() {
        let mut config = RateConfig::default();
        let profile = config.distance_profiles.get_mut("standard").unwrap();
        profile.tiers.last_mut().unwrap().upper_km = Some(dec!(500));
        assert!(matches!(config.validate(), Err(QuoteError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_non_increasing_tier_bounds() {
        let mut config = RateConfig::default();
        let profile = config.distance_profiles.get_mut("standard").unwrap();
        profile.tiers[1].upper_km = Some(dec!(10)); // equal to tier 0 bound
        assert!(matches!(config.validate(), Err(QuoteError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_mid_list_unbounded_tier() {
        let mut config = RateConfig::default();
        let profile = config.distance_profiles.get_mut("standard").unwrap();
        profile.tiers[1].upper_km = None;
        assert!(matches!(config.validate(), Err(QuoteError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_missing_insurance_tier() {
        let mut config = RateConfig::default();
        config.extras.insurance_tiers.remove("premium");
        assert!(matches!(config.validate(), Err(QuoteError::InvalidConfig(_))));
    }

    #[test]
    fn test_unknown_profile_lookup() {
        let config = RateConfig::default();
        assert!(matches!(
            config.distance_profile("weekend_only"),
            Err(QuoteError::UnknownProfile(_))
        ));
    }

    #[test]
    fn test_round_trips_through_json() {
        let config = RateConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let loaded = RateConfig::from_json_str(&json).unwrap();
        assert_eq!(loaded.version, config.version);
        assert_eq!(loaded.vehicle_classes.len(), config.vehicle_classes.len());
        assert_eq!(loaded.vat_rate, config.vat_rate);
    }
}
