//! Core pricing calculation functions.
//!
//! Pure functions for pricing math - no I/O, no shared state. The orchestrator
//! in `engine.rs` composes these into a full quote.

use chrono::{Datelike, DateTime, NaiveDate, Utc};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;

use crate::config::{DemandRates, DistanceProfile, ExtrasRates, FloorRates, VehicleClass};
use crate::error::QuoteError;
use crate::pricing::models::{ItemTotals, PricingInput};
use crate::pricing::responses::BreakdownLine;

/// Round to specified decimal places using banker's rounding (ROUND_HALF_EVEN).
///
/// Banker's rounding rounds to the nearest even number when the value is
/// exactly halfway between two possibilities, reducing cumulative bias.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use movequote::pricing::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(2));   // rounds to even
/// assert_eq!(round_money(dec!(3.5), 0), dec!(4));   // rounds to even
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

/// Round to the nearest 5 currency units, away from zero at the midpoint.
///
/// Used only for the quoted price-range bounds.
pub fn round_to_nearest_five(amount: Decimal) -> Decimal {
    let five = Decimal::from(5);
    (amount / five).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero) * five
}

/// Convert a one-way distance into a monetary cost.
///
/// Walks the ordered rate tiers, consuming distance cumulatively - each tier
/// charges its rate only for the portion of distance falling inside it. The
/// sum is multiplied by the profile's round-trip factor and clamped to the
/// minimum charge.
pub fn distance_cost(profile: &DistanceProfile, distance_km: Decimal) -> Result<Decimal, QuoteError> {
    if distance_km < Decimal::ZERO {
        return Err(QuoteError::NegativeDistance(distance_km));
    }

    let mut remaining = distance_km;
    let mut cost = Decimal::ZERO;
    let mut previous_bound = Decimal::ZERO;

    for tier in &profile.tiers {
        let portion = match tier.upper_km {
            Some(upper) => remaining.min(upper - previous_bound),
            None => remaining,
        };
        cost += portion * tier.rate_per_km;
        remaining -= portion;
        if remaining <= Decimal::ZERO {
            break;
        }
        if let Some(upper) = tier.upper_km {
            previous_bound = upper;
        }
    }

    let with_return_leg = cost * profile.round_trip_factor;
    Ok(with_return_leg.max(profile.minimum_charge))
}

/// The vehicle recommendation for a job.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleSelection {
    pub name: String,
    pub trips: u32,
    /// Class rate multiplier times trip count; scales the entire raw
    /// subtotal, since larger or repeated vehicles mean more labor
    /// throughout the job.
    pub multiplier: Decimal,
}

/// Select the smallest vehicle class that fits both volume and weight.
///
/// When nothing fits, the largest class runs multiple trips: the ceiling of
/// each capacity ratio, taking whichever dimension needs more.
pub fn resolve_vehicle(classes: &[VehicleClass], totals: &ItemTotals) -> VehicleSelection {
    for class in classes {
        if totals.volume_m3 <= class.volume_capacity_m3 && totals.weight_kg <= class.weight_capacity_kg {
            return VehicleSelection {
                name: class.name.clone(),
                trips: 1,
                multiplier: class.rate_multiplier,
            };
        }
    }

    // Capacities are validated positive at config load.
    let largest = classes.last().expect("config guarantees at least one vehicle class");
    let volume_trips = (totals.volume_m3 / largest.volume_capacity_m3)
        .ceil()
        .to_u32()
        .unwrap_or(1);
    let weight_trips = (totals.weight_kg / largest.weight_capacity_kg)
        .ceil()
        .to_u32()
        .unwrap_or(1);
    let trips = volume_trips.max(weight_trips).max(1);

    VehicleSelection {
        name: largest.name.clone(),
        trips,
        multiplier: largest.rate_multiplier * Decimal::from(trips),
    }
}

/// Access-difficulty cost for one location.
///
/// A walk-up charges per floor up to the per-location cap; a lift (or ground
/// floor) charges nothing.
pub fn floor_surcharge(rates: &FloorRates, floor: i32, has_lift: bool) -> Decimal {
    if floor <= 0 || has_lift {
        return Decimal::ZERO;
    }
    let charge = Decimal::from(floor) * rates.per_floor;
    charge.min(rates.max_per_location)
}

/// Compose day-of-week, seasonal, and urgency pricing pressure into one
/// multiplier.
///
/// Lead time is the whole-day gap between the request and the scheduled
/// date; urgency bands are checked smallest first and the first match wins,
/// so a scheduled date in the past still prices as same-day.
pub fn demand_multiplier(
    rates: &DemandRates,
    scheduled_date: NaiveDate,
    requested_at: DateTime<Utc>,
) -> Decimal {
    let weekday = rates.weekday_factors[scheduled_date.weekday().num_days_from_monday() as usize];
    let month = rates.month_factors[scheduled_date.month0() as usize];

    let lead_days = (scheduled_date - requested_at.date_naive()).num_days();
    let urgency = rates
        .urgency_bands
        .iter()
        .find(|band| lead_days <= band.max_lead_days)
        .map(|band| band.factor)
        .unwrap_or(rates.standard_factor);

    weekday * month * urgency
}

/// Result of add-on service pricing.
#[derive(Debug, Clone)]
pub struct ExtrasResult {
    pub lines: Vec<BreakdownLine>,
    pub total: Decimal,
}

/// Sum the opt-in add-ons.
///
/// Each enabled service contributes its base charge plus a per-item charge
/// and exactly one breakdown line, in fixed declaration order: packing,
/// assembly, disassembly, cleaning, insurance. Insurance is a flat tier
/// charge with no per-item component; the zero-charge basic tier produces
/// no line.
pub fn extra_services(rates: &ExtrasRates, input: &PricingInput, item_count: u32) -> ExtrasResult {
    let count = Decimal::from(item_count);
    let mut lines = Vec::new();
    let mut total = Decimal::ZERO;

    let services = [
        (input.needs_packing, &rates.packing, "Packing service"),
        (input.needs_assembly, &rates.assembly, "Furniture assembly"),
        (input.needs_disassembly, &rates.disassembly, "Furniture disassembly"),
        (input.needs_cleaning, &rates.cleaning, "End-of-move cleaning"),
    ];

    for (enabled, rate, label) in services {
        if enabled {
            let charge = rate.base + rate.per_item * count;
            lines.push(BreakdownLine::new(label, charge));
            total += charge;
        }
    }

    let insurance_charge = rates
        .insurance_tiers
        .get(input.insurance.as_str())
        .copied()
        .unwrap_or(Decimal::ZERO);
    if insurance_charge > Decimal::ZERO {
        lines.push(BreakdownLine::new(
            format!("Insurance ({})", input.insurance.as_str()),
            insurance_charge,
        ));
        total += insurance_charge;
    }

    ExtrasResult { lines, total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateConfig;
    use crate::pricing::models::{InsuranceTier, LineItem};
    use rust_decimal_macros::dec;

    fn config() -> RateConfig {
        RateConfig::default()
    }

    fn input_with_flags(
        packing: bool,
        assembly: bool,
        disassembly: bool,
        cleaning: bool,
        insurance: InsuranceTier,
    ) -> PricingInput {
        PricingInput {
            category: "house_move".to_string(),
            distance_km: dec!(10),
            items: vec![],
            pickup_floor: 0,
            pickup_has_lift: false,
            delivery_floor: 0,
            delivery_has_lift: false,
            needs_packing: packing,
            needs_assembly: assembly,
            needs_disassembly: disassembly,
            needs_cleaning: cleaning,
            insurance,
            scheduled_date: NaiveDate::from_ymd_opt(2026, 9, 14).unwrap(),
            requested_at: DateTime::parse_from_rfc3339("2026-09-01T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    // ==================== rounding tests ====================

    #[test]
    fn test_round_money_bankers_rounding() {
        assert_eq!(round_money(dec!(2.5), 0), dec!(2));
        assert_eq!(round_money(dec!(3.5), 0), dec!(4));
        assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
        assert_eq!(round_money(dec!(1.236), 2), dec!(1.24));
    }

    #[test]
    fn test_round_to_nearest_five() {
        assert_eq!(round_to_nearest_five(dec!(98.6)), dec!(100));
        assert_eq!(round_to_nearest_five(dec!(133.4)), dec!(135));
        assert_eq!(round_to_nearest_five(dec!(97.4)), dec!(95));
        assert_eq!(round_to_nearest_five(dec!(97.5)), dec!(100));
        assert_eq!(round_to_nearest_five(dec!(0)), dec!(0));
    }

    // ==================== distance cost tests ====================

    #[test]
    fn test_distance_cost_walks_tiers_cumulatively() {
        let config = config();
        let profile = config.distance_profile("standard").unwrap();
        // 10km @ 2.00 + 20km @ 1.50 = 50, x1.4 round trip = 70
        assert_eq!(distance_cost(profile, dec!(30)).unwrap(), dec!(70.0));
        // 20 + 60 + 50 = 130, x1.4 = 182
        assert_eq!(distance_cost(profile, dec!(100)).unwrap(), dec!(182.0));
        // All four tiers: 20 + 60 + 150 + 40 = 270, x1.4 = 378
        assert_eq!(distance_cost(profile, dec!(250)).unwrap(), dec!(378.0));
    }

    #[test]
    fn test_distance_cost_clamps_to_minimum_charge() {
        let config = config();
        let profile = config.distance_profile("standard").unwrap();
        // 5km x 2.00 x 1.4 = 14, below the 25 minimum
        assert_eq!(distance_cost(profile, dec!(5)).unwrap(), dec!(25));
        assert_eq!(distance_cost(profile, dec!(0)).unwrap(), dec!(25));
    }

    #[test]
    fn test_distance_cost_monotonically_non_decreasing() {
        let config = config();
        let profile = config.distance_profile("standard").unwrap();
        let mut previous = Decimal::ZERO;
        for km in 0..400 {
            let cost = distance_cost(profile, Decimal::from(km)).unwrap();
            assert!(cost >= previous, "cost dropped at {} km", km);
            previous = cost;
        }
    }

    #[test]
    fn test_distance_cost_rejects_negative() {
        let config = config();
        let profile = config.distance_profile("standard").unwrap();
        assert!(matches!(
            distance_cost(profile, dec!(-5)),
            Err(QuoteError::NegativeDistance(_))
        ));
    }

    #[test]
    fn test_long_distance_profile_uses_own_tiers() {
        let config = config();
        let profile = config.distance_profile("long_distance").unwrap();
        // 50 x 1.20 + 50 x 0.90 = 105, x1.2 = 126
        assert_eq!(distance_cost(profile, dec!(100)).unwrap(), dec!(126.0));
    }

    // ==================== vehicle resolver tests ====================

    fn totals(volume: Decimal, weight: Decimal) -> ItemTotals {
        ItemTotals {
            count: 1,
            volume_m3: volume,
            weight_kg: weight,
        }
    }

    #[test]
    fn test_smallest_fitting_class_wins() {
        let config = config();
        let selection = resolve_vehicle(&config.vehicle_classes, &totals(dec!(8), dec!(500)));
        assert_eq!(selection.name, "Van");
        assert_eq!(selection.trips, 1);
        assert_eq!(selection.multiplier, dec!(1.0));
    }

    #[test]
    fn test_both_dimensions_must_fit() {
        let config = config();
        // Volume fits a 7.5t truck but the weight pushes into the lorry.
        let selection = resolve_vehicle(&config.vehicle_classes, &totals(dec!(30), dec!(3000)));
        assert_eq!(selection.name, "18t Lorry");
        assert_eq!(selection.trips, 1);
        assert_eq!(selection.multiplier, dec!(2.1));
    }

    #[test]
    fn test_oversized_job_gets_multiple_trips() {
        let config = config();
        // ceil(120/55) = 3 volume trips vs ceil(5000/9000) = 1 weight trip
        let selection = resolve_vehicle(&config.vehicle_classes, &totals(dec!(120), dec!(5000)));
        assert_eq!(selection.name, "18t Lorry");
        assert_eq!(selection.trips, 3);
        assert_eq!(selection.multiplier, dec!(6.3));
    }

    #[test]
    fn test_trip_count_never_below_either_ceiling() {
        let config = config();
        let volume = dec!(200);
        let weight = dec!(30000);
        let selection = resolve_vehicle(&config.vehicle_classes, &totals(volume, weight));
        let largest = config.vehicle_classes.last().unwrap();
        let volume_trips = (volume / largest.volume_capacity_m3).ceil();
        let weight_trips = (weight / largest.weight_capacity_kg).ceil();
        assert!(Decimal::from(selection.trips) >= volume_trips);
        assert!(Decimal::from(selection.trips) >= weight_trips);
    }

    #[test]
    fn test_empty_job_takes_smallest_vehicle() {
        let config = config();
        let selection = resolve_vehicle(&config.vehicle_classes, &totals(dec!(0), dec!(0)));
        assert_eq!(selection.name, "Van");
        assert_eq!(selection.trips, 1);
    }

    // ==================== floor surcharge tests ====================

    #[test]
    fn test_walk_up_charges_per_floor() {
        let config = config();
        assert_eq!(floor_surcharge(&config.floor_rates, 2, false), dec!(30));
        assert_eq!(floor_surcharge(&config.floor_rates, 4, false), dec!(60));
    }

    #[test]
    fn test_floor_surcharge_is_capped() {
        let config = config();
        // 10 x 15 = 150 exceeds the 75 cap
        assert_eq!(floor_surcharge(&config.floor_rates, 10, false), dec!(75));
    }

    #[test]
    fn test_lift_or_ground_floor_is_free() {
        let config = config();
        assert_eq!(floor_surcharge(&config.floor_rates, 6, true), Decimal::ZERO);
        assert_eq!(floor_surcharge(&config.floor_rates, 0, false), Decimal::ZERO);
    }

    // ==================== demand multiplier tests ====================

    fn request_at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_demand_composes_three_factors() {
        let config = config();
        // Monday (1.0) in September (1.1), 13 days out (standard 1.0)
        let multiplier = demand_multiplier(
            &config.demand,
            NaiveDate::from_ymd_opt(2026, 9, 14).unwrap(),
            request_at("2026-09-01T10:00:00Z"),
        );
        assert_eq!(multiplier, dec!(1.10));
    }

    #[test]
    fn test_same_day_saturday_in_august_is_peak() {
        let config = config();
        // Saturday (1.3) in August (1.25), same day (1.5)
        let multiplier = demand_multiplier(
            &config.demand,
            NaiveDate::from_ymd_opt(2026, 8, 8).unwrap(),
            request_at("2026-08-08T09:00:00Z"),
        );
        assert_eq!(multiplier, dec!(1.3) * dec!(1.25) * dec!(1.5));
    }

    #[test]
    fn test_smallest_matching_urgency_band_wins() {
        let config = config();
        let scheduled = NaiveDate::from_ymd_opt(2026, 8, 12).unwrap(); // Wednesday
        // 1 day out -> next-day band (1.3), not within-3 (1.2)
        let next_day = demand_multiplier(&config.demand, scheduled, request_at("2026-08-11T08:00:00Z"));
        let within_three = demand_multiplier(&config.demand, scheduled, request_at("2026-08-09T08:00:00Z"));
        assert_eq!(next_day, dec!(0.95) * dec!(1.25) * dec!(1.3));
        assert_eq!(within_three, dec!(0.95) * dec!(1.25) * dec!(1.2));
    }

    #[test]
    fn test_past_scheduled_date_prices_as_same_day() {
        let config = config();
        let multiplier = demand_multiplier(
            &config.demand,
            NaiveDate::from_ymd_opt(2026, 8, 10).unwrap(), // Monday
            request_at("2026-08-12T08:00:00Z"),
        );
        assert_eq!(multiplier, dec!(1.0) * dec!(1.25) * dec!(1.5));
    }

    #[test]
    fn test_demand_multiplier_is_pure() {
        let config = config();
        let scheduled = NaiveDate::from_ymd_opt(2026, 12, 19).unwrap();
        let requested = request_at("2026-12-01T12:00:00Z");
        let first = demand_multiplier(&config.demand, scheduled, requested);
        let second = demand_multiplier(&config.demand, scheduled, requested);
        assert_eq!(first, second);
    }

    // ==================== extra services tests ====================

    #[test]
    fn test_enabled_services_charge_base_plus_per_item() {
        let config = config();
        let input = input_with_flags(true, true, false, false, InsuranceTier::Basic);
        let extras = extra_services(&config.extras, &input, 12);
        // packing 45 + 12x3 = 81; assembly 25 + 12x6 = 97
        assert_eq!(extras.total, dec!(178));
        assert_eq!(extras.lines.len(), 2);
        assert_eq!(extras.lines[0].label, "Packing service");
        assert_eq!(extras.lines[0].amount, dec!(81));
        assert_eq!(extras.lines[1].label, "Furniture assembly");
        assert_eq!(extras.lines[1].amount, dec!(97));
    }

    #[test]
    fn test_line_order_follows_declaration_order() {
        let config = config();
        let input = input_with_flags(true, true, true, true, InsuranceTier::Premium);
        let extras = extra_services(&config.extras, &input, 0);
        let labels: Vec<&str> = extras.lines.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Packing service",
                "Furniture assembly",
                "Furniture disassembly",
                "End-of-move cleaning",
                "Insurance (premium)",
            ]
        );
    }

    #[test]
    fn test_insurance_is_flat_with_no_per_item_component() {
        let config = config();
        let input = input_with_flags(false, false, false, false, InsuranceTier::Standard);
        let none = extra_services(&config.extras, &input, 0);
        let many = extra_services(&config.extras, &input, 50);
        assert_eq!(none.total, dec!(25));
        assert_eq!(many.total, dec!(25));
    }

    #[test]
    fn test_basic_insurance_produces_no_line() {
        let config = config();
        let input = input_with_flags(false, false, false, false, InsuranceTier::Basic);
        let extras = extra_services(&config.extras, &input, 10);
        assert!(extras.lines.is_empty());
        assert_eq!(extras.total, Decimal::ZERO);
    }

    #[test]
    fn test_disabled_services_produce_no_lines() {
        let config = config();
        let input = input_with_flags(false, false, false, true, InsuranceTier::Basic);
        let extras = extra_services(&config.extras, &input, 5);
        assert_eq!(extras.lines.len(), 1);
        assert_eq!(extras.lines[0].label, "End-of-move cleaning");
        assert_eq!(extras.total, dec!(60));
    }

    // ==================== item aggregation sanity ====================

    #[test]
    fn test_quantity_weighted_totals_feed_vehicle_choice() {
        let config = config();
        let items = vec![LineItem {
            name: "Pallet".to_string(),
            quantity: 12,
            weight_kg: dec!(100),
            volume_m3: dec!(1.2),
        }];
        let totals = ItemTotals::from_items(&items);
        assert_eq!(totals.volume_m3, dec!(14.4));
        assert_eq!(totals.weight_kg, dec!(1200));
        let selection = resolve_vehicle(&config.vehicle_classes, &totals);
        assert_eq!(selection.name, "Luton Van");
    }
}
