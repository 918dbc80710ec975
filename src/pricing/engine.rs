//! Quote orchestration.
//!
//! `PricingEngine` composes the pure calculators into a full quote: line-item
//! breakdown, subtotal, VAT, total, and a rounded price range. The engine is
//! stateless and reentrant; every call is a pure function of the input and
//! the injected rate configuration.

use std::sync::Arc;

use chrono::Datelike;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::config::RateConfig;
use crate::error::QuoteError;
use crate::learning::{LearningHooks, NeutralLearning, QuoteOutcome};
use crate::pricing::calculators::{
    demand_multiplier, distance_cost, extra_services, floor_surcharge, resolve_vehicle,
    round_money, round_to_nearest_five,
};
use crate::pricing::models::{ItemTotals, PricingInput};
use crate::pricing::responses::{BreakdownLine, PricingResult};

/// Caller-selected configuration flags.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Which distance-tier table and minimum charge apply.
    pub profile: String,
    /// When false, VAT is zero and `total == subtotal`.
    pub include_tax: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            profile: "standard".to_string(),
            include_tax: true,
        }
    }
}

/// The pricing engine. Construct once per rate configuration and share
/// freely; quote calculations never touch shared mutable state.
pub struct PricingEngine {
    config: Arc<RateConfig>,
    options: EngineOptions,
    learning: Arc<dyn LearningHooks>,
}

impl PricingEngine {
    /// Build an engine over a validated configuration.
    ///
    /// An unknown rate profile is rejected here rather than at quote time;
    /// unknown job categories, by contrast, stay quotable via the default
    /// base price.
    pub fn new(config: Arc<RateConfig>, options: EngineOptions) -> Result<Self, QuoteError> {
        config.validate()?;
        config.distance_profile(&options.profile)?;
        info!(
            version = %config.version,
            profile = %options.profile,
            "pricing engine initialized"
        );
        Ok(Self {
            config,
            options,
            learning: Arc::new(NeutralLearning),
        })
    }

    /// Install a learning strategy (neutral by default).
    pub fn with_learning(mut self, learning: Arc<dyn LearningHooks>) -> Self {
        self.learning = learning;
        self
    }

    pub fn config(&self) -> &RateConfig {
        &self.config
    }

    pub fn include_tax(&self) -> bool {
        self.options.include_tax
    }

    /// Forward a quote outcome to the learning strategy.
    pub fn record_outcome(&self, outcome: &QuoteOutcome) {
        self.learning.record_outcome(outcome);
    }

    /// Rounded low/high bounds derived from a 2-dp total: apply the
    /// configured spread, then round each bound to the nearest 5. The same
    /// derivation is used on the initial-quote and re-blend paths.
    pub fn price_range(&self, total: Decimal) -> (Decimal, Decimal) {
        let spread = self.config.range_spread;
        (
            round_to_nearest_five(total * (Decimal::ONE - spread)),
            round_to_nearest_five(total * (Decimal::ONE + spread)),
        )
    }

    /// Compute a full quote.
    ///
    /// Rejects only type/range violations; unusual-but-valid inputs (zero
    /// distance, empty item list, unrecognized category) always produce a
    /// quote.
    pub fn calculate(&self, input: &PricingInput) -> Result<PricingResult, QuoteError> {
        input.validate()?;

        let config = &self.config;
        let profile = config.distance_profile(&self.options.profile)?;
        let totals = ItemTotals::from_items(&input.items);

        let base = match config.base_prices.get(&input.category) {
            Some(price) => *price,
            None => {
                warn!(
                    category = %input.category,
                    "unknown job category, quoting at default base price"
                );
                config.default_base_price
            }
        };

        let distance = distance_cost(profile, input.distance_km)?;
        let vehicle = resolve_vehicle(&config.vehicle_classes, &totals);
        let floors = floor_surcharge(&config.floor_rates, input.pickup_floor, input.pickup_has_lift)
            + floor_surcharge(&config.floor_rates, input.delivery_floor, input.delivery_has_lift);
        let demand = demand_multiplier(&config.demand, input.scheduled_date, input.requested_at);
        let extras = extra_services(&config.extras, input, totals.count);

        let raw_subtotal = base + distance + floors + extras.total;

        // Learning post-scale, folded in before final rounding so subtotal,
        // VAT, total and range always move as one unit.
        let adjustment = self
            .learning
            .acceptance_adjustment(&input.category, None)
            * self.learning.seasonal_correction(input.scheduled_date.month());

        let subtotal = round_money(raw_subtotal * vehicle.multiplier * demand * adjustment, 2);
        let vat = if self.options.include_tax {
            round_money(subtotal * config.vat_rate, 2)
        } else {
            Decimal::ZERO
        };
        let total = subtotal + vat;
        let platform_fee = round_money(total * config.platform_fee_rate, 2);
        let (price_min, price_max) = self.price_range(total);
        let estimated_hours = self.estimate_hours(input, totals.count);

        // Ordered breakdown. The vehicle and demand lines carry the
        // difference each multiplier contributes, reconciled against the
        // already-rounded fixed lines so the column always sums to `total`.
        let mut breakdown = vec![
            BreakdownLine::new(
                format!("Base rate ({})", input.category),
                round_money(base * adjustment, 2),
            ),
            BreakdownLine::new(
                format!("Distance ({} km)", input.distance_km.normalize()),
                round_money(distance * adjustment, 2),
            ),
        ];
        if floors > Decimal::ZERO {
            breakdown.push(BreakdownLine::new(
                "Floor access",
                round_money(floors * adjustment, 2),
            ));
        }
        for extra in &extras.lines {
            breakdown.push(BreakdownLine::new(
                extra.label.clone(),
                round_money(extra.amount * adjustment, 2),
            ));
        }

        let fixed_sum: Decimal = breakdown.iter().map(|line| line.amount).sum();
        let after_vehicle = round_money(raw_subtotal * vehicle.multiplier * adjustment, 2);
        let vehicle_delta = after_vehicle - fixed_sum;
        if vehicle_delta != Decimal::ZERO {
            breakdown.push(BreakdownLine::new(
                format!("Vehicle ({} x{})", vehicle.name, vehicle.trips),
                vehicle_delta,
            ));
        }

        let demand_delta = subtotal - after_vehicle;
        if demand_delta != Decimal::ZERO {
            breakdown.push(BreakdownLine::new(
                format!("Demand adjustment (x{})", demand.normalize()),
                demand_delta,
            ));
        }

        if vat != Decimal::ZERO {
            breakdown.push(BreakdownLine::new(
                format!("VAT ({}%)", (config.vat_rate * Decimal::ONE_HUNDRED).normalize()),
                vat,
            ));
        }

        Ok(PricingResult {
            base_price: round_money(base, 2),
            distance_cost: round_money(distance, 2),
            floor_cost: round_money(floors, 2),
            extras_cost: round_money(extras.total, 2),
            vehicle: vehicle.name,
            trips: vehicle.trips,
            vehicle_multiplier: vehicle.multiplier.normalize(),
            demand_multiplier: demand.normalize(),
            subtotal,
            vat,
            total,
            platform_fee,
            estimated_hours,
            price_min,
            price_max,
            currency: config.currency.clone(),
            breakdown,
            config_version: config.version.clone(),
        })
    }

    /// Loading/unloading time per item plus per-floor time plus the driving
    /// time of both legs, in hours rounded to one decimal.
    fn estimate_hours(&self, input: &PricingInput, item_count: u32) -> Decimal {
        let duration = &self.config.duration;
        let sixty = Decimal::from(60);
        let handling_minutes = Decimal::from(item_count) * duration.loading_minutes_per_item
            + Decimal::from(input.pickup_floor + input.delivery_floor) * duration.minutes_per_floor;
        let driving_hours = Decimal::TWO * input.distance_km / duration.average_speed_kmh;
        round_money(handling_minutes / sixty + driving_hours, 1)
    }

}
