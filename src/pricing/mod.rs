//! Quote calculation: input model, pure calculators, and the orchestrating
//! engine.

pub mod calculators;
pub mod engine;
pub mod models;
pub mod responses;

// Re-export commonly used items
pub use calculators::{round_money, round_to_nearest_five, VehicleSelection};
pub use engine::{EngineOptions, PricingEngine};
pub use models::{InsuranceTier, ItemTotals, LineItem, PricingInput};
pub use responses::{BreakdownLine, Money, PricingResult};
