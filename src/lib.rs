//! movequote - pricing quotation engine for goods-transport jobs.
//!
//! Computes a deterministic, explainable price from a job's facts (distance,
//! items, access constraints, timing), optionally sanity-checks it against an
//! external estimator, and supports administrative repricing with an
//! append-only audit trail. Transport, persistence, and notification delivery
//! are the embedding application's concern.

pub mod cache;
pub mod config;
pub mod error;
pub mod learning;
pub mod pricing;
pub mod reprice;
pub mod validation;

// Re-export the public surface
pub use cache::ValidationCache;
pub use config::RateConfig;
pub use error::{QuoteError, RepriceError};
pub use learning::{LearningHooks, NeutralLearning, QuoteOutcome};
pub use pricing::{
    BreakdownLine, EngineOptions, InsuranceTier, LineItem, PricingEngine, PricingInput,
    PricingResult,
};
pub use reprice::audit::{AuditAction, AuditLogEntry, FieldDiff};
pub use reprice::store::{BookingStore, BookingUpdate, InMemoryBookingStore, StoredBooking};
pub use reprice::{RepriceQuote, RepriceService};
pub use validation::{
    apply_validation, build_validator, BlendOutcome, DisabledValidator, ExternalValidator,
    QuoteValidator, ValidationResult, ValidatorConfig,
};
