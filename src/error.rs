//! Error types for quoting and repricing.

use uuid::Uuid;

/// Errors from quote calculation and input validation.
///
/// Unknown-but-plausible inputs (unrecognized category, empty item list) are
/// deliberately not errors; they resolve through documented fallbacks so a
/// quote stays available while rate tables catch up.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QuoteError {
    #[error("distance must be non-negative, got {0}")]
    NegativeDistance(rust_decimal::Decimal),

    #[error("invalid item '{name}': {reason}")]
    InvalidItem { name: String, reason: String },

    #[error("{location} floor must be non-negative, got {floor}")]
    NegativeFloor { location: &'static str, floor: i32 },

    #[error("unknown insurance tier '{0}'")]
    UnknownInsuranceTier(String),

    #[error("unknown rate profile '{0}'")]
    UnknownProfile(String),

    #[error("invalid rate configuration: {0}")]
    InvalidConfig(String),
}

/// Errors from the administrative reprice/commit path.
///
/// Conflicts carry the booking id so the caller can tell the administrator
/// which action was refused and why.
#[derive(Debug, thiserror::Error)]
pub enum RepriceError {
    #[error("booking {0} not found")]
    BookingNotFound(Uuid),

    #[error("booking {0} is cancelled; no further pricing actions are permitted")]
    AlreadyCancelled(Uuid),

    #[error("booking {0} was modified by a concurrent commit")]
    ConcurrentCommit(Uuid),

    #[error("cancellation reason must be at least 3 characters")]
    ReasonTooShort,

    #[error(transparent)]
    Quote(#[from] QuoteError),

    #[error("storage error: {0}")]
    Storage(String),
}
