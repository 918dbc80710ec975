//! Booking storage seam.
//!
//! The engine never performs its own persistence; a `BookingStore` supplies
//! a booking's stored facts and applies committed changes. The contract's
//! one hard requirement is atomicity: a price change and its audit entry
//! land together or not at all, guarded by a per-booking version so
//! concurrent admin actions cannot interleave.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::RepriceError;
use crate::pricing::models::PricingInput;
use crate::reprice::audit::AuditLogEntry;

/// A booking's persisted pricing state.
#[derive(Debug, Clone)]
pub struct StoredBooking {
    pub id: Uuid,
    /// The facts the committed price was computed from.
    pub facts: PricingInput,
    pub price: Decimal,
    /// Bumped on every applied update; the CAS token for commits.
    pub version: u64,
    pub cancelled: bool,
    pub audit: Vec<AuditLogEntry>,
}

/// One atomic mutation of a booking, always paired with its audit entry.
#[derive(Debug, Clone)]
pub struct BookingUpdate {
    pub price: Option<Decimal>,
    pub facts: Option<PricingInput>,
    pub cancel: bool,
    pub entry: AuditLogEntry,
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Snapshot of a booking's stored state.
    async fn load(&self, id: Uuid) -> Result<StoredBooking, RepriceError>;

    /// Apply an update if the booking is live and the version still matches.
    ///
    /// The price/facts change and the audit append are a single atomic
    /// operation; implementations must not let one land without the other.
    async fn apply(
        &self,
        id: Uuid,
        expected_version: u64,
        update: BookingUpdate,
    ) -> Result<(), RepriceError>;
}

/// Reference implementation over a process-local map. Serves as the test
/// double; production callers bring their own database-backed store.
#[derive(Default)]
pub struct InMemoryBookingStore {
    bookings: RwLock<HashMap<Uuid, StoredBooking>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a booking with its initial committed price.
    pub async fn insert(&self, facts: PricingInput, price: Decimal) -> Uuid {
        let id = Uuid::new_v4();
        let booking = StoredBooking {
            id,
            facts,
            price,
            version: 1,
            cancelled: false,
            audit: Vec::new(),
        };
        self.bookings.write().await.insert(id, booking);
        id
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn load(&self, id: Uuid) -> Result<StoredBooking, RepriceError> {
        self.bookings
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(RepriceError::BookingNotFound(id))
    }

    async fn apply(
        &self,
        id: Uuid,
        expected_version: u64,
        update: BookingUpdate,
    ) -> Result<(), RepriceError> {
        let mut bookings = self.bookings.write().await;
        let booking = bookings
            .get_mut(&id)
            .ok_or(RepriceError::BookingNotFound(id))?;

        if booking.cancelled {
            return Err(RepriceError::AlreadyCancelled(id));
        }
        if booking.version != expected_version {
            return Err(RepriceError::ConcurrentCommit(id));
        }

        if let Some(price) = update.price {
            booking.price = price;
        }
        if let Some(facts) = update.facts {
            booking.facts = facts;
        }
        if update.cancel {
            booking.cancelled = true;
        }
        booking.audit.push(update.entry);
        booking.version += 1;
        Ok(())
    }
}
