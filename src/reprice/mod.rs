//! Administrative repricing with an auditable trail.
//!
//! Recompute and commit are two distinct calls: recompute is idempotent and
//! touches nothing, commit is the only operation that mutates a stored price
//! and always appends the matching audit entry in the same atomic step.

pub mod audit;
pub mod store;

use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::error::RepriceError;
use crate::pricing::engine::PricingEngine;
use crate::pricing::models::{ItemTotals, PricingInput};
use crate::pricing::responses::PricingResult;

use audit::{AuditAction, AuditLogEntry, FieldDiff};
use store::{BookingStore, BookingUpdate};

/// A recomputed price awaiting administrator confirmation.
#[derive(Debug, Clone)]
pub struct RepriceQuote {
    pub booking_id: Uuid,
    pub old_price: Decimal,
    pub new_price: Decimal,
    pub result: PricingResult,
    /// Version the recompute observed; commit CASes against it.
    version: u64,
}

/// Recompute/commit/edit/cancel against a booking store.
pub struct RepriceService<S> {
    engine: PricingEngine,
    store: S,
}

impl<S: BookingStore> RepriceService<S> {
    pub fn new(engine: PricingEngine, store: S) -> Self {
        Self { engine, store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Recompute a booking's price from its persisted facts alone.
    ///
    /// Side-effect-free and idempotent: calling it any number of times
    /// without a commit in between yields the same figures, because the
    /// stored facts include the original request instant.
    pub async fn recompute(&self, booking_id: Uuid) -> Result<RepriceQuote, RepriceError> {
        let booking = self.store.load(booking_id).await?;
        if booking.cancelled {
            return Err(RepriceError::AlreadyCancelled(booking_id));
        }

        let result = self.engine.calculate(&booking.facts)?;
        Ok(RepriceQuote {
            booking_id,
            old_price: booking.price,
            new_price: result.total,
            result,
            version: booking.version,
        })
    }

    /// Commit a recomputed price after administrator confirmation.
    pub async fn commit(
        &self,
        quote: &RepriceQuote,
        admin: &str,
        note: Option<String>,
    ) -> Result<AuditLogEntry, RepriceError> {
        let entry = AuditLogEntry::new(
            AuditAction::Reprice,
            vec![FieldDiff::new("price", quote.old_price, quote.new_price)],
            note,
            admin,
        );
        self.store
            .apply(
                quote.booking_id,
                quote.version,
                BookingUpdate {
                    price: Some(quote.new_price),
                    facts: None,
                    cancel: false,
                    entry: entry.clone(),
                },
            )
            .await?;

        info!(
            booking = %quote.booking_id,
            old = %quote.old_price,
            new = %quote.new_price,
            admin,
            "reprice committed"
        );
        Ok(entry)
    }

    /// Replace a booking's facts, reprice from them, and commit both with a
    /// per-field diff of everything that changed.
    pub async fn apply_edit(
        &self,
        booking_id: Uuid,
        new_facts: PricingInput,
        admin: &str,
        note: Option<String>,
    ) -> Result<PricingResult, RepriceError> {
        let booking = self.store.load(booking_id).await?;
        if booking.cancelled {
            return Err(RepriceError::AlreadyCancelled(booking_id));
        }

        let result = self.engine.calculate(&new_facts)?;
        let mut changes = diff_facts(&booking.facts, &new_facts);
        if booking.price != result.total {
            changes.push(FieldDiff::new("price", booking.price, result.total));
        }

        let entry = AuditLogEntry::new(AuditAction::Edit, changes, note, admin);
        self.store
            .apply(
                booking_id,
                booking.version,
                BookingUpdate {
                    price: Some(result.total),
                    facts: Some(new_facts),
                    cancel: false,
                    entry,
                },
            )
            .await?;

        info!(booking = %booking_id, total = %result.total, admin, "edit committed");
        Ok(result)
    }

    /// Cancel a booking. Terminal: no reprice or edit is permitted after.
    pub async fn cancel(
        &self,
        booking_id: Uuid,
        reason: &str,
        admin: &str,
    ) -> Result<AuditLogEntry, RepriceError> {
        if reason.trim().len() < 3 {
            return Err(RepriceError::ReasonTooShort);
        }

        let booking = self.store.load(booking_id).await?;
        if booking.cancelled {
            return Err(RepriceError::AlreadyCancelled(booking_id));
        }

        let entry = AuditLogEntry::new(
            AuditAction::Cancel,
            vec![FieldDiff::new("status", "active", "cancelled")],
            Some(reason.trim().to_string()),
            admin,
        );
        self.store
            .apply(
                booking_id,
                booking.version,
                BookingUpdate {
                    price: None,
                    facts: None,
                    cancel: true,
                    entry: entry.clone(),
                },
            )
            .await?;

        info!(booking = %booking_id, admin, "booking cancelled");
        Ok(entry)
    }
}

/// Structured before/after for every changed fact.
fn diff_facts(old: &PricingInput, new: &PricingInput) -> Vec<FieldDiff> {
    let mut changes = Vec::new();

    if old.category != new.category {
        changes.push(FieldDiff::new("category", &old.category, &new.category));
    }
    if old.distance_km != new.distance_km {
        changes.push(FieldDiff::new("distance_km", old.distance_km, new.distance_km));
    }
    if old.items != new.items {
        changes.push(FieldDiff::new(
            "items",
            summarize_items(old),
            summarize_items(new),
        ));
    }
    if old.pickup_floor != new.pickup_floor {
        changes.push(FieldDiff::new("pickup_floor", old.pickup_floor, new.pickup_floor));
    }
    if old.pickup_has_lift != new.pickup_has_lift {
        changes.push(FieldDiff::new("pickup_has_lift", old.pickup_has_lift, new.pickup_has_lift));
    }
    if old.delivery_floor != new.delivery_floor {
        changes.push(FieldDiff::new("delivery_floor", old.delivery_floor, new.delivery_floor));
    }
    if old.delivery_has_lift != new.delivery_has_lift {
        changes.push(FieldDiff::new(
            "delivery_has_lift",
            old.delivery_has_lift,
            new.delivery_has_lift,
        ));
    }
    if old.needs_packing != new.needs_packing {
        changes.push(FieldDiff::new("needs_packing", old.needs_packing, new.needs_packing));
    }
    if old.needs_assembly != new.needs_assembly {
        changes.push(FieldDiff::new("needs_assembly", old.needs_assembly, new.needs_assembly));
    }
    if old.needs_disassembly != new.needs_disassembly {
        changes.push(FieldDiff::new(
            "needs_disassembly",
            old.needs_disassembly,
            new.needs_disassembly,
        ));
    }
    if old.needs_cleaning != new.needs_cleaning {
        changes.push(FieldDiff::new("needs_cleaning", old.needs_cleaning, new.needs_cleaning));
    }
    if old.insurance != new.insurance {
        changes.push(FieldDiff::new(
            "insurance",
            old.insurance.as_str(),
            new.insurance.as_str(),
        ));
    }
    if old.scheduled_date != new.scheduled_date {
        changes.push(FieldDiff::new(
            "scheduled_date",
            old.scheduled_date,
            new.scheduled_date,
        ));
    }

    changes
}

fn summarize_items(input: &PricingInput) -> String {
    let totals = ItemTotals::from_items(&input.items);
    format!(
        "{} items, {} m3, {} kg",
        totals.count,
        totals.volume_m3.normalize(),
        totals.weight_kg.normalize()
    )
}
