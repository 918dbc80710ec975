//! Audit records for price-affecting administrative actions.
//!
//! Entries are append-only: a correction is a new entry, never a mutation of
//! an existing one. The store hands out snapshots, so a written entry's diff
//! and timestamp are out of reach of later operations.

use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// What kind of administrative action an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    Edit,
    Reprice,
    Cancel,
}

/// Before/after values for one changed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDiff {
    pub field: String,
    pub before: String,
    pub after: String,
}

impl FieldDiff {
    pub fn new(field: impl Into<String>, before: impl Display, after: impl Display) -> Self {
        Self {
            field: field.into(),
            before: before.to_string(),
            after: after.to_string(),
        }
    }
}

/// One immutable record of an administrative action against a committed
/// price.
#[derive(Debug, Clone, Serialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub action: AuditAction,
    pub changes: Vec<FieldDiff>,
    pub note: Option<String>,
    pub admin: String,
    pub at: DateTime<Utc>,
}

impl AuditLogEntry {
    pub fn new(
        action: AuditAction,
        changes: Vec<FieldDiff>,
        note: Option<String>,
        admin: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            changes,
            note,
            admin: admin.into(),
            at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_diff_stringifies_values() {
        let diff = FieldDiff::new("price", 250, 290.4);
        assert_eq!(diff.field, "price");
        assert_eq!(diff.before, "250");
        assert_eq!(diff.after, "290.4");
    }

    #[test]
    fn test_entries_get_distinct_ids() {
        let a = AuditLogEntry::new(AuditAction::Reprice, vec![], None, "ops@movequote");
        let b = AuditLogEntry::new(AuditAction::Reprice, vec![], None, "ops@movequote");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_action_serializes_uppercase() {
        let json = serde_json::to_string(&AuditAction::Cancel).unwrap();
        assert_eq!(json, r#""CANCEL""#);
    }
}
