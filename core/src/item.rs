//! The Item entity and its identifier.
//!
//! An [`Item`] is the only resource the service manages. Its `id` and
//! `created_at` are assigned by the persistence gateway when the item is
//! created and never change afterwards; `name` and `description` are the only
//! mutable fields.
//!
//! # JSON shape
//!
//! ```json
//! {
//!   "_id": "0b6f0e6e-8d0c-4a52-9a0e-3f5c1f2d7a10",
//!   "name": "Notebook",
//!   "description": "A5, dotted",
//!   "createdAt": "2025-01-01T00:00:00Z"
//! }
//! ```

use crate::gateway::GatewayError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque, store-assigned identifier of an [`Item`].
///
/// Identifiers are random UUIDs in their hyphenated text form. Whether a piece
/// of text *could* be an identifier is decided by [`ItemId::is_well_formed`],
/// without consulting the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    /// Generate a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID (e.g. one read back from the database).
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Returns `true` if `raw` is in the identifier syntax.
    #[must_use]
    pub fn is_well_formed(raw: &str) -> bool {
        // Only the canonical 36-char hyphenated form, so "simple" and
        // braced UUID spellings do not alias the same item.
        raw.len() == 36 && Uuid::try_parse(raw).is_ok()
    }

    /// Parse an identifier from its text form.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MalformedId`] if `raw` is not well formed.
    pub fn parse(raw: &str) -> Result<Self, GatewayError> {
        if !Self::is_well_formed(raw) {
            return Err(GatewayError::MalformedId(raw.to_string()));
        }
        Uuid::try_parse(raw)
            .map(Self)
            .map_err(|_| GatewayError::MalformedId(raw.to_string()))
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for ItemId {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A stored item, as returned by the persistence gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Store-assigned identifier.
    #[serde(rename = "_id", alias = "id")]
    pub id: ItemId,
    /// Display name, never empty.
    pub name: String,
    /// Free text, empty when not provided.
    #[serde(default)]
    pub description: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Item {
    /// Apply a partial update, leaving absent fields untouched.
    ///
    /// `id` and `created_at` are never touched.
    pub fn apply(&mut self, patch: &ItemPatch) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
    }
}

/// Normalized fields for a new item (output of create validation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    /// Trimmed, non-empty name.
    pub name: String,
    /// Trimmed description (empty if none was given).
    pub description: String,
}

impl NewItem {
    /// Build a new item payload.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Normalized partial update (output of update validation).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPatch {
    /// New name, if it should change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description, if it should change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ItemPatch {
    /// Returns `true` if the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample() -> Item {
        Item {
            id: ItemId::parse("0b6f0e6e-8d0c-4a52-9a0e-3f5c1f2d7a10").unwrap(),
            name: "Notebook".to_string(),
            description: "A5, dotted".to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_id_syntax_predicate() {
        assert!(ItemId::is_well_formed("0b6f0e6e-8d0c-4a52-9a0e-3f5c1f2d7a10"));
        assert!(ItemId::is_well_formed(&ItemId::generate().to_string()));
        assert!(!ItemId::is_well_formed("invalid-id"));
        assert!(!ItemId::is_well_formed(""));
        assert!(!ItemId::is_well_formed("0b6f0e6e8d0c4a529a0e3f5c1f2d7a10"));
        assert!(!ItemId::is_well_formed("507f1f77bcf86cd799439011"));
    }

    #[test]
    fn test_parse_malformed_id() {
        let err = ItemId::parse("invalid-id").unwrap_err();
        assert!(matches!(err, GatewayError::MalformedId(ref raw) if raw == "invalid-id"));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        let id = ItemId::generate();
        assert_eq!(id.to_string().parse::<ItemId>().unwrap(), id);
    }

    #[test]
    fn test_item_json_shape() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            value,
            json!({
                "_id": "0b6f0e6e-8d0c-4a52-9a0e-3f5c1f2d7a10",
                "name": "Notebook",
                "description": "A5, dotted",
                "createdAt": "2025-01-01T00:00:00Z",
            })
        );
    }

    #[test]
    fn test_item_accepts_plain_id_field() {
        let item: Item = serde_json::from_value(json!({
            "id": "0b6f0e6e-8d0c-4a52-9a0e-3f5c1f2d7a10",
            "name": "Notebook",
            "createdAt": "2025-01-01T00:00:00Z",
        }))
        .unwrap();
        assert_eq!(item.description, "");
        assert_eq!(item.id, sample().id);
    }

    #[test]
    fn test_apply_patch_keeps_absent_fields() {
        let mut item = sample();
        item.apply(&ItemPatch {
            name: Some("Renamed".to_string()),
            description: None,
        });
        assert_eq!(item.name, "Renamed");
        assert_eq!(item.description, "A5, dotted");
        assert_eq!(item.id, sample().id);
        assert_eq!(item.created_at, sample().created_at);
    }

    #[test]
    fn test_empty_patch() {
        assert!(ItemPatch::default().is_empty());
        assert!(!ItemPatch {
            name: None,
            description: Some(String::new()),
        }
        .is_empty());
    }
}
