//! Payload validation for item writes.
//!
//! Validation is a pure function from a raw JSON payload and a [`Mode`] to
//! either normalized fields or an ordered list of field errors:
//!
//! ```text
//! (serde_json::Value, Mode) ──► Ok(Normalized)          trimmed strings
//!                          └──► Err(ValidationErrors)   [{ path, msg }, ...]
//! ```
//!
//! Only `name` and `description` are looked at. Everything else in the
//! payload (including `_id` and `createdAt`) is ignored, so those fields can
//! never be written through the API.
//!
//! # Example
//!
//! ```
//! use items_core::validation::{validate_create, validate_update};
//! use serde_json::json;
//!
//! let new_item = validate_create(&json!({ "name": "  Lamp " })).unwrap();
//! assert_eq!(new_item.name, "Lamp");
//! assert_eq!(new_item.description, "");
//!
//! let errors = validate_update(&json!({ "name": "" })).unwrap_err();
//! assert_eq!(errors.first().msg, "Name cannot be empty");
//! ```

use crate::item::{ItemPatch, NewItem};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Field path of the item name.
pub const NAME: &str = "name";
/// Field path of the item description.
pub const DESCRIPTION: &str = "description";

/// Message when `name` is missing or blank on create.
pub const NAME_REQUIRED: &str = "Name is required";
/// Message when `name` is blank on update.
pub const NAME_EMPTY: &str = "Name cannot be empty";
/// Message when `name` is not a string.
pub const NAME_NOT_STRING: &str = "Name must be a string";
/// Message when `description` is not a string.
pub const DESCRIPTION_NOT_STRING: &str = "Description must be a string";

/// Which write operation a payload is validated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// All required fields must be present.
    Create,
    /// Every field is optional; present fields must be valid.
    Update,
}

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Name of the offending field.
    pub path: String,
    /// Human-readable message.
    pub msg: String,
}

impl FieldError {
    fn new(path: &str, msg: &str) -> Self {
        Self {
            path: path.to_string(),
            msg: msg.to_string(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.msg)
    }
}

/// Non-empty, ordered list of field errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// The first error (there is always at least one).
    #[must_use]
    #[allow(clippy::indexing_slicing)]
    pub fn first(&self) -> &FieldError {
        &self.0[0]
    }

    /// All errors, in field order.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Consume into the underlying list.
    #[must_use]
    pub fn into_inner(self) -> Vec<FieldError> {
        self.0
    }

    /// Returns `true` if any error refers to `path`.
    #[must_use]
    pub fn has_path(&self, path: &str) -> bool {
        self.0.iter().any(|e| e.path == path)
    }
}

/// Output of a successful validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// Fields for a new item.
    Create(NewItem),
    /// Fields to change on an existing item.
    Update(ItemPatch),
}

/// Validate `payload` for the given operation.
///
/// A payload that is not a JSON object is treated as an empty object.
///
/// # Errors
///
/// Returns every violated rule, `name` first.
pub fn validate(payload: &Value, mode: Mode) -> Result<Normalized, ValidationErrors> {
    match mode {
        Mode::Create => validate_create(payload).map(Normalized::Create),
        Mode::Update => validate_update(payload).map(Normalized::Update),
    }
}

/// Validate a create payload.
///
/// # Errors
///
/// Returns [`ValidationErrors`] if `name` is missing, blank or not a string,
/// or if `description` is present but not a string.
pub fn validate_create(payload: &Value) -> Result<NewItem, ValidationErrors> {
    let fields = fields(payload);
    let mut errors = Vec::new();

    let name = match text_field(fields, NAME) {
        Field::Text(name) if !name.is_empty() => Some(name),
        Field::Absent | Field::Text(_) => {
            errors.push(FieldError::new(NAME, NAME_REQUIRED));
            None
        }
        Field::NotText => {
            errors.push(FieldError::new(NAME, NAME_NOT_STRING));
            None
        }
    };

    let description = match text_field(fields, DESCRIPTION) {
        Field::Text(description) => Some(description),
        Field::Absent => Some(String::new()),
        Field::NotText => {
            errors.push(FieldError::new(DESCRIPTION, DESCRIPTION_NOT_STRING));
            None
        }
    };

    match (name, description) {
        (Some(name), Some(description)) if errors.is_empty() => Ok(NewItem { name, description }),
        _ => Err(ValidationErrors(errors)),
    }
}

/// Validate an update payload.
///
/// # Errors
///
/// Returns [`ValidationErrors`] if a present `name` is blank or not a string,
/// or if a present `description` is not a string.
pub fn validate_update(payload: &Value) -> Result<ItemPatch, ValidationErrors> {
    let fields = fields(payload);
    let mut errors = Vec::new();
    let mut patch = ItemPatch::default();

    match text_field(fields, NAME) {
        Field::Absent => {}
        Field::Text(name) if name.is_empty() => errors.push(FieldError::new(NAME, NAME_EMPTY)),
        Field::Text(name) => patch.name = Some(name),
        Field::NotText => errors.push(FieldError::new(NAME, NAME_NOT_STRING)),
    }

    match text_field(fields, DESCRIPTION) {
        Field::Absent => {}
        Field::Text(description) => patch.description = Some(description),
        Field::NotText => errors.push(FieldError::new(DESCRIPTION, DESCRIPTION_NOT_STRING)),
    }

    if errors.is_empty() {
        Ok(patch)
    } else {
        Err(ValidationErrors(errors))
    }
}

/// Shape of one payload field after trimming.
enum Field {
    Absent,
    Text(String),
    NotText,
}

fn fields(payload: &Value) -> Option<&Map<String, Value>> {
    payload.as_object()
}

// `null` counts as absent.
fn text_field(fields: Option<&Map<String, Value>>, key: &str) -> Field {
    match fields.and_then(|f| f.get(key)) {
        None | Some(Value::Null) => Field::Absent,
        Some(Value::String(s)) => Field::Text(s.trim().to_string()),
        Some(_) => Field::NotText,
    }
}
