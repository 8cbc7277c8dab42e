// crates/taryahan-core/src/core/validation.rs
// ============================================================================
// Module: Taryahan Validation
// Description: Field-keyed validation of untrusted JSON request bodies.
// Purpose: Normalize caller input and report every failing field at once.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Request bodies are untrusted JSON. A [`Payload`] walks one body, applies a
//! rule chain per field, and collects the first failing rule of every field
//! into [`FieldErrors`]. Schema failures are reported before any semantic
//! (cross-field) check runs; both surface as [`ValidationError`].
//!
//! Input normalization mirrors what the HTTP host historically did before
//! validation: strings are trimmed and empty strings count as absent.
//!
//! Message wording is resolved per `field.rule` key through a
//! [`MessageOverrides`] table, falling back to a generic sentence built from the
//! field's display name.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::core::records::ROSTER_SIZE;
use crate::core::records::Roster;
use crate::core::time::MatchDate;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Field key used when the body itself is not a JSON object.
pub const BODY_FIELD: &str = "body";

/// Largest integer accepted by integer fields.
pub const MAX_INTEGER: u32 = i32::MAX.unsigned_abs();

/// Custom messages keyed by `field.rule` (or `field.*.rule` for list items).
pub type MessageOverrides = &'static [(&'static str, &'static str)];

// ============================================================================
// SECTION: Field Errors
// ============================================================================

/// Field-keyed validation messages.
///
/// # Invariants
/// - Every key maps to at least one message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Creates an empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an error set holding one message.
    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    /// Appends a message for a field.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Returns true when no field has failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of failing fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the messages recorded for a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Returns true when the field has at least one message.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Iterates fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(field, messages)| (field.as_str(), messages.as_slice()))
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Validation failures reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Missing, malformed, or out-of-range input.
    #[error("schema validation failed for {} field(s)", .0.len())]
    Schema(FieldErrors),
    /// Well-formed input that breaks a cross-field invariant.
    #[error("semantic validation failed for {} field(s)", .0.len())]
    Semantic(FieldErrors),
}

impl ValidationError {
    /// Returns the field-keyed messages.
    #[must_use]
    pub const fn errors(&self) -> &FieldErrors {
        match self {
            Self::Schema(errors) | Self::Semantic(errors) => errors,
        }
    }

    /// Consumes the error and returns the field-keyed messages.
    #[must_use]
    pub fn into_errors(self) -> FieldErrors {
        match self {
            Self::Schema(errors) | Self::Semantic(errors) => errors,
        }
    }
}

// ============================================================================
// SECTION: Rules
// ============================================================================

/// A single validation rule, used to key and word failure messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Value must be present and non-empty.
    Required,
    /// Value must be a string.
    String,
    /// String length must not exceed the bound.
    Max(usize),
    /// Value must be an integer.
    Integer,
    /// Integer must be at least the bound.
    Min(u32),
    /// Integer must not exceed [`MAX_INTEGER`].
    IntegerRange,
    /// Value must be a calendar date.
    Date,
    /// Value must be an email address.
    Email,
    /// Value must be one of an enumerated set.
    In,
    /// Value must be an array.
    Array,
    /// Array must hold exactly the given number of items.
    Size(usize),
}

impl Rule {
    /// Returns the rule name used in override keys.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::String => "string",
            Self::Max(_) => "max",
            Self::Integer => "integer",
            Self::Min(_) | Self::IntegerRange => "min",
            Self::Date => "date",
            Self::Email => "email",
            Self::In => "in",
            Self::Array => "array",
            Self::Size(_) => "size",
        }
    }

    /// Builds the generic message for a field display name.
    fn generic_message(self, attribute: &str) -> String {
        match self {
            Self::Required => format!("The {attribute} field is required."),
            Self::String => format!("The {attribute} field must be a string."),
            Self::Max(max) => {
                format!("The {attribute} field must not be greater than {max} characters.")
            }
            Self::Integer => format!("The {attribute} field must be an integer."),
            Self::Min(min) => format!("The {attribute} field must be at least {min}."),
            Self::IntegerRange => {
                format!("The {attribute} field must not be greater than {MAX_INTEGER}.")
            }
            Self::Date => format!("The {attribute} field must be a valid date."),
            Self::Email => format!("The {attribute} field must be a valid email address."),
            Self::In => format!("The selected {attribute} is invalid."),
            Self::Array => format!("The {attribute} field must be an array."),
            Self::Size(size) => format!("The {attribute} field must contain {size} items."),
        }
    }
}

/// Resolves the message for a failing rule on a field.
fn resolve_message(overrides: MessageOverrides, field: &str, rule: Rule) -> String {
    let item_key = field
        .rsplit_once('.')
        .filter(|(_, index)| index.bytes().all(|b| b.is_ascii_digit()))
        .map(|(parent, _)| format!("{parent}.*.{}", rule.key()));
    let direct_key = format!("{field}.{}", rule.key());
    overrides
        .iter()
        .find(|(key, _)| *key == direct_key || item_key.as_deref() == Some(*key))
        .map_or_else(
            || rule.generic_message(&field.replace('_', " ")),
            |(_, message)| (*message).to_string(),
        )
}

// ============================================================================
// SECTION: Payload Reader
// ============================================================================

/// Rule-driven reader over one untrusted JSON body.
pub struct Payload<'a> {
    /// Object fields, or `None` when the body is not an object.
    object: Option<&'a Map<String, Value>>,
    /// Custom message table.
    overrides: MessageOverrides,
    /// Collected failures.
    errors: FieldErrors,
}

impl<'a> Payload<'a> {
    /// Starts reading a body. Non-object bodies fail immediately on `body`.
    #[must_use]
    pub fn new(body: &'a Value, overrides: MessageOverrides) -> Self {
        let mut errors = FieldErrors::new();
        let object = body.as_object();
        if object.is_none() {
            errors.push(BODY_FIELD, "The request body must be a JSON object.");
        }
        Self { object, overrides, errors }
    }

    /// Records a rule failure for a field.
    pub fn fail(&mut self, field: &str, rule: Rule) {
        let message = resolve_message(self.overrides, field, rule);
        self.errors.push(field, message);
    }

    /// Returns true when the body was not an object.
    fn body_rejected(&self) -> bool {
        self.object.is_none()
    }

    /// Returns the raw value for a field, treating null and blank text as absent.
    fn present(&self, field: &str) -> Option<&'a Value> {
        self.object?.get(field).filter(|value| !is_blank(value))
    }

    /// Reads a required string no longer than `max` characters.
    pub fn required_string(&mut self, field: &str, max: usize) -> Option<String> {
        if self.body_rejected() {
            return None;
        }
        let Some(value) = self.present(field) else {
            self.fail(field, Rule::Required);
            return None;
        };
        self.string_value(field, value, max)
    }

    /// Applies string and length rules to a present value.
    fn string_value(&mut self, field: &str, value: &Value, max: usize) -> Option<String> {
        let Some(text) = value.as_str() else {
            self.fail(field, Rule::String);
            return None;
        };
        let text = text.trim();
        if text.chars().count() > max {
            self.fail(field, Rule::Max(max));
            return None;
        }
        Some(text.to_string())
    }

    /// Reads a required integer in `min..=MAX_INTEGER`.
    pub fn required_integer(&mut self, field: &str, min: u32) -> Option<u32> {
        if self.body_rejected() {
            return None;
        }
        let Some(value) = self.present(field) else {
            self.fail(field, Rule::Required);
            return None;
        };
        let Some(number) = integer_value(value) else {
            self.fail(field, Rule::Integer);
            return None;
        };
        if number < i64::from(min) {
            self.fail(field, Rule::Min(min));
            return None;
        }
        if let Ok(number) = u32::try_from(number)
            && number <= MAX_INTEGER
        {
            return Some(number);
        }
        self.fail(field, Rule::IntegerRange);
        None
    }

    /// Reads a required calendar date.
    pub fn required_date(&mut self, field: &str) -> Option<MatchDate> {
        if self.body_rejected() {
            return None;
        }
        let Some(value) = self.present(field) else {
            self.fail(field, Rule::Required);
            return None;
        };
        let parsed = value.as_str().and_then(MatchDate::parse);
        if parsed.is_none() {
            self.fail(field, Rule::Date);
        }
        parsed
    }

    /// Reads a required email address no longer than `max` characters.
    pub fn required_email(&mut self, field: &str, max: usize) -> Option<String> {
        if self.body_rejected() {
            return None;
        }
        let Some(value) = self.present(field) else {
            self.fail(field, Rule::Required);
            return None;
        };
        let Some(text) = value.as_str().map(str::trim) else {
            self.fail(field, Rule::Email);
            return None;
        };
        if !is_valid_email(text) {
            self.fail(field, Rule::Email);
            return None;
        }
        if text.chars().count() > max {
            self.fail(field, Rule::Max(max));
            return None;
        }
        Some(text.to_string())
    }

    /// Reads a required value from an enumerated set.
    pub fn required_choice<T: DeserializeOwned>(&mut self, field: &str) -> Option<T> {
        if self.body_rejected() {
            return None;
        }
        if self.present(field).is_none() {
            self.fail(field, Rule::Required);
            return None;
        }
        self.optional_choice(field).flatten()
    }

    /// Reads an optional value from an enumerated set.
    ///
    /// Returns `Some(None)` when absent and `None` when present but invalid.
    pub fn optional_choice<T: DeserializeOwned>(&mut self, field: &str) -> Option<Option<T>> {
        let Some(value) = self.present(field) else {
            return Some(None);
        };
        let parsed = value
            .as_str()
            .and_then(|text| serde_json::from_value::<T>(Value::String(text.trim().to_string())).ok());
        if parsed.is_none() {
            self.fail(field, Rule::In);
            return None;
        }
        Some(parsed)
    }

    /// Reads a required roster of exactly [`ROSTER_SIZE`] player names.
    ///
    /// Item failures are keyed `field.<index>`.
    pub fn required_roster(&mut self, field: &str, max: usize) -> Option<Roster> {
        if self.body_rejected() {
            return None;
        }
        let Some(value) = self.present(field) else {
            self.fail(field, Rule::Required);
            return None;
        };
        let Some(items) = value.as_array() else {
            self.fail(field, Rule::Array);
            return None;
        };
        let sized = items.len() == ROSTER_SIZE;
        if !sized {
            self.fail(field, Rule::Size(ROSTER_SIZE));
        }
        let mut names = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let key = format!("{field}.{index}");
            if is_blank(item) {
                self.fail(&key, Rule::Required);
                continue;
            }
            if let Some(name) = self.string_value(&key, item, max) {
                names.push(name);
            }
        }
        if sized && names.len() == ROSTER_SIZE { Roster::try_from(names).ok() } else { None }
    }

    /// Returns true when no failure has been recorded yet.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Completes schema validation.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Schema`] when any field failed, or when
    /// `value` is missing without a recorded failure.
    pub fn finish<T>(self, value: Option<T>) -> Result<T, ValidationError> {
        match value {
            Some(value) if self.errors.is_empty() => Ok(value),
            _ if self.errors.is_empty() => Err(ValidationError::Schema(FieldErrors::single(
                BODY_FIELD,
                "The request body could not be validated.",
            ))),
            _ => Err(ValidationError::Schema(self.errors)),
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns true for values the host treats as absent.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Accepts JSON integers and integer strings.
fn integer_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Returns true when the text is a plausible `local@domain` address.
#[must_use]
pub fn is_valid_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }
    domain.split('.').all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_alphanumeric() || c == '-')
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
