//! Lookup structure over a service error report.
//!
//! Rendering asks two questions per zone, many times per frame: "does this
//! field have an error?" and "does this pair row have an error?". The index
//! answers both with a hash lookup instead of scanning the flat list.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use zonekit_model::{ErrorCode, FieldTag, ValidationError};

#[derive(Debug, Clone, Default)]
struct ZoneErrors {
    fields: HashSet<FieldTag>,
    rows: HashSet<usize>,
}

/// Errors from the last failed operation, indexed by zone, field and row.
#[derive(Debug, Clone, Default)]
pub struct ValidationErrorIndex {
    errors: Vec<ValidationError>,
    zones: HashMap<String, ZoneErrors>,
}

impl ValidationErrorIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index over `errors`, keeping their order for display.
    pub fn build(errors: Vec<ValidationError>) -> Self {
        let mut index = Self::new();
        for error in errors {
            index.push(error);
        }
        index
    }

    /// Appends one error, keeping those already indexed.
    pub fn push(&mut self, error: ValidationError) {
        let entry = self.zones.entry(error.zone.clone()).or_default();
        entry.fields.insert(error.field.clone());
        if let Some(index) = error.index {
            entry.rows.insert(index);
        }
        self.errors.push(error);
    }

    /// Returns true if `field` of `zone` has an error.
    pub fn has_error(&self, zone: &str, field: impl Into<FieldTag>) -> bool {
        let field = field.into();
        self.zones
            .get(zone)
            .is_some_and(|errors| errors.fields.contains(&field))
    }

    /// Returns true if pair row `index` of `zone` has an error in any column.
    pub fn has_row_error(&self, zone: &str, index: usize) -> bool {
        self.zones
            .get(zone)
            .is_some_and(|errors| errors.rows.contains(&index))
    }

    /// Returns true if `zone` has any error.
    pub fn has_zone_error(&self, zone: &str) -> bool {
        self.zones.contains_key(zone)
    }

    /// Iterates over the errors attached to `zone`.
    pub fn for_zone<'a>(&'a self, zone: &'a str) -> impl Iterator<Item = &'a ValidationError> + 'a {
        self.errors.iter().filter(move |error| error.zone == zone)
    }

    /// Returns all errors in report order.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Returns the number of errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns true if there are no errors.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Removes all errors.
    pub fn clear(&mut self) {
        self.errors.clear();
        self.zones.clear();
    }

    /// Returns one display line per error.
    pub fn describe_all(&self) -> Vec<String> {
        self.errors.iter().map(describe).collect()
    }
}

/// Returns the human-readable reason for an error.
pub fn reason(error: &ValidationError) -> Cow<'_, str> {
    let fixed = match error.code {
        ErrorCode::SelfReference => "Zone key cannot appear in this list",
        ErrorCode::Duplicate => "Duplicate value in list",
        ErrorCode::LengthMismatch => "List length must match neighbors length",
        ErrorCode::Exists => "A zone with this key already exists",
        ErrorCode::CreateFailed => "Failed to create space",
        ErrorCode::DeleteFailed => "Failed to delete space",
        ErrorCode::LoadFailed => "Failed to load space",
        ErrorCode::EntitiesFailed => "Failed to load entities",
        ErrorCode::SaveFailed => "Failed to save (service error)",
        ErrorCode::RefreshFailed => "Failed to refresh",
        ErrorCode::ValidationFailed => "Validation failed",
        ErrorCode::Other(_) => {
            return match error.text.as_deref() {
                Some(text) if !text.is_empty() => Cow::Borrowed(text),
                _ => Cow::Borrowed("Error"),
            };
        }
    };
    Cow::Borrowed(fixed)
}

/// Formats an error as `zone -> field[index]: reason`.
pub fn describe(error: &ValidationError) -> String {
    let mut line = String::new();
    if !error.zone.is_empty() {
        line.push_str(&error.zone);
        line.push_str(" -> ");
    }
    line.push_str(error.field.label());
    if let Some(index) = error.index {
        line.push_str(&format!("[{index}]"));
    }
    line.push_str(": ");
    line.push_str(&reason(error));

    if error.code == ErrorCode::LengthMismatch {
        let show = |value: Option<usize>| value.map_or_else(|| "?".to_string(), |v| v.to_string());
        line.push_str(&format!(
            " (expected {}, actual {})",
            show(error.expected),
            show(error.actual)
        ));
    }

    line
}
