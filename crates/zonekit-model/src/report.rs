//! Structured error reports exchanged with the service.
//!
//! ## Learning: `#[serde(from, into)]`
//!
//! The service speaks plain strings for codes and field tags. Converting
//! through `String` lets us match on enum variants in Rust while still
//! accepting values we have never seen before (`Other`).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pairs::PairColumn;
use crate::zone::ZoneField;

/// Reason code attached to a [`ValidationError`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorCode {
    SelfReference,
    Duplicate,
    LengthMismatch,
    Exists,
    CreateFailed,
    DeleteFailed,
    LoadFailed,
    EntitiesFailed,
    SaveFailed,
    RefreshFailed,
    ValidationFailed,
    /// Any code outside the known set
    Other(String),
}

impl ErrorCode {
    /// Returns the wire name of the code.
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::SelfReference => "self_reference",
            ErrorCode::Duplicate => "duplicate",
            ErrorCode::LengthMismatch => "length_mismatch",
            ErrorCode::Exists => "exists",
            ErrorCode::CreateFailed => "create_failed",
            ErrorCode::DeleteFailed => "delete_failed",
            ErrorCode::LoadFailed => "load_failed",
            ErrorCode::EntitiesFailed => "entities_failed",
            ErrorCode::SaveFailed => "save_failed",
            ErrorCode::RefreshFailed => "refresh_failed",
            ErrorCode::ValidationFailed => "validation_failed",
            ErrorCode::Other(code) => code,
        }
    }
}

impl From<&str> for ErrorCode {
    fn from(code: &str) -> Self {
        match code {
            "self_reference" => ErrorCode::SelfReference,
            "duplicate" => ErrorCode::Duplicate,
            "length_mismatch" => ErrorCode::LengthMismatch,
            "exists" => ErrorCode::Exists,
            "create_failed" => ErrorCode::CreateFailed,
            "delete_failed" => ErrorCode::DeleteFailed,
            "load_failed" => ErrorCode::LoadFailed,
            "entities_failed" => ErrorCode::EntitiesFailed,
            "save_failed" => ErrorCode::SaveFailed,
            "refresh_failed" => ErrorCode::RefreshFailed,
            "validation_failed" => ErrorCode::ValidationFailed,
            other => ErrorCode::Other(other.to_string()),
        }
    }
}

impl From<String> for ErrorCode {
    fn from(code: String) -> Self {
        ErrorCode::from(code.as_str())
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::Other(code) => code,
            known => known.as_str().to_string(),
        }
    }
}

impl Default for ErrorCode {
    fn default() -> Self {
        ErrorCode::Other(String::new())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The field an error points at. Zone fields plus space-level tags.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldTag {
    Zone(ZoneField),
    Space,
    Zones,
    Save,
    Refresh,
    Filter,
    Other(String),
}

impl FieldTag {
    /// Returns the wire name of the tag.
    pub fn as_str(&self) -> &str {
        match self {
            FieldTag::Zone(field) => field.as_str(),
            FieldTag::Space => "space",
            FieldTag::Zones => "zones",
            FieldTag::Save => "save",
            FieldTag::Refresh => "refresh",
            FieldTag::Filter => "filter",
            FieldTag::Other(tag) => tag,
        }
    }

    /// Returns a human-readable label.
    pub fn label(&self) -> &str {
        match self {
            FieldTag::Zone(ZoneField::ZoneKey) => "zone key",
            FieldTag::Zone(ZoneField::Neighbors) => "neighbors",
            FieldTag::Zone(ZoneField::FarNeighbors) => "far neighbors",
            FieldTag::Zone(ZoneField::NeighborGroups) => "neighbor light groups",
            FieldTag::Zone(ZoneField::LightGroup) => "light group",
            FieldTag::Space => "space",
            FieldTag::Zones => "zones",
            FieldTag::Save => "save",
            FieldTag::Refresh => "refresh",
            FieldTag::Filter => "area filter",
            FieldTag::Other(tag) => tag,
        }
    }
}

impl From<&str> for FieldTag {
    fn from(tag: &str) -> Self {
        match tag {
            "space" => FieldTag::Space,
            "zones" => FieldTag::Zones,
            "save" => FieldTag::Save,
            "refresh" => FieldTag::Refresh,
            "filter" => FieldTag::Filter,
            other => other
                .parse::<ZoneField>()
                .map(FieldTag::Zone)
                .unwrap_or_else(|_| FieldTag::Other(other.to_string())),
        }
    }
}

impl From<String> for FieldTag {
    fn from(tag: String) -> Self {
        FieldTag::from(tag.as_str())
    }
}

impl From<FieldTag> for String {
    fn from(tag: FieldTag) -> Self {
        match tag {
            FieldTag::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl From<ZoneField> for FieldTag {
    fn from(field: ZoneField) -> Self {
        FieldTag::Zone(field)
    }
}

impl From<PairColumn> for FieldTag {
    fn from(column: PairColumn) -> Self {
        FieldTag::Zone(column.into())
    }
}

impl Default for FieldTag {
    fn default() -> Self {
        FieldTag::Other(String::new())
    }
}

impl fmt::Display for FieldTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of an error report.
///
/// `zone` is empty for space-level errors. `index` is set for errors that
/// point at a single pair row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    #[serde(default)]
    pub zone: String,

    #[serde(default)]
    pub field: FieldTag,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,

    #[serde(default)]
    pub code: ErrorCode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<usize>,
}

impl ValidationError {
    /// Creates an error for a zone field.
    pub fn new(zone: impl Into<String>, field: impl Into<FieldTag>, code: ErrorCode) -> Self {
        Self {
            zone: zone.into(),
            field: field.into(),
            code,
            ..Self::default()
        }
    }

    /// Creates a space-level error.
    pub fn space_level(field: FieldTag, code: ErrorCode, text: impl Into<String>) -> Self {
        Self::new(String::new(), field, code).with_text(text)
    }

    /// Points the error at one pair row.
    pub fn at(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Attaches the raw message.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Attaches the expected and actual lengths of a mismatch.
    pub fn with_lengths(mut self, expected: usize, actual: usize) -> Self {
        self.expected = Some(expected);
        self.actual = Some(actual);
        self
    }

    /// Returns true if the error points at a pair row.
    pub fn is_row_error(&self) -> bool {
        self.index.is_some()
    }

    /// Returns true if the error is not tied to a zone.
    pub fn is_space_level(&self) -> bool {
        self.zone.is_empty()
    }
}
