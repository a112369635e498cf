//! # zonekit Model
//!
//! Plain data types shared by the draft engine, the service contract and the
//! local backend.
//!
//! ## Key Concepts
//!
//! ### Parallel Lists
//! - A zone's neighbor relations live in three vectors indexed together
//! - [`PairedList`] is the only type allowed to reorder them
//! - Lengths may drift while editing and are repaired by `normalize_length`
//!
//! ### Open Wire Enums
//! - [`ErrorCode`] and [`FieldTag`] are closed sets with an `Other` escape
//! - Unknown values coming from the service survive a round trip untouched

mod pairs;
mod report;
mod wire;
mod zone;

pub use pairs::{Normalized, PairColumn, PairRow, PairedList};
pub use report::{ErrorCode, FieldTag, ValidationError};
pub use wire::{Area, Domain, EntityEntry, SaveOutcome, SpaceData, SpaceSummary};
pub use zone::{ZoneDraft, ZoneField};

/// Opaque entity identifier such as `sensor.kitchen_motion`.
///
/// The empty string is the "nothing chosen yet" placeholder.
pub type EntityId = String;

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while parsing or encoding model values
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Unknown pair column: {0}")]
    UnknownColumn(String),

    #[error("Unknown zone field: {0}")]
    UnknownField(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
