//! # zonekit Core
//!
//! Draft-state management and validation correlation for lighting-zone
//! spaces edited against a remote configuration service.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     SyncController                       │
//! │  ┌──────────────┐ ┌──────────────┐ ┌──────────────────┐  │
//! │  │ ZoneService  │ │ EntityCatalog│ │     EventBus     │  │
//! │  └──────────────┘ └──────────────┘ └──────────────────┘  │
//! │         │                                                │
//! │  ┌──────┴───────────────────────────────────┐            │
//! │  │             SpaceDraftStore              │            │
//! │  │  ┌─────────┐ ┌─────────┐ ┌────────────┐  │            │
//! │  │  │ Zone 1  │ │ Zone 2  │ │ ErrorIndex │  │            │
//! │  │  └─────────┘ └─────────┘ └────────────┘  │            │
//! │  └──────────────────────────────────────────┘            │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Learning: Commands In, Events Out
//!
//! The only way to change a draft is a [`DraftCommand`]. The only way to
//! hear about a change is a [`SyncEvent`]. Hosts never poke at the store
//! directly, which keeps the dirty flag and error index honest.

pub mod catalog;
pub mod command;
pub mod config;
pub mod draft;
pub mod event;
pub mod service;
pub mod sync;
pub mod validation;

pub use catalog::{AreaFilter, EntityCatalog};
pub use command::DraftCommand;
pub use config::Config;
pub use draft::{DraftError, DraftResult, SpaceDraftStore, ZoneChange};
pub use event::{EventBus, EventHandler, SyncEvent};
pub use service::{ServiceError, ServiceResult, ZoneService};
pub use sync::{LoadRequest, LoadStatus, PendingLoad, SaveStatus, SyncController, SyncState};
pub use validation::ValidationErrorIndex;

pub use zonekit_model as model;

use zonekit_model::{ErrorCode, FieldTag, ValidationError};

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("No space selected")]
    NoSpaceSelected,

    #[error("Space name is empty")]
    EmptySpaceName,

    #[error("Failed to load space '{space}': {source}")]
    LoadFailed {
        space: String,
        #[source]
        source: ServiceError,
    },

    #[error("Failed to refresh space '{space}': {source}")]
    RefreshFailed {
        space: String,
        #[source]
        source: ServiceError,
    },

    #[error("Failed to save space '{space}': {source}")]
    SaveFailed {
        space: String,
        #[source]
        source: ServiceError,
    },

    #[error("Failed to create space '{space}': {source}")]
    CreateFailed {
        space: String,
        #[source]
        source: ServiceError,
    },

    #[error("Failed to delete space '{space}': {source}")]
    DeleteFailed {
        space: String,
        #[source]
        source: ServiceError,
    },

    #[error("Failed to load entities: {0}")]
    EntitiesFailed(#[source] ServiceError),

    #[error("Failed to load areas: {0}")]
    AreasFailed(#[source] ServiceError),

    #[error("Failed to load spaces: {0}")]
    SpacesFailed(#[source] ServiceError),

    #[error(transparent)]
    Draft(#[from] DraftError),
}

impl CoreError {
    /// Returns the error in the shape the error index displays.
    ///
    /// Local usage errors (no selection, empty name) have no report.
    pub fn to_report(&self) -> Option<ValidationError> {
        let (field, code, text) = match self {
            CoreError::NoSpaceSelected | CoreError::EmptySpaceName => return None,
            CoreError::Draft(err) => return Some(err.to_report()),
            CoreError::LoadFailed { .. } => {
                (FieldTag::Space, ErrorCode::LoadFailed, "Failed to load space")
            }
            CoreError::RefreshFailed { .. } => {
                (FieldTag::Refresh, ErrorCode::RefreshFailed, "Failed to refresh")
            }
            CoreError::SaveFailed { .. } => {
                (FieldTag::Save, ErrorCode::SaveFailed, "Failed to save")
            }
            CoreError::CreateFailed { .. } => {
                (FieldTag::Space, ErrorCode::CreateFailed, "Failed to create space")
            }
            CoreError::DeleteFailed { .. } => {
                (FieldTag::Space, ErrorCode::DeleteFailed, "Failed to delete space")
            }
            CoreError::EntitiesFailed(_) => {
                (FieldTag::Filter, ErrorCode::EntitiesFailed, "Failed to load entities")
            }
            CoreError::AreasFailed(_) => (
                FieldTag::Filter,
                ErrorCode::Other("areas_failed".to_string()),
                "Failed to load areas",
            ),
            CoreError::SpacesFailed(_) => (
                FieldTag::Space,
                ErrorCode::Other("spaces_failed".to_string()),
                "Failed to load spaces",
            ),
        };
        Some(ValidationError::space_level(field, code, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_errors_are_tagged() {
        let err = CoreError::SaveFailed {
            space: "home".to_string(),
            source: ServiceError::Transport("closed".to_string()),
        };
        let report = err.to_report().unwrap();

        assert_eq!(report.code, ErrorCode::SaveFailed);
        assert_eq!(report.field, FieldTag::Save);
        assert!(report.is_space_level());
    }

    #[test]
    fn test_usage_errors_have_no_report() {
        assert!(CoreError::NoSpaceSelected.to_report().is_none());
    }
}
