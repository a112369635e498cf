//! # zonekit Local
//!
//! A [`ZoneService`](zonekit_core::ZoneService) that keeps every space in
//! one JSON file.
//!
//! ## Key Concepts
//!
//! ### Soft Loading
//! - A missing or unreadable file starts an empty store
//! - Malformed entries are dropped one by one, never the whole file
//!
//! ### Safe Writes
//! - The previous file is copied to `<path>.bak`
//! - New content goes to a temporary file that is renamed over the old one
//! - Memory is only updated after the write succeeded

mod document;
mod service;
mod validate;

pub use document::{DATA_VERSION, StoreDocument, StoredEntity};
pub use service::LocalService;
pub use validate::validate_space;

use zonekit_core::ServiceError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while reading or writing the store file
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        ServiceError::Other(err.into())
    }
}
