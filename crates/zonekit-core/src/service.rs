//! Contract of the remote configuration service.
//!
//! ## Learning: `async-trait` and Trait Objects
//!
//! Native `async fn` in traits is not object safe, and the controller needs
//! `Arc<dyn ZoneService>` so hosts can inject any transport. `#[async_trait]`
//! boxes the returned futures, which makes the trait usable behind `dyn`.

use async_trait::async_trait;

use zonekit_model::{Area, Domain, EntityEntry, SaveOutcome, SpaceData, SpaceSummary};

/// Result type for service calls
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Domains requested for the entity catalog unless configured otherwise.
pub const DEFAULT_DOMAINS: [Domain; 2] = [Domain::Sensor, Domain::Light];

/// Failures reported by a service implementation.
///
/// Structural validation problems are not errors here; they come back as a
/// [`SaveOutcome`] with `ok: false`.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Request rejected ({code}): {message}")]
    Rejected { code: String, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ServiceError {
    /// Creates a rejection with a machine-readable code.
    pub fn rejected(code: impl Into<String>, message: impl Into<String>) -> Self {
        ServiceError::Rejected {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Request/response operations the editor consumes.
///
/// Each call resolves exactly once, to a response or an error.
#[async_trait]
pub trait ZoneService: Send + Sync {
    /// Lists all spaces with their zone counts.
    async fn list_spaces(&self) -> ServiceResult<Vec<SpaceSummary>>;

    /// Returns the stored configuration of a space.
    async fn get_space(&self, space: &str) -> ServiceResult<SpaceData>;

    /// Creates an empty space.
    async fn create_space(&self, space: &str) -> ServiceResult<()>;

    /// Deletes a space.
    async fn delete_space(&self, space: &str) -> ServiceResult<()>;

    /// Validates and stores a whole space.
    async fn save_space(&self, space: &str, data: &SpaceData) -> ServiceResult<SaveOutcome>;

    /// Lists the areas usable as catalog filters.
    async fn list_areas(&self) -> ServiceResult<Vec<Area>>;

    /// Lists entities of `domains`, restricted to `area_id` when given.
    async fn entities_for_area(
        &self,
        area_id: Option<&str>,
        domains: &[Domain],
    ) -> ServiceResult<Vec<EntityEntry>>;
}

#[cfg(test)]
pub(crate) mod mock {
    //! In-memory service used by the controller tests.

    use super::*;
    use indexmap::IndexMap;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockState {
        spaces: IndexMap<String, SpaceData>,
        entities: Vec<EntityEntry>,
        failing: HashSet<&'static str>,
        save_outcome: Option<SaveOutcome>,
        saved: Vec<(String, SpaceData)>,
    }

    /// Service double with scripted failures.
    #[derive(Default)]
    pub struct MockService {
        state: Mutex<MockState>,
    }

    impl MockService {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_space(self, name: &str, data: SpaceData) -> Self {
            self.state.lock().unwrap().spaces.insert(name.to_string(), data);
            self
        }

        pub fn with_entities(self, ids: &[&str]) -> Self {
            let entities = ids.iter().map(|id| EntityEntry::new(*id)).collect();
            self.state.lock().unwrap().entities = entities;
            self
        }

        pub fn fail(&self, operation: &'static str) {
            self.state.lock().unwrap().failing.insert(operation);
        }

        pub fn recover(&self, operation: &'static str) {
            self.state.lock().unwrap().failing.remove(operation);
        }

        pub fn respond_to_save(&self, outcome: SaveOutcome) {
            self.state.lock().unwrap().save_outcome = Some(outcome);
        }

        pub fn saved(&self) -> Vec<(String, SpaceData)> {
            self.state.lock().unwrap().saved.clone()
        }

        fn check(&self, operation: &'static str) -> ServiceResult<()> {
            if self.state.lock().unwrap().failing.contains(operation) {
                return Err(ServiceError::Transport(format!("{operation} unavailable")));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ZoneService for MockService {
        async fn list_spaces(&self) -> ServiceResult<Vec<SpaceSummary>> {
            self.check("list_spaces")?;
            let state = self.state.lock().unwrap();
            Ok(state
                .spaces
                .iter()
                .map(|(name, data)| SpaceSummary {
                    name: name.clone(),
                    zones_count: data.zones.len(),
                })
                .collect())
        }

        async fn get_space(&self, space: &str) -> ServiceResult<SpaceData> {
            self.check("get_space")?;
            self.state
                .lock()
                .unwrap()
                .spaces
                .get(space)
                .cloned()
                .ok_or_else(|| ServiceError::rejected("space_not_found", space))
        }

        async fn create_space(&self, space: &str) -> ServiceResult<()> {
            self.check("create_space")?;
            let mut state = self.state.lock().unwrap();
            if state.spaces.contains_key(space) {
                return Err(ServiceError::rejected("space_exists", space));
            }
            state.spaces.insert(space.to_string(), SpaceData::default());
            Ok(())
        }

        async fn delete_space(&self, space: &str) -> ServiceResult<()> {
            self.check("delete_space")?;
            self.state
                .lock()
                .unwrap()
                .spaces
                .shift_remove(space)
                .map(|_| ())
                .ok_or_else(|| ServiceError::rejected("space_not_found", space))
        }

        async fn save_space(&self, space: &str, data: &SpaceData) -> ServiceResult<SaveOutcome> {
            self.check("save_space")?;
            let mut state = self.state.lock().unwrap();
            state.saved.push((space.to_string(), data.clone()));
            if let Some(outcome) = state.save_outcome.clone() {
                return Ok(outcome);
            }
            state.spaces.insert(space.to_string(), data.clone());
            Ok(SaveOutcome::accepted())
        }

        async fn list_areas(&self) -> ServiceResult<Vec<Area>> {
            self.check("list_areas")?;
            Ok(vec![Area {
                id: "kitchen".to_string(),
                name: "Kitchen".to_string(),
            }])
        }

        async fn entities_for_area(
            &self,
            _area_id: Option<&str>,
            domains: &[Domain],
        ) -> ServiceResult<Vec<EntityEntry>> {
            self.check("entities_for_area")?;
            Ok(self
                .state
                .lock()
                .unwrap()
                .entities
                .iter()
                .filter(|entry| domains.contains(&entry.domain))
                .cloned()
                .collect())
        }
    }
}
