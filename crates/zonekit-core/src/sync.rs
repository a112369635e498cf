//! Orchestration of service calls around the open draft.
//!
//! ## Learning: Generations Instead of Cancellation
//!
//! A load can still be in flight when the user selects another space. We
//! cannot cancel the request, so each load captures the space name and a
//! generation number. [`SyncController::finish_load`] drops any response
//! whose capture no longer matches the controller. `deselect` and every new
//! load bump the generation.
//!
//! The split `begin_load` / [`LoadRequest::fetch`] / `finish_load` API exists
//! for hosts that keep handling input while a request is pending.
//! [`SyncController::load_space`] runs the three steps back to back.

use std::sync::Arc;

use zonekit_model::{
    Area, Domain, ErrorCode, FieldTag, Normalized, SpaceData, SpaceSummary, ValidationError,
};

use crate::catalog::{AreaFilter, EntityCatalog};
use crate::command::DraftCommand;
use crate::draft::SpaceDraftStore;
use crate::event::{EventBus, SyncEvent};
use crate::service::{DEFAULT_DOMAINS, ServiceResult, ZoneService};
use crate::validation::ValidationErrorIndex;
use crate::{CoreError, CoreResult};

/// What the controller is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Idle,
    Loading,
    Saving,
    Refreshing,
    Creating,
    Deleting,
    FetchingCatalog,
}

/// Result of applying a load response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// The draft was replaced
    Loaded,
    /// The response belonged to an outdated request
    Discarded,
}

/// Result of a save the service answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Saved,
    /// Rejected with this many validation errors
    Rejected(usize),
}

/// A load that has been started but not yet sent.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    space: String,
    generation: u64,
    refresh: bool,
}

impl LoadRequest {
    /// Returns the requested space.
    pub fn space(&self) -> &str {
        &self.space
    }

    /// Sends the request.
    pub async fn fetch(self, service: &dyn ZoneService) -> PendingLoad {
        tracing::debug!(space = %self.space, generation = self.generation, "fetching space");
        let result = service.get_space(&self.space).await;
        PendingLoad {
            request: self,
            result,
        }
    }
}

/// A load response waiting to be applied.
#[derive(Debug)]
pub struct PendingLoad {
    request: LoadRequest,
    result: ServiceResult<SpaceData>,
}

impl PendingLoad {
    /// Returns the requested space.
    pub fn space(&self) -> &str {
        &self.request.space
    }
}

/// Owns the open draft and reconciles it with the service.
pub struct SyncController {
    service: Arc<dyn ZoneService>,
    events: EventBus,
    domains: Vec<Domain>,
    default_filter: AreaFilter,

    state: SyncState,
    generation: u64,
    selected: Option<String>,
    draft: Option<SpaceDraftStore>,

    /// Errors reported while no space is open
    detached_errors: ValidationErrorIndex,

    spaces: Vec<SpaceSummary>,
    areas: Vec<Area>,
    catalog: EntityCatalog,
}

impl SyncController {
    /// Creates a controller with nothing selected.
    pub fn new(service: Arc<dyn ZoneService>) -> Self {
        Self {
            service,
            events: EventBus::new(),
            domains: DEFAULT_DOMAINS.to_vec(),
            default_filter: AreaFilter::All,
            state: SyncState::Idle,
            generation: 0,
            selected: None,
            draft: None,
            detached_errors: ValidationErrorIndex::new(),
            spaces: Vec::new(),
            areas: Vec::new(),
            catalog: EntityCatalog::new(),
        }
    }

    /// Sets the domains requested for the catalog.
    pub fn with_domains(mut self, domains: Vec<Domain>) -> Self {
        self.domains = domains;
        self
    }

    /// Sets the filter used by [`initial_load`](Self::initial_load).
    pub fn with_default_filter(mut self, filter: AreaFilter) -> Self {
        self.default_filter = filter;
        self
    }

    // ==================== Getters ====================

    /// Subscribes to controller events.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Returns the current state.
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Returns true while a service call is outstanding.
    pub fn is_busy(&self) -> bool {
        self.state != SyncState::Idle
    }

    /// Returns the selected space name.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Returns the open draft.
    pub fn draft(&self) -> Option<&SpaceDraftStore> {
        self.draft.as_ref()
    }

    /// Returns the last fetched space summaries.
    pub fn spaces(&self) -> &[SpaceSummary] {
        &self.spaces
    }

    /// Returns the last fetched areas.
    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    /// Returns the entity catalog.
    pub fn catalog(&self) -> &EntityCatalog {
        &self.catalog
    }

    /// Returns the errors to display: the draft's, or the detached ones.
    pub fn errors(&self) -> &ValidationErrorIndex {
        match &self.draft {
            Some(draft) => draft.errors(),
            None => &self.detached_errors,
        }
    }

    // ==================== Loading ====================

    /// Selects `space` and returns the request to fetch it.
    pub fn begin_load(&mut self, space: impl Into<String>) -> CoreResult<LoadRequest> {
        let space = space.into();
        if space.trim().is_empty() {
            return Err(CoreError::EmptySpaceName);
        }
        Ok(self.begin(space, false))
    }

    fn begin(&mut self, space: String, refresh: bool) -> LoadRequest {
        self.generation += 1;
        self.selected = Some(space.clone());
        self.state = if refresh {
            SyncState::Refreshing
        } else {
            SyncState::Loading
        };

        LoadRequest {
            space,
            generation: self.generation,
            refresh,
        }
    }

    /// Applies a load response if it still matches the selection.
    ///
    /// On failure the open draft is kept and the selection reverts to it.
    pub fn finish_load(&mut self, pending: PendingLoad) -> CoreResult<LoadStatus> {
        let PendingLoad { request, result } = pending;

        let still_selected = self.selected.as_deref() == Some(request.space.as_str());
        if request.generation != self.generation || !still_selected {
            tracing::debug!(
                space = %request.space,
                generation = request.generation,
                current = self.generation,
                "discarding stale load response"
            );
            self.events.emit(SyncEvent::StaleResponseDiscarded(request.space));
            return Ok(LoadStatus::Discarded);
        }

        self.state = SyncState::Idle;
        match result {
            Ok(data) => {
                tracing::info!(space = %request.space, zones = data.zones.len(), "space loaded");
                self.draft = Some(SpaceDraftStore::from_snapshot(request.space.clone(), data));
                self.detached_errors.clear();
                self.events.emit(SyncEvent::SpaceLoaded(request.space));
                Ok(LoadStatus::Loaded)
            }
            Err(source) => {
                self.selected = self.draft.as_ref().map(|draft| draft.name().to_string());
                let space = request.space;
                let err = if request.refresh {
                    CoreError::RefreshFailed { space, source }
                } else {
                    CoreError::LoadFailed { space, source }
                };
                self.record(&err);
                Err(err)
            }
        }
    }

    /// Selects and loads a space, replacing the draft.
    pub async fn load_space(&mut self, space: impl Into<String>) -> CoreResult<LoadStatus> {
        let request = self.begin_load(space)?;
        self.run_load(request).await
    }

    /// Reloads the selected space, discarding unsaved edits.
    pub async fn refresh(&mut self) -> CoreResult<LoadStatus> {
        let space = self.selected.clone().ok_or(CoreError::NoSpaceSelected)?;
        let request = self.begin(space, true);
        self.run_load(request).await
    }

    async fn run_load(&mut self, request: LoadRequest) -> CoreResult<LoadStatus> {
        let service = Arc::clone(&self.service);
        let pending = request.fetch(service.as_ref()).await;
        self.finish_load(pending)
    }

    /// Drops the selection and the draft. Pending loads become stale.
    pub fn deselect(&mut self) {
        self.generation += 1;
        self.selected = None;
        self.draft = None;
        self.detached_errors.clear();
        self.state = SyncState::Idle;
        self.events.emit(SyncEvent::SelectionCleared);
    }

    // ==================== Editing ====================

    /// Applies an edit to the open draft.
    ///
    /// A rejected edit is returned and its error is added to the draft's
    /// report. Zones and the dirty flag stay as they were.
    pub fn apply(&mut self, command: DraftCommand) -> CoreResult<()> {
        let draft = self.draft.as_mut().ok_or(CoreError::NoSpaceSelected)?;
        if let Err(e) = draft.apply(command) {
            tracing::debug!(space = %draft.name(), "edit rejected: {}", e);
            draft.record_error(e.to_report());
            self.events.emit(SyncEvent::DraftChanged(draft.name().to_string()));
            return Err(e.into());
        }
        self.events.emit(SyncEvent::DraftChanged(draft.name().to_string()));
        Ok(())
    }

    /// Reports what saving would repair, without touching the draft.
    pub fn preview_normalization(&self) -> Option<Normalized> {
        self.draft.as_ref().map(|draft| draft.snapshot().normalize())
    }

    // ==================== Saving ====================

    /// Normalizes and sends the draft.
    ///
    /// A rejection is not an error: the report lands in the draft's error
    /// index and the draft stays as it is.
    pub async fn save_space(&mut self) -> CoreResult<SaveStatus> {
        let draft = self.draft.as_mut().ok_or(CoreError::NoSpaceSelected)?;
        let space = draft.name().to_string();
        let payload = draft.to_payload();

        tracing::debug!(space = %space, zones = payload.zones.len(), "saving space");
        self.state = SyncState::Saving;
        let result = self.service.save_space(&space, &payload).await;
        self.state = SyncState::Idle;

        match result {
            Ok(outcome) if outcome.ok => {
                if let Some(draft) = self.draft.as_mut() {
                    draft.mark_saved();
                }
                tracing::info!(space = %space, "space saved");
                self.events.emit(SyncEvent::SpaceSaved(space));
                self.refresh_summaries_quietly().await;
                Ok(SaveStatus::Saved)
            }
            Ok(outcome) => {
                let errors = match outcome.errors {
                    Some(errors) if !errors.is_empty() => errors,
                    _ => vec![ValidationError::space_level(
                        FieldTag::Save,
                        ErrorCode::ValidationFailed,
                        "Validation failed",
                    )],
                };
                let count = errors.len();
                tracing::warn!(space = %space, errors = count, "save rejected");
                self.set_errors(errors);
                self.events.emit(SyncEvent::SaveRejected { space, errors: count });
                Ok(SaveStatus::Rejected(count))
            }
            Err(source) => {
                let err = CoreError::SaveFailed { space, source };
                self.record(&err);
                Err(err)
            }
        }
    }

    // ==================== Space Management ====================

    /// Creates a space and opens it.
    pub async fn create_space(&mut self, space: &str) -> CoreResult<LoadStatus> {
        let space = space.trim();
        if space.is_empty() {
            return Err(CoreError::EmptySpaceName);
        }

        tracing::debug!(space, "creating space");
        self.state = SyncState::Creating;
        let result = self.service.create_space(space).await;
        self.state = SyncState::Idle;

        if let Err(source) = result {
            let err = CoreError::CreateFailed {
                space: space.to_string(),
                source,
            };
            self.record(&err);
            return Err(err);
        }

        tracing::info!(space, "space created");
        self.refresh_summaries_quietly().await;
        self.load_space(space).await
    }

    /// Deletes a space, closing it if it is open.
    pub async fn delete_space(&mut self, space: &str) -> CoreResult<()> {
        if space.trim().is_empty() {
            return Err(CoreError::EmptySpaceName);
        }

        tracing::debug!(space, "deleting space");
        self.state = SyncState::Deleting;
        let result = self.service.delete_space(space).await;
        self.state = SyncState::Idle;

        if let Err(source) = result {
            let err = CoreError::DeleteFailed {
                space: space.to_string(),
                source,
            };
            self.record(&err);
            return Err(err);
        }

        tracing::info!(space, "space deleted");
        if self.selected.as_deref() == Some(space) {
            self.deselect();
        }
        self.refresh_summaries_quietly().await;
        Ok(())
    }

    // ==================== Lists & Catalog ====================

    /// Fetches summaries, areas and the catalog for the default filter.
    ///
    /// All three are attempted; the first failure is returned.
    pub async fn initial_load(&mut self) -> CoreResult<()> {
        let spaces = self.reload_spaces().await;
        let areas = self.reload_areas().await;
        let filter = self.default_filter.clone();
        let catalog = self.set_area_filter(filter).await;
        spaces.and(areas).and(catalog)
    }

    /// Reloads the space summaries.
    pub async fn reload_spaces(&mut self) -> CoreResult<()> {
        self.fetch_summaries().await.map_err(|source| {
            let err = CoreError::SpacesFailed(source);
            self.record(&err);
            err
        })
    }

    async fn fetch_summaries(&mut self) -> ServiceResult<()> {
        self.state = SyncState::FetchingCatalog;
        let result = self.service.list_spaces().await;
        self.state = SyncState::Idle;

        self.spaces = result?;
        tracing::debug!(count = self.spaces.len(), "spaces listed");
        self.events.emit(SyncEvent::SpacesChanged);
        Ok(())
    }

    async fn refresh_summaries_quietly(&mut self) {
        if let Err(e) = self.fetch_summaries().await {
            tracing::warn!("Failed to refresh space list: {}", e);
        }
    }

    /// Reloads the area list.
    pub async fn reload_areas(&mut self) -> CoreResult<()> {
        self.state = SyncState::FetchingCatalog;
        let result = self.service.list_areas().await;
        self.state = SyncState::Idle;

        match result {
            Ok(areas) => {
                tracing::debug!(count = areas.len(), "areas listed");
                self.areas = areas;
                Ok(())
            }
            Err(source) => {
                let err = CoreError::AreasFailed(source);
                self.record(&err);
                Err(err)
            }
        }
    }

    /// Rebuilds the catalog for `filter`. On failure the old catalog stays.
    pub async fn set_area_filter(&mut self, filter: AreaFilter) -> CoreResult<()> {
        tracing::debug!(area = ?filter.area_id(), "fetching entities");
        self.state = SyncState::FetchingCatalog;
        let result = self
            .service
            .entities_for_area(filter.area_id(), &self.domains)
            .await;
        self.state = SyncState::Idle;

        match result {
            Ok(entries) => {
                self.catalog = EntityCatalog::from_entries(filter, entries);
                tracing::debug!(count = self.catalog.len(), "catalog rebuilt");
                self.events.emit(SyncEvent::CatalogChanged);
                Ok(())
            }
            Err(source) => {
                let err = CoreError::EntitiesFailed(source);
                self.record(&err);
                Err(err)
            }
        }
    }

    // ==================== Error Recording ====================

    fn set_errors(&mut self, errors: Vec<ValidationError>) {
        match self.draft.as_mut() {
            Some(draft) => draft.set_errors(errors),
            None => self.detached_errors = ValidationErrorIndex::build(errors),
        }
    }

    fn record(&mut self, err: &CoreError) {
        tracing::error!("{}", err);
        if let Some(report) = err.to_report() {
            self.events.emit(SyncEvent::OperationFailed(report.code.clone()));
            self.set_errors(vec![report]);
        }
    }
}

impl std::fmt::Debug for SyncController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncController")
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("selected", &self.selected)
            .field("draft", &self.draft.as_ref().map(|draft| draft.name()))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::mock::MockService;
    use zonekit_model::{PairColumn, PairedList, SaveOutcome, ZoneDraft, ZoneField};

    fn home() -> SpaceData {
        let mut data = SpaceData::default();
        data.zones.insert(
            "sensor.a".to_string(),
            ZoneDraft::from_parts(
                PairedList::from_columns(vec!["sensor.b".to_string()], vec![], vec![]),
                vec![],
            ),
        );
        data
    }

    fn setup() -> (Arc<MockService>, SyncController) {
        let mock = Arc::new(
            MockService::new()
                .with_space("home", home())
                .with_space("garage", SpaceData::default())
                .with_entities(&["sensor.a", "sensor.b", "light.a"]),
        );
        let controller = SyncController::new(mock.clone());
        (mock, controller)
    }

    fn edit() -> DraftCommand {
        DraftCommand::AddZone {
            key: "sensor.c".to_string(),
        }
    }

    #[tokio::test]
    async fn test_load_gives_clean_normalized_draft() {
        let (_, mut controller) = setup();
        let mut events = controller.subscribe();

        assert_eq!(controller.load_space("home").await.unwrap(), LoadStatus::Loaded);

        let draft = controller.draft().unwrap();
        assert!(!draft.is_dirty());
        assert!(controller.errors().is_empty());
        assert!(draft.zone("sensor.a").unwrap().pairs().is_aligned());
        assert_eq!(controller.selected(), Some("home"));
        assert!(!controller.is_busy());
        assert_eq!(events.recv().await.unwrap(), SyncEvent::SpaceLoaded("home".to_string()));
    }

    #[tokio::test]
    async fn test_stale_response_after_deselect() {
        let (mock, mut controller) = setup();

        let request = controller.begin_load("home").unwrap();
        assert!(controller.is_busy());
        controller.deselect();

        let pending = request.fetch(mock.as_ref()).await;
        assert_eq!(controller.finish_load(pending).unwrap(), LoadStatus::Discarded);
        assert!(controller.draft().is_none());
        assert_eq!(controller.selected(), None);
    }

    #[tokio::test]
    async fn test_stale_response_after_newer_load() {
        let (mock, mut controller) = setup();

        let first = controller.begin_load("home").unwrap();
        let second = controller.begin_load("garage").unwrap();

        let second = second.fetch(mock.as_ref()).await;
        let first = first.fetch(mock.as_ref()).await;

        assert_eq!(controller.finish_load(second).unwrap(), LoadStatus::Loaded);
        assert_eq!(controller.finish_load(first).unwrap(), LoadStatus::Discarded);
        assert_eq!(controller.draft().unwrap().name(), "garage");
    }

    #[tokio::test]
    async fn test_same_space_reload_is_still_stale() {
        let (mock, mut controller) = setup();

        let first = controller.begin_load("home").unwrap();
        let second = controller.begin_load("home").unwrap();
        let first = first.fetch(mock.as_ref()).await;

        assert_eq!(controller.finish_load(first).unwrap(), LoadStatus::Discarded);
        let second = second.fetch(mock.as_ref()).await;
        assert_eq!(controller.finish_load(second).unwrap(), LoadStatus::Loaded);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_open_draft() {
        let (mock, mut controller) = setup();
        controller.load_space("home").await.unwrap();
        controller.apply(edit()).unwrap();

        mock.fail("get_space");
        let err = controller.load_space("garage").await.unwrap_err();

        assert!(matches!(err, CoreError::LoadFailed { ref space, .. } if space == "garage"));
        let draft = controller.draft().unwrap();
        assert_eq!(draft.name(), "home");
        assert!(draft.is_dirty());
        assert!(draft.contains("sensor.c"));
        assert_eq!(controller.selected(), Some("home"));
        assert_eq!(controller.errors().errors()[0].code, ErrorCode::LoadFailed);
        assert!(!controller.is_busy());
    }

    #[tokio::test]
    async fn test_failed_refresh_is_tagged() {
        let (mock, mut controller) = setup();
        controller.load_space("home").await.unwrap();

        mock.fail("get_space");
        assert!(matches!(
            controller.refresh().await,
            Err(CoreError::RefreshFailed { .. })
        ));
        assert_eq!(controller.errors().errors()[0].field, FieldTag::Refresh);
    }

    #[tokio::test]
    async fn test_rejected_save_maps_errors_to_rows() {
        let (mock, mut controller) = setup();
        controller.load_space("home").await.unwrap();
        controller
            .apply(DraftCommand::SetPairValue {
                zone: "sensor.a".to_string(),
                index: 0,
                column: PairColumn::Neighbors,
                value: "sensor.a".to_string(),
            })
            .unwrap();
        let before = controller.draft().unwrap().zone("sensor.a").cloned();

        mock.respond_to_save(SaveOutcome::rejected(vec![
            ValidationError::new("sensor.a", PairColumn::Neighbors, ErrorCode::SelfReference).at(0),
        ]));
        let mut events = controller.subscribe();
        assert_eq!(controller.save_space().await.unwrap(), SaveStatus::Rejected(1));

        let errors = controller.errors();
        assert!(errors.has_row_error("sensor.a", 0));
        assert!(errors.has_error("sensor.a", ZoneField::Neighbors));

        let draft = controller.draft().unwrap();
        assert!(draft.is_dirty());
        assert_eq!(draft.zone("sensor.a").cloned(), before);
        assert_eq!(
            events.recv().await.unwrap(),
            SyncEvent::SaveRejected {
                space: "home".to_string(),
                errors: 1
            }
        );
    }

    #[tokio::test]
    async fn test_rejection_without_errors_is_generic() {
        let (mock, mut controller) = setup();
        controller.load_space("home").await.unwrap();
        mock.respond_to_save(SaveOutcome {
            ok: false,
            errors: None,
        });

        assert_eq!(controller.save_space().await.unwrap(), SaveStatus::Rejected(1));
        assert_eq!(controller.errors().errors()[0].code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn test_edit_after_rejection_clears_errors() {
        let (mock, mut controller) = setup();
        controller.load_space("home").await.unwrap();
        mock.respond_to_save(SaveOutcome::rejected(vec![
            ValidationError::new("sensor.a", PairColumn::Neighbors, ErrorCode::Duplicate).at(0),
        ]));
        controller.save_space().await.unwrap();
        assert_eq!(controller.errors().len(), 1);

        controller.apply(edit()).unwrap();
        assert!(controller.errors().is_empty());
    }

    #[tokio::test]
    async fn test_successful_save() {
        let (mock, mut controller) = setup();
        controller.load_space("home").await.unwrap();
        controller.apply(edit()).unwrap();
        controller
            .apply(DraftCommand::SetField {
                zone: "sensor.c".to_string(),
                field: ZoneField::Neighbors,
                values: vec!["sensor.a".to_string(), "sensor.b".to_string()],
            })
            .unwrap();

        assert_eq!(controller.save_space().await.unwrap(), SaveStatus::Saved);

        let draft = controller.draft().unwrap();
        assert!(!draft.is_dirty());
        assert!(!draft.has_changes());

        let saved = mock.saved();
        let (space, payload) = saved.last().unwrap();
        assert_eq!(space, "home");
        assert!(payload.zones["sensor.c"].pairs().is_aligned());

        let home = controller.spaces().iter().find(|s| s.name == "home").unwrap();
        assert_eq!(home.zones_count, 2);
    }

    #[tokio::test]
    async fn test_transport_failure_on_save_keeps_draft() {
        let (mock, mut controller) = setup();
        controller.load_space("home").await.unwrap();
        controller.apply(edit()).unwrap();

        mock.fail("save_space");
        assert!(matches!(
            controller.save_space().await,
            Err(CoreError::SaveFailed { .. })
        ));

        let draft = controller.draft().unwrap();
        assert!(draft.is_dirty());
        assert!(draft.contains("sensor.c"));
        assert_eq!(controller.errors().errors()[0].code, ErrorCode::SaveFailed);
    }

    #[tokio::test]
    async fn test_summary_failure_after_save_is_not_an_error() {
        let (mock, mut controller) = setup();
        controller.load_space("home").await.unwrap();
        controller.apply(edit()).unwrap();

        mock.fail("list_spaces");
        assert_eq!(controller.save_space().await.unwrap(), SaveStatus::Saved);
        assert!(controller.errors().is_empty());
    }

    #[tokio::test]
    async fn test_create_space_opens_it() {
        let (_, mut controller) = setup();

        controller.create_space("  attic ").await.unwrap();
        assert_eq!(controller.selected(), Some("attic"));
        assert!(controller.draft().unwrap().is_empty());
        assert!(controller.spaces().iter().any(|s| s.name == "attic"));

        assert!(matches!(
            controller.create_space("   ").await,
            Err(CoreError::EmptySpaceName)
        ));
    }

    #[tokio::test]
    async fn test_create_existing_space_fails() {
        let (_, mut controller) = setup();
        controller.load_space("home").await.unwrap();

        assert!(matches!(
            controller.create_space("garage").await,
            Err(CoreError::CreateFailed { .. })
        ));
        assert_eq!(controller.selected(), Some("home"));
        assert_eq!(controller.errors().errors()[0].code, ErrorCode::CreateFailed);
    }

    #[tokio::test]
    async fn test_delete_open_space_deselects() {
        let (_, mut controller) = setup();
        controller.load_space("home").await.unwrap();

        controller.delete_space("home").await.unwrap();
        assert_eq!(controller.selected(), None);
        assert!(controller.draft().is_none());
        assert!(controller.spaces().iter().all(|s| s.name != "home"));

        assert!(matches!(
            controller.delete_space("home").await,
            Err(CoreError::DeleteFailed { .. })
        ));
        assert_eq!(controller.errors().errors()[0].code, ErrorCode::DeleteFailed);
    }

    #[tokio::test]
    async fn test_initial_load_and_filter_failure() {
        let (mock, mut controller) = setup();
        controller.initial_load().await.unwrap();

        assert_eq!(controller.spaces().len(), 2);
        assert_eq!(controller.areas().len(), 1);
        assert_eq!(controller.catalog().sensors().len(), 2);
        assert_eq!(controller.catalog().lights().len(), 1);

        mock.fail("entities_for_area");
        assert!(matches!(
            controller.set_area_filter(AreaFilter::from_id("kitchen")).await,
            Err(CoreError::EntitiesFailed(_))
        ));
        assert_eq!(controller.catalog().filter(), &AreaFilter::All);
        assert_eq!(controller.catalog().len(), 3);
        assert_eq!(controller.errors().errors()[0].code, ErrorCode::EntitiesFailed);

        mock.recover("entities_for_area");
        controller.set_area_filter(AreaFilter::from_id("kitchen")).await.unwrap();
        assert_eq!(controller.catalog().filter().area_id(), Some("kitchen"));
    }

    #[tokio::test]
    async fn test_apply_without_space() {
        let (_, mut controller) = setup();
        assert!(matches!(
            controller.apply(edit()),
            Err(CoreError::NoSpaceSelected)
        ));
        assert!(matches!(
            controller.save_space().await,
            Err(CoreError::NoSpaceSelected)
        ));
    }

    #[tokio::test]
    async fn test_rejected_edit_is_recorded() {
        let (_, mut controller) = setup();
        controller.load_space("home").await.unwrap();
        let before = controller.draft().unwrap().snapshot();

        let err = controller
            .apply(DraftCommand::AddZone {
                key: "sensor.a".to_string(),
            })
            .unwrap_err();

        assert!(matches!(err, CoreError::Draft(_)));
        assert_eq!(err.to_report().unwrap().code, ErrorCode::Exists);
        assert!(controller.errors().has_error("sensor.a", ZoneField::ZoneKey));
        assert_eq!(controller.errors().len(), 1);

        let draft = controller.draft().unwrap();
        assert!(!draft.is_dirty());
        assert_eq!(draft.snapshot(), before);
    }

    #[tokio::test]
    async fn test_rejected_rename_is_shown_on_source_zone() {
        let (_, mut controller) = setup();
        controller.load_space("home").await.unwrap();
        controller
            .apply(DraftCommand::AddZone {
                key: "sensor.z".to_string(),
            })
            .unwrap();

        controller
            .apply(DraftCommand::RenameZone {
                from: "sensor.z".to_string(),
                to: "sensor.a".to_string(),
            })
            .unwrap_err();

        assert!(controller.errors().has_error("sensor.z", ZoneField::ZoneKey));
        assert!(!controller.errors().has_zone_error("sensor.a"));
        assert!(controller.draft().unwrap().zone("sensor.z").is_some());
    }

    #[tokio::test]
    async fn test_preview_normalization_reports_truncation() {
        let (_, mut controller) = setup();
        controller.load_space("home").await.unwrap();
        controller
            .apply(DraftCommand::SetField {
                zone: "sensor.a".to_string(),
                field: ZoneField::NeighborGroups,
                values: vec!["light.a".to_string(), "light.b".to_string()],
            })
            .unwrap();

        let preview = controller.preview_normalization().unwrap();
        assert_eq!(preview.dropped, 1);
        assert!(!controller.draft().unwrap().zone("sensor.a").unwrap().pairs().is_aligned());
    }
}
