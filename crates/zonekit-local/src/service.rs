//! [`ZoneService`] over the store document.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use zonekit_core::{ServiceError, ServiceResult, ZoneService};
use zonekit_model::{Area, Domain, EntityEntry, SaveOutcome, SpaceData, SpaceSummary};

use crate::StoreResult;
use crate::document::{StoreDocument, strip_blanks};
use crate::validate::validate_space;

/// Zone service backed by a JSON file.
///
/// Access to the file is serialized by an async mutex. Every change is
/// written to disk before it becomes visible in memory.
pub struct LocalService {
    path: PathBuf,
    document: Mutex<StoreDocument>,
}

impl LocalService {
    /// Opens the store at `path`, creating it if it is missing or invalid.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        tracing::info!("Loading store from {}", path.display());

        let document = match StoreDocument::read(&path).await {
            Some(document) => {
                tracing::info!("Loaded store: spaces={}", document.spaces.len());
                document
            }
            None => {
                tracing::warn!("Store not found or invalid, creating {}", path.display());
                let document = StoreDocument::new();
                document.write(&path).await?;
                document
            }
        };

        Ok(Self {
            path,
            document: Mutex::new(document),
        })
    }

    /// Returns the store file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns a copy of the in-memory document.
    pub async fn document(&self) -> StoreDocument {
        self.document.lock().await.clone()
    }

    /// Re-reads the file, replacing the in-memory document.
    pub async fn reload(&self) -> StoreResult<()> {
        tracing::info!("Reload requested");
        let mut document = self.document.lock().await;
        *document = match StoreDocument::read(&self.path).await {
            Some(loaded) => loaded,
            None => {
                let empty = StoreDocument::new();
                empty.write(&self.path).await?;
                empty
            }
        };
        Ok(())
    }

    /// Applies `change` to a copy of the document, writes it, then commits.
    async fn update<T>(
        &self,
        change: impl FnOnce(&mut StoreDocument) -> ServiceResult<T>,
    ) -> ServiceResult<T> {
        let mut document = self.document.lock().await;
        let mut next = document.clone();
        let value = change(&mut next)?;
        next.write(&self.path).await?;
        *document = next;
        Ok(value)
    }
}

#[async_trait]
impl ZoneService for LocalService {
    async fn list_spaces(&self) -> ServiceResult<Vec<SpaceSummary>> {
        let document = self.document.lock().await;
        let mut spaces: Vec<_> = document
            .spaces
            .iter()
            .map(|(name, data)| SpaceSummary {
                name: name.clone(),
                zones_count: data.zones.len(),
            })
            .collect();
        spaces.sort_by_key(|space| space.name.to_lowercase());
        Ok(spaces)
    }

    async fn get_space(&self, space: &str) -> ServiceResult<SpaceData> {
        tracing::debug!(space, "get_space");
        self.document
            .lock()
            .await
            .spaces
            .get(space)
            .cloned()
            .ok_or_else(|| not_found(space))
    }

    async fn create_space(&self, space: &str) -> ServiceResult<()> {
        let space = space.trim();
        tracing::info!(space, "create_space");
        if space.is_empty() {
            return Err(ServiceError::rejected("invalid_name", "Space name is empty"));
        }

        self.update(|document| {
            if document.spaces.contains_key(space) {
                return Err(ServiceError::rejected(
                    "space_exists",
                    format!("Space '{space}' already exists"),
                ));
            }
            document.spaces.insert(space.to_string(), SpaceData::default());
            Ok(())
        })
        .await
    }

    async fn delete_space(&self, space: &str) -> ServiceResult<()> {
        let space = space.trim();
        tracing::info!(space, "delete_space");

        self.update(|document| {
            document
                .spaces
                .shift_remove(space)
                .map(|_| ())
                .ok_or_else(|| not_found(space))
        })
        .await
    }

    async fn save_space(&self, space: &str, data: &SpaceData) -> ServiceResult<SaveOutcome> {
        let space = space.trim();
        tracing::info!(space, "save_space");

        let data = strip_blanks(data);
        let errors = validate_space(&data);
        if !errors.is_empty() {
            tracing::warn!(space, errors = errors.len(), "validation failed");
            return Ok(SaveOutcome::rejected(errors));
        }

        self.update(|document| {
            tracing::debug!(space, zones = data.zones.len(), "space stored");
            document.spaces.insert(space.to_string(), data);
            Ok(())
        })
        .await?;
        Ok(SaveOutcome::accepted())
    }

    async fn list_areas(&self) -> ServiceResult<Vec<Area>> {
        let mut areas = self.document.lock().await.areas.clone();
        areas.sort_by_key(|area| area.name.to_lowercase());
        Ok(areas)
    }

    async fn entities_for_area(
        &self,
        area_id: Option<&str>,
        domains: &[Domain],
    ) -> ServiceResult<Vec<EntityEntry>> {
        tracing::debug!(?area_id, ?domains, "entities_for_area");
        let area_id = area_id.filter(|id| !id.is_empty());

        let document = self.document.lock().await;
        let mut entities: Vec<_> = document
            .entities
            .iter()
            .filter(|entity| area_id.is_none() || entity.area_id.as_deref() == area_id)
            .map(|entity| EntityEntry {
                name: Some(entity.name.clone().unwrap_or_else(|| entity.entity_id.clone())),
                ..EntityEntry::new(entity.entity_id.clone())
            })
            .filter(|entry| domains.contains(&entry.domain))
            .collect();

        entities.sort_by(|a, b| {
            (a.domain.as_str(), a.display_name().to_lowercase(), &a.entity_id).cmp(&(
                b.domain.as_str(),
                b.display_name().to_lowercase(),
                &b.entity_id,
            ))
        });
        Ok(entities)
    }
}

fn not_found(space: &str) -> ServiceError {
    ServiceError::rejected("space_not_found", format!("Space '{space}' not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::backup_path;
    use std::sync::Arc;
    use zonekit_core::{DraftCommand, SaveStatus, SyncController};
    use zonekit_model::{ErrorCode, PairColumn, PairedList, ZoneDraft, ZoneField};

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn zone(neighbors: &[&str], far: &[&str], groups: &[&str]) -> ZoneDraft {
        ZoneDraft::from_parts(
            PairedList::from_columns(strings(neighbors), strings(far), strings(groups)),
            strings(&["light.own"]),
        )
    }

    async fn open() -> (tempfile::TempDir, LocalService) {
        let dir = tempfile::tempdir().unwrap();
        let service = LocalService::open(dir.path().join("zones.json")).await.unwrap();
        (dir, service)
    }

    fn code(err: ServiceError) -> String {
        match err {
            ServiceError::Rejected { code, .. } => code,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_open_creates_file() {
        let (_dir, service) = open().await;
        assert!(service.path().exists());
        assert!(service.list_spaces().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_replaces_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zones.json");
        std::fs::write(&path, "garbage").unwrap();

        let service = LocalService::open(&path).await.unwrap();
        assert!(service.list_spaces().await.unwrap().is_empty());
        assert_eq!(std::fs::read_to_string(backup_path(&path)).unwrap(), "garbage");
    }

    #[tokio::test]
    async fn test_space_lifecycle() {
        let (_dir, service) = open().await;

        service.create_space(" beta ").await.unwrap();
        service.create_space("Alpha").await.unwrap();
        service.create_space("gamma").await.unwrap();
        assert_eq!(code(service.create_space("beta").await.unwrap_err()), "space_exists");

        let names: Vec<_> = service
            .list_spaces()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, ["Alpha", "beta", "gamma"]);

        service.delete_space("beta").await.unwrap();
        assert_eq!(code(service.delete_space("beta").await.unwrap_err()), "space_not_found");
        assert_eq!(code(service.get_space("beta").await.unwrap_err()), "space_not_found");
    }

    #[tokio::test]
    async fn test_rejected_save_persists_nothing() {
        let (_dir, service) = open().await;
        service.create_space("home").await.unwrap();

        let mut data = SpaceData::default();
        data.zones.insert("sensor.a".to_string(), zone(&["sensor.a"], &["sensor.b"], &["light.a"]));

        let outcome = service.save_space("home", &data).await.unwrap();
        assert!(!outcome.ok);
        let errors = outcome.errors.unwrap();
        assert_eq!(errors[0].code, ErrorCode::SelfReference);
        assert_eq!(errors[0].index, Some(0));

        assert!(service.get_space("home").await.unwrap().zones.is_empty());
        let reopened = LocalService::open(service.path()).await.unwrap();
        assert!(reopened.get_space("home").await.unwrap().zones.is_empty());
    }

    #[tokio::test]
    async fn test_blank_placeholders_are_stripped_before_validation() {
        let (_dir, service) = open().await;

        let mut data = SpaceData::default();
        data.zones.insert("sensor.a".to_string(), zone(&["sensor.b"], &[""], &["light.a"]));

        let errors = service.save_space("home", &data).await.unwrap().errors.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::LengthMismatch);
        assert_eq!((errors[0].expected, errors[0].actual), (Some(1), Some(0)));
    }

    #[tokio::test]
    async fn test_accepted_save_survives_reopen() {
        let (_dir, service) = open().await;

        let mut data = SpaceData::default();
        data.zones.insert("sensor.a".to_string(), zone(&["sensor.b"], &["sensor.c"], &["light.a"]));
        assert!(service.save_space("home", &data).await.unwrap().ok);

        let reopened = LocalService::open(service.path()).await.unwrap();
        assert_eq!(reopened.get_space("home").await.unwrap(), data);
        assert_eq!(reopened.list_spaces().await.unwrap()[0].zones_count, 1);
    }

    #[tokio::test]
    async fn test_reload_picks_up_external_changes() {
        let (_dir, service) = open().await;
        service.create_space("home").await.unwrap();

        let mut outside = service.document().await;
        outside.spaces.shift_remove("home");
        outside.spaces.insert("garage".to_string(), SpaceData::default());
        outside.write(service.path()).await.unwrap();
        assert!(service.get_space("garage").await.is_err());

        service.reload().await.unwrap();
        let names: Vec<_> = service
            .list_spaces()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, ["garage"]);
        assert!(service.document().await.spaces.contains_key("garage"));

        std::fs::write(service.path(), "not json").unwrap();
        service.reload().await.unwrap();
        assert!(service.list_spaces().await.unwrap().is_empty());
        assert!(StoreDocument::read(service.path()).await.is_some());
    }

    #[tokio::test]
    async fn test_entities_filtered_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zones.json");
        std::fs::write(
            &path,
            r#"{
                "version": "v0.1",
                "spaces": {},
                "areas": [{ "id": "b", "name": "bedroom" }, { "id": "k", "name": "Kitchen" }],
                "entities": [
                    { "entity_id": "sensor.z", "name": "alpha", "area_id": "k" },
                    { "entity_id": "light.a", "area_id": "k" },
                    { "entity_id": "sensor.b", "name": "Beta", "area_id": "b" },
                    { "entity_id": "switch.fan", "area_id": "k" }
                ]
            }"#,
        )
        .unwrap();
        let service = LocalService::open(&path).await.unwrap();

        let areas: Vec<_> = service
            .list_areas()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(areas, ["b", "k"]);

        let all = service
            .entities_for_area(None, &[Domain::Sensor, Domain::Light])
            .await
            .unwrap();
        let ids: Vec<_> = all.iter().map(|e| e.entity_id.as_str()).collect();
        assert_eq!(ids, ["light.a", "sensor.z", "sensor.b"]);
        assert_eq!(all[0].display_name(), "light.a");

        let kitchen = service
            .entities_for_area(Some("k"), &[Domain::Sensor])
            .await
            .unwrap();
        assert_eq!(kitchen.len(), 1);
        assert_eq!(kitchen[0].entity_id, "sensor.z");
    }

    #[tokio::test]
    async fn test_controller_round_trip() {
        let (_dir, service) = open().await;
        let service = Arc::new(service);
        let mut controller = SyncController::new(service.clone());

        controller.create_space("home").await.unwrap();
        for command in [
            DraftCommand::AddZone {
                key: "sensor.a".to_string(),
            },
            DraftCommand::InsertPair {
                zone: "sensor.a".to_string(),
                at: None,
            },
            DraftCommand::SetPairValue {
                zone: "sensor.a".to_string(),
                index: 0,
                column: PairColumn::Neighbors,
                value: "sensor.a".to_string(),
            },
            DraftCommand::SetPairValue {
                zone: "sensor.a".to_string(),
                index: 0,
                column: PairColumn::FarNeighbors,
                value: "sensor.c".to_string(),
            },
            DraftCommand::SetPairValue {
                zone: "sensor.a".to_string(),
                index: 0,
                column: PairColumn::NeighborGroups,
                value: "light.b".to_string(),
            },
        ] {
            controller.apply(command).unwrap();
        }

        assert_eq!(controller.save_space().await.unwrap(), SaveStatus::Rejected(1));
        assert!(controller.errors().has_row_error("sensor.a", 0));
        assert!(controller.errors().has_error("sensor.a", ZoneField::Neighbors));

        controller
            .apply(DraftCommand::SetPairValue {
                zone: "sensor.a".to_string(),
                index: 0,
                column: PairColumn::Neighbors,
                value: "sensor.b".to_string(),
            })
            .unwrap();
        assert!(controller.errors().is_empty());
        assert_eq!(controller.save_space().await.unwrap(), SaveStatus::Saved);

        let stored = service.get_space("home").await.unwrap();
        assert_eq!(
            stored.zones["sensor.a"].pairs().column(PairColumn::Neighbors),
            ["sensor.b"]
        );
    }
}
