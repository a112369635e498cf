//! The on-disk store document.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use zonekit_model::{Area, EntityId, PairColumn, PairedList, SpaceData, ZoneDraft};

use crate::StoreResult;

/// Format version written to new files.
pub const DATA_VERSION: &str = "v0.1";

/// An entity the store offers for selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntity {
    pub entity_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_id: Option<String>,
}

/// Everything the store file holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDocument {
    pub version: String,
    #[serde(default)]
    pub spaces: IndexMap<String, SpaceData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub areas: Vec<Area>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<StoredEntity>,
}

impl Default for StoreDocument {
    fn default() -> Self {
        Self {
            version: DATA_VERSION.to_string(),
            spaces: IndexMap::new(),
            areas: Vec::new(),
            entities: Vec::new(),
        }
    }
}

impl StoreDocument {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a document from arbitrary JSON, dropping what does not fit.
    pub fn from_value(raw: Value) -> Self {
        let Value::Object(root) = raw else {
            tracing::warn!("Invalid store root, starting empty");
            return Self::new();
        };

        let version = root
            .get("version")
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
            .unwrap_or(DATA_VERSION)
            .to_string();

        let mut spaces = IndexMap::new();
        if let Some(Value::Object(raw_spaces)) = root.get("spaces") {
            for (name, space) in raw_spaces {
                if name.trim().is_empty() {
                    continue;
                }
                spaces.insert(name.clone(), space_from_value(space));
            }
        }

        let areas = array(root.get("areas"))
            .filter_map(|area| {
                Some(Area {
                    id: area.get("id")?.as_str()?.to_string(),
                    name: area.get("name")?.as_str()?.to_string(),
                })
            })
            .collect();

        let entities = array(root.get("entities"))
            .filter_map(|entity| {
                let entity_id = entity.get("entity_id")?.as_str()?.trim();
                if entity_id.is_empty() {
                    return None;
                }
                Some(StoredEntity {
                    entity_id: entity_id.to_string(),
                    name: string_field(entity, "name"),
                    area_id: string_field(entity, "area_id"),
                })
            })
            .collect();

        Self {
            version,
            spaces,
            areas,
            entities,
        }
    }

    /// Reads a document. Returns `None` if the file is missing or unreadable.
    pub async fn read(path: &Path) -> Option<Self> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::error!("Failed to read store file {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(raw) => Some(Self::from_value(raw)),
            Err(e) => {
                tracing::warn!("Store file {} is not valid JSON: {}", path.display(), e);
                None
            }
        }
    }

    /// Writes the document, keeping a backup of the previous file.
    pub async fn write(&self, path: &Path) -> StoreResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        if tokio::fs::try_exists(path).await.unwrap_or(false) {
            let backup = backup_path(path);
            match tokio::fs::copy(path, &backup).await {
                Ok(_) => tracing::debug!("Backup created: {}", backup.display()),
                Err(e) => tracing::warn!("Failed to back up {}: {}", path.display(), e),
            }
        }

        let content = serde_json::to_string_pretty(self)?;

        // Write to a temporary file first, then rename (atomic write)
        let temp_path = temp_path(path);
        let mut file = tokio::fs::File::create(&temp_path).await?;
        file.write_all(content.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        if let Err(e) = tokio::fs::rename(&temp_path, path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }
}

/// Returns `<path>.bak`.
pub(crate) fn backup_path(path: &Path) -> PathBuf {
    with_suffix(path, ".bak")
}

/// Returns `<path>.tmp`, which never equals `path`.
fn temp_path(path: &Path) -> PathBuf {
    with_suffix(path, ".tmp")
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Drops blank values from every list of every zone, and zones with blank keys.
pub(crate) fn strip_blanks(data: &SpaceData) -> SpaceData {
    let zones = data
        .zones
        .iter()
        .filter(|(key, _)| !key.trim().is_empty())
        .map(|(key, zone)| {
            let pairs = zone.pairs();
            let column = |c: PairColumn| clean(pairs.column(c).iter().map(String::as_str));
            let stripped = ZoneDraft::from_parts(
                PairedList::from_columns(
                    column(PairColumn::Neighbors),
                    column(PairColumn::FarNeighbors),
                    column(PairColumn::NeighborGroups),
                ),
                clean(zone.light_group().iter().map(String::as_str)),
            );
            (key.clone(), stripped)
        })
        .collect();

    SpaceData { zones }
}

fn space_from_value(raw: &Value) -> SpaceData {
    let mut zones = IndexMap::new();
    if let Some(Value::Object(raw_zones)) = raw.get("zones") {
        for (key, zone) in raw_zones {
            if key.trim().is_empty() {
                continue;
            }
            let list = |field: &str| clean(array(zone.get(field)).filter_map(Value::as_str));
            let draft = ZoneDraft::from_parts(
                PairedList::from_columns(
                    list("neighbors"),
                    list("far_neighbors"),
                    list("neighbor_groups"),
                ),
                list("light_group"),
            );
            zones.insert(key.clone(), draft);
        }
    }
    SpaceData { zones }
}

fn clean<'a>(values: impl Iterator<Item = &'a str>) -> Vec<EntityId> {
    values
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
        .collect()
}

fn array(value: Option<&Value>) -> impl Iterator<Item = &Value> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn string_field(value: &Value, field: &str) -> Option<String> {
    value
        .get(field)
        .and_then(Value::as_str)
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}
