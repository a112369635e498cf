//! Payloads exchanged with the configuration service.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::pairs::Normalized;
use crate::report::ValidationError;
use crate::zone::ZoneDraft;
use crate::{EntityId, ModelResult};

/// The stored configuration of one space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceData {
    #[serde(default)]
    pub zones: IndexMap<EntityId, ZoneDraft>,
}

impl SpaceData {
    /// Parses a space from JSON.
    pub fn from_json(json: &str) -> ModelResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encodes the space as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> ModelResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Normalizes the pair lists of every zone.
    pub fn normalize(&mut self) -> Normalized {
        let mut report = Normalized::default();
        for zone in self.zones.values_mut() {
            report += zone.pairs_mut().normalize_length();
        }
        report
    }
}

/// Entry of the spaces list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceSummary {
    pub name: String,
    #[serde(default)]
    pub zones_count: usize,
}

/// Response to a save request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOutcome {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ValidationError>>,
}

impl SaveOutcome {
    /// A save that was stored.
    pub fn accepted() -> Self {
        Self {
            ok: true,
            errors: None,
        }
    }

    /// A save that failed validation.
    pub fn rejected(errors: Vec<ValidationError>) -> Self {
        Self {
            ok: false,
            errors: Some(errors),
        }
    }
}

/// A named area used to filter the entity catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub id: String,
    pub name: String,
}

/// Entity domain as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Sensor,
    Light,
    #[serde(other)]
    Other,
}

impl Domain {
    /// Returns the wire name of the domain.
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Sensor => "sensor",
            Domain::Light => "light",
            Domain::Other => "other",
        }
    }

    /// Derives the domain from an id such as `light.kitchen`.
    pub fn of_entity(entity_id: &str) -> Self {
        match entity_id.split_once('.').map(|(domain, _)| domain) {
            Some("sensor") => Domain::Sensor,
            Some("light") => Domain::Light,
            _ => Domain::Other,
        }
    }
}

/// One selectable entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityEntry {
    pub entity_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub domain: Domain,
}

impl EntityEntry {
    /// Creates an entry, deriving the domain from the id.
    pub fn new(entity_id: impl Into<EntityId>) -> Self {
        let entity_id = entity_id.into();
        let domain = Domain::of_entity(&entity_id);
        Self {
            entity_id,
            name: None,
            domain,
        }
    }

    /// Returns the friendly name, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.entity_id)
    }
}
