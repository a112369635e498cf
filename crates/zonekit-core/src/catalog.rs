//! Cache of selectable sensors and lights.

use indexmap::IndexSet;

use zonekit_model::{Domain, EntityEntry, EntityId, ZoneField};

/// Area restriction applied when fetching the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AreaFilter {
    /// No restriction
    #[default]
    All,
    /// Entities assigned to one area
    Area(String),
}

impl AreaFilter {
    /// Interprets an area id, treating the empty string as "all areas".
    pub fn from_id(id: &str) -> Self {
        let id = id.trim();
        if id.is_empty() {
            AreaFilter::All
        } else {
            AreaFilter::Area(id.to_string())
        }
    }

    /// Returns the id to send to the service, `None` for all areas.
    pub fn area_id(&self) -> Option<&str> {
        match self {
            AreaFilter::All => None,
            AreaFilter::Area(id) => Some(id),
        }
    }
}

/// Selectable entities for the current area filter.
///
/// The catalog is rebuilt wholesale whenever the filter changes and is never
/// edited in place.
#[derive(Debug, Clone, Default)]
pub struct EntityCatalog {
    filter: AreaFilter,
    sensors: IndexSet<EntityId>,
    lights: IndexSet<EntityId>,
}

impl EntityCatalog {
    /// Creates an empty, unfiltered catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from a service listing. Other domains are ignored.
    pub fn from_entries(
        filter: AreaFilter,
        entries: impl IntoIterator<Item = EntityEntry>,
    ) -> Self {
        let mut sensors = IndexSet::new();
        let mut lights = IndexSet::new();

        for entry in entries {
            match entry.domain {
                Domain::Sensor => {
                    sensors.insert(entry.entity_id);
                }
                Domain::Light => {
                    lights.insert(entry.entity_id);
                }
                Domain::Other => {}
            }
        }

        Self {
            filter,
            sensors,
            lights,
        }
    }

    /// Returns the filter this catalog was built for.
    pub fn filter(&self) -> &AreaFilter {
        &self.filter
    }

    /// Returns the selectable sensors.
    pub fn sensors(&self) -> &IndexSet<EntityId> {
        &self.sensors
    }

    /// Returns the selectable lights.
    pub fn lights(&self) -> &IndexSet<EntityId> {
        &self.lights
    }

    /// Returns the options offered for a zone field.
    pub fn options_for(&self, field: ZoneField) -> &IndexSet<EntityId> {
        match field {
            ZoneField::ZoneKey | ZoneField::Neighbors | ZoneField::FarNeighbors => &self.sensors,
            ZoneField::NeighborGroups | ZoneField::LightGroup => &self.lights,
        }
    }

    /// Returns true if `value` may be chosen for `field`: empty or listed.
    pub fn is_selectable(&self, field: ZoneField, value: &str) -> bool {
        value.is_empty() || self.options_for(field).contains(value)
    }

    /// Returns the total number of entities.
    pub fn len(&self) -> usize {
        self.sensors.len() + self.lights.len()
    }

    /// Returns true if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty() && self.lights.is_empty()
    }
}
