//! A single zone's editable record.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::pairs::{PairColumn, PairedList};
use crate::{EntityId, ModelError};

/// Editable fields of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneField {
    /// The zone's defining sensor (its key in the space)
    ZoneKey,
    Neighbors,
    FarNeighbors,
    NeighborGroups,
    /// The zone's own light group
    LightGroup,
}

impl ZoneField {
    /// Returns the wire name of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneField::ZoneKey => "zone_key",
            ZoneField::Neighbors => "neighbors",
            ZoneField::FarNeighbors => "far_neighbors",
            ZoneField::NeighborGroups => "neighbor_groups",
            ZoneField::LightGroup => "light_group",
        }
    }

    /// Returns the pair column backing this field, if any.
    pub fn pair_column(&self) -> Option<PairColumn> {
        match self {
            ZoneField::Neighbors => Some(PairColumn::Neighbors),
            ZoneField::FarNeighbors => Some(PairColumn::FarNeighbors),
            ZoneField::NeighborGroups => Some(PairColumn::NeighborGroups),
            ZoneField::ZoneKey | ZoneField::LightGroup => None,
        }
    }
}

impl From<PairColumn> for ZoneField {
    fn from(column: PairColumn) -> Self {
        match column {
            PairColumn::Neighbors => ZoneField::Neighbors,
            PairColumn::FarNeighbors => ZoneField::FarNeighbors,
            PairColumn::NeighborGroups => ZoneField::NeighborGroups,
        }
    }
}

impl fmt::Display for ZoneField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZoneField {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zone_key" => Ok(ZoneField::ZoneKey),
            "light_group" => Ok(ZoneField::LightGroup),
            other => other
                .parse::<PairColumn>()
                .map(ZoneField::from)
                .map_err(|_| ModelError::UnknownField(other.to_string())),
        }
    }
}

/// One zone of a space.
///
/// The zone key is not stored here; it is the key of the map that owns the
/// zone, so renaming never has to keep two copies in sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneDraft {
    #[serde(flatten)]
    pairs: PairedList,

    #[serde(default)]
    light_group: Vec<EntityId>,
}

impl ZoneDraft {
    /// Creates a zone with no neighbors and no light group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a zone from its parts.
    pub fn from_parts(pairs: PairedList, light_group: Vec<EntityId>) -> Self {
        Self { pairs, light_group }
    }

    /// Returns the neighbor rows.
    pub fn pairs(&self) -> &PairedList {
        &self.pairs
    }

    /// Returns the neighbor rows for editing.
    pub fn pairs_mut(&mut self) -> &mut PairedList {
        &mut self.pairs
    }

    /// Returns the zone's own light group.
    pub fn light_group(&self) -> &[EntityId] {
        &self.light_group
    }

    /// Replaces a list field wholesale.
    ///
    /// Returns false for [`ZoneField::ZoneKey`], which is not a list.
    pub fn set_field(&mut self, field: ZoneField, values: Vec<EntityId>) -> bool {
        match (field, field.pair_column()) {
            (ZoneField::LightGroup, _) => {
                self.light_group = values;
                true
            }
            (_, Some(column)) => {
                self.pairs.replace_column(column, values);
                true
            }
            (_, None) => false,
        }
    }

    /// Returns the rows where `key` is listed as its own neighbor or far neighbor.
    pub fn self_references<'a>(
        &'a self,
        key: &'a str,
    ) -> impl Iterator<Item = (PairColumn, usize)> + 'a {
        [PairColumn::Neighbors, PairColumn::FarNeighbors]
            .into_iter()
            .flat_map(move |column| {
                self.pairs
                    .column(column)
                    .iter()
                    .enumerate()
                    .filter(move |(_, value)| value.as_str() == key)
                    .map(move |(index, _)| (column, index))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_round_trip() {
        for field in [
            ZoneField::ZoneKey,
            ZoneField::Neighbors,
            ZoneField::FarNeighbors,
            ZoneField::NeighborGroups,
            ZoneField::LightGroup,
        ] {
            assert_eq!(field.as_str().parse::<ZoneField>().unwrap(), field);
        }
        assert!("zones".parse::<ZoneField>().is_err());
    }

    #[test]
    fn test_set_field() {
        let mut zone = ZoneDraft::new();
        assert!(zone.set_field(ZoneField::LightGroup, vec!["light.a".into()]));
        assert!(zone.set_field(ZoneField::Neighbors, vec!["sensor.b".into()]));
        assert!(!zone.set_field(ZoneField::ZoneKey, vec!["sensor.z".into()]));

        assert_eq!(zone.light_group(), ["light.a"]);
        assert_eq!(zone.pairs().len(), 1);
        assert!(!zone.pairs().is_aligned());
    }

    #[test]
    fn test_self_references() {
        let mut zone = ZoneDraft::new();
        zone.set_field(
            ZoneField::Neighbors,
            vec!["sensor.b".into(), "sensor.a".into()],
        );
        zone.set_field(ZoneField::FarNeighbors, vec!["sensor.a".into(), "".into()]);

        let hits: Vec<_> = zone.self_references("sensor.a").collect();
        assert_eq!(
            hits,
            [(PairColumn::Neighbors, 1), (PairColumn::FarNeighbors, 0)]
        );
    }
}
