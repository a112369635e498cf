//! Command interface for draft edits.
//!
//! ## Learning: The Command Pattern
//!
//! Edits are values:
//! - A presentation layer turns gestures into `DraftCommand`s
//! - Commands can be logged, queued or replayed
//! - `execute` is the single dispatch point into [`SpaceDraftStore`]

use zonekit_model::{EntityId, PairColumn, ZoneField};

use crate::draft::{DraftResult, SpaceDraftStore};

/// An edit to the open space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftCommand {
    AddZone {
        key: EntityId,
    },
    RenameZone {
        from: EntityId,
        to: EntityId,
    },
    RemoveZone {
        key: EntityId,
    },
    SetField {
        zone: EntityId,
        field: ZoneField,
        values: Vec<EntityId>,
    },
    InsertPair {
        zone: EntityId,
        at: Option<usize>,
    },
    RemovePair {
        zone: EntityId,
        index: usize,
    },
    SetPairValue {
        zone: EntityId,
        index: usize,
        column: PairColumn,
        value: EntityId,
    },
    MovePair {
        zone: EntityId,
        from: usize,
        to: usize,
    },
}

impl DraftCommand {
    /// Returns the display name for this command.
    pub fn display_name(&self) -> &'static str {
        match self {
            DraftCommand::AddZone { .. } => "Add Zone",
            DraftCommand::RenameZone { .. } => "Rename Zone",
            DraftCommand::RemoveZone { .. } => "Remove Zone",
            DraftCommand::SetField { .. } => "Set Field",
            DraftCommand::InsertPair { .. } => "Add Pair",
            DraftCommand::RemovePair { .. } => "Remove Pair",
            DraftCommand::SetPairValue { .. } => "Set Pair Value",
            DraftCommand::MovePair { .. } => "Move Pair",
        }
    }

    /// Returns the key of the zone the command addresses.
    pub fn zone(&self) -> &str {
        match self {
            DraftCommand::AddZone { key } | DraftCommand::RemoveZone { key } => key,
            DraftCommand::RenameZone { from, .. } => from,
            DraftCommand::SetField { zone, .. }
            | DraftCommand::InsertPair { zone, .. }
            | DraftCommand::RemovePair { zone, .. }
            | DraftCommand::SetPairValue { zone, .. }
            | DraftCommand::MovePair { zone, .. } => zone,
        }
    }

    /// Applies the command to a draft.
    pub fn execute(self, store: &mut SpaceDraftStore) -> DraftResult<()> {
        tracing::trace!(command = self.display_name(), zone = self.zone(), "executing");

        match self {
            DraftCommand::AddZone { key } => store.add_zone(key),
            DraftCommand::RenameZone { from, to } => store.rename_zone(&from, to).map(|_| ()),
            DraftCommand::RemoveZone { key } => {
                store.remove_zone(&key);
                Ok(())
            }
            DraftCommand::SetField {
                zone,
                field,
                values,
            } => {
                store.set_field(&zone, field, values);
                Ok(())
            }
            DraftCommand::InsertPair { zone, at } => {
                store.insert_pair(&zone, at);
                Ok(())
            }
            DraftCommand::RemovePair { zone, index } => {
                store.remove_pair(&zone, index);
                Ok(())
            }
            DraftCommand::SetPairValue {
                zone,
                index,
                column,
                value,
            } => {
                store.set_pair_value(&zone, index, column, value);
                Ok(())
            }
            DraftCommand::MovePair { zone, from, to } => {
                store.move_pair(&zone, from, to);
                Ok(())
            }
        }
    }
}
