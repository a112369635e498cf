//! The editable draft of one space.
//!
//! ## Learning: Dirty Tracking
//!
//! `dirty` is a cheap flag flipped by every accepted edit, while
//! [`SpaceDraftStore::diff`] compares against the snapshot that was loaded
//! or saved last. The flag drives the "unsaved changes" indicator; the diff
//! answers "what exactly changed".
//!
//! Every accepted edit also drops the current error index. Errors describe
//! the draft as it was sent to the service and would point at the wrong
//! rows once anything moves.

use indexmap::IndexMap;

use zonekit_model::{
    EntityId, ErrorCode, Normalized, PairColumn, SpaceData, ValidationError, ZoneDraft, ZoneField,
};

use crate::command::DraftCommand;
use crate::validation::ValidationErrorIndex;

/// Result type for draft edits
pub type DraftResult<T> = Result<T, DraftError>;

/// Edits rejected before anything reaches the service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    /// `key` is already used. `zone` is the zone the error is shown on.
    #[error("Zone with key '{key}' already exists")]
    DuplicateKey { zone: EntityId, key: EntityId },

    #[error("Zone key is empty")]
    EmptyKey,

    #[error("Zone not found: {0}")]
    ZoneNotFound(EntityId),
}

impl DraftError {
    /// Returns the error in the same shape the service uses.
    pub fn to_report(&self) -> ValidationError {
        match self {
            DraftError::DuplicateKey { zone, .. } => {
                ValidationError::new(zone.clone(), ZoneField::ZoneKey, ErrorCode::Exists)
                    .with_text("Zone with this key already exists")
            }
            DraftError::EmptyKey => {
                let code = ErrorCode::from("empty_key");
                ValidationError::new(String::new(), ZoneField::ZoneKey, code)
                    .with_text("Zone key is empty")
            }
            DraftError::ZoneNotFound(key) => {
                let code = ErrorCode::from("zone_not_found");
                ValidationError::new(key.clone(), ZoneField::ZoneKey, code)
                    .with_text("Zone not found")
            }
        }
    }
}

/// How a zone differs from the last loaded or saved snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneChange {
    Added(EntityId),
    Removed(EntityId),
    Modified(EntityId),
}

/// Draft of one space: its zones, dirty flag and current error report.
#[derive(Debug, Clone)]
pub struct SpaceDraftStore {
    /// Space name
    name: String,

    /// Zones by key, in display order
    zones: IndexMap<EntityId, ZoneDraft>,

    /// Snapshot of the last successful load or save
    baseline: SpaceData,

    /// Whether the draft has unsaved edits
    dirty: bool,

    /// Errors from the last failed operation
    errors: ValidationErrorIndex,
}

impl SpaceDraftStore {
    /// Creates an empty draft.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_snapshot(name, SpaceData::default())
    }

    /// Creates a draft from a service snapshot, repairing list lengths.
    pub fn from_snapshot(name: impl Into<String>, mut data: SpaceData) -> Self {
        let name = name.into();
        let report = data.normalize();
        log_normalization(&name, report);

        Self {
            name,
            zones: data.zones.clone(),
            baseline: data,
            dirty: false,
            errors: ValidationErrorIndex::new(),
        }
    }

    // ==================== Getters ====================

    /// Returns the space name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns all zones in display order.
    pub fn zones(&self) -> &IndexMap<EntityId, ZoneDraft> {
        &self.zones
    }

    /// Returns one zone.
    pub fn zone(&self, key: &str) -> Option<&ZoneDraft> {
        self.zones.get(key)
    }

    /// Returns true if a zone with `key` exists.
    pub fn contains(&self, key: &str) -> bool {
        self.zones.contains_key(key)
    }

    /// Returns the number of zones.
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Returns true if the space has no zones.
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Returns true if there are unsaved edits.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the current error report.
    pub fn errors(&self) -> &ValidationErrorIndex {
        &self.errors
    }

    // ==================== Dirty State & Errors ====================

    /// Flags unsaved edits and drops stale errors.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
        self.errors.clear();
    }

    /// Replaces the error report. The dirty flag is left alone.
    pub fn set_errors(&mut self, errors: Vec<ValidationError>) {
        self.errors = ValidationErrorIndex::build(errors);
    }

    /// Adds a locally detected error to the report. The dirty flag is left alone.
    pub fn record_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Records a successful save: the current zones become the baseline.
    pub fn mark_saved(&mut self) {
        self.baseline = self.snapshot();
        self.dirty = false;
        self.errors.clear();
    }

    // ==================== Zone Edits ====================

    /// Applies an edit command.
    pub fn apply(&mut self, command: DraftCommand) -> DraftResult<()> {
        command.execute(self)
    }

    /// Adds an empty zone at the end.
    pub fn add_zone(&mut self, key: impl Into<EntityId>) -> DraftResult<()> {
        let key = key.into();
        if key.is_empty() {
            return Err(DraftError::EmptyKey);
        }
        if self.zones.contains_key(&key) {
            return Err(DraftError::DuplicateKey {
                zone: key.clone(),
                key,
            });
        }

        tracing::debug!(space = %self.name, zone = %key, "zone added");
        self.zones.insert(key, ZoneDraft::new());
        self.mark_dirty();
        Ok(())
    }

    /// Moves a zone to a new key, keeping its data and display position.
    ///
    /// Returns `Ok(false)` without touching anything when `to` is empty or
    /// equal to `from`.
    pub fn rename_zone(&mut self, from: &str, to: impl Into<EntityId>) -> DraftResult<bool> {
        let to = to.into();
        if to.is_empty() || to == from {
            return Ok(false);
        }
        if self.zones.contains_key(&to) {
            return Err(DraftError::DuplicateKey {
                zone: from.to_string(),
                key: to,
            });
        }
        let Some((index, _, zone)) = self.zones.shift_remove_full(from) else {
            return Err(DraftError::ZoneNotFound(from.to_string()));
        };

        tracing::debug!(space = %self.name, from, to = %to, "zone renamed");
        self.zones.shift_insert(index, to, zone);
        self.mark_dirty();
        Ok(true)
    }

    /// Removes a zone. Removing a missing zone still counts as an edit.
    ///
    /// Returns true if the zone existed.
    pub fn remove_zone(&mut self, key: &str) -> bool {
        let removed = self.zones.shift_remove(key).is_some();
        self.mark_dirty();
        removed
    }

    /// Replaces a list field of a zone.
    ///
    /// Returns false if the zone is unknown or the field is not a list.
    pub fn set_field(&mut self, key: &str, field: ZoneField, values: Vec<EntityId>) -> bool {
        self.edit_zone(key, |zone| zone.set_field(field, values))
            .unwrap_or(false)
    }

    // ==================== Pair Edits ====================

    /// Inserts an empty pair row and returns its index.
    pub fn insert_pair(&mut self, key: &str, at: Option<usize>) -> Option<usize> {
        self.edit_zone(key, |zone| zone.pairs_mut().insert_pair(at))
    }

    /// Removes a pair row.
    pub fn remove_pair(&mut self, key: &str, index: usize) -> bool {
        self.edit_zone(key, |zone| zone.pairs_mut().remove_pair(index))
            .unwrap_or(false)
    }

    /// Sets one cell of a pair row.
    pub fn set_pair_value(
        &mut self,
        key: &str,
        index: usize,
        column: PairColumn,
        value: impl Into<EntityId>,
    ) -> bool {
        let value = value.into();
        self.edit_zone(key, |zone| zone.pairs_mut().set_value(index, column, value))
            .unwrap_or(false)
    }

    /// Moves a pair row.
    pub fn move_pair(&mut self, key: &str, from: usize, to: usize) -> bool {
        self.edit_zone(key, |zone| zone.pairs_mut().move_pair(from, to))
            .unwrap_or(false)
    }

    fn edit_zone<R>(&mut self, key: &str, edit: impl FnOnce(&mut ZoneDraft) -> R) -> Option<R> {
        let result = self.zones.get_mut(key).map(edit);
        if result.is_none() {
            tracing::debug!(space = %self.name, zone = key, "edit on unknown zone ignored");
        }
        self.mark_dirty();
        result
    }

    // ==================== Snapshots ====================

    /// Repairs pair list lengths in every zone. Not an edit.
    pub fn normalize(&mut self) -> Normalized {
        let mut report = Normalized::default();
        for zone in self.zones.values_mut() {
            report += zone.pairs_mut().normalize_length();
        }
        log_normalization(&self.name, report);
        report
    }

    /// Normalizes the draft and returns the payload to send on save.
    pub fn to_payload(&mut self) -> SpaceData {
        self.normalize();
        self.snapshot()
    }

    /// Returns the zones as they are now, without repairing anything.
    pub fn snapshot(&self) -> SpaceData {
        SpaceData {
            zones: self.zones.clone(),
        }
    }

    /// Lists zones that differ from the baseline.
    pub fn diff(&self) -> Vec<ZoneChange> {
        let mut changes = Vec::new();

        for (key, zone) in &self.zones {
            match self.baseline.zones.get(key) {
                None => changes.push(ZoneChange::Added(key.clone())),
                Some(before) if before != zone => changes.push(ZoneChange::Modified(key.clone())),
                Some(_) => {}
            }
        }
        for key in self.baseline.zones.keys() {
            if !self.zones.contains_key(key) {
                changes.push(ZoneChange::Removed(key.clone()));
            }
        }

        changes
    }

    /// Returns true if the zones differ from the baseline.
    pub fn has_changes(&self) -> bool {
        !self.diff().is_empty()
    }
}

fn log_normalization(space: &str, report: Normalized) {
    if report.lost_data() {
        tracing::warn!(
            space,
            dropped = report.dropped,
            "pair lists longer than neighbors were truncated"
        );
    } else if !report.is_noop() {
        tracing::debug!(
            space,
            padded = report.padded,
            truncated = report.truncated,
            "pair lists normalized"
        );
    }
}
