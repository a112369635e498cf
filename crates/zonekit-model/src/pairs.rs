//! Paired-list editing for zone neighbor relations.
//!
//! ## Learning: Parallel Vectors
//!
//! A row here is spread across three `Vec`s instead of one `Vec<Row>`,
//! because that is the shape the service stores and validates. The price is
//! that every structural edit must touch all three vectors at the same index.
//!
//! Only `set_value` and `replace_column` may leave the columns with different
//! lengths. `normalize_length` repairs that, using `neighbors` as the
//! reference length.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{EntityId, ModelError};

/// One of the three parallel columns of a [`PairedList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairColumn {
    /// Neighboring zone sensor
    Neighbors,
    /// Far counterpart of the neighbor
    FarNeighbors,
    /// Light group associated with the neighbor
    NeighborGroups,
}

impl PairColumn {
    /// All columns, in row order.
    pub const ALL: [PairColumn; 3] = [
        PairColumn::Neighbors,
        PairColumn::FarNeighbors,
        PairColumn::NeighborGroups,
    ];

    /// Returns the wire name of the column.
    pub fn as_str(&self) -> &'static str {
        match self {
            PairColumn::Neighbors => "neighbors",
            PairColumn::FarNeighbors => "far_neighbors",
            PairColumn::NeighborGroups => "neighbor_groups",
        }
    }
}

impl fmt::Display for PairColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PairColumn {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PairColumn::ALL
            .into_iter()
            .find(|column| column.as_str() == s)
            .ok_or_else(|| ModelError::UnknownColumn(s.to_string()))
    }
}

/// What [`PairedList::normalize_length`] had to do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Normalized {
    /// Placeholders appended to short columns
    pub padded: usize,
    /// Values cut from long columns
    pub truncated: usize,
    /// Non-empty values among the truncated ones
    pub dropped: usize,
}

impl Normalized {
    /// Returns true if nothing changed.
    pub fn is_noop(&self) -> bool {
        self.padded == 0 && self.truncated == 0
    }

    /// Returns true if truncation discarded a chosen entity.
    pub fn lost_data(&self) -> bool {
        self.dropped > 0
    }
}

impl std::ops::AddAssign for Normalized {
    fn add_assign(&mut self, rhs: Self) {
        self.padded += rhs.padded;
        self.truncated += rhs.truncated;
        self.dropped += rhs.dropped;
    }
}

/// A borrowed view of one aligned row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairRow<'a> {
    pub neighbor: &'a str,
    pub far_neighbor: &'a str,
    pub neighbor_group: &'a str,
}

/// Three parallel entity lists edited in lockstep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairedList {
    #[serde(default)]
    neighbors: Vec<EntityId>,

    #[serde(default)]
    far_neighbors: Vec<EntityId>,

    #[serde(default)]
    neighbor_groups: Vec<EntityId>,
}

impl PairedList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list from raw columns without repairing their lengths.
    pub fn from_columns(
        neighbors: Vec<EntityId>,
        far_neighbors: Vec<EntityId>,
        neighbor_groups: Vec<EntityId>,
    ) -> Self {
        Self {
            neighbors,
            far_neighbors,
            neighbor_groups,
        }
    }

    // ==================== Getters ====================

    /// Returns the number of rows, measured on `neighbors`.
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    /// Returns true if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// Returns true if all three columns have the same length.
    pub fn is_aligned(&self) -> bool {
        self.far_neighbors.len() == self.neighbors.len()
            && self.neighbor_groups.len() == self.neighbors.len()
    }

    /// Returns one column.
    pub fn column(&self, column: PairColumn) -> &[EntityId] {
        match column {
            PairColumn::Neighbors => &self.neighbors,
            PairColumn::FarNeighbors => &self.far_neighbors,
            PairColumn::NeighborGroups => &self.neighbor_groups,
        }
    }

    fn column_mut(&mut self, column: PairColumn) -> &mut Vec<EntityId> {
        match column {
            PairColumn::Neighbors => &mut self.neighbors,
            PairColumn::FarNeighbors => &mut self.far_neighbors,
            PairColumn::NeighborGroups => &mut self.neighbor_groups,
        }
    }

    /// Returns the row at `index`. Cells missing from a short column read as empty.
    pub fn row(&self, index: usize) -> Option<PairRow<'_>> {
        fn cell(values: &[EntityId], index: usize) -> &str {
            values.get(index).map_or("", String::as_str)
        }

        self.neighbors.get(index).map(|neighbor| PairRow {
            neighbor: neighbor.as_str(),
            far_neighbor: cell(&self.far_neighbors, index),
            neighbor_group: cell(&self.neighbor_groups, index),
        })
    }

    /// Iterates over all rows.
    pub fn rows(&self) -> impl Iterator<Item = PairRow<'_>> + '_ {
        (0..self.len()).filter_map(|index| self.row(index))
    }

    /// Returns true if `value` appears in `column`.
    pub fn contains(&self, column: PairColumn, value: &str) -> bool {
        self.column(column).iter().any(|v| v == value)
    }

    // ==================== Editing ====================

    /// Inserts an empty row at `at` (end when `None`) and returns its index.
    ///
    /// Indices past the end are clamped, so this never fails.
    pub fn insert_pair(&mut self, at: Option<usize>) -> usize {
        let len = self.neighbors.len();
        let at = at.map_or(len, |index| index.min(len));

        for column in PairColumn::ALL {
            let values = self.column_mut(column);
            let index = at.min(values.len());
            values.insert(index, EntityId::new());
        }

        at
    }

    /// Removes the row at `index` from every column.
    ///
    /// Returns false and changes nothing if `index` is out of bounds.
    pub fn remove_pair(&mut self, index: usize) -> bool {
        if index >= self.neighbors.len() {
            return false;
        }

        for column in PairColumn::ALL {
            let values = self.column_mut(column);
            if index < values.len() {
                values.remove(index);
            }
        }

        true
    }

    /// Replaces one cell. The other columns are left alone.
    ///
    /// A short column is padded up to `index`, but only within the rows
    /// that exist (or one cell past its own end). Returns false and changes
    /// nothing for an index beyond that.
    pub fn set_value(
        &mut self,
        index: usize,
        column: PairColumn,
        value: impl Into<EntityId>,
    ) -> bool {
        let rows = self.neighbors.len();
        let values = self.column_mut(column);
        if index > rows.max(values.len()) {
            return false;
        }
        if index >= values.len() {
            values.resize(index + 1, EntityId::new());
        }
        values[index] = value.into();
        true
    }

    /// Replaces a whole column without resyncing the others.
    pub fn replace_column(&mut self, column: PairColumn, values: Vec<EntityId>) {
        *self.column_mut(column) = values;
    }

    /// Moves the row at `from` so that it ends up at `to`.
    ///
    /// Returns false if the indices are equal or either is out of bounds.
    pub fn move_pair(&mut self, from: usize, to: usize) -> bool {
        let len = self.neighbors.len();
        if from == to || from >= len || to >= len {
            return false;
        }

        let needed = from.max(to) + 1;
        for column in PairColumn::ALL {
            let values = self.column_mut(column);
            if values.len() < needed {
                values.resize(needed, EntityId::new());
            }
            let item = values.remove(from);
            values.insert(to, item);
        }

        true
    }

    /// Pads or truncates `far_neighbors` and `neighbor_groups` to `len()`.
    pub fn normalize_length(&mut self) -> Normalized {
        let len = self.neighbors.len();
        let mut report = Normalized::default();

        for column in [PairColumn::FarNeighbors, PairColumn::NeighborGroups] {
            let values = self.column_mut(column);
            if values.len() < len {
                report.padded += len - values.len();
                values.resize(len, EntityId::new());
            } else if values.len() > len {
                let tail = values.split_off(len);
                report.truncated += tail.len();
                report.dropped += tail.iter().filter(|v| !v.is_empty()).count();
            }
        }

        report
    }
}
