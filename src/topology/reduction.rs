//! Z/2 boundary-matrix columns and the standard column reduction.
//!
//! Rows and columns are filtration ranks, so the lowest non-zero entry of a
//! column is its largest row index.

use std::collections::{BTreeSet, HashMap};

/// Sparse column over Z/2
#[derive(Debug, Clone, Default)]
pub struct SparseColumn {
    rows: BTreeSet<usize>,
}

impl SparseColumn {
    pub fn new() -> Self {
        Self { rows: BTreeSet::new() }
    }

    pub fn from_indices(indices: impl IntoIterator<Item = usize>) -> Self {
        let mut column = Self::new();
        for row in indices {
            column.toggle(row);
        }
        column
    }

    pub fn is_zero(&self) -> bool {
        self.rows.is_empty()
    }

    /// Lowest (maximum) non-zero row
    pub fn low(&self) -> Option<usize> {
        self.rows.iter().next_back().copied()
    }

    fn toggle(&mut self, row: usize) {
        if !self.rows.remove(&row) {
            self.rows.insert(row);
        }
    }

    /// Column addition in Z/2 (symmetric difference)
    pub fn add_assign(&mut self, other: &SparseColumn) {
        for &row in &other.rows {
            self.toggle(row);
        }
    }
}

/// Reduced columns keyed by their pivot row
#[derive(Debug, Default)]
pub struct Reducer {
    low_to_col: HashMap<usize, usize>,
    reduced: HashMap<usize, SparseColumn>,
}

impl Reducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reduce `column` (rank `col`) against every column stored so far.
    ///
    /// Returns the pivot row when the column stays non-zero; the column is then
    /// stored for later reductions.
    pub fn reduce(&mut self, col: usize, mut column: SparseColumn) -> Option<usize> {
        while let Some(low) = column.low() {
            match self.low_to_col.get(&low) {
                Some(pivot_col) => column.add_assign(&self.reduced[pivot_col]),
                None => break,
            }
        }

        let low = column.low()?;
        self.low_to_col.insert(low, col);
        self.reduced.insert(col, column);
        Some(low)
    }

    /// Whether `row` is already the pivot of a reduced column
    pub fn is_pivot(&self, row: usize) -> bool {
        self.low_to_col.contains_key(&row)
    }
}
