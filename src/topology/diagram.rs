//! Persistence diagrams
//!
//! A persistence interval [b, d) records a homology class born at filtration
//! value b and killed at d. Classes that never die carry `d = +inf`.

use ndarray::Array2;

/// One (birth, death) pair in a given homological dimension
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersistenceInterval {
    pub birth: f64,
    pub death: f64,
    pub dimension: usize,
}

impl PersistenceInterval {
    pub fn new(birth: f64, death: f64, dimension: usize) -> Self {
        Self { birth, death, dimension }
    }

    pub fn essential(birth: f64, dimension: usize) -> Self {
        Self::new(birth, f64::INFINITY, dimension)
    }

    /// Lifetime of the feature
    pub fn persistence(&self) -> f64 {
        if self.death.is_infinite() {
            f64::INFINITY
        } else {
            self.death - self.birth
        }
    }

    pub fn is_essential(&self) -> bool {
        self.death.is_infinite()
    }
}

/// Intervals for every computed dimension
#[derive(Debug, Clone, Default)]
pub struct PersistenceDiagram {
    pub intervals: Vec<PersistenceInterval>,
}

impl PersistenceDiagram {
    pub fn new() -> Self {
        Self { intervals: Vec::new() }
    }

    pub fn push(&mut self, interval: PersistenceInterval) {
        self.intervals.push(interval);
    }

    /// Intervals of dimension d
    pub fn dim(&self, d: usize) -> Vec<&PersistenceInterval> {
        self.intervals.iter().filter(|i| i.dimension == d).collect()
    }

    /// Finite intervals of dimension d
    pub fn finite_intervals(&self, d: usize) -> Vec<&PersistenceInterval> {
        self.intervals
            .iter()
            .filter(|i| i.dimension == d && !i.is_essential())
            .collect()
    }

    /// Number of essential classes in dimension d (Betti number of the full complex)
    pub fn essential_count(&self, d: usize) -> usize {
        self.intervals
            .iter()
            .filter(|i| i.dimension == d && i.is_essential())
            .count()
    }

    /// Total finite persistence in dimension d
    pub fn total_persistence(&self, d: usize) -> f64 {
        self.finite_intervals(d).iter().map(|i| i.persistence()).sum()
    }

    /// `[k, 2]` table of (birth, death) for dimension d, ordered by death then
    /// birth, essential classes last
    pub fn pairs(&self, d: usize) -> Array2<f64> {
        let mut rows: Vec<(f64, f64)> = self
            .intervals
            .iter()
            .filter(|i| i.dimension == d)
            .map(|i| (i.birth, i.death))
            .collect();
        rows.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.total_cmp(&b.0)));

        let mut table = Array2::<f64>::zeros((rows.len(), 2));
        for (k, (b, de)) in rows.into_iter().enumerate() {
            table[[k, 0]] = b;
            table[[k, 1]] = de;
        }
        table
    }
}
