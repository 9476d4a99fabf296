//! Vietoris–Rips persistence of a point cloud
//!
//! VR_ε(X) holds an edge between two points at distance ≤ ε and a triangle
//! when all three of its edges are present. Persistence up to H1 is computed
//! exactly with the standard column reduction:
//!
//! 1. Build the filtered complex (vertices at 0, edges at their length,
//!    triangles at their longest edge), truncated at `max_epsilon`
//! 2. Sort by (birth, dimension, vertices)
//! 3. Reduce the boundary matrix over Z/2
//! 4. Read off pairs; unpaired positive simplices are essential
//!
//! The triangle count grows cubically in the number of points, so this is
//! meant for cropped clouds of at most a few thousand subhalos.

use std::collections::{BTreeSet, HashMap};

use ndarray::{Array2, ArrayView2};

use super::diagram::{PersistenceDiagram, PersistenceInterval};
use super::reduction::{Reducer, SparseColumn};

/// A simplex in the filtration with its birth time
#[derive(Debug, Clone)]
struct FilteredSimplex {
    /// Vertex indices (sorted)
    vertices: Vec<usize>,
    /// Filtration value when simplex appears
    birth: f64,
}

impl FilteredSimplex {
    fn dimension(&self) -> usize {
        self.vertices.len() - 1
    }
}

/// Euclidean distance matrix of the rows of `points`
pub fn distance_matrix(points: ArrayView2<'_, f64>) -> Array2<f64> {
    let n = points.nrows();
    let mut dm = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in i + 1..n {
            let dist = points
                .row(i)
                .iter()
                .zip(points.row(j).iter())
                .map(|(a, b)| (a - b) * (a - b))
                .sum::<f64>()
                .sqrt();
            dm[[i, j]] = dist;
            dm[[j, i]] = dist;
        }
    }

    dm
}

/// H0 and H1 persistence of the Rips filtration of `points` up to `max_epsilon`
pub fn rips_persistence(points: ArrayView2<'_, f64>, max_epsilon: f64) -> PersistenceDiagram {
    let distances = distance_matrix(points);
    rips_persistence_from_distances(distances.view(), max_epsilon)
}

/// Same as [`rips_persistence`] for a precomputed distance matrix
pub fn rips_persistence_from_distances(distances: ArrayView2<'_, f64>, max_epsilon: f64) -> PersistenceDiagram {
    let n = distances.nrows();
    let mut simplices: Vec<FilteredSimplex> = (0..n)
        .map(|i| FilteredSimplex { vertices: vec![i], birth: 0.0 })
        .collect();

    // Edges within range, and for each vertex its higher-indexed neighbours
    let mut upper: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
    let mut edges = Vec::new();
    for i in 0..n {
        for j in i + 1..n {
            if distances[[i, j]] <= max_epsilon {
                upper[i].insert(j);
                edges.push((i, j));
            }
        }
    }

    // Triangle (i, j, k) with i < j < k exists when k neighbours both i and j;
    // it appears with its longest edge
    for &(i, j) in &edges {
        for &k in upper[i].intersection(&upper[j]) {
            let birth = distances[[i, j]].max(distances[[i, k]]).max(distances[[j, k]]);
            simplices.push(FilteredSimplex { vertices: vec![i, j, k], birth });
        }
    }
    simplices.extend(edges.iter().map(|&(i, j)| FilteredSimplex {
        vertices: vec![i, j],
        birth: distances[[i, j]],
    }));

    simplices.sort_by(|a, b| {
        a.birth
            .total_cmp(&b.birth)
            .then(a.dimension().cmp(&b.dimension()))
            .then(a.vertices.cmp(&b.vertices))
    });
    log::debug!("Rips filtration: {n} points, {} simplices", simplices.len());

    let simplex_index: HashMap<&[usize], usize> = simplices
        .iter()
        .enumerate()
        .map(|(idx, s)| (s.vertices.as_slice(), idx))
        .collect();

    let mut reducer = Reducer::new();
    let mut negative = vec![false; simplices.len()];
    let mut diagram = PersistenceDiagram::new();

    for (col, simplex) in simplices.iter().enumerate() {
        if simplex.dimension() == 0 {
            continue;
        }
        // Boundary of [v0, ..., vk] = sum of [v0, ..., v̂i, ..., vk]
        let faces = (0..simplex.vertices.len()).filter_map(|i| {
            let mut face = simplex.vertices.clone();
            face.remove(i);
            simplex_index.get(face.as_slice()).copied()
        });

        if let Some(low) = reducer.reduce(col, SparseColumn::from_indices(faces)) {
            negative[col] = true;
            let (birth, death) = (simplices[low].birth, simplex.birth);
            if death > birth {
                diagram.push(PersistenceInterval::new(birth, death, simplices[low].dimension()));
            }
        }
    }

    // Positive simplices that nothing kills; triangles only close H2, not computed
    for (idx, simplex) in simplices.iter().enumerate() {
        if simplex.dimension() < 2 && !negative[idx] && !reducer.is_pivot(idx) {
            diagram.push(PersistenceInterval::essential(simplex.birth, simplex.dimension()));
        }
    }

    diagram
}
