//! Cubical complex persistence over a 3-D voxel grid
//!
//! Grid values sit on the vertices (V-construction). Every elementary cube of
//! the grid enters the filtration at the maximum of its vertex values, so the
//! sublevel set at t is the union of cubes whose corners are all ≤ t.
//!
//! ## Cell indexing
//!
//! A grid with `n_x × n_y × n_z` vertices has `(2n_x-1) × (2n_y-1) × (2n_z-1)`
//! cells in Khalimsky coordinates: even coordinates are vertex positions, odd
//! coordinates span an edge along that axis. The number of odd coordinates is
//! the cell dimension, and the facets of a cell are obtained by moving one odd
//! coordinate by ±1.
//!
//! ## Algorithm
//!
//! 1. Order cells by (value, dimension, index)
//! 2. Reduce cube and square columns top-down, skipping columns that are
//!    already known to be pivots of the dimension above (clearing)
//! 3. H0 by union-find over edges in filtration order (elder rule)
//!
//! Pairs with zero persistence are dropped; unpaired classes are reported
//! with death `+inf`.

use ndarray::ArrayView3;

use super::diagram::{PersistenceDiagram, PersistenceInterval};
use super::reduction::{Reducer, SparseColumn};

/// Vertex-valued cubical complex of a 3-D grid
#[derive(Debug, Clone)]
pub struct CubicalComplex {
    /// Cells per axis, `2n - 1`
    cell_shape: [usize; 3],
    /// Filtration value of every cell, by linear cell index
    filtration: Vec<f64>,
}

impl CubicalComplex {
    /// Build the complex from vertex values. A grid with an empty axis gives an
    /// empty complex.
    pub fn from_vertices(values: ArrayView3<'_, f64>) -> Self {
        let (nx, ny, nz) = values.dim();
        if nx == 0 || ny == 0 || nz == 0 {
            return Self {
                cell_shape: [0, 0, 0],
                filtration: Vec::new(),
            };
        }

        let cell_shape = [2 * nx - 1, 2 * ny - 1, 2 * nz - 1];
        let n_cells = cell_shape.iter().product();
        let mut filtration = vec![f64::NEG_INFINITY; n_cells];

        for a in 0..cell_shape[0] {
            for b in 0..cell_shape[1] {
                for c in 0..cell_shape[2] {
                    let mut value = f64::NEG_INFINITY;
                    for i in vertex_span(a) {
                        for j in vertex_span(b) {
                            for k in vertex_span(c) {
                                value = max_propagating_nan(value, values[[i, j, k]]);
                            }
                        }
                    }
                    filtration[(a * cell_shape[1] + b) * cell_shape[2] + c] = value;
                }
            }
        }

        Self {
            cell_shape,
            filtration,
        }
    }

    pub fn n_cells(&self) -> usize {
        self.filtration.len()
    }

    /// Filtration value of a cell
    pub fn value(&self, cell: usize) -> f64 {
        self.filtration[cell]
    }

    fn coords(&self, cell: usize) -> [usize; 3] {
        let [_, sb, sc] = self.cell_shape;
        [cell / (sb * sc), (cell / sc) % sb, cell % sc]
    }

    fn index(&self, coords: [usize; 3]) -> usize {
        (coords[0] * self.cell_shape[1] + coords[1]) * self.cell_shape[2] + coords[2]
    }

    /// Number of odd Khalimsky coordinates
    pub fn dimension(&self, cell: usize) -> usize {
        self.coords(cell).iter().filter(|&&x| x % 2 == 1).count()
    }

    /// Codimension-one faces of a cell
    pub fn facets(&self, cell: usize) -> Vec<usize> {
        let coords = self.coords(cell);
        let mut faces = Vec::with_capacity(6);
        for axis in 0..3 {
            if coords[axis] % 2 == 1 {
                let mut lower = coords;
                lower[axis] -= 1;
                let mut upper = coords;
                upper[axis] += 1;
                faces.push(self.index(lower));
                faces.push(self.index(upper));
            }
        }
        faces
    }

    /// Cells ordered by (value, dimension, index); faces always precede cofaces
    fn filtration_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.n_cells()).collect();
        order.sort_by(|&a, &b| {
            self.filtration[a]
                .total_cmp(&self.filtration[b])
                .then(self.dimension(a).cmp(&self.dimension(b)))
                .then(a.cmp(&b))
        });
        order
    }

    /// Persistence in dimensions 0, 1 and 2 over Z/2
    pub fn persistence(&self) -> PersistenceDiagram {
        let mut diagram = PersistenceDiagram::new();
        if self.n_cells() == 0 {
            return diagram;
        }

        let order = self.filtration_order();
        let mut rank = vec![0usize; order.len()];
        for (r, &cell) in order.iter().enumerate() {
            rank[cell] = r;
        }
        let dims: Vec<usize> = order.iter().map(|&cell| self.dimension(cell)).collect();
        let value_at = |r: usize| self.filtration[order[r]];

        // Ranks that are pivots of a column one dimension up
        let mut cleared = vec![false; order.len()];

        // H2 from cubes, then H1 from squares
        for d in (2..=3).rev() {
            let mut reducer = Reducer::new();
            for r in 0..order.len() {
                if dims[r] != d || cleared[r] {
                    continue;
                }
                let column = SparseColumn::from_indices(
                    self.facets(order[r]).into_iter().map(|f| rank[f]),
                );
                match reducer.reduce(r, column) {
                    Some(low) => {
                        cleared[low] = true;
                        let (birth, death) = (value_at(low), value_at(r));
                        if death > birth {
                            diagram.push(PersistenceInterval::new(birth, death, d - 1));
                        }
                    }
                    None if d < 3 => diagram.push(PersistenceInterval::essential(value_at(r), d)),
                    None => {}
                }
            }
        }

        // H0 and essential H1 from edges
        let mut components = UnionFind::new(order.len());
        for r in 0..order.len() {
            if dims[r] != 1 {
                continue;
            }
            let facets = self.facets(order[r]);
            let (u, v) = (rank[facets[0]], rank[facets[1]]);
            match components.union(u, v) {
                Some(younger) => {
                    let (birth, death) = (value_at(younger), value_at(r));
                    if death > birth {
                        diagram.push(PersistenceInterval::new(birth, death, 0));
                    }
                }
                None if !cleared[r] => diagram.push(PersistenceInterval::essential(value_at(r), 1)),
                None => {}
            }
        }

        for r in 0..order.len() {
            if dims[r] == 0 && components.find(r) == r {
                diagram.push(PersistenceInterval::essential(value_at(r), 0));
            }
        }

        diagram
    }
}

/// Vertex indices spanned along one axis by a Khalimsky coordinate
fn vertex_span(coord: usize) -> std::ops::RangeInclusive<usize> {
    if coord % 2 == 0 {
        coord / 2..=coord / 2
    } else {
        coord / 2..=coord / 2 + 1
    }
}

fn max_propagating_nan(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

/// Union-find over filtration ranks where every root is the oldest member
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, i: usize) -> usize {
        let mut root = i;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = i;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    /// Merge the classes of `a` and `b`; returns the root that dies (the
    /// younger one), or `None` when they were already connected
    fn union(&mut self, a: usize, b: usize) -> Option<usize> {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return None;
        }
        let (elder, younger) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[younger] = elder;
        Some(younger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array3, array};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_cell_counts_and_dimensions() {
        let grid = Array3::<f64>::zeros((2, 2, 2));
        let cc = CubicalComplex::from_vertices(grid.view());
        assert_eq!(cc.n_cells(), 27);

        let mut by_dim = [0usize; 4];
        for cell in 0..cc.n_cells() {
            by_dim[cc.dimension(cell)] += 1;
        }
        // unit cube: 8 vertices, 12 edges, 6 squares, 1 cube
        assert_eq!(by_dim, [8, 12, 6, 1]);
        assert_eq!(cc.facets(13).len(), 6);
    }

    #[test]
    fn test_cell_value_is_max_of_vertices() {
        let mut grid = Array3::<f64>::zeros((2, 1, 1));
        grid[[1, 0, 0]] = 3.0;
        let cc = CubicalComplex::from_vertices(grid.view());
        assert_eq!(cc.n_cells(), 3);
        assert_eq!(cc.value(0), 0.0);
        assert_eq!(cc.value(1), 3.0);
        assert_eq!(cc.value(2), 3.0);
    }

    #[test]
    fn test_constant_field_has_one_component() {
        let grid = Array3::<f64>::zeros((4, 4, 4));
        let pd = CubicalComplex::from_vertices(grid.view()).persistence();

        let h0 = pd.dim(0);
        assert_eq!(h0.len(), 1);
        assert_eq!(h0[0].birth, 0.0);
        assert!(h0[0].is_essential());
        assert!(pd.dim(1).is_empty());
        assert!(pd.dim(2).is_empty());
    }

    #[test]
    fn test_two_basins_merge_at_ridge() {
        // 1-D profile: minima 0 and 1 separated by a ridge of height 2
        let grid = Array3::from_shape_vec((3, 1, 1), vec![0.0, 2.0, 1.0]).unwrap();
        let pd = CubicalComplex::from_vertices(grid.view()).persistence();

        let finite = pd.finite_intervals(0);
        assert_eq!(finite.len(), 1);
        assert_eq!((finite[0].birth, finite[0].death), (1.0, 2.0));
        assert_eq!(pd.essential_count(0), 1);
        assert_eq!(pd.dim(0).iter().find(|i| i.is_essential()).unwrap().birth, 0.0);
    }

    #[test]
    fn test_ring_gives_one_loop() {
        // 3x3 plane, low ring around a high centre
        let grid = array![[[0.0], [0.0], [0.0]], [[0.0], [5.0], [0.0]], [[0.0], [0.0], [0.0]]];
        let pd = CubicalComplex::from_vertices(grid.view()).persistence();

        let h1 = pd.dim(1);
        assert_eq!(h1.len(), 1);
        assert_eq!((h1[0].birth, h1[0].death), (0.0, 5.0));
        assert!(pd.finite_intervals(0).is_empty());
        assert_eq!(pd.essential_count(0), 1);
    }

    #[test]
    fn test_shell_gives_one_void() {
        // 3x3x3 cube, low boundary shell around a high centre voxel
        let mut grid = Array3::<f64>::zeros((3, 3, 3));
        grid[[1, 1, 1]] = 4.0;
        let pd = CubicalComplex::from_vertices(grid.view()).persistence();

        let h2 = pd.dim(2);
        assert_eq!(h2.len(), 1);
        assert_eq!((h2[0].birth, h2[0].death), (0.0, 4.0));
        assert!(pd.dim(1).is_empty());
        assert_eq!(pd.dim(0).len(), 1);
    }

    #[test]
    fn test_random_field_is_well_formed() {
        let mut rng = StdRng::seed_from_u64(17);
        let grid = Array3::from_shape_fn((5, 5, 5), |_| rng.random_range(0.0..1.0));
        let pd = CubicalComplex::from_vertices(grid.view()).persistence();

        for interval in &pd.intervals {
            assert!(interval.birth <= interval.death);
            assert!(interval.dimension <= 2);
        }
        // a full grid is contractible
        assert_eq!(pd.essential_count(0), 1);
        assert_eq!(pd.essential_count(1), 0);
        assert_eq!(pd.essential_count(2), 0);
        let global_min = grid.iter().copied().fold(f64::INFINITY, f64::min);
        assert_eq!(pd.dim(0).iter().find(|i| i.is_essential()).unwrap().birth, global_min);
    }
}
