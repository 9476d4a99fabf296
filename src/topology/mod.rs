//! Topology Module: Persistent Homology of Grids and Point Clouds
//!
//! Two filtrations feed the same persistence diagram type:
//!
//! - `cubical.rs`: vertex-valued cubical complex over a voxel grid (density
//!   fields). H0 via union-find, H1/H2 via column reduction with clearing.
//!
//! - `rips.rs`: Vietoris–Rips filtration of a point cloud, exact up to H1 via
//!   the standard boundary-matrix reduction.
//!
//! Both work over Z/2 and share the sparse column reducer in `reduction.rs`.

mod cubical;
mod diagram;
mod reduction;
mod rips;

pub use cubical::CubicalComplex;
pub use diagram::{PersistenceDiagram, PersistenceInterval};
pub use reduction::{Reducer, SparseColumn};
pub use rips::{distance_matrix, rips_persistence, rips_persistence_from_distances};
