//! # subhalo-persistence
//!
//! Persistent homology of IllustrisTNG subhalo catalogs.
//!
//! ## Workflows
//!
//! 1. **PP (point-cloud preprocessing)**: fetch `SubhaloPos` / `SubhaloMass`
//!    from the TNG archive (once per snapshot), keep subhalos above a mass
//!    threshold, crop a cube around the median position and write the cloud
//!    both in original units and min–max scaled to [-1, 1]. Optionally the
//!    Vietoris–Rips persistence of the scaled cloud is written as well.
//!
//! 2. **CCPH (cubical complex persistent homology)**: read a density field
//!    sampled on an n³ grid, apply `ln(1 + x)` and compute H0, H1 and H2 of
//!    the sublevel-set filtration of the cubical complex.
//!
//! ## Layout
//!
//! Every artifact lives under `<data_root>/<dataset>/snap_0<snapshot>/`, see
//! [`layout::SnapshotKey`]. Diagrams are two-column text tables of
//! (birth, death) with `inf` for essential classes.
//!
//! ## References
//!
//! - Edelsbrunner & Harer, "Computational Topology" (2010)
//! - Wagner, Chen & Vuçini, "Efficient computation of persistent homology for
//!   cubical data" (2012)
//! - Nelson et al., "The IllustrisTNG simulations: public data release" (2019)

pub mod acquisition;
pub mod catalog;
pub mod config;
pub mod density;
pub mod error;
pub mod layout;
pub mod pipeline;
pub mod preprocess;
pub mod table;
pub mod topology;

// Re-exports from config
pub use config::{
    Algorithm,
    ArchiveConfig,
    CropPercent,
    Dataset,
    FilterConfig,
    Snapshot,
};

pub use error::{PipelineError, Result};
pub use layout::{Field, SnapshotKey};

// Re-exports from acquisition
pub use acquisition::{
    ensure_catalog,
    Acquisition,
    ArchiveClient,
    FieldSource,
};

pub use catalog::SubhaloCatalog;
pub use density::DensityField;
pub use preprocess::{CropWindow, CroppedCloud};

// Re-exports from topology
pub use topology::{
    // Grids
    CubicalComplex,
    // Point clouds
    rips_persistence,
    // Shared
    PersistenceDiagram,
    PersistenceInterval,
};

// Re-exports from pipeline
pub use pipeline::{
    CubicalOutputs,
    CubicalStage,
    PointCloudOutputs,
    PreprocessStage,
};
