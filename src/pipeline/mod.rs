//! The two end-to-end workflows.
//!
//! - [`PreprocessStage`] (PP): acquisition, mass filter, crop, normalisation,
//!   point-cloud files, optional Rips persistence.
//! - [`CubicalStage`] (CCPH): density field, `ln(1 + x)`, cubical persistence,
//!   one diagram file per dimension.
//!
//! Stages are sequential; a failure aborts the run with no retry.

mod cubical;
mod point_cloud;
mod progress;

pub use cubical::{CubicalOutputs, CubicalStage, CUBICAL_DIMENSIONS};
pub use point_cloud::{PointCloudOutputs, PreprocessStage};
pub use progress::StageProgress;
