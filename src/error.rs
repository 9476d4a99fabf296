//! Error taxonomy for the acquisition → filtering → persistence pipeline.
//!
//! Every stage returns [`PipelineError`]; nothing is caught or retried inside
//! the library. Binaries attach the stage name with `anyhow::Context`.

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for all pipeline stages.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Non-2xx archive response, transport failure or unusable
    /// `content-disposition` header
    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    /// An expected cached input is absent
    #[error("missing input file: {}", .0.display())]
    MissingInputFile(PathBuf),

    /// The mass filter removed every subhalo
    #[error("no subhalos with mass >= {min_mass} (catalog holds {total})")]
    EmptyDataset { min_mass: f64, total: usize },

    /// Subhalos passed the mass filter but none lies inside the crop window
    #[error("crop window of {crop_percent}% keeps none of the {candidates} subhalos above the mass threshold")]
    EmptyCrop { crop_percent: u8, candidates: usize },

    /// Density samples do not form a cube
    #[error("density grid is not a cube: {rows} rows for inferred grid size {grid_size} (expected {expected})")]
    MalformedGrid {
        rows: usize,
        grid_size: usize,
        expected: usize,
    },

    /// `ln(1 + x)` is undefined for x < -1
    #[error("log transform undefined for density {value} at voxel {index}")]
    Domain { value: f64, index: usize },

    /// Catalog arrays are inconsistent
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    /// Out-of-range configuration value
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Malformed numeric text table
    #[error("parse error in {} line {line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// HDF5 read failure, or the crate was built without HDF5 support
    #[error("HDF5 error in {}: {message}", .path.display())]
    Hdf5 { path: PathBuf, message: String },

    /// Filesystem failure with the path involved
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::Network {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
