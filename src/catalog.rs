//! Subhalo catalog: index-aligned positions and masses for one snapshot.

use ndarray::{Array1, Array2};
use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};

use crate::error::{PipelineError, Result};
use crate::layout::{Field, SnapshotKey};

/// Positions `[N, 3]` and masses `[N]`, row `i` of each describing subhalo `i`
#[derive(Debug, Clone)]
pub struct SubhaloCatalog {
    positions: Array2<f64>,
    masses: Array1<f64>,
}

impl SubhaloCatalog {
    pub fn new(positions: Array2<f64>, masses: Array1<f64>) -> Result<Self> {
        if positions.ncols() != 3 {
            return Err(PipelineError::InvalidCatalog(format!(
                "positions must have 3 columns, found {}",
                positions.ncols()
            )));
        }
        if positions.nrows() != masses.len() {
            return Err(PipelineError::InvalidCatalog(format!(
                "{} positions but {} masses",
                positions.nrows(),
                masses.len()
            )));
        }
        Ok(Self { positions, masses })
    }

    pub fn positions(&self) -> &Array2<f64> {
        &self.positions
    }

    pub fn masses(&self) -> &Array1<f64> {
        &self.masses
    }

    pub fn len(&self) -> usize {
        self.masses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }

    /// Fails when this build cannot read the archive's HDF5 group catalogs
    pub fn ensure_loadable(key: &SnapshotKey) -> Result<()> {
        if hdf5_io::SUPPORTED {
            return Ok(());
        }
        Err(PipelineError::Hdf5 {
            path: key.snapshot_dir(),
            message: "built without the `hdf5` feature; rebuild with `--features hdf5`".to_string(),
        })
    }

    /// Load the cached `SubhaloPos` / `SubhaloMass` group catalog files
    pub fn load(key: &SnapshotKey) -> Result<Self> {
        let pos_path = key.catalog_path(Field::SubhaloPos);
        let mass_path = key.catalog_path(Field::SubhaloMass);
        for path in [&pos_path, &mass_path] {
            if !path.exists() {
                return Err(PipelineError::MissingInputFile(path.clone()));
            }
        }

        let positions = hdf5_io::read_field(&pos_path, Field::SubhaloPos)?;
        let masses = hdf5_io::read_field(&mass_path, Field::SubhaloMass)?;
        log::debug!(
            "loaded {} positions and {} masses for {} snapshot {}",
            positions.nrows(),
            masses.nrows(),
            key.dataset,
            key.snapshot
        );

        if masses.ncols() != 1 {
            return Err(PipelineError::InvalidCatalog(format!(
                "SubhaloMass has shape {:?}, expected a single column",
                masses.shape()
            )));
        }
        Self::new(positions, masses.column(0).to_owned())
    }

    /// `n` subhalos uniform in `[lo, hi)^3` with masses uniform in `[0, max_mass)`
    pub fn uniform_cube<R: Rng + ?Sized>(
        n: usize,
        lo: f64,
        hi: f64,
        max_mass: f64,
        rng: &mut R,
    ) -> Result<Self> {
        let coord = Uniform::new(lo, hi)
            .map_err(|e| PipelineError::InvalidConfig(format!("position range: {e}")))?;
        let mass = Uniform::new(0.0, max_mass)
            .map_err(|e| PipelineError::InvalidConfig(format!("mass range: {e}")))?;

        let positions = Array2::from_shape_fn((n, 3), |_| coord.sample(rng));
        let masses = Array1::from_shape_fn(n, |_| mass.sample(rng));
        Self::new(positions, masses)
    }

    /// Gaussian clumps around random centres inside a periodic box of side `box_size`
    pub fn clustered<R: Rng + ?Sized>(
        n_halos: usize,
        per_halo: usize,
        box_size: f64,
        spread: f64,
        rng: &mut R,
    ) -> Result<Self> {
        let centre = Uniform::new(0.0, box_size)
            .map_err(|e| PipelineError::InvalidConfig(format!("box size: {e}")))?;
        let offset = Normal::new(0.0, spread)
            .map_err(|e| PipelineError::InvalidConfig(format!("spread: {e}")))?;
        // Log-normal masses, heavier near the clump centre
        let log_mass = Normal::new(0.0_f64, 1.0)
            .map_err(|e| PipelineError::InvalidConfig(format!("mass: {e}")))?;

        let n = n_halos * per_halo;
        let mut positions = Array2::<f64>::zeros((n, 3));
        let mut masses = Array1::<f64>::zeros(n);

        for h in 0..n_halos {
            let c = [centre.sample(rng), centre.sample(rng), centre.sample(rng)];
            for k in 0..per_halo {
                let i = h * per_halo + k;
                for d in 0..3 {
                    positions[[i, d]] = (c[d] + offset.sample(rng)).rem_euclid(box_size);
                }
                let boost: f64 = if k == 0 { 3.0 } else { 0.0 };
                masses[i] = (log_mass.sample(rng) + boost).exp();
            }
        }

        Self::new(positions, masses)
    }
}

#[cfg(feature = "hdf5")]
mod hdf5_io {
    use std::path::Path;

    use ndarray::Array2;

    use crate::error::{PipelineError, Result};
    use crate::layout::Field;

    pub const SUPPORTED: bool = true;

    /// Read `Subhalo/<field>` as an `[N, k]` array (k = 1 for scalar fields)
    pub fn read_field(path: &Path, field: Field) -> Result<Array2<f64>> {
        let err = |message: String| PipelineError::Hdf5 {
            path: path.to_path_buf(),
            message,
        };

        let file = hdf5::File::open(path).map_err(|e| err(e.to_string()))?;
        let dataset = file
            .dataset(&format!("Subhalo/{}", field.name()))
            .map_err(|e| err(e.to_string()))?;
        let shape = dataset.shape();
        let raw: Vec<f32> = dataset.read_raw::<f32>().map_err(|e| err(e.to_string()))?;

        let rows = shape.first().copied().unwrap_or(0);
        let cols = shape.get(1).copied().unwrap_or(1);
        let values: Vec<f64> = raw.into_iter().map(f64::from).collect();
        Array2::from_shape_vec((rows, cols), values).map_err(|e| err(e.to_string()))
    }
}

#[cfg(not(feature = "hdf5"))]
mod hdf5_io {
    use std::path::Path;

    use ndarray::Array2;

    use crate::error::{PipelineError, Result};
    use crate::layout::Field;

    pub const SUPPORTED: bool = false;

    pub fn read_field(path: &Path, field: Field) -> Result<Array2<f64>> {
        Err(PipelineError::Hdf5 {
            path: path.to_path_buf(),
            message: format!(
                "cannot read Subhalo/{}: built without the `hdf5` feature",
                field.name()
            ),
        })
    }
}
