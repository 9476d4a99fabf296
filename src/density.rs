//! Density fields on a regular voxel grid.
//!
//! Samples arrive as rows `(voxel_index, ..., density)`: the first column
//! determines the grid size (`max + 1`) and the last column, read in row-major
//! order, fills an `n × n × n` cube.

use std::path::Path;

use ndarray::{Array2, Array3, ArrayView2, ArrayView3};
use rand::Rng;
use rand_distr::{Distribution, Uniform};

use crate::error::{PipelineError, Result};
use crate::table;

/// Scalar field on an `n³` voxel grid
#[derive(Debug, Clone)]
pub struct DensityField {
    values: Array3<f64>,
}

impl DensityField {
    pub fn new(values: Array3<f64>) -> Self {
        Self { values }
    }

    /// Reshape sample rows into a cube
    pub fn from_samples(samples: ArrayView2<'_, f64>) -> Result<Self> {
        let rows = samples.nrows();
        if rows == 0 || samples.ncols() == 0 {
            return Err(PipelineError::MalformedGrid {
                rows,
                grid_size: 0,
                expected: 0,
            });
        }

        let max_index = samples.column(0).iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !max_index.is_finite() || max_index < 0.0 {
            return Err(PipelineError::MalformedGrid {
                rows,
                grid_size: 0,
                expected: 0,
            });
        }
        // Saturates for indices far beyond the row count; the size check below rejects them
        let grid_size = (max_index as usize).saturating_add(1);
        let expected = grid_size.saturating_pow(3);
        if rows != expected {
            return Err(PipelineError::MalformedGrid {
                rows,
                grid_size,
                expected,
            });
        }

        let density = samples.column(samples.ncols() - 1).to_vec();
        let values = Array3::from_shape_vec((grid_size, grid_size, grid_size), density).map_err(|_| {
            PipelineError::MalformedGrid {
                rows,
                grid_size,
                expected,
            }
        })?;
        Ok(Self { values })
    }

    /// Load a sample table such as `densities_C<crop>.txt`
    pub fn load(path: &Path) -> Result<Self> {
        let samples = table::read_table(path, 0)?;
        log::debug!("read {} density samples from {}", samples.nrows(), path.display());
        Self::from_samples(samples.view())
    }

    pub fn values(&self) -> ArrayView3<'_, f64> {
        self.values.view()
    }

    pub fn grid_size(&self) -> usize {
        self.values.dim().0
    }

    /// `ln(1 + x)` of every voxel; values below -1 (or NaN) are rejected
    pub fn log_transformed(&self) -> Result<Self> {
        if let Some((index, &value)) = self
            .values
            .iter()
            .enumerate()
            .find(|(_, &v)| v.is_nan() || v < -1.0)
        {
            return Err(PipelineError::Domain { value, index });
        }
        Ok(Self {
            values: self.values.mapv(f64::ln_1p),
        })
    }

    /// Rows `(i, j, k, value)` in row-major order, the layout [`Self::from_samples`] reads
    pub fn to_samples(&self) -> Array2<f64> {
        let mut samples = Array2::<f64>::zeros((self.values.len(), 4));
        for (row, ((i, j, k), &v)) in self.values.indexed_iter().enumerate() {
            samples[[row, 0]] = i as f64;
            samples[[row, 1]] = j as f64;
            samples[[row, 2]] = k as f64;
            samples[[row, 3]] = v;
        }
        samples
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        table::write_table(path, &[], self.to_samples().view())
    }

    /// Sum of Gaussian halos at random positions on an `n³` grid in `[0, 1)^3`
    pub fn gaussian_halos<R: Rng + ?Sized>(
        grid_size: usize,
        n_halos: usize,
        width: f64,
        rng: &mut R,
    ) -> Result<Self> {
        let unit = Uniform::new(0.0, 1.0)
            .map_err(|e| PipelineError::InvalidConfig(format!("halo position: {e}")))?;
        let amplitude = Uniform::new(1.0, 10.0)
            .map_err(|e| PipelineError::InvalidConfig(format!("halo amplitude: {e}")))?;
        if !(width > 0.0) {
            return Err(PipelineError::InvalidConfig(format!("halo width {width} must be positive")));
        }

        let halos: Vec<([f64; 3], f64)> = (0..n_halos)
            .map(|_| ([unit.sample(rng), unit.sample(rng), unit.sample(rng)], amplitude.sample(rng)))
            .collect();

        let step = 1.0 / grid_size.max(1) as f64;
        let values = Array3::from_shape_fn((grid_size, grid_size, grid_size), |(i, j, k)| {
            let p = [i as f64 * step, j as f64 * step, k as f64 * step];
            halos
                .iter()
                .map(|(c, a)| {
                    let r2: f64 = p.iter().zip(c.iter()).map(|(x, y)| (x - y) * (x - y)).sum();
                    a * (-r2 / (2.0 * width * width)).exp()
                })
                .sum()
        });
        Ok(Self { values })
    }
}
