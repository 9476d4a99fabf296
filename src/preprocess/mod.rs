//! Filtering & normalisation of subhalo positions.
//!
//! ```text
//!   SubhaloCatalog
//!        │  mass ≥ min_mass
//!        ▼
//!   CropWindow (median centre, crop% of largest extent)
//!        │
//!        ├──────────────► unnormalised cloud
//!        ▼
//!   min–max per axis → [-1, 1]  ─► normalised cloud
//! ```

mod filter;

pub use filter::{column_bounds, mass_filter, median, min_max_scale, peak_to_peak, CropWindow};

use std::path::Path;

use ndarray::{Array2, ArrayView1, ArrayView2};

use crate::catalog::SubhaloCatalog;
use crate::config::{CropPercent, FilterConfig};
use crate::error::{PipelineError, Result};
use crate::table;

/// Bounding-box line written as the second preamble line of every point-cloud
/// file, including the unnormalised one
pub const BOUNDING_BOX_LINE: &str = "-1 1 -1 1 -1 1";

/// Mass filter, crop and optional normalisation of one position set
pub fn filter_points(
    positions: ArrayView2<'_, f64>,
    masses: ArrayView1<'_, f64>,
    config: &FilterConfig,
) -> Result<Array2<f64>> {
    let cropped = crop(positions, masses, config.min_mass(), config.crop_percent)?;
    if config.normalize {
        Ok(min_max_scale(cropped.view()))
    } else {
        Ok(cropped)
    }
}

fn crop(
    positions: ArrayView2<'_, f64>,
    masses: ArrayView1<'_, f64>,
    min_mass: f64,
    crop_percent: CropPercent,
) -> Result<Array2<f64>> {
    let massive = mass_filter(positions, masses, min_mass);
    let window = CropWindow::fit(massive.view(), crop_percent).ok_or(PipelineError::EmptyDataset {
        min_mass,
        total: masses.len(),
    })?;
    log::debug!(
        "{} of {} subhalos pass mass >= {min_mass}; window centre {:?} edge {:.4}",
        massive.nrows(),
        masses.len(),
        window.center,
        window.size
    );
    let cropped = window.apply(massive.view());
    if cropped.nrows() == 0 {
        return Err(PipelineError::EmptyCrop {
            crop_percent: crop_percent.value(),
            candidates: massive.nrows(),
        });
    }
    Ok(cropped)
}

/// The same cropped selection in normalised and original units
#[derive(Debug, Clone)]
pub struct CroppedCloud {
    pub normalized: Array2<f64>,
    pub unnormalized: Array2<f64>,
}

impl CroppedCloud {
    pub fn from_catalog(catalog: &SubhaloCatalog, config: &FilterConfig) -> Result<Self> {
        let normalized = filter_points(catalog.positions().view(), catalog.masses().view(), &config.normalized())?;
        let unnormalized = filter_points(catalog.positions().view(), catalog.masses().view(), &config.unnormalized())?;
        Ok(Self {
            normalized,
            unnormalized,
        })
    }

    pub fn len(&self) -> usize {
        self.normalized.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.nrows() == 0
    }
}

/// Write a point cloud with its two-line preamble (count, bounding box)
pub fn write_point_cloud(path: &Path, points: ArrayView2<'_, f64>) -> Result<()> {
    let header = [points.nrows().to_string(), BOUNDING_BOX_LINE.to_string()];
    table::write_table(path, &header, points)
}

/// Read a point cloud written by [`write_point_cloud`]
pub fn read_point_cloud(path: &Path) -> Result<Array2<f64>> {
    let points = table::read_table(path, 2)?;
    if points.nrows() > 0 && points.ncols() != 3 {
        return Err(PipelineError::Parse {
            path: path.to_path_buf(),
            line: 3,
            message: format!("expected 3 coordinates per point, found {}", points.ncols()),
        });
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};

    fn config(min_mass: f64, pct: u32, normalize: bool) -> FilterConfig {
        FilterConfig::new(min_mass, CropPercent::new(pct).unwrap(), normalize).unwrap()
    }

    #[test]
    fn test_empty_after_mass_filter() {
        let pos = array![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]];
        let masses = array![0.1, 0.2];
        let err = filter_points(pos.view(), masses.view(), &config(5.0, 40, true)).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyDataset { total: 2, .. }));
    }

    #[test]
    fn test_empty_crop_window() {
        // Medians (5, 5, 5) fall between the two subhalos; a 1% window holds neither
        let pos = array![[0.0, 0.0, 0.0], [10.0, 10.0, 10.0]];
        let masses = array![1.0, 1.0];
        let err = filter_points(pos.view(), masses.view(), &config(0.0, 1, false)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::EmptyCrop { crop_percent: 1, candidates: 2 }
        ));
    }

    #[test]
    fn test_normalized_and_raw_share_selection() {
        let pos = array![
            [0.0, 0.0, 0.0],
            [4.0, 6.0, 5.0],
            [5.0, 5.0, 5.0],
            [6.0, 4.0, 5.5],
            [10.0, 10.0, 10.0]
        ];
        let masses = Array1::from_elem(5, 1.0);
        let catalog = SubhaloCatalog::new(pos, masses).unwrap();

        let cloud = CroppedCloud::from_catalog(&catalog, &config(0.0, 30, true)).unwrap();

        // window edge 3 around (5, 5, 5): the three middle points
        assert_eq!(cloud.len(), 3);
        assert_eq!(
            cloud.unnormalized,
            array![[4.0, 6.0, 5.0], [5.0, 5.0, 5.0], [6.0, 4.0, 5.5]]
        );
        for (lo, hi) in column_bounds(cloud.normalized.view()) {
            assert_eq!((lo, hi), (-1.0, 1.0));
        }
    }

    #[test]
    fn test_point_cloud_preamble() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw_C12.txt");
        let pts = array![[0.5, -0.5, 1.0]];

        write_point_cloud(&path, pts.view()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("1"));
        assert_eq!(lines.next(), Some(BOUNDING_BOX_LINE));

        assert_eq!(read_point_cloud(&path).unwrap(), pts);
    }
}
