//! PP workflow: fetch the catalog, crop it and write both point clouds.

use std::fs;
use std::path::PathBuf;

use crate::acquisition::{ensure_catalog, Acquisition, FieldSource};
use crate::catalog::SubhaloCatalog;
use crate::config::FilterConfig;
use crate::error::{PipelineError, Result};
use crate::layout::SnapshotKey;
use crate::preprocess::{write_point_cloud, CroppedCloud};
use crate::table;
use crate::topology::rips_persistence;

use super::progress::StageProgress;

/// Files produced by one PP run
#[derive(Debug, Clone)]
pub struct PointCloudOutputs {
    pub normalized_path: PathBuf,
    pub unnormalized_path: PathBuf,
    pub n_points: usize,
    /// Written only when a Rips scale was requested
    pub rips_paths: Vec<PathBuf>,
}

pub struct PreprocessStage {
    pub key: SnapshotKey,
    pub filter: FilterConfig,
    /// Largest edge length of the Rips filtration; `None` skips Rips persistence
    pub rips_epsilon: Option<f64>,
    pub show_progress: bool,
}

impl PreprocessStage {
    pub fn new(key: SnapshotKey, filter: FilterConfig) -> Self {
        Self {
            key,
            filter,
            rips_epsilon: None,
            show_progress: false,
        }
    }

    pub fn with_rips_epsilon(mut self, epsilon: Option<f64>) -> Self {
        self.rips_epsilon = epsilon;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Acquire (if needed), load and preprocess the snapshot's catalog
    pub fn run(&self, source: &dyn FieldSource) -> Result<PointCloudOutputs> {
        // Checked before any request is made
        SubhaloCatalog::ensure_loadable(&self.key)?;

        let progress = StageProgress::new("Preprocessing Data", self.show_progress);
        progress.stage("Checking data availability");
        match ensure_catalog(&self.key, source)? {
            Acquisition::Cached => progress.stage("Data already present"),
            Acquisition::Downloaded(paths) => {
                log::debug!("downloaded {} catalog files", paths.len());
                progress.stage("Downloaded data");
            }
        }
        progress.advance(33);

        let catalog = SubhaloCatalog::load(&self.key)?;
        self.process(&catalog, &progress)
    }

    /// Filter an in-memory catalog and write the outputs
    pub fn run_with_catalog(&self, catalog: &SubhaloCatalog) -> Result<PointCloudOutputs> {
        let progress = StageProgress::new("Preprocessing Data", self.show_progress);
        self.process(catalog, &progress)
    }

    fn process(&self, catalog: &SubhaloCatalog, progress: &StageProgress) -> Result<PointCloudOutputs> {
        progress.stage("Filtering data");
        // Both selections exist before anything is written
        let cloud = CroppedCloud::from_catalog(catalog, &self.filter)?;
        log::info!(
            "{} of {} subhalos kept at {}% crop",
            cloud.len(),
            catalog.len(),
            self.filter.crop_percent
        );

        let dir = self.key.preprocessed_dir();
        fs::create_dir_all(&dir).map_err(|e| PipelineError::io(&dir, e))?;

        let crop = self.filter.crop_percent;
        let normalized_path = self.key.normalized_cloud_path(crop);
        let unnormalized_path = self.key.unnormalized_cloud_path(crop);
        write_point_cloud(&normalized_path, cloud.normalized.view())?;
        write_point_cloud(&unnormalized_path, cloud.unnormalized.view())?;
        progress.advance(66);

        let rips_paths = match self.rips_epsilon {
            Some(epsilon) => self.write_rips(&cloud, epsilon)?,
            None => Vec::new(),
        };
        progress.finish("Done preprocessing");

        Ok(PointCloudOutputs {
            normalized_path,
            unnormalized_path,
            n_points: cloud.len(),
            rips_paths,
        })
    }

    fn write_rips(&self, cloud: &CroppedCloud, epsilon: f64) -> Result<Vec<PathBuf>> {
        if !(epsilon > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "Rips scale {epsilon} must be positive"
            )));
        }
        log::info!("computing Rips persistence of {} points up to {epsilon}", cloud.len());
        let diagram = rips_persistence(cloud.normalized.view(), epsilon);

        let dir = self.key.rips_dir();
        fs::create_dir_all(&dir).map_err(|e| PipelineError::io(&dir, e))?;

        let mut paths = Vec::with_capacity(2);
        for dim in 0..2 {
            let path = self.key.rips_diagram_path(dim, self.filter.crop_percent);
            table::write_table(&path, &[], diagram.pairs(dim).view())?;
            paths.push(path);
        }
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CropPercent, Dataset, Snapshot};
    use ndarray::{array, Array1};

    fn stage(root: &std::path::Path, min_mass: f64) -> PreprocessStage {
        let key = SnapshotKey::new(root, Dataset::Tng50_1Dark, Snapshot::new(99).unwrap());
        let filter = FilterConfig::new(min_mass, CropPercent::new(100).unwrap(), true).unwrap();
        PreprocessStage::new(key, filter)
    }

    #[test]
    fn test_writes_both_clouds() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = SubhaloCatalog::new(
            array![[0.0, 0.0, 0.0], [2.0, 4.0, 6.0], [1.0, 2.0, 3.0]],
            Array1::from_elem(3, 1.0),
        )
        .unwrap();

        let out = stage(dir.path(), 0.0).run_with_catalog(&catalog).unwrap();
        assert_eq!(out.n_points, 3);
        assert!(out.rips_paths.is_empty());
        assert!(out.normalized_path.ends_with("preprocessed/raw_C100.txt"));
        assert!(out.unnormalized_path.ends_with("preprocessed/raw_unnormalized_C100.txt"));

        let raw = std::fs::read_to_string(&out.unnormalized_path).unwrap();
        assert!(raw.starts_with("3\n-1 1 -1 1 -1 1\n"));
    }

    #[test]
    fn test_empty_dataset_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = SubhaloCatalog::new(array![[0.0, 0.0, 0.0]], array![0.5]).unwrap();

        let s = stage(dir.path(), 1.0);
        let err = s.run_with_catalog(&catalog).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyDataset { .. }));
        assert!(!s.key.preprocessed_dir().exists());
    }

    #[test]
    fn test_empty_crop_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = SubhaloCatalog::new(
            array![[0.0, 0.0, 0.0], [10.0, 10.0, 10.0]],
            Array1::from_elem(2, 1.0),
        )
        .unwrap();
        let key = SnapshotKey::new(dir.path(), Dataset::Tng50_1Dark, Snapshot::new(99).unwrap());
        let filter = FilterConfig::new(0.0, CropPercent::new(1).unwrap(), true).unwrap();

        let s = PreprocessStage::new(key, filter);
        let err = s.run_with_catalog(&catalog).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyCrop { .. }));
        assert!(!s.key.preprocessed_dir().exists());
    }

    #[test]
    fn test_rips_diagrams_written() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = SubhaloCatalog::new(
            array![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            Array1::from_elem(4, 1.0),
        )
        .unwrap();

        let out = stage(dir.path(), 0.0)
            .with_rips_epsilon(Some(4.0))
            .run_with_catalog(&catalog)
            .unwrap();
        assert_eq!(out.rips_paths.len(), 2);
        assert!(out.rips_paths[1].ends_with("rips/PP_dim1_C100.txt"));

        let h0 = table::read_table(&out.rips_paths[0], 0).unwrap();
        // three merges plus the surviving component
        assert_eq!(h0.nrows(), 4);
        assert_eq!(h0[[3, 1]], f64::INFINITY);
    }

    #[test]
    fn test_rejects_non_positive_rips_scale() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = SubhaloCatalog::new(array![[0.0, 0.0, 0.0]], array![1.0]).unwrap();
        let err = stage(dir.path(), 0.0)
            .with_rips_epsilon(Some(0.0))
            .run_with_catalog(&catalog)
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfig(_)));
    }
}
