//! CCPH workflow: cubical persistence of a cached density field.

use std::fs;
use std::path::PathBuf;

use crate::config::CropPercent;
use crate::density::DensityField;
use crate::error::{PipelineError, Result};
use crate::layout::SnapshotKey;
use crate::table;
use crate::topology::{CubicalComplex, PersistenceDiagram};

use super::progress::StageProgress;

/// Homology dimensions written for a 3-D grid
pub const CUBICAL_DIMENSIONS: [usize; 3] = [0, 1, 2];

/// Result of one CCPH run
#[derive(Debug, Clone)]
pub struct CubicalOutputs {
    pub grid_size: usize,
    /// `DTFE_dim{0,1,2}_C<crop>.txt`, in dimension order
    pub diagram_paths: Vec<PathBuf>,
    pub diagram: PersistenceDiagram,
}

pub struct CubicalStage {
    pub key: SnapshotKey,
    pub crop: CropPercent,
    pub show_progress: bool,
}

impl CubicalStage {
    pub fn new(key: SnapshotKey, crop: CropPercent) -> Self {
        Self {
            key,
            crop,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Load `densities_C<crop>.txt`, log-transform it and write one diagram per dimension
    pub fn run(&self) -> Result<CubicalOutputs> {
        let progress = StageProgress::new("Approximating PH", self.show_progress);

        progress.stage("Loading density field");
        let path = self.key.densities_path(self.crop);
        let field = DensityField::load(&path)?;
        log::info!("density grid {0}x{0}x{0} from {1}", field.grid_size(), path.display());
        progress.advance(50);

        progress.stage("Computing cubical complex persistence");
        let logged = field.log_transformed()?;
        let diagram = CubicalComplex::from_vertices(logged.values()).persistence();
        let diagram_paths = self.write_diagrams(&diagram)?;
        progress.advance(50);
        progress.finish("Done approximating PH");

        Ok(CubicalOutputs {
            grid_size: field.grid_size(),
            diagram_paths,
            diagram,
        })
    }

    fn write_diagrams(&self, diagram: &PersistenceDiagram) -> Result<Vec<PathBuf>> {
        let dir = self.key.cubical_dir();
        fs::create_dir_all(&dir).map_err(|e| PipelineError::io(&dir, e))?;

        CUBICAL_DIMENSIONS
            .iter()
            .map(|&dim| {
                let path = self.key.cubical_diagram_path(dim, self.crop);
                let pairs = diagram.pairs(dim);
                log::debug!("H{dim}: {} intervals -> {}", pairs.nrows(), path.display());
                table::write_table(&path, &[], pairs.view())?;
                Ok(path)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Dataset, Snapshot};
    use ndarray::Array3;

    fn key(root: &std::path::Path) -> SnapshotKey {
        SnapshotKey::new(root, Dataset::Tng100_1Dark, Snapshot::new(50).unwrap())
    }

    #[test]
    fn test_missing_density_file() {
        let dir = tempfile::tempdir().unwrap();
        let stage = CubicalStage::new(key(dir.path()), CropPercent::new(12).unwrap());
        match stage.run() {
            Err(PipelineError::MissingInputFile(path)) => {
                assert!(path.ends_with("preprocessed/densities_C12.txt"));
            }
            other => panic!("expected missing input, got {other:?}"),
        }
        assert!(!stage.key.cubical_dir().exists());
    }

    #[test]
    fn test_single_basin_field() {
        let dir = tempfile::tempdir().unwrap();
        let crop = CropPercent::new(25).unwrap();
        let k = key(dir.path());
        std::fs::create_dir_all(k.preprocessed_dir()).unwrap();

        // L1 bowl around the centre voxel: every sublevel set is star-shaped
        let values = Array3::from_shape_fn((3, 3, 3), |(i, j, k)| {
            (i as f64 - 1.0).abs() + (j as f64 - 1.0).abs() + (k as f64 - 1.0).abs()
        });
        DensityField::new(values).save(&k.densities_path(crop)).unwrap();

        let out = CubicalStage::new(k, crop).run().unwrap();
        assert_eq!(out.grid_size, 3);
        assert_eq!(out.diagram_paths.len(), 3);
        assert_eq!(out.diagram.essential_count(0), 1);
        assert!(out.diagram.finite_intervals(0).is_empty());
        assert!(out.diagram.dim(1).is_empty());
        assert!(out.diagram.dim(2).is_empty());

        let h0 = std::fs::read_to_string(&out.diagram_paths[0]).unwrap();
        assert_eq!(h0, "0.000000000000000000e+00 inf\n");
    }
}
