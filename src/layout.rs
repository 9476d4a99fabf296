//! On-disk layout of downloaded and derived artifacts.
//!
//! ```text
//! <data_root>/<dataset>/snap_0<snapshot>/
//!     fof_subhalo_tab_0<snapshot>.Subhalo.SubhaloPos.hdf5
//!     fof_subhalo_tab_0<snapshot>.Subhalo.SubhaloMass.hdf5
//!     preprocessed/raw_C<crop>.txt
//!     preprocessed/raw_unnormalized_C<crop>.txt
//!     preprocessed/densities_C<crop>.txt
//!     cubical/DTFE_dim{0,1,2}_C<crop>.txt
//!     rips/PP_dim{0,1}_C<crop>.txt
//! ```
//!
//! The `snap_0<snapshot>` prefix is literal: snapshot 5 lives in `snap_05`,
//! snapshot 99 in `snap_099`.

use std::path::{Path, PathBuf};

use crate::config::{CropPercent, Dataset, Snapshot};

/// Catalog fields served by the archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    SubhaloPos,
    SubhaloMass,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::SubhaloPos => "SubhaloPos",
            Field::SubhaloMass => "SubhaloMass",
        }
    }
}

/// Cache key shared by every stage: data root, simulation and snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotKey {
    pub data_root: PathBuf,
    pub dataset: Dataset,
    pub snapshot: Snapshot,
}

impl SnapshotKey {
    pub fn new(data_root: impl Into<PathBuf>, dataset: Dataset, snapshot: Snapshot) -> Self {
        Self {
            data_root: data_root.into(),
            dataset,
            snapshot,
        }
    }

    pub fn snapshot_dir(&self) -> PathBuf {
        self.data_root
            .join(self.dataset.name())
            .join(format!("snap_0{}", self.snapshot))
    }

    pub fn catalog_file_name(&self, field: Field) -> String {
        format!(
            "fof_subhalo_tab_0{}.Subhalo.{}.hdf5",
            self.snapshot,
            field.name()
        )
    }

    pub fn catalog_path(&self, field: Field) -> PathBuf {
        self.snapshot_dir().join(self.catalog_file_name(field))
    }

    pub fn preprocessed_dir(&self) -> PathBuf {
        self.snapshot_dir().join("preprocessed")
    }

    pub fn cubical_dir(&self) -> PathBuf {
        self.snapshot_dir().join("cubical")
    }

    pub fn rips_dir(&self) -> PathBuf {
        self.snapshot_dir().join("rips")
    }

    pub fn normalized_cloud_path(&self, crop: CropPercent) -> PathBuf {
        self.preprocessed_dir().join(format!("raw_C{crop}.txt"))
    }

    pub fn unnormalized_cloud_path(&self, crop: CropPercent) -> PathBuf {
        self.preprocessed_dir()
            .join(format!("raw_unnormalized_C{crop}.txt"))
    }

    pub fn densities_path(&self, crop: CropPercent) -> PathBuf {
        self.preprocessed_dir().join(format!("densities_C{crop}.txt"))
    }

    pub fn cubical_diagram_path(&self, dim: usize, crop: CropPercent) -> PathBuf {
        self.cubical_dir().join(format!("DTFE_dim{dim}_C{crop}.txt"))
    }

    pub fn rips_diagram_path(&self, dim: usize, crop: CropPercent) -> PathBuf {
        self.rips_dir().join(format!("PP_dim{dim}_C{crop}.txt"))
    }
}

/// True when every path exists
pub fn all_exist<P: AsRef<Path>>(paths: &[P]) -> bool {
    paths.iter().all(|p| p.as_ref().exists())
}
