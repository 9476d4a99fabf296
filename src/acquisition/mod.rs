//! Acquisition: make sure the two group catalog files for a snapshot are on disk.
//!
//! The existence check and the download are not coordinated between processes.
//! To keep a crashed or concurrent run from leaving a truncated file behind,
//! each payload is written to `<name>.part` and renamed into place once
//! complete, so an existing final path is always a finished download.

mod client;

pub use client::{filename_from_content_disposition, ArchiveClient};

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use crate::config::{Dataset, Snapshot};
use crate::error::{PipelineError, Result};
use crate::layout::{all_exist, Field, SnapshotKey};

/// Fields requested on a cache miss, in request order
pub const CATALOG_FIELDS: [Field; 2] = [Field::SubhaloMass, Field::SubhaloPos];

/// Raw payload of one archive request
#[derive(Debug, Clone)]
pub struct Download {
    /// Name suggested by the server's `content-disposition`
    pub filename: String,
    pub body: Vec<u8>,
}

/// Something that can produce a catalog field for a snapshot
pub trait FieldSource {
    fn fetch(&self, dataset: Dataset, snapshot: Snapshot, field: Field) -> Result<Download>;
}

/// What [`ensure_catalog`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquisition {
    /// Both files were already present; no request was made
    Cached,
    /// Files written, in request order
    Downloaded(Vec<PathBuf>),
}

/// Download both catalog fields unless both expected files already exist.
///
/// A file the server names differently from the expected cache name is still
/// written, but the run then fails with `MissingInputFile`.
pub fn ensure_catalog(key: &SnapshotKey, source: &dyn FieldSource) -> Result<Acquisition> {
    let expected: Vec<PathBuf> = CATALOG_FIELDS
        .iter()
        .map(|&f| key.catalog_path(f))
        .collect();

    if all_exist(&expected) {
        log::info!(
            "catalog for {} snapshot {} already present",
            key.dataset,
            key.snapshot
        );
        return Ok(Acquisition::Cached);
    }

    log::info!("downloading catalog for {} snapshot {}", key.dataset, key.snapshot);
    let mut written = Vec::with_capacity(CATALOG_FIELDS.len());
    for field in CATALOG_FIELDS {
        let download = source.fetch(key.dataset, key.snapshot, field)?;
        written.push(save_download(key, &download)?);
    }

    if let Some(missing) = expected.into_iter().find(|p| !p.exists()) {
        return Err(PipelineError::MissingInputFile(missing));
    }
    Ok(Acquisition::Downloaded(written))
}

/// Write a payload into the snapshot directory (created if absent)
pub fn save_download(key: &SnapshotKey, download: &Download) -> Result<PathBuf> {
    let dir = key.snapshot_dir();
    fs::create_dir_all(&dir).map_err(|e| PipelineError::io(&dir, e))?;

    let target = dir.join(&download.filename);
    let partial = dir.join(format!("{}.part", download.filename));

    let mut file = fs::File::create(&partial).map_err(|e| PipelineError::io(&partial, e))?;
    file.write_all(&download.body)
        .and_then(|_| file.sync_all())
        .map_err(|e| PipelineError::io(&partial, e))?;
    drop(file);

    fs::rename(&partial, &target).map_err(|e| PipelineError::io(&target, e))?;
    log::debug!("wrote {} ({} bytes)", target.display(), download.body.len());
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Serves canned payloads named the way the archive names them
    struct FakeArchive {
        calls: RefCell<Vec<Field>>,
        rename: bool,
    }

    impl FakeArchive {
        fn new() -> Self {
            Self { calls: RefCell::new(Vec::new()), rename: false }
        }
    }

    impl FieldSource for FakeArchive {
        fn fetch(&self, _dataset: Dataset, snapshot: Snapshot, field: Field) -> Result<Download> {
            self.calls.borrow_mut().push(field);
            let filename = if self.rename {
                format!("renamed.{}.hdf5", field.name())
            } else {
                format!("fof_subhalo_tab_0{snapshot}.Subhalo.{}.hdf5", field.name())
            };
            Ok(Download {
                filename,
                body: format!("payload-{}", field.name()).into_bytes(),
            })
        }
    }

    struct FailingArchive;

    impl FieldSource for FailingArchive {
        fn fetch(&self, dataset: Dataset, snapshot: Snapshot, _field: Field) -> Result<Download> {
            Err(PipelineError::network(
                format!("http://archive/api/{dataset}/files/groupcat-{snapshot}/"),
                "HTTP 403 Forbidden",
            ))
        }
    }

    fn key(root: &std::path::Path) -> SnapshotKey {
        SnapshotKey::new(root, Dataset::Tng50_1Dark, Snapshot::new(99).unwrap())
    }

    #[test]
    fn test_downloads_both_fields_on_miss() {
        let dir = tempfile::tempdir().unwrap();
        let key = key(dir.path());
        let archive = FakeArchive::new();

        let outcome = ensure_catalog(&key, &archive).unwrap();

        assert_eq!(*archive.calls.borrow(), vec![Field::SubhaloMass, Field::SubhaloPos]);
        assert_eq!(
            outcome,
            Acquisition::Downloaded(vec![
                key.catalog_path(Field::SubhaloMass),
                key.catalog_path(Field::SubhaloPos),
            ])
        );
        let body = fs::read(key.catalog_path(Field::SubhaloPos)).unwrap();
        assert_eq!(body, b"payload-SubhaloPos");
        assert!(!key.snapshot_dir().join("fof_subhalo_tab_099.Subhalo.SubhaloPos.hdf5.part").exists());
    }

    #[test]
    fn test_second_run_makes_no_requests() {
        let dir = tempfile::tempdir().unwrap();
        let key = key(dir.path());
        ensure_catalog(&key, &FakeArchive::new()).unwrap();
        let before = fs::read(key.catalog_path(Field::SubhaloMass)).unwrap();

        let archive = FakeArchive::new();
        let outcome = ensure_catalog(&key, &archive).unwrap();

        assert_eq!(outcome, Acquisition::Cached);
        assert!(archive.calls.borrow().is_empty());
        assert_eq!(fs::read(key.catalog_path(Field::SubhaloMass)).unwrap(), before);
    }

    #[test]
    fn test_one_missing_file_refetches_both() {
        let dir = tempfile::tempdir().unwrap();
        let key = key(dir.path());
        ensure_catalog(&key, &FakeArchive::new()).unwrap();
        fs::remove_file(key.catalog_path(Field::SubhaloPos)).unwrap();

        let archive = FakeArchive::new();
        ensure_catalog(&key, &archive).unwrap();
        assert_eq!(archive.calls.borrow().len(), 2);
    }

    #[test]
    fn test_network_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let err = ensure_catalog(&key(dir.path()), &FailingArchive).unwrap_err();
        assert!(matches!(err, PipelineError::Network { .. }));
    }

    #[test]
    fn test_unexpected_server_name_is_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let key = key(dir.path());
        let archive = FakeArchive { calls: RefCell::new(Vec::new()), rename: true };

        let err = ensure_catalog(&key, &archive).unwrap_err();
        assert!(matches!(err, PipelineError::MissingInputFile(_)));
        assert!(key.snapshot_dir().join("renamed.SubhaloPos.hdf5").exists());
    }
}
