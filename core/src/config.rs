// Configuration — resolve a dataset profile into an immutable handle
//
// A handle is either backed by a private copy of the dataset or attached to a
// shared segment. Both backings expose the same `Dataset`, so everything
// downstream is unaware of how the data was loaded.

use crate::dataset::{shared, Dataset, Profile};
use crate::error::{Error, Result};
use std::sync::Arc;
use tracing::info;

/// Where a handle's dataset lives
#[derive(Debug, Clone)]
pub enum Backing {
    /// Loaded into process-private memory for this handle
    Private(Arc<Dataset>),
    /// Attached to a named shared segment
    Shared { segment: String, data: Arc<Dataset> },
}

/// Immutable, cheaply cloneable reference to a loaded dataset.
#[derive(Debug, Clone)]
pub struct DatasetHandle {
    backing: Backing,
}

impl DatasetHandle {
    pub fn dataset(&self) -> &Dataset {
        match &self.backing {
            Backing::Private(data) => data.as_ref(),
            Backing::Shared { data, .. } => data.as_ref(),
        }
    }

    pub(crate) fn shared_dataset(&self) -> Arc<Dataset> {
        match &self.backing {
            Backing::Private(data) => Arc::clone(data),
            Backing::Shared { data, .. } => Arc::clone(data),
        }
    }

    pub fn backing(&self) -> &Backing {
        &self.backing
    }

    /// Segment name when attached to shared memory.
    pub fn segment(&self) -> Option<&str> {
        match &self.backing {
            Backing::Private(_) => None,
            Backing::Shared { segment, .. } => Some(segment),
        }
    }

    pub fn is_shared(&self) -> bool {
        self.segment().is_some()
    }

    pub fn checksum(&self) -> u32 {
        self.dataset().checksum()
    }

    pub fn timestamp(&self) -> &str {
        self.dataset().timestamp()
    }
}

impl From<Dataset> for DatasetHandle {
    fn from(dataset: Dataset) -> Self {
        Self {
            backing: Backing::Private(Arc::new(dataset)),
        }
    }
}

pub struct Configuration;

impl Configuration {
    /// Load the dataset named by `profile`.
    ///
    /// With `use_shared_memory` the handle attaches to the segment for the
    /// profile, publishing it first if nobody has yet.
    pub fn load(profile: &str, use_shared_memory: bool) -> Result<DatasetHandle> {
        if profile.is_empty() {
            return Err(Error::invalid("dataset profile path must not be empty"));
        }

        let profile = Profile::load(profile)?;
        let backing = if use_shared_memory {
            let (segment, data) = shared::attach(&profile)?;
            info!("Attached {} to shared segment {}", profile.source, segment);
            Backing::Shared { segment, data }
        } else {
            Backing::Private(Arc::new(Dataset::load(&profile)?))
        };

        Ok(DatasetHandle { backing })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, FileKind};
    use crate::fixtures;

    #[test]
    fn test_empty_profile_path_rejected() {
        let err = Configuration::load("", false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_private_and_shared_agree() {
        let dir = tempfile::tempdir().unwrap();
        let profile = fixtures::write_berlin(dir.path()).unwrap();

        let private = Configuration::load(&profile, false).unwrap();
        let shared_handle = Configuration::load(&profile, true).unwrap();

        assert!(!private.is_shared());
        assert!(shared_handle.is_shared());
        assert_eq!(private.checksum(), shared_handle.checksum());
        assert_eq!(private.timestamp(), shared_handle.timestamp());
        assert_eq!(
            private.dataset().edge_count(),
            shared_handle.dataset().edge_count()
        );

        let segment = shared_handle.segment().unwrap().to_string();
        assert!(shared::release(&segment));
        // The handle keeps its data after the segment is released
        assert_eq!(shared_handle.checksum(), private.checksum());
    }

    #[test]
    fn test_missing_referenced_file() {
        let dir = tempfile::tempdir().unwrap();
        let profile = fixtures::write_berlin(dir.path()).unwrap();
        std::fs::remove_file(dir.path().join("berlin.graph")).unwrap();

        let err = Configuration::load(&profile, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReferencedFileMissing);
        assert!(matches!(
            err,
            Error::ReferencedFileMissing {
                kind: FileKind::Graph,
                ..
            }
        ));
    }

    #[test]
    fn test_shared_load_failure_publishes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let profile = fixtures::write_berlin(dir.path()).unwrap();
        std::fs::write(dir.path().join("berlin.nodes"), b"").unwrap();

        let err = Configuration::load(&profile, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReferencedFileCorrupt);
        let name = Profile::load(&profile).unwrap().segment_name();
        assert!(shared::lookup(&name).is_none());
    }
}
