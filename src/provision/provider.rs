// src/provision/provider.rs
//! Lazy artifact providers installed into [`Settings`](crate::Settings)

use crate::mapping::{absent_on_error, try_map_artifact, BaseDirectory, FileMapping, Protection};
use crate::ArtifactError;
use std::sync::{Arc, Weak};

/// Maps one snapshot file when asked to.
///
/// The provider only holds a weak reference to the fixture's directory.
/// Once the fixture tears down and releases the directory, every call
/// yields `None`.
#[derive(Debug, Clone)]
pub struct SnapshotProvider {
    directory: Weak<BaseDirectory>,
    file_name: &'static str,
    protection: Protection,
}

impl SnapshotProvider {
    pub fn new(
        directory: &Arc<BaseDirectory>,
        file_name: &'static str,
        protection: Protection,
    ) -> Self {
        Self {
            directory: Arc::downgrade(directory),
            file_name,
            protection,
        }
    }

    /// File this provider maps
    pub fn file_name(&self) -> &'static str {
        self.file_name
    }

    pub fn protection(&self) -> Protection {
        self.protection
    }

    /// Map the artifact, `None` if it is unavailable
    pub fn produce(&self) -> Option<FileMapping> {
        absent_on_error(self.try_produce())
    }

    pub fn try_produce(&self) -> Result<FileMapping, ArtifactError> {
        let directory = self
            .directory
            .upgrade()
            .ok_or(ArtifactError::DirectoryReleased {
                name: self.file_name.to_string(),
            })?;
        try_map_artifact(&directory, self.file_name, self.protection.is_executable())
    }
}

/// Produces the ordered list of kernel bytecode units for JIT mode.
///
/// Currently always a single blob; the list shape is what the VM expects.
#[derive(Debug, Clone)]
pub struct KernelListProvider {
    blob: SnapshotProvider,
}

impl KernelListProvider {
    pub fn new(directory: &Arc<BaseDirectory>, file_name: &'static str) -> Self {
        Self {
            blob: SnapshotProvider::new(directory, file_name, Protection::ReadOnly),
        }
    }

    pub fn file_name(&self) -> &'static str {
        self.blob.file_name()
    }

    /// One mapping per kernel, empty when the blob is unavailable
    pub fn produce(&self) -> Vec<FileMapping> {
        self.blob.produce().into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_is_lazy() {
        let dir = tempfile::tempdir().unwrap();
        let base = Arc::new(BaseDirectory::open(dir.path()).unwrap());
        let provider = SnapshotProvider::new(&base, "vm_snapshot_data", Protection::ReadOnly);

        // Created before the file exists, resolved on demand.
        assert!(provider.produce().is_none());
        std::fs::write(dir.path().join("vm_snapshot_data"), [1u8; 8]).unwrap();
        assert_eq!(provider.produce().unwrap().size(), 8);
    }

    #[test]
    fn test_provider_after_directory_release() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("kernel_blob.bin"), b"kernel").unwrap();
        let base = Arc::new(BaseDirectory::open(dir.path()).unwrap());
        let provider = KernelListProvider::new(&base, "kernel_blob.bin");

        assert_eq!(provider.produce().len(), 1);

        drop(base);
        assert!(provider.produce().is_empty());
        assert!(matches!(
            provider.blob.try_produce(),
            Err(ArtifactError::DirectoryReleased { .. })
        ));
    }

    #[test]
    fn test_kernel_list_empty_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let base = Arc::new(BaseDirectory::open(dir.path()).unwrap());
        let provider = KernelListProvider::new(&base, "kernel_blob.bin");

        assert_eq!(provider.file_name(), "kernel_blob.bin");
        assert!(provider.produce().is_empty());
    }
}
