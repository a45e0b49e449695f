// src/mapping/mod.rs
//! Mapping snapshot artifacts from a base directory
//!
//! A failed open, a failed `mmap`, and an empty file all mean the same thing
//! to callers: the artifact is absent.

pub mod directory;
pub mod file_mapping;

pub use directory::BaseDirectory;
pub use file_mapping::{FileMapping, Protection};

use crate::ArtifactError;
use tracing::debug;

/// Map `name` from `directory`, read+execute when `executable` is set and
/// read-only otherwise.
///
/// Returns `None` if the file cannot be opened, cannot be mapped, or is
/// empty.
pub fn map_artifact(
    directory: &BaseDirectory,
    name: &str,
    executable: bool,
) -> Option<FileMapping> {
    absent_on_error(try_map_artifact(directory, name, executable))
}

/// Like [`map_artifact`] but reports why the artifact is unavailable
pub fn try_map_artifact(
    directory: &BaseDirectory,
    name: &str,
    executable: bool,
) -> Result<FileMapping, ArtifactError> {
    let file = directory.open_file(name).map_err(|source| ArtifactError::Open {
        name: name.to_string(),
        source,
    })?;

    let mapping = FileMapping::new(file, Protection::for_executable(executable)).map_err(|source| {
        ArtifactError::Map {
            name: name.to_string(),
            source,
        }
    })?;

    if !mapping.is_usable() {
        return Err(ArtifactError::Empty {
            name: name.to_string(),
        });
    }

    Ok(mapping)
}

pub(crate) fn absent_on_error(result: Result<FileMapping, ArtifactError>) -> Option<FileMapping> {
    match result {
        Ok(mapping) => Some(mapping),
        Err(err) => {
            debug!(artifact = err.artifact_name(), error = %err, "snapshot artifact unavailable");
            None
        }
    }
}
