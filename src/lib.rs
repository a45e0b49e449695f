// src/lib.rs
//! # Snapshot Harness
//!
//! Test harness plumbing for booting a VM from on-disk snapshot artifacts.
//!
//! A [`RuntimeFixture`] opens a fixtures directory and builds [`Settings`]
//! for the VM bootstrap. Depending on the [`ExecutionMode`] those settings
//! carry lazy providers for the four precompiled snapshot blobs or for the
//! JIT kernel blob. Each provider memory-maps its file on demand: data
//! read-only, instructions read+execute. Missing or empty files come back
//! as `None`; the bootstrap decides what that means.
//!
//! ## Example
//!
//! ```rust
//! use snapshot_harness::{ExecutionMode, HarnessConfig, RuntimeFixture, VmBootstrap};
//!
//! let dir = tempfile::tempdir().unwrap();
//! std::fs::write(dir.path().join("vm_snapshot_data"), [0u8; 16]).unwrap();
//!
//! let config = HarnessConfig::new(dir.path()).with_execution_mode(ExecutionMode::Precompiled);
//! let fixture = RuntimeFixture::set_up(config);
//! let settings = fixture.create_settings_for_fixture();
//! assert_eq!(settings.installed_provider_count(), 4);
//!
//! let snapshots = VmBootstrap::new(settings).load_snapshots();
//! assert_eq!(snapshots.vm_data.unwrap().size(), 16);
//! assert!(snapshots.isolate_data.is_none());
//! ```

pub mod config;
pub mod fixture;
pub mod mapping;
pub mod natives;
pub mod provision;
pub mod runtime;
pub mod settings;

use std::path::PathBuf;
use thiserror::Error;

pub use config::HarnessConfig;
pub use fixture::RuntimeFixture;
pub use mapping::{map_artifact, BaseDirectory, FileMapping, Protection};
pub use natives::{NativeArguments, NativeFunction, NativeResolver, Value};
pub use provision::{
    provision, ExecutionMode, ExecutionModeOracle, KernelListProvider, ProcessExecutionMode,
    SnapshotProvider,
};
pub use runtime::{Isolate, SnapshotSet, VmBootstrap};
pub use settings::Settings;

/// Why a snapshot artifact could not be produced.
///
/// Never fatal: providers turn every variant into an absent artifact.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("cannot open artifact {name}: {source}")]
    Open {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot map artifact {name}: {source}")]
    Map {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact {name} is empty")]
    Empty { name: String },

    #[error("base directory released before artifact {name} was requested")]
    DirectoryReleased { name: String },
}

impl ArtifactError {
    pub fn artifact_name(&self) -> &str {
        match self {
            ArtifactError::Open { name, .. }
            | ArtifactError::Map { name, .. }
            | ArtifactError::Empty { name }
            | ArtifactError::DirectoryReleased { name } => name,
        }
    }
}

/// Errors setting up the harness
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("cannot open fixtures directory {}: {source}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Worker error: {0}")]
    Worker(String),
}

/// Errors raised inside an isolate
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Unresolved native: {0}")]
    UnresolvedNative(String),

    #[error("No native resolver installed for this isolate")]
    NoResolver,
}
