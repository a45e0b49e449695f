// src/provision/mod.rs
//! Deciding which snapshot artifacts the VM needs and installing providers
//! for them
//!
//! | Mode        | Artifact                 | Protection |
//! |-------------|--------------------------|------------|
//! | precompiled | `vm_snapshot_data`       | r--        |
//! | precompiled | `isolate_snapshot_data`  | r--        |
//! | precompiled | `vm_snapshot_instr`      | r-x        |
//! | precompiled | `isolate_snapshot_instr` | r-x        |
//! | jit         | `kernel_blob.bin`        | r--        |

pub mod mode;
pub mod provider;

pub use mode::{ExecutionMode, ExecutionModeOracle, ProcessExecutionMode};
pub use provider::{KernelListProvider, SnapshotProvider};

use crate::mapping::{BaseDirectory, Protection};
use crate::Settings;
use std::sync::Arc;
use tracing::{debug, trace};

pub const VM_SNAPSHOT_DATA: &str = "vm_snapshot_data";
pub const ISOLATE_SNAPSHOT_DATA: &str = "isolate_snapshot_data";
pub const VM_SNAPSHOT_INSTRUCTIONS: &str = "vm_snapshot_instr";
pub const ISOLATE_SNAPSHOT_INSTRUCTIONS: &str = "isolate_snapshot_instr";
pub const KERNEL_BLOB: &str = "kernel_blob.bin";

/// Install artifact providers for `mode` into `settings`.
///
/// Without a base directory this is a no-op and `settings` is left untouched.
/// The oracle is consulted once per call.
///
/// Expects fresh [`Settings`]: only the slots for the current mode are
/// written, so providers installed by an earlier call for the other mode
/// stay in place.
pub fn provision<M>(settings: &mut Settings, directory: Option<&Arc<BaseDirectory>>, mode: &M)
where
    M: ExecutionModeOracle + ?Sized,
{
    let Some(directory) = directory else {
        trace!("no base directory, skipping artifact provisioning");
        return;
    };

    settings.assets_path = Some(directory.path().to_path_buf());

    let mode = mode.execution_mode();
    match mode {
        ExecutionMode::Precompiled => {
            settings.vm_snapshot_data = Some(SnapshotProvider::new(
                directory,
                VM_SNAPSHOT_DATA,
                Protection::ReadOnly,
            ));
            settings.isolate_snapshot_data = Some(SnapshotProvider::new(
                directory,
                ISOLATE_SNAPSHOT_DATA,
                Protection::ReadOnly,
            ));
            // Instructions are installed under the same mode reading as the
            // data; a second query could never disagree with the first.
            settings.vm_snapshot_instr = Some(SnapshotProvider::new(
                directory,
                VM_SNAPSHOT_INSTRUCTIONS,
                Protection::ReadExecute,
            ));
            settings.isolate_snapshot_instr = Some(SnapshotProvider::new(
                directory,
                ISOLATE_SNAPSHOT_INSTRUCTIONS,
                Protection::ReadExecute,
            ));
        }
        ExecutionMode::Jit => {
            settings.application_kernels = Some(KernelListProvider::new(directory, KERNEL_BLOB));
        }
    }

    debug!(
        %mode,
        directory = %directory.path().display(),
        providers = settings.installed_provider_count(),
        "provisioned snapshot artifacts"
    );
}
