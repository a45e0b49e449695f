// src/settings/mod.rs
//! Configuration handed to the VM bootstrap

use crate::provision::{KernelListProvider, SnapshotProvider};
use crate::runtime::Isolate;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Observer callback run by a task runner after each task
pub type TaskObserver = Arc<dyn Fn() + Send + Sync>;

/// Registers a task observer under a key
pub type TaskObserverAdd = Arc<dyn Fn(isize, TaskObserver) + Send + Sync>;

/// Removes the task observer registered under a key
pub type TaskObserverRemove = Arc<dyn Fn(isize) + Send + Sync>;

/// Runs right after a root isolate is created, before any user code
pub type IsolateCreateCallback = Arc<dyn Fn(&mut Isolate) + Send + Sync>;

/// VM bootstrap settings.
///
/// Artifact slots are written by [`provision`](crate::provision::provision)
/// and read by the bootstrap; an empty slot means the VM must cope without
/// that artifact.
#[derive(Clone, Default)]
pub struct Settings {
    /// Directory the artifacts were resolved against
    pub assets_path: Option<PathBuf>,

    pub vm_snapshot_data: Option<SnapshotProvider>,
    pub isolate_snapshot_data: Option<SnapshotProvider>,
    pub vm_snapshot_instr: Option<SnapshotProvider>,
    pub isolate_snapshot_instr: Option<SnapshotProvider>,

    /// Kernel bytecode units, JIT mode only
    pub application_kernels: Option<KernelListProvider>,

    pub task_observer_add: Option<TaskObserverAdd>,
    pub task_observer_remove: Option<TaskObserverRemove>,
    pub root_isolate_create_callback: Option<IsolateCreateCallback>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot slots that hold a provider, in VM bootstrap order
    pub fn snapshot_providers(&self) -> impl Iterator<Item = &SnapshotProvider> {
        [
            &self.vm_snapshot_data,
            &self.isolate_snapshot_data,
            &self.vm_snapshot_instr,
            &self.isolate_snapshot_instr,
        ]
        .into_iter()
        .flatten()
    }

    /// Number of artifact slots that hold a provider
    pub fn installed_provider_count(&self) -> usize {
        self.snapshot_providers().count() + usize::from(self.application_kernels.is_some())
    }

    /// File names targeted by the installed providers
    pub fn provider_file_names(&self) -> Vec<&'static str> {
        self.snapshot_providers()
            .map(SnapshotProvider::file_name)
            .chain(self.application_kernels.iter().map(KernelListProvider::file_name))
            .collect()
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("assets_path", &self.assets_path)
            .field("vm_snapshot_data", &self.vm_snapshot_data)
            .field("isolate_snapshot_data", &self.isolate_snapshot_data)
            .field("vm_snapshot_instr", &self.vm_snapshot_instr)
            .field("isolate_snapshot_instr", &self.isolate_snapshot_instr)
            .field("application_kernels", &self.application_kernels)
            .field("task_observer_add", &self.task_observer_add.is_some())
            .field("task_observer_remove", &self.task_observer_remove.is_some())
            .field(
                "root_isolate_create_callback",
                &self.root_isolate_create_callback.is_some(),
            )
            .finish()
    }
}
