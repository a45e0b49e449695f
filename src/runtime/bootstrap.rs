// src/runtime/bootstrap.rs
//! Minimal VM bootstrap that consumes [`Settings`]
//!
//! Stands in for the real VM start-up path: it pulls snapshots from the
//! installed providers, creates root isolates, and drives the settings
//! hooks in the order the VM does.

use crate::mapping::FileMapping;
use crate::runtime::Isolate;
use crate::Settings;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Artifacts pulled from a [`Settings`] object.
///
/// Slots whose provider was missing or produced nothing stay empty. Whether
/// that is fatal is up to whoever starts the VM.
#[derive(Debug, Default)]
pub struct SnapshotSet {
    pub vm_data: Option<FileMapping>,
    pub isolate_data: Option<FileMapping>,
    pub vm_instructions: Option<FileMapping>,
    pub isolate_instructions: Option<FileMapping>,
    pub kernels: Vec<FileMapping>,
}

impl SnapshotSet {
    /// Invoke every installed provider once
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            vm_data: settings.vm_snapshot_data.as_ref().and_then(|p| p.produce()),
            isolate_data: settings.isolate_snapshot_data.as_ref().and_then(|p| p.produce()),
            vm_instructions: settings.vm_snapshot_instr.as_ref().and_then(|p| p.produce()),
            isolate_instructions: settings
                .isolate_snapshot_instr
                .as_ref()
                .and_then(|p| p.produce()),
            kernels: settings
                .application_kernels
                .as_ref()
                .map(|p| p.produce())
                .unwrap_or_default(),
        }
    }

    /// Number of mappings that were actually produced
    pub fn loaded_count(&self) -> usize {
        [
            &self.vm_data,
            &self.isolate_data,
            &self.vm_instructions,
            &self.isolate_instructions,
        ]
        .into_iter()
        .filter(|slot| slot.is_some())
        .count()
            + self.kernels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded_count() == 0
    }
}

pub struct VmBootstrap {
    settings: Settings,
    next_isolate_id: AtomicU64,
}

impl VmBootstrap {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            next_isolate_id: AtomicU64::new(1),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn load_snapshots(&self) -> SnapshotSet {
        let snapshots = SnapshotSet::from_settings(&self.settings);
        debug!(
            loaded = snapshots.loaded_count(),
            kernels = snapshots.kernels.len(),
            "loaded VM snapshots"
        );
        snapshots
    }

    /// Load snapshots on a blocking worker thread
    #[cfg(feature = "tokio")]
    pub async fn load_snapshots_async(&self) -> Result<SnapshotSet, crate::HarnessError> {
        let settings = self.settings.clone();
        tokio::task::spawn_blocking(move || SnapshotSet::from_settings(&settings))
            .await
            .map_err(|e| crate::HarnessError::Worker(e.to_string()))
    }

    /// Create a root isolate and run the creation hook before handing it out
    pub fn create_root_isolate(&self) -> Isolate {
        let id = self.next_isolate_id.fetch_add(1, Ordering::Relaxed);
        let mut isolate = Isolate::new(id);

        if let Some(add_observer) = &self.settings.task_observer_add {
            add_observer(
                id as isize,
                Arc::new(move || trace!(isolate = id, "task observer fired")),
            );
        }

        if let Some(on_create) = &self.settings.root_isolate_create_callback {
            on_create(&mut isolate);
        }

        debug!(isolate = id, natives = isolate.has_native_resolver(), "root isolate created");
        isolate
    }

    pub fn shutdown_isolate(&self, isolate: Isolate) {
        if let Some(remove_observer) = &self.settings.task_observer_remove {
            remove_observer(isolate.id() as isize);
        }
        trace!(isolate = isolate.id(), "isolate shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::TaskObserver;
    use parking_lot::Mutex;

    #[test]
    fn test_empty_settings_load_nothing() {
        let bootstrap = VmBootstrap::new(Settings::default());

        let snapshots = bootstrap.load_snapshots();
        assert!(snapshots.is_empty());
        assert!(snapshots.kernels.is_empty());
    }

    #[test]
    fn test_isolate_hooks_run_in_order() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut settings = Settings::default();

        let log = events.clone();
        settings.task_observer_add = Some(Arc::new(move |key: isize, _: TaskObserver| {
            log.lock().push(format!("add {key}"))
        }));
        let log = events.clone();
        settings.task_observer_remove = Some(Arc::new(move |key: isize| {
            log.lock().push(format!("remove {key}"))
        }));
        let log = events.clone();
        settings.root_isolate_create_callback = Some(Arc::new(move |isolate: &mut Isolate| {
            log.lock().push(format!("create {}", isolate.id()))
        }));

        let bootstrap = VmBootstrap::new(settings);
        let first = bootstrap.create_root_isolate();
        let second = bootstrap.create_root_isolate();
        bootstrap.shutdown_isolate(first);
        bootstrap.shutdown_isolate(second);

        assert_eq!(
            *events.lock(),
            vec!["add 1", "create 1", "add 2", "create 2", "remove 1", "remove 2"]
        );
    }
}
