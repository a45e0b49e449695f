// src/fixture/mod.rs
//! Per-test fixture that owns the artifact directory and native registry
//!
//! ```rust,no_run
//! use snapshot_harness::{ExecutionMode, HarnessConfig, RuntimeFixture, VmBootstrap};
//!
//! let config = HarnessConfig::new("fixtures").with_execution_mode(ExecutionMode::Jit);
//! let fixture = RuntimeFixture::set_up(config);
//!
//! let bootstrap = VmBootstrap::new(fixture.create_settings_for_fixture());
//! let snapshots = bootstrap.load_snapshots();
//! let isolate = bootstrap.create_root_isolate();
//! ```

use crate::mapping::BaseDirectory;
use crate::natives::{NativeFunction, NativeResolver};
use crate::provision::{provision, ExecutionMode};
use crate::runtime::Isolate;
use crate::settings::TaskObserver;
use crate::{HarnessConfig, HarnessError, Settings};
use std::sync::Arc;
use tracing::{debug, warn};

/// Test fixture for anything that boots a VM.
///
/// Providers handed out through [`RuntimeFixture::create_settings_for_fixture`]
/// must be invoked before [`RuntimeFixture::tear_down`]; afterwards they
/// produce nothing. Dropping the fixture tears it down, so bind it to a local
/// that outlives the settings rather than calling through a temporary.
#[derive(Debug)]
pub struct RuntimeFixture {
    config: HarnessConfig,
    assets_dir: Option<Arc<BaseDirectory>>,
    native_resolver: Arc<NativeResolver>,
}

impl RuntimeFixture {
    /// Open the fixtures directory and start with an empty native registry.
    ///
    /// A directory that cannot be opened is logged and left unset, so
    /// artifact provisioning becomes a no-op.
    pub fn set_up(config: HarnessConfig) -> Self {
        let assets_dir = match BaseDirectory::open(config.fixtures_path()) {
            Ok(dir) => Some(Arc::new(dir)),
            Err(err) => {
                warn!(
                    path = %config.fixtures_path().display(),
                    error = %err,
                    "fixtures directory unavailable, snapshots will not be provisioned"
                );
                None
            }
        };
        Self::with_assets(config, assets_dir)
    }

    /// Like [`RuntimeFixture::set_up`] but fails if the directory cannot be opened
    pub fn try_set_up(config: HarnessConfig) -> Result<Self, HarnessError> {
        let dir = BaseDirectory::open(config.fixtures_path()).map_err(|source| {
            HarnessError::Directory {
                path: config.fixtures_path().to_path_buf(),
                source,
            }
        })?;
        Ok(Self::with_assets(config, Some(Arc::new(dir))))
    }

    /// Set up from [`HarnessConfig::from_env`]
    pub fn from_env() -> Result<Self, HarnessError> {
        Ok(Self::set_up(HarnessConfig::from_env()?))
    }

    fn with_assets(config: HarnessConfig, assets_dir: Option<Arc<BaseDirectory>>) -> Self {
        debug!(
            path = %config.fixtures_path().display(),
            mode = %config.execution_mode(),
            assets = assets_dir.is_some(),
            "runtime fixture set up"
        );
        Self {
            config,
            assets_dir,
            native_resolver: Arc::new(NativeResolver::new()),
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn execution_mode(&self) -> ExecutionMode {
        self.config.execution_mode()
    }

    pub fn assets_dir(&self) -> Option<&Arc<BaseDirectory>> {
        self.assets_dir.as_ref()
    }

    pub fn native_resolver(&self) -> &Arc<NativeResolver> {
        &self.native_resolver
    }

    /// Fresh settings with no-op task observers, the native-activation hook,
    /// and snapshot providers for this fixture's mode.
    ///
    /// The fixture must outlive the returned settings: dropping it releases
    /// the directory and every provider yields nothing from then on.
    pub fn create_settings_for_fixture(&self) -> Settings {
        let mut settings = Settings::new();
        settings.task_observer_add = Some(Arc::new(|_: isize, _: TaskObserver| {}));
        settings.task_observer_remove = Some(Arc::new(|_: isize| {}));

        let resolver = Arc::clone(&self.native_resolver);
        settings.root_isolate_create_callback = Some(Arc::new(move |isolate: &mut Isolate| {
            resolver.activate_for_context(isolate);
        }));

        self.set_snapshots_and_assets(&mut settings);
        settings
    }

    /// Install snapshot providers into `settings`; no-op without a directory
    pub fn set_snapshots_and_assets(&self, settings: &mut Settings) {
        provision(settings, self.assets_dir.as_ref(), &self.execution_mode());
    }

    /// Register a native callback. Must happen before the root isolate is
    /// created for it to be visible there.
    pub fn add_native_callback(&self, name: impl Into<String>, callback: NativeFunction) {
        self.native_resolver.add_native_callback(name, callback);
    }

    /// Release the fixtures directory
    pub fn tear_down(&mut self) {
        if self.assets_dir.take().is_some() {
            debug!(path = %self.config.fixtures_path().display(), "runtime fixture torn down");
        }
    }
}

impl Drop for RuntimeFixture {
    fn drop(&mut self) {
        self.tear_down();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::natives::{NativeArguments, Value};
    use crate::provision::{KERNEL_BLOB, VM_SNAPSHOT_DATA};
    use crate::runtime::VmBootstrap;

    fn ping(args: &mut NativeArguments) {
        args.set_return("pong");
    }

    fn config_for(path: impl Into<std::path::PathBuf>, mode: ExecutionMode) -> HarnessConfig {
        HarnessConfig::new(path).with_execution_mode(mode)
    }

    #[test]
    fn test_missing_directory_degrades_to_noop() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path().join("absent"), ExecutionMode::Precompiled);

        let fixture = RuntimeFixture::set_up(config.clone());
        let settings = fixture.create_settings_for_fixture();

        assert!(fixture.assets_dir().is_none());
        assert_eq!(settings.installed_provider_count(), 0);
        assert!(settings.root_isolate_create_callback.is_some());
        assert!(matches!(
            RuntimeFixture::try_set_up(config),
            Err(HarnessError::Directory { .. })
        ));
    }

    #[test]
    fn test_settings_follow_configured_mode() {
        let dir = tempfile::tempdir().unwrap();

        let aot = RuntimeFixture::set_up(config_for(dir.path(), ExecutionMode::Precompiled));
        let names = aot.create_settings_for_fixture().provider_file_names();
        assert!(names.contains(&VM_SNAPSHOT_DATA));

        let jit = RuntimeFixture::set_up(config_for(dir.path(), ExecutionMode::Jit));
        assert_eq!(jit.create_settings_for_fixture().provider_file_names(), vec![KERNEL_BLOB]);
    }

    #[test]
    fn test_root_isolate_sees_natives() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = RuntimeFixture::set_up(config_for(dir.path(), ExecutionMode::Jit));
        fixture.add_native_callback("Ping", ping);

        let bootstrap = VmBootstrap::new(fixture.create_settings_for_fixture());
        let isolate = bootstrap.create_root_isolate();

        assert_eq!(isolate.call_native("Ping", vec![]).unwrap(), Value::from("pong"));
    }

    #[test]
    fn test_tear_down_invalidates_providers() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(KERNEL_BLOB), b"kernel").unwrap();
        let mut fixture = RuntimeFixture::set_up(config_for(dir.path(), ExecutionMode::Jit));
        let settings = fixture.create_settings_for_fixture();
        let kernels = settings.application_kernels.as_ref().unwrap();

        assert_eq!(kernels.produce().len(), 1);
        fixture.tear_down();
        assert!(kernels.produce().is_empty());
    }

    #[test]
    fn test_dropped_fixture_invalidates_providers() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(KERNEL_BLOB), b"kernel").unwrap();

        let settings = RuntimeFixture::set_up(config_for(dir.path(), ExecutionMode::Jit))
            .create_settings_for_fixture();

        assert_eq!(settings.installed_provider_count(), 1);
        assert!(settings.application_kernels.as_ref().unwrap().produce().is_empty());
    }
}
