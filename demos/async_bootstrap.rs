// demos/async_bootstrap.rs
//! Load snapshots on a blocking worker while the async runtime stays free.
//!
//! Run with:
//!   SNAPSHOT_HARNESS_FIXTURES=path/to/fixtures \
//!     cargo run --example async_bootstrap --features tokio

use snapshot_harness::{ExecutionMode, HarnessConfig, RuntimeFixture, VmBootstrap};
use std::time::Instant;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = HarnessConfig::from_env()?;
    let mut handles = Vec::new();

    for mode in [ExecutionMode::Precompiled, ExecutionMode::Jit] {
        let config = config.clone().with_execution_mode(mode);
        handles.push(tokio::spawn(async move {
            let fixture = RuntimeFixture::try_set_up(config)?;
            let bootstrap = VmBootstrap::new(fixture.create_settings_for_fixture());

            let start = Instant::now();
            let snapshots = bootstrap.load_snapshots_async().await?;
            let loaded = snapshots.loaded_count();
            Ok::<_, snapshot_harness::HarnessError>((mode, loaded, start.elapsed()))
        }));
    }

    for handle in handles {
        let (mode, loaded, elapsed) = handle.await??;
        println!("{mode}: {loaded} artifact(s) in {:?}", elapsed);
    }

    Ok(())
}
