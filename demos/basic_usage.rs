// demos/basic_usage.rs
//! Provision snapshot artifacts from a fixtures directory and boot a root
//! isolate with a native callback.
//!
//! Run with:
//!   SNAPSHOT_HARNESS_FIXTURES=path/to/fixtures SNAPSHOT_HARNESS_MODE=jit \
//!     cargo run --example basic_usage

use snapshot_harness::{NativeArguments, RuntimeFixture, Value, VmBootstrap};
use tracing_subscriber::EnvFilter;

fn print_line(args: &mut NativeArguments) {
    println!("  [native] {}", args.arg(0));
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let fixture = RuntimeFixture::from_env()?;
    println!(
        "Fixtures: {} ({} mode)",
        fixture.config().fixtures_path().display(),
        fixture.execution_mode()
    );

    fixture.add_native_callback("PrintLine", print_line);

    let settings = fixture.create_settings_for_fixture();
    println!("Installed providers: {:?}", settings.provider_file_names());

    let bootstrap = VmBootstrap::new(settings);
    let snapshots = bootstrap.load_snapshots();
    println!("Loaded {} artifact(s)", snapshots.loaded_count());
    for (label, mapping) in [
        ("vm data", &snapshots.vm_data),
        ("isolate data", &snapshots.isolate_data),
        ("vm instructions", &snapshots.vm_instructions),
        ("isolate instructions", &snapshots.isolate_instructions),
    ] {
        match mapping {
            Some(m) => println!("  {label}: {} bytes ({})", m.size(), m.protection()),
            None => println!("  {label}: absent"),
        }
    }
    for (i, kernel) in snapshots.kernels.iter().enumerate() {
        println!("  kernel {i}: {} bytes", kernel.size());
    }

    let isolate = bootstrap.create_root_isolate();
    isolate.call_native("PrintLine", vec![Value::from("hello from the root isolate")])?;
    bootstrap.shutdown_isolate(isolate);

    Ok(())
}
