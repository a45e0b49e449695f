// src/runtime/mod.rs
//! Runtime side of the harness: isolates and the VM bootstrap stand-in

pub mod bootstrap;
pub mod isolate;

pub use bootstrap::{SnapshotSet, VmBootstrap};
pub use isolate::Isolate;
