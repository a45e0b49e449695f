// src/natives/mod.rs
//! Host-provided native functions and the registry that exposes them to
//! isolates

pub mod value;

pub use value::Value;

use crate::runtime::Isolate;
use ahash::HashMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::{trace, warn};

/// A host function callable from user code
pub type NativeFunction = fn(&mut NativeArguments);

/// Arguments and return slot of one native call
#[derive(Debug, Clone, Default)]
pub struct NativeArguments {
    args: Vec<Value>,
    return_value: Value,
}

impl NativeArguments {
    pub fn new(args: Vec<Value>) -> Self {
        Self {
            args,
            return_value: Value::Null,
        }
    }

    #[inline]
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// Argument at `index`, `Null` if it was not passed
    #[inline]
    pub fn arg(&self, index: usize) -> &Value {
        static NULL: Value = Value::Null;
        self.args.get(index).unwrap_or(&NULL)
    }

    #[inline]
    pub fn set_return(&mut self, value: impl Into<Value>) {
        self.return_value = value.into();
    }

    pub fn into_return_value(self) -> Value {
        self.return_value
    }
}

/// Resolved view of the registry that an isolate looks natives up in
#[derive(Clone, Default)]
pub struct NativeTable {
    entries: HashMap<String, NativeFunction>,
}

impl NativeTable {
    #[inline]
    pub fn lookup(&self, name: &str) -> Option<NativeFunction> {
        self.entries.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for NativeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

/// Name to native function registry, shared between a test fixture and its
/// isolate-creation hook.
///
/// Entries are only ever added. [`NativeResolver::activate_for_context`]
/// hands an isolate the entries registered up to that point.
#[derive(Default)]
pub struct NativeResolver {
    entries: RwLock<HashMap<String, NativeFunction>>,
}

impl NativeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` under `name`. A second registration under the
    /// same name replaces the first.
    pub fn add_native_callback(&self, name: impl Into<String>, callback: NativeFunction) {
        let name = name.into();
        trace!(native = %name, "registering native callback");
        if self.entries.write().insert(name.clone(), callback).is_some() {
            warn!(native = %name, "native callback registered twice, keeping the latest");
        }
    }

    pub fn resolve(&self, name: &str) -> Option<NativeFunction> {
        self.entries.read().get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Copy of the current registry; later registrations do not show up in it
    pub fn snapshot(&self) -> NativeTable {
        NativeTable {
            entries: self.entries.read().clone(),
        }
    }

    /// Make the registered natives resolvable from `isolate`
    pub fn activate_for_context(&self, isolate: &mut Isolate) {
        let table = self.snapshot();
        trace!(isolate = isolate.id(), natives = table.len(), "activating native resolver");
        isolate.set_native_table(Arc::new(table));
    }
}

impl fmt::Debug for NativeResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeResolver")
            .field("natives", &self.entries.read().keys().collect::<Vec<_>>())
            .finish()
    }
}
