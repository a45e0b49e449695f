// src/runtime/isolate.rs
//! Isolated execution context with its own native symbol resolution

use crate::natives::{NativeArguments, NativeFunction, NativeTable, Value};
use crate::ExecutionError;
use std::sync::Arc;

/// One isolated execution context.
///
/// User code resolves native symbols through the table installed by
/// [`NativeResolver::activate_for_context`](crate::NativeResolver::activate_for_context);
/// until then every native lookup fails.
#[derive(Debug)]
pub struct Isolate {
    id: u64,
    natives: Option<Arc<NativeTable>>,
}

impl Isolate {
    pub fn new(id: u64) -> Self {
        Self { id, natives: None }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn set_native_table(&mut self, table: Arc<NativeTable>) {
        self.natives = Some(table);
    }

    pub fn has_native_resolver(&self) -> bool {
        self.natives.is_some()
    }

    pub fn resolve_native(&self, name: &str) -> Result<NativeFunction, ExecutionError> {
        let table = self.natives.as_ref().ok_or(ExecutionError::NoResolver)?;
        table
            .lookup(name)
            .ok_or_else(|| ExecutionError::UnresolvedNative(name.to_string()))
    }

    /// Call the native registered as `name` and return what it set
    pub fn call_native(&self, name: &str, args: Vec<Value>) -> Result<Value, ExecutionError> {
        let callback = self.resolve_native(name)?;
        let mut args = NativeArguments::new(args);
        callback(&mut args);
        Ok(args.into_return_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NativeResolver;

    fn add(args: &mut NativeArguments) {
        let sum = args.arg(0).as_int() + args.arg(1).as_int();
        args.set_return(sum);
    }

    #[test]
    fn test_no_resolver_before_activation() {
        let isolate = Isolate::new(1);

        assert!(!isolate.has_native_resolver());
        assert!(matches!(
            isolate.call_native("Add", vec![]),
            Err(ExecutionError::NoResolver)
        ));
    }

    #[test]
    fn test_call_activated_native() {
        let resolver = NativeResolver::new();
        resolver.add_native_callback("Add", add);
        let mut isolate = Isolate::new(1);
        resolver.activate_for_context(&mut isolate);

        let result = isolate.call_native("Add", vec![Value::Int(2), Value::Int(3)]).unwrap();
        assert_eq!(result, Value::Int(5));
        assert!(matches!(
            isolate.call_native("Sub", vec![]),
            Err(ExecutionError::UnresolvedNative(name)) if name == "Sub"
        ));
    }
}
