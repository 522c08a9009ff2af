//! Temporary reference table for non-serializable argument values.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::ActionError;

/// An opaque value held by handle for the duration of one request.
pub type OpaqueValue = Arc<dyn Any + Send + Sync>;

/// Request-scoped handle table for passing non-primitive values by
/// reference.
///
/// Created fresh for each direct invocation, consulted by the argument
/// decoder, handed to the tree serializer so referenced values can be
/// echoed back, and dropped at the end of the request.
#[derive(Default)]
pub struct TemporaryReferences {
    slots: HashMap<String, OpaqueValue>,
}

impl TemporaryReferences {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a value under a handle, replacing any previous entry.
    pub fn register(&mut self, handle: impl Into<String>, value: OpaqueValue) {
        self.slots.insert(handle.into(), value);
    }

    /// Look up a handle without failing.
    pub fn get(&self, handle: &str) -> Option<&OpaqueValue> {
        self.slots.get(handle)
    }

    /// Resolve a handle, failing if it was never registered.
    pub fn resolve(&self, handle: &str) -> Result<OpaqueValue, ActionError> {
        self.slots
            .get(handle)
            .cloned()
            .ok_or_else(|| ActionError::UnresolvedReference(handle.to_string()))
    }

    /// Number of registered handles.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl std::fmt::Debug for TemporaryReferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemporaryReferences")
            .field("handles", &self.slots.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_resolve() {
        let mut refs = TemporaryReferences::new();
        refs.register("h1", Arc::new("payload".to_string()));
        let value = refs.resolve("h1").unwrap();
        assert_eq!(value.downcast_ref::<String>().unwrap(), "payload");
    }

    #[test]
    fn test_unresolved_handle_fails() {
        let refs = TemporaryReferences::new();
        let err = refs.resolve("missing").unwrap_err();
        assert!(matches!(err, ActionError::UnresolvedReference(h) if h == "missing"));
    }

    #[test]
    fn test_register_replaces() {
        let mut refs = TemporaryReferences::new();
        refs.register("h", Arc::new(1u32));
        refs.register("h", Arc::new(2u32));
        assert_eq!(refs.len(), 1);
        let value = refs.resolve("h").unwrap();
        assert_eq!(*value.downcast_ref::<u32>().unwrap(), 2);
    }
}
