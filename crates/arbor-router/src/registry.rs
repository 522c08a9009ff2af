//! Registry-backed component locator.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::{LocateError, PathSegments, Unit, UnitKind, UnitRef};

/// Contract for looking up a page or layout by path prefix.
///
/// Absence is a normal outcome and must be reported as `Ok(None)`; the
/// resolver probes many prefixes that have no layout. Any `Err` is treated
/// as fatal for the request.
#[async_trait]
pub trait ComponentSource: Send + Sync {
    /// Locate the unit registered for `segments` with the given kind.
    async fn locate(
        &self,
        segments: &[String],
        kind: UnitKind,
    ) -> Result<Option<UnitRef>, LocateError>;
}

/// A statically-known mapping from (path prefix, kind) to units.
///
/// This replaces dynamic module lookup with a plain registry: applications
/// register their pages and layouts up front and lookups are pure.
#[derive(Default)]
pub struct ComponentRegistry {
    units: HashMap<(Vec<String>, UnitKind), UnitRef>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page at an exact path.
    pub fn page(self, path: &str, unit: impl Unit + 'static) -> Self {
        self.register(path, UnitKind::Page, std::sync::Arc::new(unit))
    }

    /// Register a layout at a path prefix.
    pub fn layout(self, path: &str, unit: impl Unit + 'static) -> Self {
        self.register(path, UnitKind::Layout, std::sync::Arc::new(unit))
    }

    /// Register a shared unit handle.
    pub fn register(mut self, path: &str, kind: UnitKind, unit: UnitRef) -> Self {
        let key = (PathSegments::parse(path).as_slice().to_vec(), kind);
        self.units.insert(key, unit);
        self
    }

    /// Number of registered units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

#[async_trait]
impl ComponentSource for ComponentRegistry {
    async fn locate(
        &self,
        segments: &[String],
        kind: UnitKind,
    ) -> Result<Option<UnitRef>, LocateError> {
        Ok(self.units.get(&(segments.to_vec(), kind)).cloned())
    }
}
