//! Renderable units and the composed tree.

use std::sync::Arc;

/// The kind of unit a locator lookup asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// Leaf unit rendered for an exact route.
    Page,
    /// Unit that wraps nested content at a path prefix.
    Layout,
}

impl UnitKind {
    /// Stable name, used in registry keys and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::Page => "page",
            UnitKind::Layout => "layout",
        }
    }
}

/// An opaque renderable unit (a page or a layout).
///
/// The core never renders units itself; it composes them and hands the tree
/// to the serialization collaborator. Units are immutable and lookups are
/// idempotent.
pub trait Unit: Send + Sync {
    /// Unit name, used for tree outlines and serialization.
    fn name(&self) -> &str;

    /// Serializable props for this unit.
    fn props(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
}

/// Shared handle to a unit.
pub type UnitRef = Arc<dyn Unit>;

/// A unit with a fixed name and props. Sufficient for registries whose
/// rendering happens entirely in the serialization collaborator.
#[derive(Debug, Clone)]
pub struct StaticUnit {
    name: String,
    props: serde_json::Value,
}

impl StaticUnit {
    /// Create a unit with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            props: serde_json::Value::Null,
        }
    }

    /// Attach props.
    pub fn with_props(mut self, props: serde_json::Value) -> Self {
        self.props = props;
        self
    }

    /// Wrap into a shared handle.
    pub fn into_ref(self) -> UnitRef {
        Arc::new(self)
    }
}

impl Unit for StaticUnit {
    fn name(&self) -> &str {
        &self.name
    }

    fn props(&self) -> serde_json::Value {
        self.props.clone()
    }
}

/// Built-in page shown when no page exists for a route.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotFoundView;

impl NotFoundView {
    /// The unit name of the not-found view.
    pub const NAME: &'static str = "not-found";
}

impl Unit for NotFoundView {
    fn name(&self) -> &str {
        Self::NAME
    }
}

/// The full nesting of layouts around a page for one request.
///
/// The page is always the innermost node; the outermost surviving layout is
/// the root.
#[derive(Clone)]
pub struct ComposedTree {
    unit: UnitRef,
    child: Option<Box<ComposedTree>>,
}

impl ComposedTree {
    /// A tree consisting of a single page.
    pub fn leaf(unit: UnitRef) -> Self {
        Self { unit, child: None }
    }

    /// Wrap this tree in a layout, making the layout the new root.
    pub fn wrapped_in(self, layout: UnitRef) -> Self {
        Self {
            unit: layout,
            child: Some(Box::new(self)),
        }
    }

    /// The unit at the root of the tree.
    pub fn unit(&self) -> &UnitRef {
        &self.unit
    }

    /// The wrapped child tree, if this node is a layout.
    pub fn child(&self) -> Option<&ComposedTree> {
        self.child.as_deref()
    }

    /// Nesting depth (1 for a bare page).
    pub fn depth(&self) -> usize {
        1 + self.child.as_ref().map_or(0, |c| c.depth())
    }

    /// Render the nesting as `outer(inner(leaf))`, for logs and assertions.
    pub fn outline(&self) -> String {
        match &self.child {
            Some(child) => format!("{}({})", self.unit.name(), child.outline()),
            None => format!("{}()", self.unit.name()),
        }
    }
}

impl std::fmt::Debug for ComposedTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ComposedTree({})", self.outline())
    }
}
