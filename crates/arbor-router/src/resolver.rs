//! Route resolution: page lookup and layout chain composition.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;

use crate::{ComponentSource, ComposedTree, LocateError, NotFoundView, PathSegments, UnitKind};

#[async_trait]
impl<S: ComponentSource + ?Sized> ComponentSource for Arc<S> {
    async fn locate(
        &self,
        segments: &[String],
        kind: UnitKind,
    ) -> Result<Option<crate::UnitRef>, LocateError> {
        (**self).locate(segments, kind).await
    }
}

/// Resolves a request path to a composed tree of layouts around a page.
pub struct RouteResolver<S> {
    source: S,
}

impl<S: ComponentSource> RouteResolver<S> {
    /// Create a resolver over a component source.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Resolve a request path.
    ///
    /// When no page exists for the path this still succeeds: the built-in
    /// not-found view is composed inside the root layout (or stands alone
    /// when there is no root layout). Locator failures other than absence
    /// propagate.
    pub async fn resolve(&self, path: &str) -> Result<ComposedTree, LocateError> {
        let segments = PathSegments::parse(path);

        let page = self
            .source
            .locate(segments.as_slice(), UnitKind::Page)
            .await?;

        let Some(page) = page else {
            let tree = ComposedTree::leaf(Arc::new(NotFoundView));
            return Ok(match self.source.locate(&[], UnitKind::Layout).await? {
                Some(root_layout) => tree.wrapped_in(root_layout),
                None => tree,
            });
        };

        // Probe every prefix 0..=N for a layout as one concurrent batch.
        // Results come back in prefix order regardless of completion order.
        let probes = (0..=segments.len())
            .map(|len| self.source.locate(segments.prefix(len), UnitKind::Layout));
        let chain = try_join_all(probes).await?;

        // Fold innermost-out so the root layout ends up at the tree root.
        let mut tree = ComposedTree::leaf(page);
        for layout in chain.into_iter().flatten().rev() {
            tree = tree.wrapped_in(layout);
        }
        Ok(tree)
    }
}
