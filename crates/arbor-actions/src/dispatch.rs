//! Action dispatch: protocol detection and invocation.

use std::sync::Arc;

use arbor_core::RequestContext;

use crate::{
    decode_submission, ActionBody, ActionCodec, ActionError, ActionRegistry, FormState,
    TemporaryReferences,
};

/// Header carrying the action identifier in the direct protocol.
pub const ACTION_HEADER: &str = "x-rsc-action";

/// The result of running the dispatcher over one request.
///
/// `Returned` and `Resumed` are produced by the direct and progressive
/// protocols respectively; at most one protocol applies per request, which
/// is what keeps the payload's `return_value` and `form_state` mutually
/// exclusive.
#[derive(Debug)]
pub enum ActionOutcome {
    /// Render-only request; no action ran.
    RenderOnly,
    /// A direct invocation completed.
    Returned {
        value: serde_json::Value,
        /// Handle table decoded alongside the arguments, needed again when
        /// the response payload is serialized.
        references: TemporaryReferences,
    },
    /// A progressive invocation completed.
    Resumed { form_state: FormState },
}

/// Detects and executes a server action before rendering.
///
/// Dispatch must complete (successfully or not) before the route is
/// resolved so the composed tree reflects any state the action changed.
pub struct ActionDispatcher {
    registry: Arc<dyn ActionRegistry>,
    codec: Arc<dyn ActionCodec>,
}

impl ActionDispatcher {
    /// Create a dispatcher over an action registry and codec.
    pub fn new(registry: Arc<dyn ActionRegistry>, codec: Arc<dyn ActionCodec>) -> Self {
        Self { registry, codec }
    }

    /// Run the applicable protocol for this request, if any.
    pub async fn dispatch(&self, ctx: &RequestContext) -> Result<ActionOutcome, ActionError> {
        if !ctx.method.is_submission() {
            return Ok(ActionOutcome::RenderOnly);
        }

        match ctx.header(ACTION_HEADER) {
            Some(action_id) => self.dispatch_direct(ctx, action_id).await,
            None => self.dispatch_progressive(ctx).await,
        }
    }

    /// Direct protocol: the header names the action, the body carries the
    /// encoded arguments.
    async fn dispatch_direct(
        &self,
        ctx: &RequestContext,
        action_id: &str,
    ) -> Result<ActionOutcome, ActionError> {
        let body = ActionBody::from_content_type(ctx.content_type(), &ctx.body)?;
        let mut references = TemporaryReferences::new();
        let args = self.codec.decode_direct_args(&body, &mut references)?;
        let action = self.registry.resolve(action_id)?;
        let value = action.invoke(args).await?;
        Ok(ActionOutcome::Returned { value, references })
    }

    /// Progressive protocol: the form submission self-describes its target,
    /// used when the client cannot run enhancement script.
    async fn dispatch_progressive(&self, ctx: &RequestContext) -> Result<ActionOutcome, ActionError> {
        let form = decode_submission(ctx.content_type(), &ctx.body)?;
        let decoded = self.codec.decode_progressive(&form)?;
        let action = self.registry.resolve(&decoded.id)?;
        let result = action.invoke(decoded.args).await?;
        let form_state = self.codec.decode_form_state(&result, &form)?;
        Ok(ActionOutcome::Resumed { form_state })
    }
}
