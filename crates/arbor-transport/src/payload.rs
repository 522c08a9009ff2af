//! Response payload assembly.

use arbor_actions::{ActionOutcome, FormState, TemporaryReferences};
use arbor_router::ComposedTree;

/// The single payload serialized into every response.
///
/// `return_value` and `form_state` come from the two action protocols; at
/// most one is ever set, and both are absent on render-only requests.
#[derive(Debug)]
pub struct ResponsePayload {
    /// The composed tree for the resolved route.
    pub root: ComposedTree,
    /// Return value of a direct invocation.
    pub return_value: Option<serde_json::Value>,
    /// Resumable form state of a progressive invocation.
    pub form_state: Option<FormState>,
}

impl ResponsePayload {
    /// Payload for a render-only request.
    pub fn render_only(root: ComposedTree) -> Self {
        Self {
            root,
            return_value: None,
            form_state: None,
        }
    }

    /// Package the resolved tree with whatever the dispatcher produced.
    ///
    /// Pure structural composition. Returns the temporary-reference table
    /// from a direct invocation so the serializer can resolve references
    /// when writing the payload.
    pub fn assemble(
        root: ComposedTree,
        outcome: ActionOutcome,
    ) -> (Self, Option<TemporaryReferences>) {
        match outcome {
            ActionOutcome::RenderOnly => (Self::render_only(root), None),
            ActionOutcome::Returned { value, references } => (
                Self {
                    root,
                    return_value: Some(value),
                    form_state: None,
                },
                Some(references),
            ),
            ActionOutcome::Resumed { form_state } => (
                Self {
                    root,
                    return_value: None,
                    form_state: Some(form_state),
                },
                None,
            ),
        }
    }
}
