//! Reference tree serializer.

use arbor_router::ComposedTree;
use async_trait::async_trait;

use crate::{ResponsePayload, SerializeOptions, StreamProducer, TransportError, TreeSerializer};

/// Serializes the payload as newline-delimited JSON chunks.
///
/// One chunk for the root tree, then one each for the return value, form
/// state, and temporary-reference handles when present. Real deployments
/// substitute their wire codec behind the `TreeSerializer` trait; this one
/// keeps the pipeline exercisable and human-inspectable.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTreeSerializer;

fn tree_to_value(tree: &ComposedTree) -> serde_json::Value {
    let mut node = serde_json::json!({
        "unit": tree.unit().name(),
        "props": tree.unit().props(),
    });
    if let Some(child) = tree.child() {
        node["child"] = tree_to_value(child);
    }
    node
}

#[async_trait]
impl TreeSerializer for JsonTreeSerializer {
    async fn serialize(
        &self,
        payload: ResponsePayload,
        opts: SerializeOptions,
        mut out: StreamProducer,
    ) -> Result<(), TransportError> {
        let root = serde_json::json!({ "root": tree_to_value(&payload.root) });
        out.send_str(&format!("{}\n", root)).await?;

        if let Some(value) = &payload.return_value {
            let chunk = serde_json::json!({ "returnValue": value });
            out.send_str(&format!("{}\n", chunk)).await?;
        }
        if let Some(state) = &payload.form_state {
            let chunk = serde_json::json!({ "formState": state.0 });
            out.send_str(&format!("{}\n", chunk)).await?;
        }
        if let Some(refs) = &opts.temporary_references {
            if !refs.is_empty() {
                let chunk = serde_json::json!({ "references": refs.len() });
                out.send_str(&format!("{}\n", chunk)).await?;
            }
        }

        out.complete();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{chunk_channel, fused_body};
    use arbor_actions::{ActionOutcome, TemporaryReferences};
    use arbor_core::TimingContext;
    use arbor_router::StaticUnit;
    use futures::executor::block_on;
    use futures::StreamExt;
    use serde_json::json;

    fn serialize(payload: ResponsePayload, opts: SerializeOptions) -> Vec<String> {
        let (producer, rx) = chunk_channel(4, TimingContext::new());
        let work = async move { JsonTreeSerializer.serialize(payload, opts, producer).await };
        let chunks: Vec<_> = block_on(fused_body(work, rx).collect());
        chunks
            .into_iter()
            .map(|c| String::from_utf8(c.unwrap()).unwrap())
            .collect()
    }

    fn tree() -> ComposedTree {
        ComposedTree::leaf(StaticUnit::new("post-page").into_ref())
            .wrapped_in(StaticUnit::new("root-layout").into_ref())
    }

    #[test]
    fn test_render_only_payload_is_one_chunk() {
        let chunks = serialize(
            ResponsePayload::render_only(tree()),
            SerializeOptions::default(),
        );
        assert_eq!(chunks.len(), 1);
        let parsed: serde_json::Value = serde_json::from_str(&chunks[0]).unwrap();
        assert_eq!(parsed["root"]["unit"], "root-layout");
        assert_eq!(parsed["root"]["child"]["unit"], "post-page");
    }

    #[test]
    fn test_return_value_chunk_follows_tree() {
        let outcome = ActionOutcome::Returned {
            value: json!({"likes": 5}),
            references: TemporaryReferences::new(),
        };
        let (payload, refs) = ResponsePayload::assemble(tree(), outcome);
        let chunks = serialize(
            payload,
            SerializeOptions {
                temporary_references: refs,
            },
        );
        assert_eq!(chunks.len(), 2);
        let second: serde_json::Value = serde_json::from_str(&chunks[1]).unwrap();
        assert_eq!(second["returnValue"]["likes"], 5);
    }
}
