//! Action value model and decoding collaborator contracts.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::{ActionBody, ActionError, FormData, FormValue, OpaqueValue, TemporaryReferences};

/// A decoded action argument.
#[derive(Clone)]
pub enum ActionValue {
    /// A plain serializable value.
    Json(serde_json::Value),
    /// A value passed by temporary reference within this request.
    Opaque(OpaqueValue),
}

impl ActionValue {
    /// The JSON value, if this argument is serializable.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ActionValue::Json(v) => Some(v),
            ActionValue::Opaque(_) => None,
        }
    }
}

impl std::fmt::Debug for ActionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionValue::Json(v) => write!(f, "Json({})", v),
            ActionValue::Opaque(_) => write!(f, "Opaque(..)"),
        }
    }
}

/// Resumable state handed back to the client after a progressive
/// invocation, describing what should be redisplayed.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FormState(pub serde_json::Value);

/// A progressive submission decoded from form fields: the target action id
/// plus its arguments, no separate identifier needed.
#[derive(Debug)]
pub struct ProgressiveAction {
    /// Target action identifier.
    pub id: String,
    /// Decoded arguments.
    pub args: Vec<ActionValue>,
}

/// A callable server action.
#[async_trait]
pub trait ServerAction: Send + Sync {
    /// Invoke the action with decoded arguments.
    async fn invoke(&self, args: Vec<ActionValue>) -> Result<serde_json::Value, ActionError>;
}

/// Resolves action identifiers to callables.
pub trait ActionRegistry: Send + Sync {
    /// Resolve an identifier; unknown identifiers are fatal.
    fn resolve(&self, id: &str) -> Result<Arc<dyn ServerAction>, ActionError>;
}

/// Decoding collaborator for both action protocols.
pub trait ActionCodec: Send + Sync {
    /// Decode a direct-protocol body into an argument list, registering any
    /// temporary references it defines into `refs`.
    fn decode_direct_args(
        &self,
        body: &ActionBody,
        refs: &mut TemporaryReferences,
    ) -> Result<Vec<ActionValue>, ActionError>;

    /// Decode a progressive form submission into its target action and
    /// arguments.
    fn decode_progressive(&self, form: &FormData) -> Result<ProgressiveAction, ActionError>;

    /// Combine an action result with the original submission into resumable
    /// form state.
    fn decode_form_state(
        &self,
        result: &serde_json::Value,
        form: &FormData,
    ) -> Result<FormState, ActionError>;
}

/// Registry of server actions keyed by identifier.
#[derive(Default)]
pub struct ActionTable {
    actions: HashMap<String, Arc<dyn ServerAction>>,
}

impl ActionTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action under an identifier.
    pub fn action(mut self, id: impl Into<String>, action: impl ServerAction + 'static) -> Self {
        self.actions.insert(id.into(), Arc::new(action));
        self
    }
}

impl ActionRegistry for ActionTable {
    fn resolve(&self, id: &str) -> Result<Arc<dyn ServerAction>, ActionError> {
        self.actions
            .get(id)
            .cloned()
            .ok_or_else(|| ActionError::UnknownAction(id.to_string()))
    }
}

/// A server action backed by a plain function.
pub struct FnAction<F>(pub F);

#[async_trait]
impl<F> ServerAction for FnAction<F>
where
    F: Fn(Vec<ActionValue>) -> Result<serde_json::Value, ActionError> + Send + Sync,
{
    async fn invoke(&self, args: Vec<ActionValue>) -> Result<serde_json::Value, ActionError> {
        (self.0)(args)
    }
}

/// Reference codec over the field conventions of the wire format.
///
/// Direct text bodies are JSON argument arrays. An object of the shape
/// `{"$tmp": "<handle>", "value": ...}` defines a temporary reference and
/// passes it as an argument; the string `"$ref:<handle>"` passes a
/// previously defined reference. Multipart direct bodies take text fields
/// as JSON-encoded arguments in field order, while file fields are
/// registered as temporary references under their field name.
///
/// Progressive forms name their target in a `$action` field; the remaining
/// fields become a single object argument.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldCodec;

impl FieldCodec {
    const ACTION_FIELD: &'static str = "$action";
    const REF_PREFIX: &'static str = "$ref:";
    const TMP_KEY: &'static str = "$tmp";

    fn decode_element(
        value: serde_json::Value,
        refs: &mut TemporaryReferences,
    ) -> Result<ActionValue, ActionError> {
        if let serde_json::Value::String(s) = &value {
            if let Some(handle) = s.strip_prefix(Self::REF_PREFIX) {
                return Ok(ActionValue::Opaque(refs.resolve(handle)?));
            }
        }
        if let serde_json::Value::Object(map) = &value {
            if let Some(serde_json::Value::String(handle)) = map.get(Self::TMP_KEY) {
                let inner = map.get("value").cloned().unwrap_or(serde_json::Value::Null);
                let opaque: OpaqueValue = Arc::new(inner);
                refs.register(handle.clone(), Arc::clone(&opaque));
                return Ok(ActionValue::Opaque(opaque));
            }
        }
        Ok(ActionValue::Json(value))
    }
}

impl ActionCodec for FieldCodec {
    fn decode_direct_args(
        &self,
        body: &ActionBody,
        refs: &mut TemporaryReferences,
    ) -> Result<Vec<ActionValue>, ActionError> {
        match body {
            ActionBody::Text(text) => {
                let parsed: serde_json::Value = serde_json::from_str(text)
                    .map_err(|e| ActionError::DecodeFailure(format!("bad argument body: {}", e)))?;
                let serde_json::Value::Array(elements) = parsed else {
                    return Err(ActionError::DecodeFailure(
                        "argument body must be a JSON array".into(),
                    ));
                };
                elements
                    .into_iter()
                    .map(|e| Self::decode_element(e, refs))
                    .collect()
            }
            ActionBody::Form(form) => {
                let mut args = Vec::new();
                for (name, value) in form.entries() {
                    match value {
                        FormValue::Text(text) => {
                            let parsed: serde_json::Value =
                                serde_json::from_str(text).map_err(|e| {
                                    ActionError::DecodeFailure(format!(
                                        "bad argument field '{}': {}",
                                        name, e
                                    ))
                                })?;
                            args.push(Self::decode_element(parsed, refs)?);
                        }
                        FormValue::File { data, .. } => {
                            let opaque: OpaqueValue = Arc::new(data.clone());
                            refs.register(name.clone(), Arc::clone(&opaque));
                            args.push(ActionValue::Opaque(opaque));
                        }
                    }
                }
                Ok(args)
            }
        }
    }

    fn decode_progressive(&self, form: &FormData) -> Result<ProgressiveAction, ActionError> {
        let id = form
            .text(Self::ACTION_FIELD)
            .ok_or_else(|| {
                ActionError::DecodeFailure("submission does not name a target action".into())
            })?
            .to_string();

        let mut fields = serde_json::Map::new();
        for (name, value) in form.entries() {
            if name == Self::ACTION_FIELD {
                continue;
            }
            let field_value = match value {
                FormValue::Text(t) => serde_json::Value::String(t.clone()),
                FormValue::File { filename, .. } => serde_json::Value::String(filename.clone()),
            };
            fields.insert(name.clone(), field_value);
        }

        Ok(ProgressiveAction {
            id,
            args: vec![ActionValue::Json(serde_json::Value::Object(fields))],
        })
    }

    fn decode_form_state(
        &self,
        result: &serde_json::Value,
        form: &FormData,
    ) -> Result<FormState, ActionError> {
        let mut fields = serde_json::Map::new();
        for (name, value) in form.entries() {
            if name == Self::ACTION_FIELD {
                continue;
            }
            if let FormValue::Text(t) = value {
                fields.insert(name.clone(), serde_json::Value::String(t.clone()));
            }
        }
        Ok(FormState(serde_json::json!({
            "value": result,
            "fields": fields,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    impl std::fmt::Debug for dyn ServerAction {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("ServerAction")
        }
    }

    // === Direct decoding ===

    #[test]
    fn test_decode_plain_json_args() {
        let body = ActionBody::Text(r#"["post-1", 2, {"flag": true}]"#.to_string());
        let mut refs = TemporaryReferences::new();
        let args = FieldCodec.decode_direct_args(&body, &mut refs).unwrap();
        assert_eq!(args.len(), 3);
        assert_eq!(args[0].as_json().unwrap(), "post-1");
        assert!(refs.is_empty());
    }

    #[test]
    fn test_decode_registers_and_resolves_temp_refs() {
        let body = ActionBody::Text(
            r#"[{"$tmp": "h1", "value": {"cyclic": true}}, "$ref:h1"]"#.to_string(),
        );
        let mut refs = TemporaryReferences::new();
        let args = FieldCodec.decode_direct_args(&body, &mut refs).unwrap();
        assert_eq!(refs.len(), 1);
        assert!(matches!(args[0], ActionValue::Opaque(_)));
        assert!(matches!(args[1], ActionValue::Opaque(_)));
    }

    #[test]
    fn test_decode_unresolved_ref_fails() {
        let body = ActionBody::Text(r#"["$ref:never-defined"]"#.to_string());
        let mut refs = TemporaryReferences::new();
        let err = FieldCodec.decode_direct_args(&body, &mut refs).unwrap_err();
        assert!(matches!(err, ActionError::UnresolvedReference(_)));
    }

    #[test]
    fn test_decode_non_array_body_fails() {
        let body = ActionBody::Text(r#"{"not": "an array"}"#.to_string());
        let mut refs = TemporaryReferences::new();
        let err = FieldCodec.decode_direct_args(&body, &mut refs).unwrap_err();
        assert!(matches!(err, ActionError::DecodeFailure(_)));
    }

    #[test]
    fn test_decode_multipart_file_becomes_reference() {
        let mut form = FormData::new();
        form.push_text("0", r#""slug""#);
        form.push(
            "upload",
            FormValue::File {
                filename: "a.bin".into(),
                content_type: None,
                data: vec![1, 2, 3],
            },
        );
        let mut refs = TemporaryReferences::new();
        let args = FieldCodec
            .decode_direct_args(&ActionBody::Form(form), &mut refs)
            .unwrap();
        assert_eq!(args[0].as_json().unwrap(), "slug");
        assert!(refs.get("upload").is_some());
    }

    // === Progressive decoding ===

    #[test]
    fn test_progressive_self_describes_action() {
        let mut form = FormData::new();
        form.push_text("$action", "app/login");
        form.push_text("username", "ada");
        let decoded = FieldCodec.decode_progressive(&form).unwrap();
        assert_eq!(decoded.id, "app/login");
        assert_eq!(decoded.args[0].as_json().unwrap()["username"], "ada");
    }

    #[test]
    fn test_progressive_without_action_field_fails() {
        let mut form = FormData::new();
        form.push_text("username", "ada");
        let err = FieldCodec.decode_progressive(&form).unwrap_err();
        assert!(matches!(err, ActionError::DecodeFailure(_)));
    }

    #[test]
    fn test_form_state_carries_result_and_fields() {
        let mut form = FormData::new();
        form.push_text("$action", "app/login");
        form.push_text("username", "ada");
        let state = FieldCodec
            .decode_form_state(&json!({"ok": true}), &form)
            .unwrap();
        assert_eq!(state.0["value"]["ok"], true);
        assert_eq!(state.0["fields"]["username"], "ada");
        assert!(state.0["fields"].get("$action").is_none());
    }

    // === Registry ===

    #[test]
    fn test_action_table_resolves() {
        let table =
            ActionTable::new().action(
                "app/like",
                FnAction(|_args: Vec<ActionValue>| Ok(json!({"likes": 1}))),
            );
        assert!(table.resolve("app/like").is_ok());
        let err = table.resolve("app/unknown").unwrap_err();
        assert!(matches!(err, ActionError::UnknownAction(_)));
    }
}
