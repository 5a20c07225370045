//! OpenAPI document skeleton for serde deserialization.
//!
//! Only the parts the compiler walks are modeled: `components.schemas` and the
//! operations under `paths`. Schema bodies are kept as raw JSON values and
//! handed to the [`reader`](crate::reader), which parses the schema subset we
//! understand into a closed variant.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{CompileError, Result};

/// HTTP methods recognized as operation keys of a path item.
pub const HTTP_METHODS: &[&str] = &[
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Root of an OpenAPI document (entry or referenced).
#[derive(Debug, Default, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub components: Components,
    /// Route template to path item. A path item maps keys to operations, but
    /// may also carry non-operation keys such as `summary`.
    #[serde(default)]
    pub paths: IndexMap<String, IndexMap<String, Value>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub schemas: IndexMap<String, Value>,
}

/// A single API operation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    pub request_body: Option<RequestBody>,
    pub responses: Option<IndexMap<String, Response>>,
}

/// A `path` or `query` parameter.
#[derive(Debug, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Deserialize)]
pub struct RequestBody {
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
}

#[derive(Debug, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
}

#[derive(Debug, Deserialize)]
pub struct MediaType {
    pub schema: Option<Value>,
}

impl MediaType {
    /// The schema of the `application/json` entry of a content map, if any.
    pub fn json_schema(content: &IndexMap<String, MediaType>) -> Option<&Value> {
        content
            .get("application/json")
            .and_then(|media| media.schema.as_ref())
    }
}

impl Document {
    /// Deserialize a decoded document tree.
    pub fn from_value(value: Value, file: &str) -> Result<Document> {
        if value.is_null() {
            return Ok(Document::default());
        }
        serde_json::from_value(value)
            .map_err(|e| CompileError::format(format!("invalid OpenAPI document `{file}`: {e}")))
    }

    /// Operations of a path item, in document order, paired with their
    /// lower-case method key. Non-operation keys are skipped.
    pub fn operations<'a>(
        item: &'a IndexMap<String, Value>,
    ) -> impl Iterator<Item = (&'a str, &'a Value)> + 'a {
        item.iter()
            .filter(|(key, _)| HTTP_METHODS.contains(&key.to_ascii_lowercase().as_str()))
            .map(|(key, value)| (key.as_str(), value))
    }
}

impl Operation {
    pub fn from_value(value: &Value, method: &str, route: &str) -> Result<Operation> {
        Operation::deserialize(value).map_err(|e| {
            CompileError::format(format!(
                "invalid operation `{} {route}`: {e}",
                method.to_ascii_uppercase()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_sections_default_to_empty() {
        let doc = Document::from_value(json!({ "openapi": "3.0.0" }), "a.yaml")
            .expect("minimal document deserializes");
        assert!(doc.components.schemas.is_empty());
        assert!(doc.paths.is_empty());
    }

    #[test]
    fn non_operation_keys_are_skipped() {
        let doc = Document::from_value(
            json!({
                "paths": {
                    "/items": {
                        "summary": "Items",
                        "parameters": [],
                        "get": { "responses": {} },
                        "POST": { "responses": {} }
                    }
                }
            }),
            "a.yaml",
        )
        .expect("document deserializes");
        let item = &doc.paths["/items"];
        let methods: Vec<_> = Document::operations(item).map(|(m, _)| m).collect();
        assert_eq!(methods, vec!["get", "POST"]);
    }

    #[test]
    fn operation_parameters_and_body() {
        let op = Operation::from_value(
            &json!({
                "parameters": [
                    { "name": "id", "in": "path", "required": true },
                    { "name": "q", "in": "query" }
                ],
                "requestBody": {
                    "content": { "application/json": { "schema": { "type": "string" } } }
                },
                "responses": { "200": { "description": "ok" } }
            }),
            "put",
            "/items/{id}",
        )
        .expect("operation deserializes");
        assert_eq!(op.parameters.len(), 2);
        assert!(op.parameters[0].required);
        assert!(!op.parameters[1].required);
        let body = op.request_body.expect("body present");
        assert_eq!(
            MediaType::json_schema(&body.content),
            Some(&json!({ "type": "string" }))
        );
        assert!(op.responses.expect("responses present").contains_key("200"));
    }

    #[test]
    fn malformed_operation_is_format_error() {
        let err = Operation::from_value(&json!({ "parameters": [{ "in": "path" }] }), "get", "/x")
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Format);
        assert!(err.message().starts_with("invalid operation `GET /x`"));
    }
}
