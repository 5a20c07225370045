// ==============================================================================
// Document Sources: Loading and Decoding Schema Files
// ==============================================================================
//
// The compiler never touches the filesystem directly. Documents are addressed
// by their canonical file name (a `/`-separated path relative to the entry
// document's directory) and fetched through a `SourceLoader`. Decoding turns
// YAML or JSON text into a `serde_json::Value` tree, the one generic node
// representation the rest of the crate works with.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{CompileError, Result};

/// Supplies the raw text of a document given its canonical file name.
pub trait SourceLoader {
    fn load_text(&self, file: &str) -> Result<String, CompileError>;
}

/// Loads documents from disk, relative to a root directory.
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsLoader { root: root.into() }
    }
}

impl SourceLoader for FsLoader {
    fn load_text(&self, file: &str) -> Result<String, CompileError> {
        let path = self.root.join(file);
        std::fs::read_to_string(&path)
            .map_err(|e| CompileError::load(format!("read `{}`: {e}", path.display())))
    }
}

/// Serves documents from memory. Useful for tests and for callers that
/// already hold the documents.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: IndexMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a document.
    pub fn insert(&mut self, file: impl Into<String>, text: impl Into<String>) -> &mut Self {
        self.files.insert(file.into(), text.into());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemoryLoader {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        MemoryLoader {
            files: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl SourceLoader for MemoryLoader {
    fn load_text(&self, file: &str) -> Result<String, CompileError> {
        self.files
            .get(file)
            .cloned()
            .ok_or_else(|| CompileError::load(format!("document `{file}` not found")))
    }
}

/// Decode document text into a generic node tree.
///
/// `.json` files are parsed as JSON with C-style comments allowed; everything
/// else is parsed as YAML (which also accepts plain JSON).
pub fn parse_document(text: &str, file: &str) -> Result<Value, CompileError> {
    if file.ends_with(".json") {
        return serde_json::from_reader(
            json_comments::CommentSettings::c_style().strip_comments(text.as_bytes()),
        )
        .map_err(|e| CompileError::format(format!("invalid JSON in `{file}`: {e}")));
    }

    let yaml: serde_yaml::Value = serde_yaml::from_str(text)
        .map_err(|e| CompileError::format(format!("invalid YAML in `{file}`: {e}")))?;
    yaml_to_json(yaml).map_err(|e| CompileError::format(format!("in `{file}`: {e}")))
}

/// Convert a YAML tree into a JSON tree.
///
/// YAML mappings may have non-string keys (response codes like `200` are
/// integers); scalar keys are stringified, anything else is rejected.
fn yaml_to_json(value: serde_yaml::Value) -> Result<Value, String> {
    use serde_yaml::Value as Yaml;

    Ok(match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map_or(Value::Null, Value::Number)
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<Result<_, _>>()?,
        ),
        Yaml::Mapping(mapping) => {
            let mut object = serde_json::Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                let key = match key {
                    Yaml::String(s) => s,
                    Yaml::Number(n) => n.to_string(),
                    Yaml::Bool(b) => b.to_string(),
                    Yaml::Null => "null".to_string(),
                    other => return Err(format!("unsupported mapping key: {other:?}")),
                };
                object.insert(key, yaml_to_json(value)?);
            }
            Value::Object(object)
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}

/// Resolve `target` relative to the directory of `origin` and normalize `.`
/// and `..` segments. Both are canonical, `/`-separated file names.
pub(crate) fn join_relative(origin: &str, target: &str) -> String {
    let mut segments: Vec<&str> = origin.split('/').collect();
    segments.pop();
    segments.retain(|s| !s.is_empty() && *s != ".");

    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(segments.last(), Some(last) if *last != "..") {
                    segments.pop();
                } else {
                    segments.push("..");
                }
            }
            name => segments.push(name),
        }
    }

    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn yaml_integer_keys_become_strings() {
        let value = parse_document(
            "responses:\n  200:\n    description: ok\n  404:\n    description: missing\n",
            "api.yaml",
        )
        .expect("valid YAML parses");
        assert_eq!(
            value,
            json!({
                "responses": {
                    "200": { "description": "ok" },
                    "404": { "description": "missing" }
                }
            })
        );
    }

    #[test]
    fn yaml_preserves_key_order() {
        let value = parse_document("b: 1\na: 2\nc: 3\n", "x.yml").expect("valid YAML parses");
        let keys: Vec<_> = value
            .as_object()
            .expect("top-level mapping")
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn json_with_comments() {
        let value = parse_document(
            r#"{
                // line comment
                "openapi": "3.0.0" /* trailing */
            }"#,
            "api.json",
        )
        .expect("JSON with comments parses");
        assert_eq!(value, json!({ "openapi": "3.0.0" }));
    }

    #[test]
    fn invalid_document_is_format_error() {
        let err = parse_document("{ not json", "broken.json").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Format);
        assert!(err.message().contains("broken.json"));
    }

    #[test]
    fn memory_loader_reports_missing_document() {
        let loader: MemoryLoader = [("a.yaml", "x: 1")].into_iter().collect();
        assert_eq!(loader.load_text("a.yaml").expect("present"), "x: 1");
        let err = loader.load_text("b.yaml").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Load);
    }

    #[test]
    fn join_relative_paths() {
        assert_eq!(join_relative("openapi.yaml", "common.yaml"), "common.yaml");
        assert_eq!(join_relative("openapi.yaml", "./common.yaml"), "common.yaml");
        assert_eq!(
            join_relative("schemas/user.yaml", "../shared/id.yaml"),
            "shared/id.yaml"
        );
        assert_eq!(
            join_relative("schemas/user.yaml", "role.yaml"),
            "schemas/role.yaml"
        );
        assert_eq!(join_relative("a.yaml", "../outside.yaml"), "../outside.yaml");
        assert_eq!(join_relative("", "common.yaml"), "common.yaml");
    }
}
