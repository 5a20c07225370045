// ==============================================================================
// Schema Reader: Raw JSON Nodes to a Closed Schema Grammar
// ==============================================================================
//
// OpenAPI schemas are open-ended JSON objects whose meaning depends on which
// keys happen to be present. This module inspects those keys exactly once and
// produces a `RawSchema`: a closed variant covering the subset of the schema
// grammar we consume (references, primitives, string enums, arrays, and the
// object forms). The converter then dispatches on the variant tag and never
// looks at raw keys again.
//
// Every parse function takes `at`, a pointer-like location string used in
// error messages (e.g. `api.yaml#/components/schemas/User/properties/role`).

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::{CompileError, Result};

/// A schema node, parsed into the shape it represents.
#[derive(Debug, Clone, PartialEq)]
pub enum RawSchema {
    /// `$ref`, verbatim. Other keys next to `$ref` are ignored.
    Ref(String),
    /// `type: string`, optionally restricted by `enum`.
    String { enum_values: Option<Vec<String>> },
    Number,
    Integer,
    Boolean,
    /// `type: array` with its `items` schema.
    Array(Box<RawSchema>),
    Object(RawObject),
}

/// The object forms, in the precedence they are recognized.
#[derive(Debug, Clone, PartialEq)]
pub enum RawObject {
    /// A node whose only key is `type: object`. Implicit objects (a lone
    /// `properties` or `allOf`) are never empty.
    Empty,
    /// `allOf`, plus any `properties` declared beside it.
    AllOf {
        parts: Vec<RawSchema>,
        properties: Option<Vec<RawField>>,
    },
    /// `oneOf` with its mandatory discriminator, plus any `properties`
    /// declared beside it.
    OneOf {
        variants: Vec<RawSchema>,
        properties: Option<Vec<RawField>>,
        discriminator: RawDiscriminator,
    },
    Properties(Vec<RawField>),
    /// `additionalProperties` without `properties`.
    AdditionalProperties(AdditionalProperties),
}

/// A declared property. `name` is the original, unsanitized key.
#[derive(Debug, Clone, PartialEq)]
pub struct RawField {
    pub name: String,
    pub schema: RawSchema,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdditionalProperties {
    /// `additionalProperties: true`
    Any,
    Schema(Box<RawSchema>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawDiscriminator {
    pub property_name: String,
    /// Discriminant value to (uncanonicalized) `$ref` string.
    pub mapping: Option<IndexMap<String, String>>,
}

/// Keys whose presence marks a node without `type` as an object.
const IMPLICIT_OBJECT_KEYS: &[&str] = &["properties", "additionalProperties", "allOf", "oneOf"];

/// Parse a schema node.
pub fn parse_schema(value: &Value, at: &str) -> Result<RawSchema> {
    let Value::Object(node) = value else {
        return Err(CompileError::format(format!(
            "schema at `{at}` must be an object, found {}",
            describe(value)
        )));
    };

    if let Some(reference) = node.get("$ref") {
        return match reference {
            Value::String(s) => Ok(RawSchema::Ref(s.clone())),
            other => Err(CompileError::format(format!(
                "`$ref` at `{at}` must be a string, found {}",
                describe(other)
            ))),
        };
    }

    let ty = match node.get("type") {
        Some(Value::String(ty)) => Some(ty.as_str()),
        None if IMPLICIT_OBJECT_KEYS.iter().any(|k| node.contains_key(*k)) => Some("object"),
        None => None,
        Some(other) => {
            return Err(unknown_type(&other.to_string(), at));
        }
    };

    match ty {
        Some("string") => Ok(RawSchema::String {
            enum_values: parse_enum_values(node, at)?,
        }),
        Some("number") => Ok(RawSchema::Number),
        Some("integer") => Ok(RawSchema::Integer),
        Some("boolean") => Ok(RawSchema::Boolean),
        Some("array") => {
            let items = match node.get("items") {
                Some(items) if !items.is_null() => items,
                _ => {
                    return Err(CompileError::format(format!(
                        "array without items specification at `{at}`"
                    )));
                }
            };
            let items = parse_schema(items, &format!("{at}/items"))?;
            Ok(RawSchema::Array(Box::new(items)))
        }
        Some("object") => parse_object(node, at).map(RawSchema::Object),
        Some(other) => Err(unknown_type(other, at)),
        None => Err(unknown_type("<missing>", at)),
    }
}

fn unknown_type(ty: &str, at: &str) -> CompileError {
    CompileError::format(format!("unknown field type `{ty}` at `{at}`")).with_help(
        "supported types are string, number, integer, boolean, array, and object",
    )
}

fn parse_enum_values(node: &Map<String, Value>, at: &str) -> Result<Option<Vec<String>>> {
    let values = match node.get("enum") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(values)) => values,
        Some(other) => {
            return Err(CompileError::format(format!(
                "`enum` at `{at}` must be a list, found {}",
                describe(other)
            )));
        }
    };

    let values = values
        .iter()
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();
    Ok(Some(values))
}

fn parse_object(node: &Map<String, Value>, at: &str) -> Result<RawObject> {
    if node.len() == 1 && node.contains_key("type") {
        return Ok(RawObject::Empty);
    }

    let properties = parse_properties(node, at)?;

    if let Some(parts) = node.get("allOf") {
        let parts = parse_schema_list(parts, &format!("{at}/allOf"))?;
        return Ok(RawObject::AllOf { parts, properties });
    }

    if let Some(variants) = node.get("oneOf") {
        let variants = parse_schema_list(variants, &format!("{at}/oneOf"))?;
        let discriminator = match node.get("discriminator") {
            Some(d) if !d.is_null() => parse_discriminator(d, &format!("{at}/discriminator"))?,
            _ => {
                return Err(CompileError::format(format!(
                    "union type at `{at}` has to have a discriminator"
                ))
                .with_help("add `discriminator: {propertyName: ...}` next to `oneOf`"));
            }
        };
        return Ok(RawObject::OneOf {
            variants,
            properties,
            discriminator,
        });
    }

    if let Some(fields) = properties {
        return Ok(RawObject::Properties(fields));
    }

    match node.get("additionalProperties") {
        Some(Value::Bool(true)) => Ok(RawObject::AdditionalProperties(AdditionalProperties::Any)),
        Some(schema @ Value::Object(_)) => {
            let schema = parse_schema(schema, &format!("{at}/additionalProperties"))?;
            Ok(RawObject::AdditionalProperties(AdditionalProperties::Schema(
                Box::new(schema),
            )))
        }
        _ => Err(CompileError::format(format!("invalid object notation at `{at}`")).with_help(
            "an object needs `properties`, `additionalProperties`, `allOf`, or `oneOf`, \
             or no keys besides `type`",
        )),
    }
}

fn parse_properties(node: &Map<String, Value>, at: &str) -> Result<Option<Vec<RawField>>> {
    let properties = match node.get("properties") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Object(properties)) => properties,
        Some(other) => {
            return Err(CompileError::format(format!(
                "`properties` at `{at}` must be a mapping, found {}",
                describe(other)
            )));
        }
    };

    let required: Vec<&str> = match node.get("required") {
        Some(Value::Array(names)) => names.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };

    let mut fields = Vec::with_capacity(properties.len());
    for (name, schema) in properties {
        let schema = parse_schema(schema, &format!("{at}/properties/{name}"))?;
        fields.push(RawField {
            name: name.clone(),
            schema,
            required: required.contains(&name.as_str()),
        });
    }
    Ok(Some(fields))
}

fn parse_schema_list(value: &Value, at: &str) -> Result<Vec<RawSchema>> {
    let Value::Array(items) = value else {
        return Err(CompileError::format(format!(
            "`{at}` must be a list of schemas, found {}",
            describe(value)
        )));
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| parse_schema(item, &format!("{at}/{i}")))
        .collect()
}

fn parse_discriminator(value: &Value, at: &str) -> Result<RawDiscriminator> {
    let property_name = value
        .get("propertyName")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            CompileError::format(format!("discriminator at `{at}` is missing `propertyName`"))
        })?
        .to_string();

    let mapping = match value.get("mapping") {
        None | Some(Value::Null) => None,
        Some(Value::Object(entries)) => {
            let mut mapping = IndexMap::with_capacity(entries.len());
            for (key, target) in entries {
                let target = target.as_str().ok_or_else(|| {
                    CompileError::format(format!(
                        "discriminator mapping `{key}` at `{at}` must be a `$ref` string"
                    ))
                })?;
                mapping.insert(key.clone(), target.to_string());
            }
            Some(mapping)
        }
        Some(other) => {
            return Err(CompileError::format(format!(
                "discriminator mapping at `{at}` must be a mapping, found {}",
                describe(other)
            )));
        }
    };

    Ok(RawDiscriminator {
        property_name,
        mapping,
    })
}

/// Short description of a JSON value's kind, for error messages.
fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn parse(value: Value) -> Result<RawSchema> {
        parse_schema(&value, "test.yaml#/components/schemas/T")
    }

    #[test]
    fn primitives() {
        assert_eq!(parse(json!({"type": "number"})).unwrap(), RawSchema::Number);
        assert_eq!(parse(json!({"type": "integer"})).unwrap(), RawSchema::Integer);
        assert_eq!(parse(json!({"type": "boolean"})).unwrap(), RawSchema::Boolean);
        assert_eq!(
            parse(json!({"type": "string", "format": "uuid"})).unwrap(),
            RawSchema::String { enum_values: None }
        );
    }

    #[test]
    fn string_enum_values_are_stringified() {
        assert_eq!(
            parse(json!({"type": "string", "enum": ["a", 1, true]})).unwrap(),
            RawSchema::String {
                enum_values: Some(vec!["a".into(), "1".into(), "true".into()])
            }
        );
    }

    #[test]
    fn ref_wins_over_other_keys() {
        assert_eq!(
            parse(json!({"$ref": "#/components/schemas/User", "type": "object"})).unwrap(),
            RawSchema::Ref("#/components/schemas/User".into())
        );
    }

    #[test]
    fn implicit_object_markers() {
        let raw = parse(json!({"properties": {"id": {"type": "string"}}, "required": ["id"]}))
            .unwrap();
        assert_eq!(
            raw,
            RawSchema::Object(RawObject::Properties(vec![RawField {
                name: "id".into(),
                schema: RawSchema::String { enum_values: None },
                required: true,
            }]))
        );
        assert!(matches!(
            parse(json!({"additionalProperties": true})).unwrap(),
            RawSchema::Object(RawObject::AdditionalProperties(AdditionalProperties::Any))
        ));
    }

    #[test]
    fn bare_object_is_empty() {
        assert_eq!(
            parse(json!({"type": "object"})).unwrap(),
            RawSchema::Object(RawObject::Empty)
        );
    }

    #[test]
    fn all_of_keeps_side_properties() {
        let raw = parse(json!({
            "allOf": [{"$ref": "#/components/schemas/Base"}],
            "properties": {"extra": {"type": "boolean"}}
        }))
        .unwrap();
        let RawSchema::Object(RawObject::AllOf { parts, properties }) = raw else {
            panic!("expected allOf, got {raw:?}");
        };
        assert_eq!(parts.len(), 1);
        assert_eq!(properties.map(|p| p.len()), Some(1));
    }

    #[test]
    fn one_of_requires_discriminator() {
        let err = parse(json!({"oneOf": [{"$ref": "#/components/schemas/A"}]})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        insta::assert_snapshot!(err.message(), @"union type at `test.yaml#/components/schemas/T` has to have a discriminator");
    }

    #[test]
    fn one_of_with_mapping() {
        let raw = parse(json!({
            "oneOf": [{"$ref": "#/components/schemas/Cat"}],
            "discriminator": {
                "propertyName": "kind",
                "mapping": {"cat": "#/components/schemas/Cat"}
            }
        }))
        .unwrap();
        let RawSchema::Object(RawObject::OneOf { discriminator, .. }) = raw else {
            panic!("expected oneOf, got {raw:?}");
        };
        assert_eq!(discriminator.property_name, "kind");
        assert_eq!(
            discriminator.mapping.and_then(|m| m.get("cat").cloned()),
            Some("#/components/schemas/Cat".to_string())
        );
    }

    #[test]
    fn array_without_items() {
        let err = parse(json!({"type": "array"})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        insta::assert_snapshot!(err.message(), @"array without items specification at `test.yaml#/components/schemas/T`");
    }

    #[test]
    fn nested_error_location() {
        let err = parse(json!({
            "type": "object",
            "properties": {"tags": {"type": "array", "items": {"type": "date"}}}
        }))
        .unwrap_err();
        insta::assert_snapshot!(err.message(), @"unknown field type `date` at `test.yaml#/components/schemas/T/properties/tags/items`");
    }

    #[test]
    fn missing_type_is_unknown() {
        let err = parse(json!({"description": "nothing"})).unwrap_err();
        assert!(err.message().starts_with("unknown field type `<missing>`"));
    }

    #[test]
    fn object_with_only_noise_is_invalid() {
        let err = parse(json!({"type": "object", "description": "opaque"})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.message().starts_with("invalid object notation"));
    }

    #[test]
    fn additional_properties_schema() {
        let raw = parse(json!({"type": "object", "additionalProperties": {"type": "integer"}}))
            .unwrap();
        assert_eq!(
            raw,
            RawSchema::Object(RawObject::AdditionalProperties(AdditionalProperties::Schema(
                Box::new(RawSchema::Integer)
            )))
        );
    }
}
