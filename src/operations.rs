// ==============================================================================
// API Method Extraction
// ==============================================================================
//
// Walks the `paths` of the entry document and turns every operation into an
// `ApiMethod`. Path templates and `path` parameters must agree exactly: every
// `{placeholder}` is described by a required path parameter and every path
// parameter appears in the template. Request and response schemas go through
// the same reader/converter as component schemas, so references they make are
// tracked like any other.

use std::sync::LazyLock;

use regex::Regex;

use crate::document::{Document, MediaType, Operation};
use crate::error::{CompileError, Result};
use crate::model::api::{ApiMethod, Parameter, ParameterPlace};
use crate::model::schema::{PrimitiveKind, TypeNode, sanitize_name};
use crate::reader::parse_schema;
use crate::resolve::CompilationContext;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
});

/// Extract the `{placeholder}` names of a route template, left to right.
///
/// Placeholders are removed one at a time, leftmost first; any `{` or `}`
/// left over afterwards makes the template malformed.
pub(crate) fn extract_path_params(route: &str) -> Result<Vec<String>> {
    let mut rest = route.to_string();
    let mut params = Vec::new();
    while let Some((range, name)) = PLACEHOLDER
        .captures(&rest)
        .and_then(|caps| Some((caps.get(0)?.range(), caps.get(1)?.as_str().to_string())))
    {
        rest.replace_range(range, "");
        params.push(name);
    }

    if rest.contains(['{', '}']) {
        return Err(CompileError::format(format!(
            "invalid path template `{route}`"
        ))
        .with_help("placeholders look like `{name}` with a name matching [A-Za-z_][A-Za-z0-9_]*"));
    }
    Ok(params)
}

/// Extract the API methods of a document, in document order.
pub(crate) fn extract_methods(
    ctx: &mut CompilationContext,
    document: &Document,
    file: &str,
) -> Result<Vec<ApiMethod>> {
    let mut methods = Vec::new();
    for (route, item) in &document.paths {
        let placeholders = extract_path_params(route)?;
        for (method, value) in Document::operations(item) {
            let operation = Operation::from_value(value, method, route)?;
            let location = OperationLocation {
                file,
                route,
                method,
            };
            methods.push(extract_method(ctx, &operation, &placeholders, &location)?);
        }
    }
    Ok(methods)
}

struct OperationLocation<'a> {
    file: &'a str,
    route: &'a str,
    method: &'a str,
}

impl OperationLocation<'_> {
    fn label(&self) -> String {
        format!("{} {}", self.method.to_ascii_uppercase(), self.route)
    }

    fn pointer(&self, suffix: &str) -> String {
        format!(
            "{}#/paths/{}/{}/{suffix}",
            self.file,
            self.route,
            self.method.to_ascii_lowercase()
        )
    }
}

fn extract_method(
    ctx: &mut CompilationContext,
    operation: &Operation,
    placeholders: &[String],
    location: &OperationLocation<'_>,
) -> Result<ApiMethod> {
    let label = location.label();
    let http_method = location.method.to_ascii_uppercase();

    let mut parameters = Vec::new();
    let mut described = Vec::new();
    for parameter in &operation.parameters {
        match parameter.location.as_str() {
            "path" => {
                if !parameter.required {
                    return Err(CompileError::consistency(format!(
                        "path parameter `{}` of `{label}` must be required",
                        parameter.name
                    )));
                }
                if !placeholders.contains(&parameter.name) {
                    return Err(CompileError::consistency(format!(
                        "path parameter `{}` of `{label}` does not appear in the route",
                        parameter.name
                    )));
                }
                described.push(parameter.name.as_str());
                parameters.push(Parameter {
                    place: ParameterPlace::Path,
                    name: sanitize_name(&parameter.name),
                    ty: TypeNode::Primitive(PrimitiveKind::String),
                    required: true,
                });
            }
            "query" => parameters.push(Parameter {
                place: ParameterPlace::Query,
                name: sanitize_name(&parameter.name),
                ty: TypeNode::Primitive(PrimitiveKind::String),
                required: parameter.required,
            }),
            other => {
                return Err(CompileError::format(format!(
                    "parameter `{}` of `{label}` has unsupported location `{other}`",
                    parameter.name
                ))
                .with_help("supported locations are `path` and `query`"));
            }
        }
    }

    let undescribed: Vec<&str> = placeholders
        .iter()
        .map(String::as_str)
        .filter(|name| !described.contains(name))
        .collect();
    if !undescribed.is_empty() {
        return Err(CompileError::consistency(format!(
            "path parameters of `{label}` are not described: {}",
            undescribed.join(", ")
        )));
    }

    let mut body_type = None;
    if let Some(body) = &operation.request_body {
        if http_method == "GET" {
            return Err(CompileError::consistency(format!(
                "`{label}` can't have a request body"
            )));
        }
        let schema = MediaType::json_schema(&body.content).ok_or_else(|| {
            CompileError::format(format!(
                "request body of `{label}` has no `application/json` schema"
            ))
        })?;
        let raw = parse_schema(schema, &location.pointer("requestBody"))?;
        match ctx.convert(&raw, location.file)? {
            TypeNode::Object(object) => {
                parameters.extend(object.fields.into_iter().map(|field| Parameter {
                    place: ParameterPlace::Body,
                    name: field.name,
                    ty: field.ty,
                    required: field.required,
                }));
            }
            other => body_type = Some(other),
        }
    }

    let success = operation
        .responses
        .as_ref()
        .and_then(|responses| responses.get("200"))
        .ok_or_else(|| {
            CompileError::consistency(format!("`{label}` has no `200` response"))
                .with_help("every operation must declare `responses: {200: ...}`")
        })?;
    let result_type = match MediaType::json_schema(&success.content) {
        Some(schema) => {
            let raw = parse_schema(schema, &location.pointer("responses/200"))?;
            ctx.convert(&raw, location.file)?
        }
        None => TypeNode::Primitive(PrimitiveKind::Void),
    };

    Ok(ApiMethod {
        http_method,
        route_path: location.route.to_string(),
        parameters,
        body_type,
        result_type,
    })
}
