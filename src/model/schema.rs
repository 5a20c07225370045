use indexmap::IndexMap;

/// Pointer prefix every schema reference must carry.
pub const SCHEMA_POINTER_PREFIX: &str = "/components/schemas/";

/// Characters stripped from schema, field, and parameter names before they
/// are used as identifiers.
const NAME_PUNCTUATION: &[char] = &[
    '.', ',', '!', '@', '#', '$', '%', '^', '&', '*', '(', ')', '_', '-',
];

/// Strip the punctuation set from a raw OpenAPI name.
pub fn sanitize_name(name: &str) -> String {
    name.chars().filter(|c| !NAME_PUNCTUATION.contains(c)).collect()
}

/// The primitive kinds a schema can lower to. `integer` lowers to `Number`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    String,
    Number,
    Boolean,
    Void,
}

impl PrimitiveKind {
    /// The TypeScript spelling of this primitive.
    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Number => "number",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Void => "void",
        }
    }
}

/// Language-neutral type representation of a converted schema.
///
/// The tree is immutable after conversion with one exception: the
/// `assigned_name` cell of [`EnumType`], which the naming pass fills in.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeNode {
    Primitive(PrimitiveKind),
    /// `type: object` with no other keys.
    EmptyObject,
    /// `additionalProperties: true`.
    FreeFormMap,
    Array(Box<TypeNode>),
    Map(Box<TypeNode>),
    Object(ObjectType),
    /// `allOf`: every part's shape at once.
    Composition(Vec<TypeNode>),
    /// `oneOf` with a discriminator.
    Union(UnionType),
    Enum(EnumType),
    /// Canonical `<file>#/components/schemas/<name>` path of a declaration.
    Ref(String),
}

/// An object with declared properties, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectType {
    pub fields: Vec<Field>,
}

/// A property of an [`ObjectType`].
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Sanitized property name.
    pub name: String,
    pub ty: TypeNode,
    pub required: bool,
}

/// A discriminated `oneOf`.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionType {
    /// Properties declared next to `oneOf`, shared by every variant.
    pub fields_object: Option<ObjectType>,
    pub variants: Vec<TypeNode>,
    pub discriminator: Discriminator,
    /// Type of the discriminator property, when it is declared in
    /// `fields_object` as a reference.
    pub discriminator_type: Option<Box<TypeNode>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Discriminator {
    pub property_name: String,
    /// Discriminant value to canonical schema path.
    pub mapping: Option<IndexMap<String, String>>,
}

/// A string enum. `assigned_name` stays `None` until the naming pass runs.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub values: Vec<String>,
    pub assigned_name: Option<String>,
}

impl EnumType {
    pub fn new(values: Vec<String>) -> Self {
        EnumType {
            values,
            assigned_name: None,
        }
    }

    /// Order-independent identity of the value set. Two enums are the same
    /// enum exactly when their footprints match.
    pub fn footprint(&self) -> String {
        footprint(&self.values)
    }
}

pub(crate) fn footprint(values: &[String]) -> String {
    let mut sorted: Vec<&str> = values.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.join("|")
}

/// A named schema from some document's `components.schemas`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDeclaration {
    /// Sanitized schema name; unique across the whole compilation.
    pub name: String,
    /// Canonical `<file>#/components/schemas/<schema>` path.
    pub full_path: String,
    pub root: TypeNode,
}

impl TypeDeclaration {
    /// The enum this declaration is, if it is one.
    pub fn as_enum(&self) -> Option<&EnumType> {
        match &self.root {
            TypeNode::Enum(site) => Some(site),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_punctuation() {
        assert_eq!(sanitize_name("user_id"), "userid");
        assert_eq!(sanitize_name("x-rate-limit"), "xratelimit");
        assert_eq!(sanitize_name("Api.Response(v2)"), "ApiResponsev2");
        assert_eq!(sanitize_name("plain"), "plain");
    }

    #[test]
    fn footprint_ignores_order() {
        let a = EnumType::new(vec!["open".into(), "closed".into()]);
        let b = EnumType::new(vec!["closed".into(), "open".into()]);
        let c = EnumType::new(vec!["active".into(), "inactive".into()]);
        assert_eq!(a.footprint(), b.footprint());
        assert_ne!(a.footprint(), c.footprint());
        assert_eq!(a.footprint(), "closed|open");
    }
}
