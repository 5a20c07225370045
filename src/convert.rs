// ==============================================================================
// Schema Converter: RawSchema to TypeNode
// ==============================================================================
//
// Lowers the reader's closed schema grammar into the type IR. References are
// canonicalized to `<file>#/components/schemas/<name>` relative to the
// document they appear in; any target not yet declared is recorded as pending
// on the compilation context, and its file is queued for loading.

use crate::document::Document;
use crate::error::{CompileError, Result};
use crate::model::schema::{
    Discriminator, EnumType, Field, ObjectType, PrimitiveKind, SCHEMA_POINTER_PREFIX,
    TypeDeclaration, TypeNode, UnionType, sanitize_name,
};
use crate::reader::{AdditionalProperties, RawField, RawObject, RawSchema, parse_schema};
use crate::resolve::CompilationContext;
use crate::source::join_relative;

/// A reference resolved against the document it appears in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SchemaPath {
    /// Canonical file name of the target document.
    pub(crate) file: String,
    /// Canonical `<file>#/components/schemas/<name>` path.
    pub(crate) path: String,
}

/// Canonicalize a `$ref` string found in `origin`.
///
/// The file part is resolved relative to the directory of `origin`; an empty
/// file part means `origin` itself.
pub(crate) fn canonicalize_ref(reference: &str, origin: &str) -> Result<SchemaPath> {
    let reference = reference.trim();
    let Some((file, pointer)) = reference.split_once('#') else {
        return Err(CompileError::format(format!(
            "invalid reference `{reference}` in `{origin}`"
        ))
        .with_help("references look like `<file>#/components/schemas/<name>`"));
    };

    if !pointer.starts_with(SCHEMA_POINTER_PREFIX) || pointer.len() == SCHEMA_POINTER_PREFIX.len()
    {
        return Err(CompileError::format(format!(
            "reference `{reference}` in `{origin}` does not point to a schema"
        ))
        .with_help(format!("only `{SCHEMA_POINTER_PREFIX}<name>` pointers are supported")));
    }

    let file = if file.is_empty() {
        origin.to_string()
    } else {
        join_relative(origin, file)
    };
    let path = format!("{file}#{pointer}");
    Ok(SchemaPath { file, path })
}

impl CompilationContext {
    /// Convert and declare every top-level schema of a loaded document.
    pub(crate) fn declare_schemas(&mut self, document: &Document, file: &str) -> Result<()> {
        for (name, value) in &document.components.schemas {
            let full_path = format!("{file}#{SCHEMA_POINTER_PREFIX}{name}");
            let raw = parse_schema(value, &full_path)?;
            let root = self.convert(&raw, file)?;
            self.declare(TypeDeclaration {
                name: sanitize_name(name),
                full_path,
                root,
            })?;
        }
        Ok(())
    }

    /// Lower a parsed schema found in the document `origin`.
    pub(crate) fn convert(&mut self, raw: &RawSchema, origin: &str) -> Result<TypeNode> {
        Ok(match raw {
            RawSchema::Ref(reference) => TypeNode::Ref(self.reference(reference, origin)?),
            RawSchema::String { enum_values: None } => TypeNode::Primitive(PrimitiveKind::String),
            RawSchema::String {
                enum_values: Some(values),
            } => TypeNode::Enum(EnumType::new(values.clone())),
            RawSchema::Number | RawSchema::Integer => TypeNode::Primitive(PrimitiveKind::Number),
            RawSchema::Boolean => TypeNode::Primitive(PrimitiveKind::Boolean),
            RawSchema::Array(items) => TypeNode::Array(Box::new(self.convert(items, origin)?)),
            RawSchema::Object(object) => self.convert_object(object, origin)?,
        })
    }

    fn convert_object(&mut self, object: &RawObject, origin: &str) -> Result<TypeNode> {
        Ok(match object {
            RawObject::Empty => TypeNode::EmptyObject,
            RawObject::Properties(fields) => TypeNode::Object(self.convert_fields(fields, origin)?),
            RawObject::AllOf { parts, properties } => {
                let mut converted = parts
                    .iter()
                    .map(|part| self.convert(part, origin))
                    .collect::<Result<Vec<_>>>()?;
                if let Some(fields) = properties {
                    converted.push(TypeNode::Object(self.convert_fields(fields, origin)?));
                }
                TypeNode::Composition(converted)
            }
            RawObject::OneOf {
                variants,
                properties,
                discriminator,
            } => {
                let variants = variants
                    .iter()
                    .map(|variant| self.convert(variant, origin))
                    .collect::<Result<Vec<_>>>()?;
                let fields_object = properties
                    .as_ref()
                    .map(|fields| self.convert_fields(fields, origin))
                    .transpose()?;

                let mapping = match &discriminator.mapping {
                    Some(entries) => {
                        let mut mapping = indexmap::IndexMap::with_capacity(entries.len());
                        for (value, reference) in entries {
                            mapping.insert(value.clone(), self.reference(reference, origin)?);
                        }
                        Some(mapping)
                    }
                    None => None,
                };

                let property = sanitize_name(&discriminator.property_name);
                let discriminator_type = fields_object
                    .as_ref()
                    .and_then(|object| object.fields.iter().find(|f| f.name == property))
                    .filter(|field| matches!(field.ty, TypeNode::Ref(_)))
                    .map(|field| Box::new(field.ty.clone()));

                TypeNode::Union(UnionType {
                    fields_object,
                    variants,
                    discriminator: Discriminator {
                        property_name: discriminator.property_name.clone(),
                        mapping,
                    },
                    discriminator_type,
                })
            }
            RawObject::AdditionalProperties(AdditionalProperties::Any) => TypeNode::FreeFormMap,
            RawObject::AdditionalProperties(AdditionalProperties::Schema(schema)) => {
                TypeNode::Map(Box::new(self.convert(schema, origin)?))
            }
        })
    }

    fn convert_fields(&mut self, fields: &[RawField], origin: &str) -> Result<ObjectType> {
        let fields = fields
            .iter()
            .map(|field| -> Result<Field> {
                Ok(Field {
                    name: sanitize_name(&field.name),
                    ty: self.convert(&field.schema, origin)?,
                    required: field.required,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(ObjectType { fields })
    }

    /// Canonicalize a reference and track its target.
    fn reference(&mut self, reference: &str, origin: &str) -> Result<String> {
        let SchemaPath { file, path } = canonicalize_ref(reference, origin)?;
        self.track_reference(&path, &file);
        Ok(path)
    }
}
