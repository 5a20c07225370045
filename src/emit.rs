// ==============================================================================
// TypeScript Emitter
// ==============================================================================
//
// Renders resolved and named declarations as TypeScript source. Rendering is
// a pure function of the IR except for one piece of bookkeeping: every
// declaration or named enum that a rendered type refers to is recorded, so
// callers can import exactly the names they use.

use std::collections::HashSet;

use heck::ToShoutySnakeCase;

use crate::error::{CompileError, Result};
use crate::model::schema::{EnumType, ObjectType, TypeNode, UnionType, sanitize_name};
use crate::naming::EnumTable;
use crate::resolve::TypeRegistry;

const INDENT: &str = "  ";

/// Renders type nodes against a registry and its enum table.
#[derive(Debug)]
pub struct Emitter<'a> {
    registry: &'a TypeRegistry,
    enums: &'a EnumTable,
    use_enums: bool,
    namespace: Option<&'a str>,
    used: HashSet<String>,
}

impl<'a> Emitter<'a> {
    /// With `use_enums`, enums render by their assigned name and inline enums
    /// get `export enum` declarations; otherwise enums render as string
    /// literal unions. References to declarations are prefixed with
    /// `<namespace>.` when a namespace is given.
    pub fn new(
        registry: &'a TypeRegistry,
        enums: &'a EnumTable,
        use_enums: bool,
        namespace: Option<&'a str>,
    ) -> Self {
        Emitter {
            registry,
            enums,
            use_enums,
            namespace,
            used: HashSet::new(),
        }
    }

    /// Render a type expression. `depth` is the indentation level of the line
    /// the expression starts on.
    pub fn render(&mut self, node: &TypeNode, depth: usize) -> Result<String> {
        Ok(match node {
            TypeNode::Primitive(kind) => kind.as_str().to_string(),
            TypeNode::EmptyObject => "Record<string, never>".to_string(),
            TypeNode::FreeFormMap => "Record<string, unknown>".to_string(),
            TypeNode::Map(element) => format!("Record<string, {}>", self.render(element, depth)?),
            TypeNode::Array(element) => {
                let rendered = self.render(element, depth)?;
                if self.is_compound(element) {
                    format!("({rendered})[]")
                } else {
                    format!("{rendered}[]")
                }
            }
            TypeNode::Object(object) => self.render_object(object, depth)?,
            TypeNode::Composition(parts) => {
                let mut rendered = Vec::with_capacity(parts.len());
                for part in parts {
                    let part_text = self.render(part, depth)?;
                    if self.is_union(part) {
                        rendered.push(format!("({part_text})"));
                    } else {
                        rendered.push(part_text);
                    }
                }
                rendered.join(" & ")
            }
            TypeNode::Union(union) => self.render_union(union, depth)?,
            TypeNode::Enum(site) => self.render_enum(site),
            TypeNode::Ref(target) => {
                let registry = self.registry;
                let declaration = registry.lookup(target).ok_or_else(|| {
                    CompileError::internal(format!("reference `{target}` was never declared"))
                })?;
                self.used.insert(declaration.name.clone());
                self.qualified(&declaration.name)
            }
        })
    }

    fn render_object(&mut self, object: &ObjectType, depth: usize) -> Result<String> {
        if object.fields.is_empty() {
            return Ok("{}".to_string());
        }
        let gap = INDENT.repeat(depth);
        let inner_gap = INDENT.repeat(depth + 1);
        let mut out = String::from("{\n");
        for field in &object.fields {
            let optional = if field.required { "" } else { "?" };
            let ty = self.render(&field.ty, depth + 1)?;
            out.push_str(&format!("{inner_gap}{}{optional}: {ty};\n", field.name));
        }
        out.push_str(&gap);
        out.push('}');
        Ok(out)
    }

    fn render_union(&mut self, union: &UnionType, depth: usize) -> Result<String> {
        let property = sanitize_name(&union.discriminator.property_name);
        let mut variants = Vec::with_capacity(union.variants.len());
        for variant in &union.variants {
            let rendered = self.render(variant, depth)?;
            let tag = match (variant, &union.discriminator.mapping) {
                (TypeNode::Ref(target), Some(mapping)) => mapping
                    .iter()
                    .find(|(_, mapped)| *mapped == target)
                    .map(|(value, _)| value),
                _ => None,
            };
            match tag {
                Some(value) => variants.push(format!(
                    "{rendered} & {{{property}: '{}'}}",
                    escape_literal(value)
                )),
                None => variants.push(rendered),
            }
        }
        let variants = variants.join(" | ");

        Ok(match &union.fields_object {
            Some(object) => format!("{} & ({variants})", self.render_object(object, depth)?),
            None => variants,
        })
    }

    fn render_enum(&mut self, site: &EnumType) -> String {
        match (&site.assigned_name, self.use_enums) {
            (Some(name), true) => {
                self.used.insert(name.clone());
                if self.registry.lookup_name(name).is_some() {
                    self.qualified(name)
                } else {
                    name.clone()
                }
            }
            _ => inline_enum(&site.values),
        }
    }

    fn qualified(&self, name: &str) -> String {
        match self.namespace {
            Some(namespace) => format!("{namespace}.{name}"),
            None => name.to_string(),
        }
    }

    /// Whether a node renders as a `|` union at its top level.
    fn is_union(&self, node: &TypeNode) -> bool {
        match node {
            TypeNode::Union(_) => true,
            TypeNode::Enum(site) => {
                site.values.len() > 1 && !(self.use_enums && site.assigned_name.is_some())
            }
            _ => false,
        }
    }

    /// Whether a node needs parentheses as an array element.
    fn is_compound(&self, node: &TypeNode) -> bool {
        match node {
            TypeNode::Composition(parts) => parts.len() > 1,
            other => self.is_union(other),
        }
    }

    /// All declarations: inline enums first (in named-enum mode), then one
    /// type alias per declaration, sorted by name.
    pub fn declarations(&mut self) -> Result<Vec<String>> {
        let mut out = Vec::new();
        if self.use_enums {
            out.extend(
                self.enums
                    .iter()
                    .map(|(name, values)| enum_declaration(name, values)),
            );
        }

        let mut declarations: Vec<_> = self.registry.declarations().collect();
        declarations.sort_by(|a, b| a.name.cmp(&b.name));
        for declaration in declarations {
            let body = match &declaration.root {
                TypeNode::Enum(site) => inline_enum(&site.values),
                root => self.render(root, 0)?,
            };
            out.push(format!("export type {} = {body};", declaration.name));
        }
        Ok(out)
    }

    /// Names of declarations and inline enums referenced by anything rendered
    /// so far, sorted.
    pub fn used_names(&self) -> Vec<String> {
        let inline = self
            .enums
            .iter()
            .filter(|_| self.use_enums)
            .map(|(name, _)| name);
        let declared = self.registry.declarations().map(|d| d.name.as_str());
        let mut names: Vec<String> = inline
            .chain(declared)
            .filter(|name| self.used.contains(*name))
            .map(str::to_string)
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

fn inline_enum(values: &[String]) -> String {
    if values.is_empty() {
        return "never".to_string();
    }
    values
        .iter()
        .map(|value| format!("'{}'", escape_literal(value)))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn enum_declaration(name: &str, values: &[String]) -> String {
    let members: String = values
        .iter()
        .zip(member_keys(values))
        .map(|(value, key)| format!("{INDENT}{key} = '{}',\n", escape_literal(value)))
        .collect();
    format!("export enum {name} {{\n{members}}}")
}

/// Member keys for an enum's values: `SHOUTY_SNAKE_CASE` where that is a
/// fresh identifier, otherwise the value itself, quoted unless it is an
/// identifier. Keys still taken get a numeric suffix.
fn member_keys(values: &[String]) -> Vec<String> {
    let mut taken = HashSet::new();
    values
        .iter()
        .map(|value| {
            let shouty = value.to_shouty_snake_case();
            let base = if is_identifier(&shouty) && !taken.contains(&shouty) {
                shouty
            } else {
                value.clone()
            };
            let mut key = base.clone();
            let mut suffix = 2;
            while taken.contains(&key) {
                key = format!("{base}_{suffix}");
                suffix += 1;
            }
            taken.insert(key.clone());
            if is_identifier(&key) {
                key
            } else {
                format!("'{}'", escape_literal(&key))
            }
        })
        .collect()
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Escape a value for a single-quoted TypeScript string literal.
fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
