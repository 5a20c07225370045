// ==============================================================================
// Enum Naming and Deduplication
// ==============================================================================
//
// Inline string enums have no name of their own. To emit them as named
// TypeScript enums, each enum site is named after the property that holds it
// (`role` becomes `Role`). When that name is taken -- by a declared type, or
// by another inline enum with a different set of values -- the enclosing
// names are prefixed one at a time, innermost first (`UserRole`, then
// `ApiUserRole`, ...).
//
// A collision discovered late in a pass can invalidate names handed out
// earlier in the same pass, so the whole walk is repeated with the collided
// names blacklisted until a pass discovers no new collision. Every pass that
// doesn't converge blacklists at least one candidate, and the number of
// distinct candidates is finite, which bounds the number of passes.

use std::collections::{HashMap, HashSet};

use heck::ToUpperCamelCase;
use indexmap::IndexMap;

use crate::error::{CompileError, Result};
use crate::model::schema::{EnumType, ObjectType, TypeNode, footprint};
use crate::resolve::TypeRegistry;

/// Candidates shorter than this are never used on their own.
const MIN_ENUM_NAME_LEN: usize = 3;

/// The inline enums that received a name, in the order their names were
/// first handed out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumTable {
    entries: IndexMap<String, Vec<String>>,
}

impl EnumTable {
    /// Inline enum names with their values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Assign a name to every enum reachable from the registry's declarations.
///
/// Returns the table of inline enums. Enums that are declarations themselves
/// carry their declaration name, and inline enums whose candidate name is a
/// declared enum with the same values are bound to that declaration instead
/// of getting an entry.
pub fn assign_enum_names(registry: &mut TypeRegistry) -> Result<EnumTable> {
    let declared: HashSet<String> = registry.declarations().map(|d| d.name.clone()).collect();
    let declared_enums: HashMap<String, String> = registry
        .declarations()
        .filter_map(|d| Some((d.name.clone(), d.as_enum()?.footprint())))
        .collect();

    // Each site has at most (depth + 1) candidates.
    let mut candidates = 0usize;
    walk_declarations(registry, &mut |_, path, _| {
        candidates += path.len() + 1;
        Ok(())
    })?;
    let max_passes = candidates + 1;

    let mut namer = EnumNamer {
        declared: &declared,
        declared_enums: &declared_enums,
        duplicates: HashSet::new(),
        table: IndexMap::new(),
    };
    for pass in 1..=max_passes {
        namer.table.clear();
        let known_duplicates = namer.duplicates.len();
        walk_declarations(registry, &mut |name, path, site| namer.assign(name, path, site))?;

        if namer.duplicates.len() == known_duplicates {
            tracing::debug!(
                passes = pass,
                inline_enums = namer.table.len(),
                "Enum naming converged."
            );
            return Ok(EnumTable {
                entries: namer.table,
            });
        }
        tracing::debug!(
            pass,
            blacklisted = namer.duplicates.len(),
            "Enum name collisions found, renaming again."
        );
    }

    Err(CompileError::internal(format!(
        "enum naming did not converge after {max_passes} passes"
    )))
}

type Visit<'v> = dyn FnMut(&str, &[String], &mut EnumType) -> Result<()> + 'v;

/// Visit every enum site of every declaration. Root enums are bound to their
/// declaration name directly and not visited. Enums reached from the root
/// without passing through a field (array items, map values, composition
/// parts, union variants) have no name to derive one from and stay inline.
fn walk_declarations(registry: &mut TypeRegistry, visit: &mut Visit<'_>) -> Result<()> {
    let mut path = Vec::new();
    for declaration in registry.declarations_mut() {
        match &mut declaration.root {
            TypeNode::Enum(site) => site.assigned_name = Some(declaration.name.clone()),
            root => walk_enums(&declaration.name, root, &mut path, visit)?,
        }
    }
    Ok(())
}

/// Walk a type tree. `name` is the name of the innermost enclosing
/// declaration or field, and `path` the names enclosing that one.
fn walk_enums(
    name: &str,
    node: &mut TypeNode,
    path: &mut Vec<String>,
    visit: &mut Visit<'_>,
) -> Result<()> {
    match node {
        TypeNode::Enum(_) if path.is_empty() => Ok(()),
        TypeNode::Enum(site) => visit(name, path.as_slice(), site),
        TypeNode::Object(object) => walk_fields(name, object, path, visit),
        TypeNode::Array(element) | TypeNode::Map(element) => walk_enums(name, element, path, visit),
        TypeNode::Composition(parts) => {
            for part in parts {
                walk_enums(name, part, path, visit)?;
            }
            Ok(())
        }
        TypeNode::Union(union) => {
            if let Some(object) = &mut union.fields_object {
                walk_fields(name, object, path, visit)?;
            }
            for variant in &mut union.variants {
                walk_enums(name, variant, path, visit)?;
            }
            Ok(())
        }
        TypeNode::Primitive(_) | TypeNode::EmptyObject | TypeNode::FreeFormMap | TypeNode::Ref(_) => {
            Ok(())
        }
    }
}

fn walk_fields(
    name: &str,
    object: &mut ObjectType,
    path: &mut Vec<String>,
    visit: &mut Visit<'_>,
) -> Result<()> {
    path.push(name.to_string());
    for field in &mut object.fields {
        walk_enums(&field.name, &mut field.ty, path, visit)?;
    }
    path.pop();
    Ok(())
}

struct EnumNamer<'a> {
    declared: &'a HashSet<String>,
    /// Declared enum names with their footprints.
    declared_enums: &'a HashMap<String, String>,
    /// Candidates claimed by two different value sets. Survives passes.
    duplicates: HashSet<String>,
    /// Rebuilt on every pass.
    table: IndexMap<String, Vec<String>>,
}

impl EnumNamer<'_> {
    fn assign(&mut self, name: &str, path: &[String], site: &mut EnumType) -> Result<()> {
        let site_footprint = site.footprint();
        let mut ancestors = path.iter().rev();
        let mut candidate = name.to_upper_camel_case();
        loop {
            if self.declared_enums.get(&candidate) == Some(&site_footprint) {
                site.assigned_name = Some(candidate);
                return Ok(());
            }
            if !self.conflicts(&candidate, &site_footprint) {
                self.table
                    .entry(candidate.clone())
                    .or_insert_with(|| site.values.clone());
                site.assigned_name = Some(candidate);
                return Ok(());
            }
            let Some(segment) = ancestors.next() else {
                let location: Vec<&str> = path.iter().map(String::as_str).chain([name]).collect();
                return Err(CompileError::naming(format!(
                    "top level enum duplicate: {name}"
                ))
                .with_help(format!(
                    "every name derived from `{}` is already taken",
                    location.join(".")
                )));
            };
            candidate = format!("{segment}{candidate}").to_upper_camel_case();
        }
    }

    fn conflicts(&mut self, candidate: &str, site_footprint: &str) -> bool {
        if self.declared.contains(candidate) || self.duplicates.contains(candidate) {
            return true;
        }
        if let Some(values) = self.table.get(candidate) {
            if footprint(values) != site_footprint {
                self.table.shift_remove(candidate);
                self.duplicates.insert(candidate.to_string());
                return true;
            }
        }
        candidate.chars().count() < MIN_ENUM_NAME_LEN || candidate == "Type"
    }
}
