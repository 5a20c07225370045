// ==============================================================================
// Type Registry and Compilation Context
// ==============================================================================
//
// Schemas may reference schemas that have not been loaded yet -- either later
// in the same document or in another file altogether. During conversion such
// targets stay in the IR as `TypeNode::Ref(path)` and are recorded as pending.
// The resolution driver keeps loading files until nothing is pending; after
// that, every `Ref` must point at a registered declaration.
//
// The `Ref` variant intentionally stays in the IR rather than being replaced
// inline with the target's definition: references render as the target's
// name, and recursive schemas would otherwise be infinite.

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};

use crate::error::{CompileError, Result};
use crate::model::schema::{TypeDeclaration, TypeNode};
use crate::suggest::suggest_similar_path;

/// Registry of declared types, keyed by canonical path, in registration
/// order.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: IndexMap<String, TypeDeclaration>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        TypeRegistry {
            types: IndexMap::new(),
        }
    }

    /// Register a declaration. Each canonical path can be registered once.
    pub fn register(&mut self, declaration: TypeDeclaration) -> Result<()> {
        if self.types.contains_key(&declaration.full_path) {
            return Err(CompileError::consistency(format!(
                "schema `{}` is declared twice",
                declaration.full_path
            )));
        }
        self.types
            .insert(declaration.full_path.clone(), declaration);
        Ok(())
    }

    /// Look up a declaration by canonical path.
    pub fn lookup(&self, full_path: &str) -> Option<&TypeDeclaration> {
        self.types.get(full_path)
    }

    pub fn contains(&self, full_path: &str) -> bool {
        self.types.contains_key(full_path)
    }

    /// Look up a declaration by its (unique) name.
    pub fn lookup_name(&self, name: &str) -> Option<&TypeDeclaration> {
        self.types.values().find(|d| d.name == name)
    }

    /// All declarations, in registration order.
    pub fn declarations(&self) -> impl Iterator<Item = &TypeDeclaration> {
        self.types.values()
    }

    pub(crate) fn declarations_mut(&mut self) -> impl Iterator<Item = &mut TypeDeclaration> {
        self.types.values_mut()
    }

    /// All canonical paths, in registration order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Declaration names shared by more than one schema, each with the paths
    /// declaring it (in registration order).
    pub fn duplicate_names(&self) -> Vec<(&str, Vec<&str>)> {
        let mut by_name: IndexMap<&str, Vec<&str>> = IndexMap::new();
        for declaration in self.types.values() {
            by_name
                .entry(declaration.name.as_str())
                .or_default()
                .push(declaration.full_path.as_str());
        }
        by_name
            .into_iter()
            .filter(|(_, paths)| paths.len() > 1)
            .collect()
    }

    /// Fail if two schemas sanitize to the same declaration name. Every
    /// conflicting name is reported.
    pub fn check_duplicate_names(&self) -> Result<()> {
        let errors: Vec<CompileError> = self
            .duplicate_names()
            .into_iter()
            .map(|(name, paths)| {
                tracing::warn!(name, paths = ?paths, "Type name declared more than once.");
                CompileError::consistency(format!("type `{name}` is already declared"))
                    .with_help(format!("declared by {}", paths.join(", ")))
            })
            .collect();
        match CompileError::combine(errors) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Collect `Ref` targets in registered declarations that are not
    /// registered themselves, in tree-walk order.
    pub fn validate_references(&self) -> Vec<String> {
        let mut unresolved = Vec::new();
        for declaration in self.types.values() {
            collect_unresolved_refs(&declaration.root, &self.types, &mut unresolved);
        }
        unresolved
    }

    /// Like [`validate_references`](Self::validate_references), for a node
    /// that is not itself registered (e.g., an operation's result type).
    pub fn validate_node(&self, node: &TypeNode) -> Vec<String> {
        let mut unresolved = Vec::new();
        collect_unresolved_refs(node, &self.types, &mut unresolved);
        unresolved
    }
}

/// Recursively walk a type tree and collect `Ref` targets that don't
/// correspond to a registered declaration. Discriminator mapping targets are
/// references too.
fn collect_unresolved_refs(
    node: &TypeNode,
    known: &IndexMap<String, TypeDeclaration>,
    unresolved: &mut Vec<String>,
) {
    match node {
        TypeNode::Ref(target) => {
            if !known.contains_key(target) {
                unresolved.push(target.clone());
            }
        }
        TypeNode::Array(element) | TypeNode::Map(element) => {
            collect_unresolved_refs(element, known, unresolved);
        }
        TypeNode::Object(object) => {
            for field in &object.fields {
                collect_unresolved_refs(&field.ty, known, unresolved);
            }
        }
        TypeNode::Composition(parts) => {
            for part in parts {
                collect_unresolved_refs(part, known, unresolved);
            }
        }
        TypeNode::Union(union) => {
            if let Some(object) = &union.fields_object {
                for field in &object.fields {
                    collect_unresolved_refs(&field.ty, known, unresolved);
                }
            }
            for variant in &union.variants {
                collect_unresolved_refs(variant, known, unresolved);
            }
            if let Some(mapping) = &union.discriminator.mapping {
                for target in mapping.values() {
                    if !known.contains_key(target) {
                        unresolved.push(target.clone());
                    }
                }
            }
        }
        TypeNode::Primitive(_)
        | TypeNode::EmptyObject
        | TypeNode::FreeFormMap
        | TypeNode::Enum(_) => {}
    }
}

// ==============================================================================
// Compilation Context
// ==============================================================================

/// All mutable state of one compilation: the registry plus the bookkeeping
/// for incremental file loading. Created fresh for every compile call.
#[derive(Debug, Default)]
pub(crate) struct CompilationContext {
    pub(crate) registry: TypeRegistry,
    /// Canonical paths referenced but not (yet) backed by a declaration.
    pub(crate) pending_references: IndexSet<String>,
    /// Files referenced but not yet loaded, in discovery order.
    pub(crate) files_to_load: IndexSet<String>,
    pub(crate) loaded_files: HashSet<String>,
}

impl CompilationContext {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Mark a file as loaded. Returns `false` if it already was.
    pub(crate) fn mark_loaded(&mut self, file: &str) -> bool {
        self.files_to_load.shift_remove(file);
        self.loaded_files.insert(file.to_string())
    }

    /// Take the next file waiting to be loaded, in discovery order.
    pub(crate) fn next_file_to_load(&mut self) -> Option<String> {
        self.files_to_load.shift_remove_index(0)
    }

    /// Record a reference to `path` inside `file`. Unless the path is already
    /// declared it becomes pending, and its file is queued if it has not been
    /// loaded.
    pub(crate) fn track_reference(&mut self, path: &str, file: &str) {
        if self.registry.contains(path) {
            return;
        }
        if !self.loaded_files.contains(file) {
            self.files_to_load.insert(file.to_string());
        }
        self.pending_references.insert(path.to_string());
    }

    /// Register a converted declaration and clear it from the pending set.
    pub(crate) fn declare(&mut self, declaration: TypeDeclaration) -> Result<()> {
        self.pending_references
            .shift_remove(&declaration.full_path);
        self.registry.register(declaration)
    }

    /// Fail with one error per reference that is still pending, with a
    /// "did you mean" hint where a registered path is close.
    pub(crate) fn check_pending(&self) -> Result<()> {
        let errors: Vec<CompileError> = self
            .pending_references
            .iter()
            .map(|path| {
                let error =
                    CompileError::consistency(format!("schema `{path}` can't be loaded"));
                match suggest_similar_path(path, self.registry.paths()) {
                    Some(suggestion) => error.with_help(format!("did you mean `{suggestion}`?")),
                    None => error,
                }
            })
            .collect();
        match CompileError::combine(errors) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
