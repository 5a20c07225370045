// ==============================================================================
// Library API: Resolving and Compiling OpenAPI Schemas
// ==============================================================================
//
// Two entry points:
//
//   - `resolve` -- load the entry document and every document it references,
//     and return the type registry plus the entry document's API methods.
//   - `TypeGen` -- a non-consuming `&mut self` builder that resolves, names
//     enums, and renders TypeScript declarations.
//
// All mutable compilation state (registry, pending references, files to load)
// lives in a `CompilationContext` created fresh per call, so a builder can be
// reused freely. Every failure is fatal and aborts the whole compile.

use std::path::Path;

use crate::document::Document;
use crate::emit::Emitter;
use crate::error::{CompileError, Result};
use crate::model::api::ApiMethod;
use crate::model::schema::TypeDeclaration;
use crate::naming::{EnumTable, assign_enum_names};
use crate::operations::extract_methods;
use crate::resolve::{CompilationContext, TypeRegistry};
use crate::source::{FsLoader, MemoryLoader, SourceLoader, parse_document};

// ==============================================================================
// Resolution
// ==============================================================================

/// Everything the entry document transitively declares.
#[derive(Debug)]
pub struct Resolved {
    /// Every schema of every loaded document, keyed by canonical path.
    pub registry: TypeRegistry,
    /// The entry document's operations, in document order.
    pub methods: Vec<ApiMethod>,
}

/// Load `entry` and every document it references through `loader`.
///
/// On success every reference in the registry and in the methods points at a
/// registered declaration, and declaration names are unique.
pub fn resolve(loader: &dyn SourceLoader, entry: &str) -> miette::Result<Resolved> {
    Ok(resolve_documents(loader, entry)?)
}

fn resolve_documents(loader: &dyn SourceLoader, entry: &str) -> Result<Resolved> {
    let mut ctx = CompilationContext::new();

    tracing::debug!(file = entry, "Loading entry document.");
    let document = load_document(loader, entry)?;
    ctx.mark_loaded(entry);
    ctx.declare_schemas(&document, entry)?;
    let methods = extract_methods(&mut ctx, &document, entry)?;

    // Each iteration loads a file not loaded before; the set of loaded files
    // only grows and the number of referenced files is finite.
    while let Some(file) = ctx.next_file_to_load() {
        if !ctx.mark_loaded(&file) {
            continue;
        }
        tracing::debug!(
            file,
            pending = ctx.pending_references.len(),
            "Loading referenced document."
        );
        let document = load_document(loader, &file)?;
        ctx.declare_schemas(&document, &file)?;
    }

    ctx.check_pending()?;
    ctx.registry.check_duplicate_names()?;

    let mut dangling = ctx.registry.validate_references();
    for method in &methods {
        let types = method
            .parameters
            .iter()
            .map(|p| &p.ty)
            .chain(method.body_type.as_ref())
            .chain([&method.result_type]);
        for ty in types {
            dangling.extend(ctx.registry.validate_node(ty));
        }
    }
    if let Some(target) = dangling.first() {
        return Err(CompileError::internal(format!(
            "reference `{target}` survived resolution without a declaration"
        )));
    }

    tracing::debug!(
        files = ctx.loaded_files.len(),
        types = ctx.registry.len(),
        methods = methods.len(),
        "Resolved all references."
    );
    Ok(Resolved {
        registry: ctx.registry,
        methods,
    })
}

fn load_document(loader: &dyn SourceLoader, file: &str) -> Result<Document> {
    let text = loader.load_text(file)?;
    let value = parse_document(&text, file)?;
    Document::from_value(value, file)
}

// ==============================================================================
// `TypeGen` Builder
// ==============================================================================

/// Compiles OpenAPI documents into TypeScript type declarations.
///
/// # Example
///
/// ```no_run
/// use openapi_typegen::TypeGen;
///
/// let output = TypeGen::new()
///     .use_enums(true)
///     .namespace("Api")
///     .generate("specs/openapi.yaml")?;
/// println!("{}", output.declarations.join("\n\n"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct TypeGen {
    use_enums: bool,
    namespace: Option<String>,
}

/// Result of a successful compilation.
#[derive(Debug)]
pub struct TypeGenOutput {
    /// Rendered declarations: `export enum` blocks for inline enums (in
    /// named-enum mode), then one `export type` per schema, sorted by name.
    pub declarations: Vec<String>,
    /// Sorted names of declarations and enums the rendered declarations
    /// refer to.
    pub used_names: Vec<String>,
    /// The named inline enums.
    pub enums: EnumTable,
    /// The resolved declarations, in load order, with enum names assigned.
    pub types: Vec<TypeDeclaration>,
    /// The entry document's operations.
    pub methods: Vec<ApiMethod>,
}

impl TypeGen {
    /// Create a builder rendering enums inline and without a namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Render enums as named `export enum` declarations instead of string
    /// literal unions.
    pub fn use_enums(&mut self, use_enums: bool) -> &mut Self {
        self.use_enums = use_enums;
        self
    }

    /// Prefix references to declared types with `<namespace>.`.
    pub fn namespace(&mut self, namespace: impl Into<String>) -> &mut Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Compile an OpenAPI document from disk. Referenced documents are looked
    /// up relative to its directory.
    pub fn generate(&self, path: impl AsRef<Path>) -> miette::Result<TypeGenOutput> {
        let path = path.as_ref();
        let entry = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                CompileError::load(format!("`{}` does not name a document", path.display()))
            })?;
        let root = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        self.generate_with(&FsLoader::new(root), entry)
    }

    /// Compile a single self-contained document held in memory. `name` is
    /// its file name, which also selects the format (`.json` or YAML).
    pub fn generate_str(&self, source: &str, name: &str) -> miette::Result<TypeGenOutput> {
        let mut loader = MemoryLoader::new();
        loader.insert(name, source);
        self.generate_with(&loader, name)
    }

    /// Compile the document `entry` served by `loader`.
    pub fn generate_with(
        &self,
        loader: &dyn SourceLoader,
        entry: &str,
    ) -> miette::Result<TypeGenOutput> {
        Ok(self.generate_impl(loader, entry)?)
    }

    fn generate_impl(&self, loader: &dyn SourceLoader, entry: &str) -> Result<TypeGenOutput> {
        let Resolved {
            mut registry,
            methods,
        } = resolve_documents(loader, entry)?;
        let enums = assign_enum_names(&mut registry)?;

        let mut emitter = Emitter::new(
            &registry,
            &enums,
            self.use_enums,
            self.namespace.as_deref(),
        );
        let declarations = emitter.declarations()?;
        let used_names = emitter.used_names();

        let types = registry.declarations().cloned().collect();
        Ok(TypeGenOutput {
            declarations,
            used_names,
            enums,
            types,
            methods,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    fn compile_error(report: &miette::Report) -> &CompileError {
        report
            .downcast_ref::<CompileError>()
            .expect("compile errors surface as CompileError")
    }

    #[test]
    fn loads_referenced_documents_once() {
        let loader: MemoryLoader = [
            (
                "api.yaml",
                "components:\n  schemas:\n    Order:\n      properties:\n        item:\n          $ref: 'shared/item.yaml#/components/schemas/Item'\n",
            ),
            (
                "shared/item.yaml",
                "components:\n  schemas:\n    Item:\n      properties:\n        order:\n          $ref: '../api.yaml#/components/schemas/Order'\n        price:\n          $ref: '#/components/schemas/Price'\n    Price:\n      type: number\n",
            ),
        ]
        .into_iter()
        .collect();

        let resolved = resolve(&loader, "api.yaml").expect("documents resolve");
        let paths: Vec<_> = resolved.registry.paths().collect();
        assert_eq!(
            paths,
            vec![
                "api.yaml#/components/schemas/Order",
                "shared/item.yaml#/components/schemas/Item",
                "shared/item.yaml#/components/schemas/Price",
            ]
        );
        assert!(resolved.methods.is_empty());
    }

    #[test]
    fn missing_document_is_load_error() {
        let loader: MemoryLoader = [(
            "api.yaml",
            "components:\n  schemas:\n    A:\n      $ref: 'gone.yaml#/components/schemas/B'\n",
        )]
        .into_iter()
        .collect();
        let report = resolve(&loader, "api.yaml").unwrap_err();
        assert_eq!(compile_error(&report).kind(), ErrorKind::Load);
    }

    #[test]
    fn builder_is_reusable() {
        let source = "components:\n  schemas:\n    Flag:\n      type: string\n      enum: [open, shut]\n    Switch:\n      properties:\n        state:\n          type: string\n          enum: [up, down]\n";
        let mut generator = TypeGen::new();
        let inline = generator
            .generate_str(source, "api.yaml")
            .expect("compiles");
        assert_eq!(inline.declarations.len(), 2);

        let named = generator
            .use_enums(true)
            .namespace("Api")
            .generate_str(source, "api.yaml")
            .expect("compiles again");
        assert_eq!(named.declarations.len(), 3);
        assert!(named.declarations[0].starts_with("export enum State {"));
        assert_eq!(named.used_names, vec!["State"]);
        assert_eq!(named.enums.len(), 1);
    }
}
