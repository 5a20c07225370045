//! OpenAPI to TypeScript compiler: resolve multi-file OpenAPI schemas and emit
//! TypeScript type declarations.
//!
//! Schemas may reference schemas in other documents
//! (`common.yaml#/components/schemas/Id`); every referenced document is loaded
//! relative to the document referring to it, cycles included. The resolved
//! schemas are rendered as `export type` declarations, and inline string
//! enums can optionally be emitted as named `export enum` declarations.
//!
//! This crate provides two entry points:
//!
//! - [`TypeGen`]: a non-consuming builder that compiles a document to
//!   TypeScript declarations and can be reused across calls.
//! - [`resolve`]: load and resolve the documents only, yielding the type
//!   registry and the entry document's API methods for other generators.
//!
//! # Generating declarations
//!
//! ```no_run
//! use openapi_typegen::TypeGen;
//!
//! let output = TypeGen::new()
//!     .use_enums(true)
//!     .generate("specs/openapi.yaml")?;
//! for declaration in &output.declarations {
//!     println!("{declaration}\n");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Documents held in memory
//!
//! ```
//! use openapi_typegen::{MemoryLoader, TypeGen};
//!
//! let loader: MemoryLoader = [
//!     ("api.yaml", "components:\n  schemas:\n    User:\n      $ref: 'ids.yaml#/components/schemas/UserId'\n"),
//!     ("ids.yaml", "components:\n  schemas:\n    UserId:\n      type: string\n"),
//! ]
//! .into_iter()
//! .collect();
//!
//! let output = TypeGen::new().generate_with(&loader, "api.yaml")?;
//! assert_eq!(output.declarations, ["export type User = UserId;", "export type UserId = string;"]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Error handling
//!
//! All fallible methods return [`miette::Result`]. Every failure is fatal and
//! carries a [`CompileError`]; use [`miette::Report::downcast_ref`] and
//! [`CompileError::kind`] to tell failure classes apart.

pub(crate) mod compiler;
pub(crate) mod convert;
pub(crate) mod document;
pub(crate) mod emit;
pub(crate) mod error;
pub mod model;
pub(crate) mod naming;
pub(crate) mod operations;
pub(crate) mod reader;
pub(crate) mod resolve;
pub(crate) mod source;
pub(crate) mod suggest;

// Re-export the small number of public API at the crate root.
pub use compiler::{Resolved, TypeGen, TypeGenOutput, resolve};
pub use emit::Emitter;
pub use error::{CompileError, ErrorKind};
pub use naming::{EnumTable, assign_enum_names};
pub use resolve::TypeRegistry;
pub use source::{FsLoader, MemoryLoader, SourceLoader, parse_document};
