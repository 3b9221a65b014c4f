//! graphql to swift code generator
//!
//! this crate compiles graphql operations and fragments against a schema and
//! emits typed swift data-access code for an apollo-style runtime: one
//! struct per selection set, variant structs for type conditions, fragment
//! views, enums, and input objects.
//!
//! ## quick start
//!
//! ```no_run
//! use typecase::{compile, generate, load_schema, read_documents, write_output};
//! use typecase::{GeneratorConfig, SchemaSource};
//! use std::path::{Path, PathBuf};
//!
//! # fn main() -> typecase::Result<()> {
//! let schema = load_schema(&SchemaSource::file("schema.graphql"))?;
//! let documents = read_documents(&[PathBuf::from("graphql")])?;
//! let ctx = compile(schema, &documents)?;
//! let config = GeneratorConfig::new().with_namespace("StarWarsAPI");
//! let output = generate(&ctx, &config)?;
//! write_output(&output, Path::new("Generated"))?;
//! # Ok(())
//! # }
//! ```
//!
//! ## pipeline
//!
//! - [`Schema::parse`] builds the type model from sdl
//! - [`compile`] lowers executable documents into a [`CompilerContext`]
//! - [`generate`] renders swift artifacts and the operation-id manifest

mod codegen;
mod config;
mod error;
mod frontend;
pub mod ir;
mod loader;
mod schema;

#[cfg(test)]
mod test_support;

pub use codegen::{generate, GeneratedOutput, OperationIdEntry};
pub use config::{GeneratorConfig, OutputMode};
pub use error::{Error, Result};
pub use frontend::{compile, SourceDocument};
pub use ir::CompilerContext;
pub use loader::{load_schema, read_documents, write_operation_ids, write_output, SchemaSource};
pub use schema::{EnumValue, FieldDefinition, InputField, NamedType, Schema, TypeKind};
