//! shared fixtures for unit tests

use crate::frontend::{compile, SourceDocument};
use crate::ir::CompilerContext;
use crate::schema::Schema;

pub(crate) const STARWARS_SCHEMA: &str = include_str!("../tests/fixtures/starwars.graphql");

pub(crate) fn starwars_schema() -> Schema {
    Schema::parse(STARWARS_SCHEMA).expect("fixture schema parses")
}

/// compile a single document against the star wars schema
pub(crate) fn compile_document(text: &str) -> CompilerContext {
    compile(
        starwars_schema(),
        &[SourceDocument::new("StarWars.graphql", text)],
    )
    .expect("fixture document compiles")
}
