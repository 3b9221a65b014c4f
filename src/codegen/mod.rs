//! swift code generation
//!
//! turns a [`CompilerContext`] into swift source artifacts: shared enum and
//! input object declarations, one class per operation, and one struct per
//! fragment.
//!
//! ```no_run
//! use typecase::{compile, generate, load_schema, GeneratorConfig, SchemaSource, SourceDocument};
//!
//! # fn main() -> typecase::Result<()> {
//! let schema = load_schema(&SchemaSource::file("schema.graphql"))?;
//! let documents = [SourceDocument::new("HeroName.graphql", "query HeroName { hero { name } }")];
//! let ctx = compile(schema, &documents)?;
//! let output = generate(&ctx, &GeneratorConfig::new())?;
//! for (path, text) in output.files() {
//!     println!("{}: {} bytes", path.display(), text.len());
//! }
//! # Ok(())
//! # }
//! ```

mod builder;
mod declarations;
mod merge;
pub(crate) mod naming;
mod operation;
mod selections;
mod type_case;
mod types;

use crate::config::{GeneratorConfig, OutputMode};
use crate::error::{Error, Result};
use crate::ir::{CompilerContext, Fragment, Operation};
use builder::CodeBuilder;
use declarations::SelectionSetEmitter;
use indexmap::IndexMap;
use naming::TypeNamer;
use serde::Serialize;
use std::path::{Path, PathBuf};

const BANNER: &str = "//  This file was automatically generated and should not be edited.";
const TYPES_FILE_NAME: &str = "Types.graphql.swift";

/// operation-id manifest entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationIdEntry {
    pub name: String,
    pub source: String,
}

/// generated artifacts keyed by relative path, plus the operation-id manifest
#[derive(Debug, Clone, Default)]
pub struct GeneratedOutput {
    files: IndexMap<PathBuf, String>,
    operation_ids: IndexMap<String, OperationIdEntry>,
}

impl GeneratedOutput {
    /// artifacts in generation order
    pub fn files(&self) -> &IndexMap<PathBuf, String> {
        &self.files
    }

    /// text of one artifact
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.files.get(path.as_ref()).map(String::as_str)
    }

    /// operation id -> name and identifying source; empty unless ids are enabled
    pub fn operation_ids(&self) -> &IndexMap<String, OperationIdEntry> {
        &self.operation_ids
    }

    /// the manifest as pretty-printed json
    pub fn operation_ids_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.operation_ids)?)
    }
}

/// generate swift artifacts for every operation and fragment in `ctx`
pub fn generate(ctx: &CompilerContext, config: &GeneratorConfig) -> Result<GeneratedOutput> {
    config.validate()?;
    // every operation type is checked before anything is rendered
    for operation in ctx.operations.values() {
        operation::OperationKind::of(operation)?;
    }

    let generator = Generator {
        ctx,
        config,
        emitter: SelectionSetEmitter::new(
            TypeNamer::new(&ctx.schema, config),
            config.merge_in_fields_from_fragment_spreads,
        ),
    };

    let mut output = GeneratedOutput::default();
    let mut identifiers = IndexMap::new();
    if config.generate_operation_ids {
        for operation in ctx.operations.values() {
            let source = operation::identifying_source(ctx, operation)?;
            let id = operation::operation_id(&source);
            identifiers.insert(operation.name.clone(), id.clone());
            output.operation_ids.insert(
                id,
                OperationIdEntry {
                    name: operation.name.clone(),
                    source,
                },
            );
        }
    }

    match config.output_mode {
        OutputMode::Combined => {
            let operations: Vec<&Operation> = ctx.operations.values().collect();
            let fragments: Vec<&Fragment> = ctx.fragments.values().collect();
            let text = generator.artifact(true, &operations, &fragments, &identifiers)?;
            output
                .files
                .insert(PathBuf::from(&config.combined_file_name), text);
        }
        OutputMode::PerFile => {
            let text = generator.artifact(true, &[], &[], &identifiers)?;
            output.files.insert(PathBuf::from(TYPES_FILE_NAME), text);

            let mut by_source: IndexMap<&Path, (Vec<&Operation>, Vec<&Fragment>)> =
                IndexMap::new();
            for operation in ctx.operations.values() {
                by_source
                    .entry(operation.file_path.as_path())
                    .or_default()
                    .0
                    .push(operation);
            }
            for fragment in ctx.fragments.values() {
                by_source
                    .entry(fragment.file_path.as_path())
                    .or_default()
                    .1
                    .push(fragment);
            }

            for (source, (operations, fragments)) in by_source {
                let file_name = per_file_name(source)?;
                if output.files.contains_key(&file_name) {
                    return Err(Error::Config(format!(
                        "two documents map to the same output file {}",
                        file_name.display()
                    )));
                }
                let text = generator.artifact(false, &operations, &fragments, &identifiers)?;
                output.files.insert(file_name, text);
            }
        }
    }

    tracing::info!(
        files = output.files.len(),
        operations = ctx.operations.len(),
        fragments = ctx.fragments.len(),
        "generated swift sources"
    );
    Ok(output)
}

/// `queries/HeroName.graphql` -> `HeroName.graphql.swift`
fn per_file_name(source: &Path) -> Result<PathBuf> {
    let stem = source
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| {
            Error::Config(format!(
                "cannot derive an output file name from {}",
                source.display()
            ))
        })?;
    let file_name = PathBuf::from(format!("{stem}.graphql.swift"));
    if file_name.as_path() == Path::new(TYPES_FILE_NAME) {
        return Err(Error::Config(format!(
            "{} would overwrite the shared types file",
            source.display()
        )));
    }
    Ok(file_name)
}

struct Generator<'a> {
    ctx: &'a CompilerContext,
    config: &'a GeneratorConfig,
    emitter: SelectionSetEmitter<'a>,
}

impl Generator<'_> {
    /// one artifact; `with_types` adds the used enums and input objects
    fn artifact(
        &self,
        with_types: bool,
        operations: &[&Operation],
        fragments: &[&Fragment],
        identifiers: &IndexMap<String, String>,
    ) -> Result<String> {
        let mut b = CodeBuilder::new();
        b.line(BANNER);
        b.blank();
        b.line("import Apollo");
        b.line("import Foundation");

        match self.config.namespace() {
            Some(namespace) => {
                if with_types {
                    b.blank();
                    b.line(format!("public enum {namespace} {{}}"));
                }
                b.blank();
                b.block(format!("public extension {namespace}"), |b| {
                    self.declarations(b, with_types, operations, fragments, identifiers)
                })?;
            }
            None => self.declarations(&mut b, with_types, operations, fragments, identifiers)?,
        }
        Ok(b.finish())
    }

    fn declarations(
        &self,
        b: &mut CodeBuilder,
        with_types: bool,
        operations: &[&Operation],
        fragments: &[&Fragment],
        identifiers: &IndexMap<String, String>,
    ) -> Result<()> {
        if with_types {
            for name in &self.ctx.used_types {
                b.blank();
                types::type_declaration(b, self.emitter.namer(), name)?;
            }
        }
        for operation in operations {
            tracing::debug!(operation = %operation.name, "generating operation");
            b.blank();
            operation::operation_declaration(
                b,
                &self.emitter,
                self.ctx,
                operation,
                identifiers.get(&operation.name).map(String::as_str),
            )?;
        }
        for fragment in fragments {
            tracing::debug!(fragment = %fragment.name, "generating fragment");
            b.blank();
            operation::fragment_declaration(b, &self.emitter, fragment)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::{compile, SourceDocument};
    use crate::test_support::{compile_document, starwars_schema};

    const HERO_NAME: &str = "query HeroName($episode: Episode) { hero(episode: $episode) { name } }";

    #[test]
    fn test_combined_output() {
        let ctx = compile_document(HERO_NAME);
        let output = generate(&ctx, &GeneratorConfig::new()).unwrap();
        assert_eq!(output.files().len(), 1);
        let text = output.get("API.swift").unwrap();
        assert!(text.starts_with(concat!(
            "//  This file was automatically generated and should not be edited.\n",
            "\n",
            "import Apollo\n",
            "import Foundation\n",
            "\n",
            "/// The episodes in the Star Wars trilogy\n",
            "public enum Episode: ",
        )));
        let enum_at = text.find("public enum Episode").unwrap();
        let class_at = text.find("public final class HeroNameQuery").unwrap();
        assert!(enum_at < class_at);
        assert!(output.operation_ids().is_empty());
    }

    #[test]
    fn test_combined_order_operations_then_fragments() {
        let ctx = compile_document(
            "fragment HeroDetails on Character { name }
             query Hero { hero { ...HeroDetails } }",
        );
        let output = generate(
            &ctx,
            &GeneratorConfig::new().with_combined_file_name("StarWarsAPI.swift"),
        )
        .unwrap();
        let text = output.get("StarWarsAPI.swift").unwrap();
        let class_at = text.find("public final class HeroQuery").unwrap();
        let fragment_at = text.find("public struct HeroDetails: GraphQLFragment").unwrap();
        assert!(class_at < fragment_at);
    }

    #[test]
    fn test_namespace_wraps_declarations() {
        let ctx = compile_document(HERO_NAME);
        let config = GeneratorConfig::new().with_namespace("StarWarsAPI");
        let text = generate(&ctx, &config).unwrap().get("API.swift").unwrap().to_string();
        assert!(text.contains("import Foundation\n\npublic enum StarWarsAPI {}\n\npublic extension StarWarsAPI {\n"));
        assert!(text.contains("\n  public final class HeroNameQuery: GraphQLQuery {\n"));
        assert!(text.ends_with("  }\n}\n"));
    }

    #[test]
    fn test_per_file_output() {
        let documents = [
            SourceDocument::new("queries/HeroName.graphql", HERO_NAME),
            SourceDocument::new(
                "fragments/HeroDetails.graphql",
                "fragment HeroDetails on Character { name }",
            ),
        ];
        let ctx = compile(starwars_schema(), &documents).unwrap();
        let config = GeneratorConfig::new()
            .with_output_mode(OutputMode::PerFile)
            .with_namespace("API");
        let output = generate(&ctx, &config).unwrap();

        let names: Vec<_> = output.files().keys().cloned().collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("Types.graphql.swift"),
                PathBuf::from("HeroName.graphql.swift"),
                PathBuf::from("HeroDetails.graphql.swift"),
            ]
        );
        let types = output.get("Types.graphql.swift").unwrap();
        assert!(types.contains("public enum API {}"));
        assert!(types.contains("public enum Episode: "));
        assert!(!types.contains("HeroNameQuery"));

        let hero_name = output.get("HeroName.graphql.swift").unwrap();
        assert!(!hero_name.contains("public enum API {}"));
        assert!(hero_name.contains("public extension API {"));
        assert!(hero_name.contains("public final class HeroNameQuery"));
        assert!(!hero_name.contains("public enum Episode"));
    }

    #[test]
    fn test_per_file_types_artifact_without_types() {
        let ctx = compile_document("query HeroName { hero { name } }");
        let config = GeneratorConfig::new().with_output_mode(OutputMode::PerFile);
        let output = generate(&ctx, &config).unwrap();
        assert_eq!(
            output.get("Types.graphql.swift").unwrap(),
            "//  This file was automatically generated and should not be edited.\n\nimport Apollo\nimport Foundation\n"
        );
        assert!(output.get("StarWars.graphql.swift").is_some());
    }

    #[test]
    fn test_per_file_name_collisions() {
        let documents = [
            SourceDocument::new("a/Hero.graphql", "query A { hero { name } }"),
            SourceDocument::new("b/Hero.graphql", "query B { hero { id } }"),
        ];
        let ctx = compile(starwars_schema(), &documents).unwrap();
        let config = GeneratorConfig::new().with_output_mode(OutputMode::PerFile);
        assert!(matches!(generate(&ctx, &config), Err(Error::Config(_))));

        assert!(per_file_name(Path::new("Types.graphql")).is_err());
        assert_eq!(
            per_file_name(Path::new("q/HeroName.graphql")).unwrap(),
            PathBuf::from("HeroName.graphql.swift")
        );
    }

    #[test]
    fn test_operation_id_manifest() {
        let ctx = compile_document(
            "query HeroAndFriendsNamesWithFragment { hero { name ...FriendsNames } }
             fragment FriendsNames on Character { friends { name } }",
        );
        let config = GeneratorConfig::new().with_operation_ids(true);
        let output = generate(&ctx, &config).unwrap();
        assert_eq!(output.operation_ids().len(), 1);
        let (id, entry) = output.operation_ids().first().unwrap();
        assert_eq!(entry.name, "HeroAndFriendsNamesWithFragment");
        assert!(entry.source.contains("fragment FriendsNames on Character"));
        assert!(output
            .get("API.swift")
            .unwrap()
            .contains(&format!("public let operationIdentifier: String? = \"{id}\"")));

        let json: serde_json::Value =
            serde_json::from_str(&output.operation_ids_json().unwrap()).unwrap();
        assert_eq!(json[id]["name"], "HeroAndFriendsNamesWithFragment");
    }

    #[test]
    fn test_unknown_operation_type_aborts_before_output() {
        let mut ctx = compile_document(HERO_NAME);
        ctx.operations[0].operation_type = "fetch".to_string();
        let err = generate(&ctx, &GeneratorConfig::new()).unwrap_err();
        assert!(matches!(err, Error::UnknownOperationType { .. }));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let ctx = compile_document(HERO_NAME);
        let err = generate(&ctx, &GeneratorConfig::new().with_namespace("not valid")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_deterministic() {
        let document = "query HeroDetails($episode: Episode) {
            hero(episode: $episode) { name ... on Human { height } ... on Droid { primaryFunction } }
        }";
        let config = GeneratorConfig::new().with_operation_ids(true);
        let first = generate(&compile_document(document), &config).unwrap();
        let second = generate(&compile_document(document), &config).unwrap();
        assert_eq!(first.files(), second.files());
        assert_eq!(first.operation_ids(), second.operation_ids());
    }
}
