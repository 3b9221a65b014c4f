//! operation and fragment declarations
//!
//! an operation becomes a `final class` carrying its wire document, name,
//! optional persisted-query identifier, variables, and the root `Data`
//! selection set. a fragment becomes a `GraphQLFragment` struct.

use super::builder::CodeBuilder;
use super::declarations::SelectionSetEmitter;
use super::naming::{property_name, string_literal, upper_first};
use crate::error::{Error, Result};
use crate::ir::{CompilerContext, Fragment, Operation};
use sha2::{Digest, Sha256};
use std::str::FromStr;

/// graphql operation type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    /// runtime protocol the operation class adopts
    pub(crate) fn protocol(self) -> &'static str {
        match self {
            OperationKind::Query => "GraphQLQuery",
            OperationKind::Mutation => "GraphQLMutation",
            OperationKind::Subscription => "GraphQLSubscription",
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            OperationKind::Query => "Query",
            OperationKind::Mutation => "Mutation",
            OperationKind::Subscription => "Subscription",
        }
    }

    pub(crate) fn of(operation: &Operation) -> Result<Self> {
        operation
            .operation_type
            .parse()
            .map_err(|_| Error::UnknownOperationType {
                operation: operation.name.clone(),
                operation_type: operation.operation_type.clone(),
            })
    }
}

impl FromStr for OperationKind {
    type Err = ();

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "query" => Ok(OperationKind::Query),
            "mutation" => Ok(OperationKind::Mutation),
            "subscription" => Ok(OperationKind::Subscription),
            _ => Err(()),
        }
    }
}

/// `HeroName` -> `HeroNameQuery`; an existing suffix is not repeated
pub(crate) fn operation_class_name(operation: &Operation) -> Result<String> {
    let suffix = OperationKind::of(operation)?.suffix();
    let name = upper_first(&operation.name);
    if name.ends_with(suffix) {
        Ok(name)
    } else {
        Ok(format!("{name}{suffix}"))
    }
}

/// operation source followed by every referenced fragment's source
pub(crate) fn identifying_source(ctx: &CompilerContext, operation: &Operation) -> Result<String> {
    let mut source = operation.source.clone();
    for name in operation.fragments_referenced() {
        let fragment = ctx
            .fragments
            .get(&name)
            .ok_or_else(|| Error::UnknownFragment(name.clone()))?;
        source.push('\n');
        source.push_str(&fragment.source);
    }
    Ok(source)
}

/// lowercase hex sha-256 of `source`
pub(crate) fn operation_id(source: &str) -> String {
    hex::encode(Sha256::digest(source.as_bytes()))
}

/// `"""` block holding `source`, indented one level below the declaration
fn multiline_literal(source: &str) -> String {
    let escaped = source.replace('\\', "\\\\").replace("\"\"\"", "\\\"\"\"");
    let mut out = String::from("  \"\"\"\n");
    for line in escaped.lines() {
        if !line.is_empty() {
            out.push_str("  ");
            out.push_str(line);
        }
        out.push('\n');
    }
    out.push_str("  \"\"\"");
    out
}

pub(crate) fn operation_declaration(
    b: &mut CodeBuilder,
    emitter: &SelectionSetEmitter<'_>,
    ctx: &CompilerContext,
    operation: &Operation,
    operation_identifier: Option<&str>,
) -> Result<()> {
    let kind = OperationKind::of(operation)?;
    let class_name = operation_class_name(operation)?;
    let fragments = operation.fragments_referenced();
    for name in &fragments {
        if !ctx.fragments.contains_key(name) {
            return Err(Error::UnknownFragment(name.clone()));
        }
    }

    let mut variables = Vec::with_capacity(operation.variables.len());
    for variable in &operation.variables {
        let swift_type = emitter.namer().type_name(&variable.variable_type, None)?;
        variables.push((variable, property_name(&variable.name), swift_type));
    }

    b.block(
        format!("public final class {class_name}: {}", kind.protocol()),
        |b| {
            b.line("/// The raw GraphQL definition of this operation.");
            b.line("public let operationDefinition: String =");
            b.lines(&multiline_literal(&operation.source));
            b.blank();
            b.line(format!(
                "public let operationName: String = {}",
                string_literal(&operation.name)
            ));

            if let Some(identifier) = operation_identifier {
                b.blank();
                b.line(format!(
                    "public let operationIdentifier: String? = {}",
                    string_literal(identifier)
                ));
            }

            if !fragments.is_empty() {
                b.blank();
                b.block("public var queryDocument: String", |b| {
                    b.line("var document: String = operationDefinition");
                    for name in &fragments {
                        b.line(format!("document.append(\"\\n\" + {name}.fragmentDefinition)"));
                    }
                    b.line("return document");
                    Ok(())
                })?;
            }

            b.blank();
            for (_, name, swift_type) in &variables {
                b.line(format!("public var {name}: {swift_type}"));
            }
            b.blank();
            let parameters = variables
                .iter()
                .map(|(_, name, swift_type)| {
                    let default = if swift_type.ends_with('?') { " = nil" } else { "" };
                    format!("{name}: {swift_type}{default}")
                })
                .collect::<Vec<_>>()
                .join(", ");
            b.block(format!("public init({parameters})"), |b| {
                for (_, name, _) in &variables {
                    b.line(format!("self.{name} = {name}"));
                }
                Ok(())
            })?;

            if !variables.is_empty() {
                b.blank();
                let entries = variables
                    .iter()
                    .map(|(variable, name, _)| format!("{}: {name}", string_literal(&variable.name)))
                    .collect::<Vec<_>>()
                    .join(", ");
                b.block("public var variables: GraphQLMap?", |b| {
                    b.line(format!("return [{entries}]"));
                    Ok(())
                })?;
            }

            b.blank();
            emitter.struct_declaration(
                b,
                "Data",
                "GraphQLSelectionSet",
                &operation.selection_set,
                None,
            )
        },
    )
}

pub(crate) fn fragment_declaration(
    b: &mut CodeBuilder,
    emitter: &SelectionSetEmitter<'_>,
    fragment: &Fragment,
) -> Result<()> {
    let preamble = format!(
        "/// The raw GraphQL definition of this fragment.\npublic static let fragmentDefinition: String =\n{}",
        multiline_literal(&fragment.source)
    );
    emitter.struct_declaration(
        b,
        &fragment.name,
        "GraphQLFragment",
        &fragment.selection_set,
        Some(&preamble),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::naming::TypeNamer;
    use crate::config::GeneratorConfig;
    use crate::test_support::compile_document;
    use pretty_assertions::assert_eq;

    const HERO_AND_FRIENDS: &str = "
        query HeroAndFriendsNamesWithFragment($episode: Episode) {
          hero(episode: $episode) { name ...FriendsNames }
        }
        fragment FriendsNames on Character { friends { name } }";

    fn render_operation(document: &str, name: &str, identifier: Option<&str>) -> String {
        let ctx = compile_document(document);
        let config = GeneratorConfig::new();
        let emitter = SelectionSetEmitter::new(TypeNamer::new(&ctx.schema, &config), true);
        let mut b = CodeBuilder::new();
        operation_declaration(&mut b, &emitter, &ctx, &ctx.operations[name], identifier).unwrap();
        b.finish()
    }

    #[test]
    fn test_class_names() {
        let ctx = compile_document(
            "query HeroName { hero { name } }
             query heroQuery { hero { id } }
             mutation CreateReview($review: ReviewInput!) { createReview(review: $review) { stars } }
             subscription ReviewAdded { reviewAdded { stars } }",
        );
        let names: Vec<String> = ctx
            .operations
            .values()
            .map(|operation| operation_class_name(operation).unwrap())
            .collect();
        assert_eq!(
            names,
            vec![
                "HeroNameQuery",
                "HeroQuery",
                "CreateReviewMutation",
                "ReviewAddedSubscription"
            ]
        );
    }

    #[test]
    fn test_unknown_operation_type() {
        let ctx = compile_document("query HeroName { hero { name } }");
        let mut operation = ctx.operations["HeroName"].clone();
        operation.operation_type = "fetch".to_string();
        let err = operation_class_name(&operation).unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownOperationType { ref operation_type, .. } if operation_type == "fetch"
        ));

        let config = GeneratorConfig::new();
        let emitter = SelectionSetEmitter::new(TypeNamer::new(&ctx.schema, &config), true);
        let mut b = CodeBuilder::new();
        assert!(operation_declaration(&mut b, &emitter, &ctx, &operation, None).is_err());
    }

    #[test]
    fn test_operation_declaration() {
        let output = render_operation(
            "query HeroName($episode: Episode) { hero(episode: $episode) { name } }",
            "HeroName",
            None,
        );
        let expected_head = r#"public final class HeroNameQuery: GraphQLQuery {
  /// The raw GraphQL definition of this operation.
  public let operationDefinition: String =
    """
    query HeroName($episode: Episode) {
      hero(episode: $episode) {
        __typename
        name
      }
    }
    """

  public let operationName: String = "HeroName"

  public var episode: Episode?

  public init(episode: Episode? = nil) {
    self.episode = episode
  }

  public var variables: GraphQLMap? {
    return ["episode": episode]
  }

  public struct Data: GraphQLSelectionSet {
    public static let possibleTypes: [String] = ["Query"]
"#;
        assert!(output.starts_with(expected_head), "{output}");
        assert!(output.contains(
            "GraphQLField(\"hero\", arguments: [\"episode\": GraphQLVariable(\"episode\")], type: .object(Hero.selections)),"
        ));
        assert!(output.contains("    public init(hero: Hero? = nil) {\n"));
        assert!(output.contains("    public struct Hero: GraphQLSelectionSet {\n"));
        assert!(!output.contains("queryDocument"));
        assert!(!output.contains("operationIdentifier"));
    }

    #[test]
    fn test_operation_without_variables() {
        let output = render_operation("query HeroName { hero { name } }", "HeroName", None);
        assert!(output.contains("  public init() {\n  }\n"));
        assert!(!output.contains("public var variables"));
    }

    #[test]
    fn test_query_document_and_identifier() {
        let ctx = compile_document(HERO_AND_FRIENDS);
        let operation = &ctx.operations["HeroAndFriendsNamesWithFragment"];
        let source = identifying_source(&ctx, operation).unwrap();
        assert!(source.starts_with("query HeroAndFriendsNamesWithFragment"));
        assert!(source.ends_with(&format!("\n{}", ctx.fragments["FriendsNames"].source)));
        let id = operation_id(&source);
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|ch| ch.is_ascii_hexdigit() && !ch.is_ascii_uppercase()));

        let output = render_operation(HERO_AND_FRIENDS, "HeroAndFriendsNamesWithFragment", Some(&id));
        assert!(output.contains(&format!(
            "  public let operationIdentifier: String? = \"{id}\"\n"
        )));
        assert!(output.contains(concat!(
            "  public var queryDocument: String {\n",
            "    var document: String = operationDefinition\n",
            "    document.append(\"\\n\" + FriendsNames.fragmentDefinition)\n",
            "    return document\n",
            "  }\n",
        )));
    }

    #[test]
    fn test_identifier_tracks_fragment_source() {
        let before = compile_document(HERO_AND_FRIENDS);
        let after = compile_document(&HERO_AND_FRIENDS.replace("friends { name }", "friends { id name }"));
        let spaced = compile_document(&HERO_AND_FRIENDS.replace("{ name }", "{\n\n  name\n}"));

        let id = |ctx: &CompilerContext| {
            let operation = &ctx.operations["HeroAndFriendsNamesWithFragment"];
            operation_id(&identifying_source(ctx, operation).unwrap())
        };
        assert_ne!(id(&before), id(&after));
        assert_eq!(id(&before), id(&spaced));
    }

    #[test]
    fn test_missing_fragment_is_fatal() {
        let mut ctx = compile_document(HERO_AND_FRIENDS);
        ctx.fragments.shift_remove("FriendsNames");
        let operation = ctx.operations["HeroAndFriendsNamesWithFragment"].clone();
        assert!(matches!(
            identifying_source(&ctx, &operation),
            Err(Error::UnknownFragment(ref name)) if name == "FriendsNames"
        ));
    }

    #[test]
    fn test_fragment_declaration() {
        let ctx = compile_document("fragment HeroDetails on Character { name ... on Droid { primaryFunction } }");
        let config = GeneratorConfig::new();
        let emitter = SelectionSetEmitter::new(TypeNamer::new(&ctx.schema, &config), true);
        let mut b = CodeBuilder::new();
        fragment_declaration(&mut b, &emitter, &ctx.fragments["HeroDetails"]).unwrap();
        let output = b.finish();
        assert!(output.starts_with(concat!(
            "public struct HeroDetails: GraphQLFragment {\n",
            "  /// The raw GraphQL definition of this fragment.\n",
            "  public static let fragmentDefinition: String =\n",
            "    \"\"\"\n",
            "    fragment HeroDetails on Character {\n",
        )));
        assert!(output.contains("  public static let possibleTypes: [String] = [\"Human\", \"Droid\"]\n"));
        assert!(output.contains("  public var asDroid: AsDroid? {\n"));
    }

    #[test]
    fn test_multiline_literal_escapes() {
        assert_eq!(
            multiline_literal("a \"\"\"b\"\"\" \\n\n\nc"),
            "  \"\"\"\n  a \\\"\"\"b\\\"\"\" \\\\n\n\n  c\n  \"\"\""
        );
    }
}
