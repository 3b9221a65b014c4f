//! selection metadata
//!
//! renders the `[GraphQLSelection]` recipe a decoder walks to read a
//! response. composite fields reference their nested struct's own
//! `selections` and fragment spreads reference the fragment type, so nothing
//! is inlined and recursive selection sets terminate.

use super::builder::CodeBuilder;
use super::naming::{string_literal, struct_name_for_property, TypeNamer};
use crate::error::{Error, Result};
use crate::ir::{ArgumentValue, Field, GraphQlType, Selection};
use crate::schema::TypeKind;

/// one metadata entry per selection, each terminated by a comma
pub(crate) fn emit_selections<'s>(
    b: &mut CodeBuilder,
    namer: &TypeNamer<'_>,
    selections: impl IntoIterator<Item = &'s Selection>,
) -> Result<()> {
    for selection in selections {
        match selection {
            Selection::Field(field) => b.line(format!("{},", field_initializer(namer, field)?)),
            Selection::BooleanCondition(condition) => b.wrapped(
                format!(
                    "GraphQLBooleanCondition(variableName: {}, inverted: {}, selections: [",
                    string_literal(&condition.variable_name),
                    condition.inverted
                ),
                "]),",
                |b| emit_selections(b, namer, &condition.selection_set.selections),
            )?,
            Selection::TypeCondition(condition) => b.wrapped(
                format!(
                    "GraphQLTypeCondition(possibleTypes: [{}], selections: [",
                    string_list(&condition.selection_set.possible_types)
                ),
                "]),",
                |b| emit_selections(b, namer, &condition.selection_set.selections),
            )?,
            Selection::FragmentSpread(spread) => {
                b.line(format!("GraphQLFragmentSpread({}.self),", spread.fragment_name))
            }
        }
    }
    Ok(())
}

/// `GraphQLField(...)` for one field
pub(crate) fn field_initializer(namer: &TypeNamer<'_>, field: &Field) -> Result<String> {
    let mut args = vec![string_literal(&field.name)];
    if let Some(alias) = &field.alias {
        args.push(format!("alias: {}", string_literal(alias)));
    }
    if !field.arguments.is_empty() {
        let arguments = field
            .arguments
            .iter()
            .map(|argument| {
                format!(
                    "{}: {}",
                    string_literal(&argument.name),
                    argument_expression(&argument.value)
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        args.push(format!("arguments: [{arguments}]"));
    }
    let struct_name = struct_name_for_property(field.response_key());
    args.push(format!(
        "type: {}",
        field_type_descriptor(namer, &field.field_type, &struct_name, field)?
    ));
    Ok(format!("GraphQLField({})", args.join(", ")))
}

fn field_type_descriptor(
    namer: &TypeNamer<'_>,
    ty: &GraphQlType,
    struct_name: &str,
    field: &Field,
) -> Result<String> {
    Ok(match ty {
        GraphQlType::NonNull(inner) => format!(
            ".nonNull({})",
            field_type_descriptor(namer, inner, struct_name, field)?
        ),
        GraphQlType::List(inner) => format!(
            ".list({})",
            field_type_descriptor(namer, inner, struct_name, field)?
        ),
        GraphQlType::Named(name) => match namer.schema().kind(name) {
            Some(TypeKind::Scalar) => format!(".scalar({}.self)", namer.scalar_name(name)),
            Some(TypeKind::Enum) => format!(".scalar({name}.self)"),
            Some(kind) if kind.is_composite() => format!(".object({struct_name}.selections)"),
            _ => {
                return Err(Error::UnsupportedType {
                    type_name: name.clone(),
                    context: format!("field `{}`", field.response_key()),
                })
            }
        },
    })
}

/// swift literal for an argument value; variables become `GraphQLVariable`
pub(crate) fn argument_expression(value: &ArgumentValue) -> String {
    match value {
        ArgumentValue::Variable(name) => format!("GraphQLVariable({})", string_literal(name)),
        ArgumentValue::Int(value) => value.to_string(),
        ArgumentValue::Float(value) => format!("{value:?}"),
        ArgumentValue::String(value) | ArgumentValue::Enum(value) => string_literal(value),
        ArgumentValue::Boolean(value) => value.to_string(),
        ArgumentValue::Null => "nil".to_string(),
        ArgumentValue::List(items) => format!(
            "[{}]",
            items
                .iter()
                .map(argument_expression)
                .collect::<Vec<_>>()
                .join(", ")
        ),
        ArgumentValue::Object(fields) if fields.is_empty() => "[:]".to_string(),
        ArgumentValue::Object(fields) => format!(
            "[{}]",
            fields
                .iter()
                .map(|(name, value)| format!("{}: {}", string_literal(name), argument_expression(value)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

/// `"A", "B"`
pub(crate) fn string_list(values: &[String]) -> String {
    values
        .iter()
        .map(|value| string_literal(value))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::test_support::{compile_document, starwars_schema};
    use pretty_assertions::assert_eq;

    fn render(document: &str, operation: &str) -> String {
        let ctx = compile_document(document);
        let config = GeneratorConfig::new();
        let namer = TypeNamer::new(&ctx.schema, &config);
        let mut b = CodeBuilder::new();
        let Selection::Field(root) = &ctx.operations[operation].selection_set.selections[0] else {
            panic!("expected field");
        };
        emit_selections(&mut b, &namer, &root.selection_set.as_ref().unwrap().selections)
            .unwrap();
        b.finish()
    }

    #[test]
    fn test_fields_and_arguments() {
        let ctx = compile_document(
            "query HeroName($episode: Episode) { hero(episode: $episode) { name friends { id } } }",
        );
        let config = GeneratorConfig::new();
        let namer = TypeNamer::new(&ctx.schema, &config);
        let Selection::Field(hero) = &ctx.operations["HeroName"].selection_set.selections[0]
        else {
            panic!("expected field");
        };
        assert_eq!(
            field_initializer(&namer, hero).unwrap(),
            r#"GraphQLField("hero", arguments: ["episode": GraphQLVariable("episode")], type: .object(Hero.selections))"#
        );

        let rendered = render(
            "query HeroName($episode: Episode) { hero(episode: $episode) { name friends { id } } }",
            "HeroName",
        );
        assert_eq!(
            rendered,
            concat!(
                "GraphQLField(\"__typename\", type: .nonNull(.scalar(String.self))),\n",
                "GraphQLField(\"name\", type: .nonNull(.scalar(String.self))),\n",
                "GraphQLField(\"friends\", type: .list(.object(Friend.selections))),\n",
            )
        );
    }

    #[test]
    fn test_alias_enum_and_literal_arguments() {
        let rendered = render(
            "query Height { human(id: \"1000\") { tall: height(unit: FOOT) appearsIn } }",
            "Height",
        );
        assert_eq!(
            rendered,
            concat!(
                "GraphQLField(\"__typename\", type: .nonNull(.scalar(String.self))),\n",
                "GraphQLField(\"height\", alias: \"tall\", arguments: [\"unit\": \"FOOT\"], type: .scalar(Double.self)),\n",
                "GraphQLField(\"appearsIn\", type: .nonNull(.list(.scalar(Episode.self)))),\n",
            )
        );
    }

    #[test]
    fn test_boolean_conditions_nest() {
        let rendered = render(
            "query HeroNameConditionalBoth($skipName: Boolean!, $includeName: Boolean!) {
                hero { name @skip(if: $skipName) @include(if: $includeName) }
            }",
            "HeroNameConditionalBoth",
        );
        assert_eq!(
            rendered,
            concat!(
                "GraphQLField(\"__typename\", type: .nonNull(.scalar(String.self))),\n",
                "GraphQLBooleanCondition(variableName: \"includeName\", inverted: false, selections: [\n",
                "  GraphQLBooleanCondition(variableName: \"skipName\", inverted: true, selections: [\n",
                "    GraphQLField(\"name\", type: .nonNull(.scalar(String.self))),\n",
                "  ]),\n",
                "]),\n",
            )
        );
    }

    #[test]
    fn test_type_conditions_and_spreads() {
        let rendered = render(
            "query Hero { hero { ... on Droid { primaryFunction } ...HeroName } }
            fragment HeroName on Character { name }",
            "Hero",
        );
        assert_eq!(
            rendered,
            concat!(
                "GraphQLField(\"__typename\", type: .nonNull(.scalar(String.self))),\n",
                "GraphQLTypeCondition(possibleTypes: [\"Droid\"], selections: [\n",
                "  GraphQLField(\"primaryFunction\", type: .scalar(String.self)),\n",
                "]),\n",
                "GraphQLFragmentSpread(HeroName.self),\n",
            )
        );
    }

    #[test]
    fn test_custom_scalar_and_unsupported_type() {
        let ctx = compile_document("query Reviews { reviews(episode: JEDI) { createdAt } }");
        let config = GeneratorConfig::new()
            .with_passthrough_custom_scalars(true)
            .with_custom_scalars_prefix("Custom");
        let namer = TypeNamer::new(&ctx.schema, &config);
        let Selection::Field(reviews) = &ctx.operations["Reviews"].selection_set.selections[0]
        else {
            panic!("expected field");
        };
        let Selection::Field(created_at) = &reviews.selection_set.as_ref().unwrap().selections[1]
        else {
            panic!("expected field");
        };
        assert_eq!(
            field_initializer(&namer, created_at).unwrap(),
            r#"GraphQLField("createdAt", type: .scalar(CustomDateTime.self))"#
        );

        let schema = starwars_schema();
        let namer = TypeNamer::new(&schema, &config);
        let bogus = Field {
            name: "review".to_string(),
            alias: None,
            arguments: vec![],
            field_type: GraphQlType::named("ReviewInput"),
            description: None,
            selection_set: None,
        };
        assert!(matches!(
            field_initializer(&namer, &bogus),
            Err(Error::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_argument_expressions() {
        let value = ArgumentValue::Object(vec![
            ("stars".to_string(), ArgumentValue::Int(5)),
            ("ratio".to_string(), ArgumentValue::Float(1.0)),
            (
                "tags".to_string(),
                ArgumentValue::List(vec![ArgumentValue::Boolean(true), ArgumentValue::Null]),
            ),
        ]);
        assert_eq!(
            argument_expression(&value),
            r#"["stars": 5, "ratio": 1.0, "tags": [true, nil]]"#
        );
        assert_eq!(argument_expression(&ArgumentValue::Object(vec![])), "[:]");
    }
}
