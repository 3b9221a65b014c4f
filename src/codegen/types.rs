//! enum and input object declarations

use super::builder::CodeBuilder;
use super::naming::{camel_case, escape_identifier, property_name, string_literal, TypeNamer};
use crate::error::{Error, Result};
use crate::schema::{NamedType, TypeKind};

/// declaration for a used enum or input object
pub(crate) fn type_declaration(b: &mut CodeBuilder, namer: &TypeNamer<'_>, name: &str) -> Result<()> {
    let ty = namer.schema().get(name).ok_or_else(|| Error::UnsupportedType {
        type_name: name.to_string(),
        context: "used types".to_string(),
    })?;
    match ty.kind {
        TypeKind::Enum => enum_declaration(b, ty),
        TypeKind::InputObject => input_object_declaration(b, namer, ty),
        _ => Err(Error::UnsupportedType {
            type_name: name.to_string(),
            context: "used types".to_string(),
        }),
    }
}

/// enum case name for a schema value (`NEWHOPE` -> `newhope`)
fn case_name(value: &str) -> String {
    escape_identifier(&camel_case(value))
}

/// string-backed enum with a `__unknown` case for values added server-side
pub(crate) fn enum_declaration(b: &mut CodeBuilder, ty: &NamedType) -> Result<()> {
    let name = &ty.name;
    let cases: Vec<(String, &str)> = ty
        .values
        .iter()
        .map(|value| (case_name(&value.name), value.name.as_str()))
        .collect();

    if let Some(description) = &ty.description {
        b.doc(description);
    }
    b.block(
        format!(
            "public enum {name}: RawRepresentable, Equatable, Hashable, CaseIterable, Apollo.JSONDecodable, Apollo.JSONEncodable"
        ),
        |b| {
            b.line("public typealias RawValue = String");
            for (value, (case, _)) in ty.values.iter().zip(&cases) {
                if let Some(description) = &value.description {
                    b.doc(description);
                }
                b.line(format!("case {case}"));
            }
            b.line("/// Auto generated constant for unknown enum values");
            b.line("case __unknown(RawValue)");
            b.blank();

            b.block("public init?(rawValue: RawValue)", |b| {
                b.block("switch rawValue", |b| {
                    for (case, raw) in &cases {
                        b.line(format!("case {}: self = .{case}", string_literal(raw)));
                    }
                    b.line("default: self = .__unknown(rawValue)");
                    Ok(())
                })
            })?;
            b.blank();

            b.block("public var rawValue: RawValue", |b| {
                b.block("switch self", |b| {
                    for (case, raw) in &cases {
                        b.line(format!("case .{case}: return {}", string_literal(raw)));
                    }
                    b.line("case .__unknown(let value): return value");
                    Ok(())
                })
            })?;
            b.blank();

            b.block(
                format!("public static func == (lhs: {name}, rhs: {name}) -> Bool"),
                |b| {
                    b.block("switch (lhs, rhs)", |b| {
                        for (case, _) in &cases {
                            b.line(format!("case (.{case}, .{case}): return true"));
                        }
                        b.line("case (.__unknown(let lhsValue), .__unknown(let rhsValue)): return lhsValue == rhsValue");
                        b.line("default: return false");
                        Ok(())
                    })
                },
            )?;
            b.blank();

            b.block(format!("public static var allCases: [{name}]"), |b| {
                b.wrapped("return [", "]", |b| {
                    for (case, _) in &cases {
                        b.line(format!(".{case},"));
                    }
                    Ok(())
                })
            })
        },
    )
}

/// `GraphQLMapConvertible` struct; nullable fields are `Swift.Optional<T?>`
/// so an omitted value (`.none`) stays distinct from an explicit null
pub(crate) fn input_object_declaration(
    b: &mut CodeBuilder,
    namer: &TypeNamer<'_>,
    ty: &NamedType,
) -> Result<()> {
    struct InputProperty<'f> {
        key: &'f str,
        name: String,
        swift_type: String,
        optional: bool,
        description: Option<&'f str>,
    }

    let mut properties = Vec::with_capacity(ty.input_fields.len());
    for field in &ty.input_fields {
        let optional = !field.field_type.is_non_null();
        let swift_type = namer.type_name(&field.field_type, None)?;
        properties.push(InputProperty {
            key: &field.name,
            name: property_name(&field.name),
            swift_type: if optional {
                format!("Swift.Optional<{swift_type}>")
            } else {
                swift_type
            },
            optional,
            description: field.description.as_deref(),
        });
    }

    if let Some(description) = &ty.description {
        b.doc(description);
    }
    b.block(format!("public struct {}: GraphQLMapConvertible", ty.name), |b| {
        b.line("public var graphQLMap: GraphQLMap");
        b.blank();

        if properties.iter().any(|property| property.description.is_some()) {
            b.line("/// - Parameters:");
            for property in &properties {
                match property.description {
                    Some(description) => {
                        let first = description.lines().next().unwrap_or_default();
                        b.line(format!("///   - {}: {first}", property.name));
                    }
                    None => b.line(format!("///   - {}", property.name)),
                }
            }
        }
        let parameters = properties
            .iter()
            .map(|property| {
                let default = if property.optional { " = nil" } else { "" };
                format!("{}: {}{default}", property.name, property.swift_type)
            })
            .collect::<Vec<_>>()
            .join(", ");
        let entries = properties
            .iter()
            .map(|property| format!("{}: {}", string_literal(property.key), property.name))
            .collect::<Vec<_>>()
            .join(", ");
        b.block(format!("public init({parameters})"), |b| {
            if entries.is_empty() {
                b.line("graphQLMap = [:]");
            } else {
                b.line(format!("graphQLMap = [{entries}]"));
            }
            Ok(())
        })?;

        for property in &properties {
            b.blank();
            if let Some(description) = property.description {
                b.doc(description);
            }
            let key = string_literal(property.key);
            let swift_type = &property.swift_type;
            b.block(format!("public var {}: {swift_type}", property.name), |b| {
                b.block("get", |b| {
                    if property.optional {
                        b.line(format!(
                            "return graphQLMap[{key}] as? {swift_type} ?? {swift_type}.none"
                        ));
                    } else {
                        b.line(format!("return graphQLMap[{key}] as! {swift_type}"));
                    }
                    Ok(())
                })?;
                b.block("set", |b| {
                    b.line(format!("graphQLMap.updateValue(newValue, forKey: {key})"));
                    Ok(())
                })
            })?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::test_support::starwars_schema;
    use pretty_assertions::assert_eq;

    fn render(name: &str) -> String {
        let schema = starwars_schema();
        let config = GeneratorConfig::new();
        let namer = TypeNamer::new(&schema, &config);
        let mut b = CodeBuilder::new();
        type_declaration(&mut b, &namer, name).unwrap();
        b.finish()
    }

    #[test]
    fn test_enum_declaration() {
        let expected = r#"/// Units of height
public enum LengthUnit: RawRepresentable, Equatable, Hashable, CaseIterable, Apollo.JSONDecodable, Apollo.JSONEncodable {
  public typealias RawValue = String
  /// The standard unit around the world
  case meter
  /// Primarily used in the United States
  case foot
  /// Auto generated constant for unknown enum values
  case __unknown(RawValue)

  public init?(rawValue: RawValue) {
    switch rawValue {
      case "METER": self = .meter
      case "FOOT": self = .foot
      default: self = .__unknown(rawValue)
    }
  }

  public var rawValue: RawValue {
    switch self {
      case .meter: return "METER"
      case .foot: return "FOOT"
      case .__unknown(let value): return value
    }
  }

  public static func == (lhs: LengthUnit, rhs: LengthUnit) -> Bool {
    switch (lhs, rhs) {
      case (.meter, .meter): return true
      case (.foot, .foot): return true
      case (.__unknown(let lhsValue), .__unknown(let rhsValue)): return lhsValue == rhsValue
      default: return false
    }
  }

  public static var allCases: [LengthUnit] {
    return [
      .meter,
      .foot,
    ]
  }
}
"#;
        assert_eq!(render("LengthUnit"), expected);
    }

    #[test]
    fn test_enum_case_names_are_escaped() {
        let schema = crate::schema::Schema::parse("type Query { a: Int } enum Kind { DEFAULT PUBLIC_KEY }")
            .unwrap();
        let mut b = CodeBuilder::new();
        enum_declaration(&mut b, schema.get("Kind").unwrap()).unwrap();
        let output = b.finish();
        assert!(output.contains("  case `default`\n"));
        assert!(output.contains("  case publicKey\n"));
        assert!(output.contains("case \"PUBLIC_KEY\": self = .publicKey"));
    }

    #[test]
    fn test_input_object_declaration() {
        let output = render("ReviewInput");
        assert!(output.starts_with(
            "/// The input object sent when someone is creating a new review\npublic struct ReviewInput: GraphQLMapConvertible {\n"
        ));
        assert!(output.contains(concat!(
            "  /// - Parameters:\n",
            "  ///   - stars: 0-5 stars\n",
            "  ///   - commentary: Comment about the movie, optional\n",
            "  ///   - favoriteColor: Favorite color, optional\n",
            "  public init(stars: Int, commentary: Swift.Optional<String?> = nil, favoriteColor: Swift.Optional<ColorInput?> = nil) {\n",
            "    graphQLMap = [\"stars\": stars, \"commentary\": commentary, \"favorite_color\": favoriteColor]\n",
            "  }\n",
        )));
        assert!(output.contains("return graphQLMap[\"stars\"] as! Int\n"));
        assert!(output.contains(
            "return graphQLMap[\"commentary\"] as? Swift.Optional<String?> ?? Swift.Optional<String?>.none\n"
        ));
        assert!(output.contains("graphQLMap.updateValue(newValue, forKey: \"favorite_color\")"));
    }

    #[test]
    fn test_input_object_without_descriptions() {
        let output = render("ColorInput");
        assert!(!output.contains("- Parameters:"));
        assert!(output.contains("public init(red: Int, green: Int, blue: Int) {"));
    }

    #[test]
    fn test_composite_is_not_a_type_declaration() {
        let schema = starwars_schema();
        let config = GeneratorConfig::new();
        let namer = TypeNamer::new(&schema, &config);
        let mut b = CodeBuilder::new();
        let err = type_declaration(&mut b, &namer, "Human").unwrap_err();
        assert!(matches!(err, Error::UnsupportedType { .. }));
    }
}
