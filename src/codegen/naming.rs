//! swift names
//!
//! maps graphql types to swift type names and derives the identifiers the
//! emitters use for properties, nested structs, variants, and operations.

use crate::config::GeneratorConfig;
use crate::error::{Error, Result};
use crate::ir::GraphQlType;
use crate::schema::{Schema, TypeKind};
use heck::{ToLowerCamelCase, ToUpperCamelCase};

/// maps graphql types to swift type names
pub(crate) struct TypeNamer<'a> {
    schema: &'a Schema,
    passthrough_custom_scalars: bool,
    custom_scalars_prefix: &'a str,
}

impl<'a> TypeNamer<'a> {
    pub(crate) fn new(schema: &'a Schema, config: &'a GeneratorConfig) -> Self {
        Self {
            schema,
            passthrough_custom_scalars: config.passthrough_custom_scalars,
            custom_scalars_prefix: &config.custom_scalars_prefix,
        }
    }

    pub(crate) fn schema(&self) -> &'a Schema {
        self.schema
    }

    /// swift type for `ty`; composite and enum types use `unmodified` when given
    pub(crate) fn type_name(&self, ty: &GraphQlType, unmodified: Option<&str>) -> Result<String> {
        self.type_name_inner(ty, unmodified, true)
    }

    /// like [`Self::type_name`], but always optional when `conditional`
    pub(crate) fn property_type_name(
        &self,
        ty: &GraphQlType,
        unmodified: Option<&str>,
        conditional: bool,
    ) -> Result<String> {
        if conditional {
            self.type_name(ty.nullable(), unmodified)
        } else {
            self.type_name(ty, unmodified)
        }
    }

    fn type_name_inner(
        &self,
        ty: &GraphQlType,
        unmodified: Option<&str>,
        optional: bool,
    ) -> Result<String> {
        let name = match ty {
            GraphQlType::NonNull(inner) => return self.type_name_inner(inner, unmodified, false),
            GraphQlType::List(inner) => format!("[{}]", self.type_name_inner(inner, unmodified, true)?),
            GraphQlType::Named(name) => match self.schema.kind(name) {
                Some(TypeKind::Scalar) => self.scalar_name(name),
                Some(TypeKind::Enum | TypeKind::Object | TypeKind::Interface | TypeKind::Union) => {
                    unmodified.unwrap_or(name).to_string()
                }
                Some(TypeKind::InputObject) => name.clone(),
                None => {
                    return Err(Error::UnsupportedType {
                        type_name: name.clone(),
                        context: "type name".to_string(),
                    })
                }
            },
        };
        Ok(if optional { format!("{name}?") } else { name })
    }

    /// swift type for a scalar
    pub(crate) fn scalar_name(&self, name: &str) -> String {
        match name {
            "String" => "String".to_string(),
            "Int" => "Int".to_string(),
            "Float" => "Double".to_string(),
            "Boolean" => "Bool".to_string(),
            "ID" => "GraphQLID".to_string(),
            custom if self.passthrough_custom_scalars => {
                format!("{}{custom}", self.custom_scalars_prefix)
            }
            _ => "String".to_string(),
        }
    }
}

/// swift type for `ty` with every named leaf replaced by `leaf`
pub(crate) fn wrapped_type(ty: &GraphQlType, leaf: &str, optional: bool) -> String {
    match ty {
        GraphQlType::NonNull(inner) => wrapped_type(inner, leaf, false),
        GraphQlType::List(inner) => {
            let list = format!("[{}]", wrapped_type(inner, leaf, true));
            if optional {
                format!("{list}?")
            } else {
                list
            }
        }
        GraphQlType::Named(_) if optional => format!("{leaf}?"),
        GraphQlType::Named(_) => leaf.to_string(),
    }
}

pub(crate) fn camel_case(name: &str) -> String {
    name.to_lower_camel_case()
}

pub(crate) fn pascal_case(name: &str) -> String {
    name.to_upper_camel_case()
}

/// uppercase the first character, keep the rest
pub(crate) fn upper_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// property name for a response key; meta fields keep their name
pub(crate) fn property_name(response_key: &str) -> String {
    if response_key.starts_with("__") {
        response_key.to_string()
    } else {
        escape_identifier(&camel_case(response_key))
    }
}

/// nested struct name for a composite field (`friends` -> `Friend`)
pub(crate) fn struct_name_for_property(response_key: &str) -> String {
    pascal_case(&singularize(response_key))
}

/// variant struct name (`AsHuman`, `AsHumanOrDroid`)
pub(crate) fn variant_struct_name(possible_types: &[String]) -> String {
    format!("As{}", variant_suffix(possible_types))
}

/// narrowing accessor name (`asHuman`)
pub(crate) fn variant_property_name(possible_types: &[String]) -> String {
    format!("as{}", variant_suffix(possible_types))
}

fn variant_suffix(possible_types: &[String]) -> String {
    possible_types
        .iter()
        .map(|ty| upper_first(ty))
        .collect::<Vec<_>>()
        .join("Or")
}

/// best-effort english singular of the last word
pub(crate) fn singularize(word: &str) -> String {
    const IRREGULAR: [(&str, &str); 4] = [
        ("people", "person"),
        ("children", "child"),
        ("men", "man"),
        ("data", "datum"),
    ];
    let lower = word.to_ascii_lowercase();
    for (plural, singular) in IRREGULAR {
        if lower.ends_with(plural) {
            let stem = &word[..word.len() - plural.len()];
            if stem.is_empty() || stem.ends_with(|c: char| c == '_' || c.is_lowercase()) {
                let tail = &word[word.len() - plural.len()..];
                let singular = if tail.starts_with(|c: char| c.is_uppercase()) {
                    upper_first(singular)
                } else {
                    singular.to_string()
                };
                return format!("{stem}{singular}");
            }
        }
    }

    if lower.ends_with("ies") && word.len() > 3 {
        return format!("{}y", &word[..word.len() - 3]);
    }
    for suffix in ["sses", "shes", "ches", "xes", "zes"] {
        if lower.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if lower.ends_with("ss") || lower.ends_with("us") || lower.ends_with("is") {
        return word.to_string();
    }
    if lower.ends_with('s') && word.len() > 1 {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

/// escape a swift keyword with backticks
pub(crate) fn escape_identifier(name: &str) -> String {
    if is_swift_keyword(name) {
        format!("`{name}`")
    } else {
        name.to_string()
    }
}

/// true if `name` can be used unescaped as a swift identifier
pub(crate) fn is_swift_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|first| first == '_' || first.is_ascii_alphabetic());
    valid_start
        && chars.all(|ch| ch == '_' || ch.is_ascii_alphanumeric())
        && !is_swift_keyword(name)
}

/// swift string literal with quotes and escapes
pub(crate) fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

fn is_swift_keyword(name: &str) -> bool {
    matches!(
        name,
        "associatedtype"
            | "class"
            | "deinit"
            | "enum"
            | "extension"
            | "fileprivate"
            | "func"
            | "import"
            | "init"
            | "inout"
            | "internal"
            | "let"
            | "open"
            | "operator"
            | "private"
            | "protocol"
            | "public"
            | "static"
            | "struct"
            | "subscript"
            | "typealias"
            | "var"
            | "break"
            | "case"
            | "continue"
            | "default"
            | "defer"
            | "do"
            | "else"
            | "fallthrough"
            | "for"
            | "guard"
            | "if"
            | "in"
            | "repeat"
            | "return"
            | "switch"
            | "where"
            | "while"
            | "as"
            | "Any"
            | "catch"
            | "false"
            | "is"
            | "nil"
            | "rethrows"
            | "super"
            | "self"
            | "Self"
            | "throw"
            | "throws"
            | "true"
            | "try"
    )
}
