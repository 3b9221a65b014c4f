//! intermediate representation
//!
//! typed, validated operations and fragments as produced by the frontend.
//! every tree here is immutable once built; the generator only reads it.

use crate::schema::Schema;
use indexmap::{IndexMap, IndexSet};
use std::fmt;
use std::path::PathBuf;

/// graphql type reference, possibly wrapped in non-null and list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GraphQlType {
    Named(String),
    List(Box<GraphQlType>),
    NonNull(Box<GraphQlType>),
}

impl GraphQlType {
    pub fn named(name: impl Into<String>) -> Self {
        GraphQlType::Named(name.into())
    }

    pub fn non_null(inner: GraphQlType) -> Self {
        GraphQlType::NonNull(Box::new(inner))
    }

    pub fn list(inner: GraphQlType) -> Self {
        GraphQlType::List(Box::new(inner))
    }

    /// innermost named type
    pub fn named_type(&self) -> &str {
        match self {
            GraphQlType::Named(name) => name,
            GraphQlType::List(inner) | GraphQlType::NonNull(inner) => inner.named_type(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, GraphQlType::NonNull(_))
    }

    /// the type with a top-level non-null wrapper removed
    pub fn nullable(&self) -> &GraphQlType {
        match self {
            GraphQlType::NonNull(inner) => inner,
            other => other,
        }
    }
}

impl fmt::Display for GraphQlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphQlType::Named(name) => write!(f, "{name}"),
            GraphQlType::List(inner) => write!(f, "[{inner}]"),
            GraphQlType::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

impl<'a> From<&graphql_parser::query::Type<'a, String>> for GraphQlType {
    fn from(ty: &graphql_parser::query::Type<'a, String>) -> Self {
        use graphql_parser::query::Type;
        match ty {
            Type::NamedType(name) => GraphQlType::Named(name.clone()),
            Type::ListType(inner) => GraphQlType::list(GraphQlType::from(inner.as_ref())),
            Type::NonNullType(inner) => GraphQlType::non_null(GraphQlType::from(inner.as_ref())),
        }
    }
}

/// argument value as written in a document
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentValue {
    Variable(String),
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Null,
    Enum(String),
    List(Vec<ArgumentValue>),
    Object(Vec<(String, ArgumentValue)>),
}

/// field argument
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: String,
    pub value: ArgumentValue,
}

/// fields and fragments requested against a value of some type
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionSet {
    /// concrete types this selection set can apply to
    pub possible_types: Vec<String>,
    pub selections: Vec<Selection>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Field(Field),
    BooleanCondition(BooleanCondition),
    TypeCondition(TypeCondition),
    FragmentSpread(FragmentSpread),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub alias: Option<String>,
    pub arguments: Vec<Argument>,
    pub field_type: GraphQlType,
    pub description: Option<String>,
    /// present iff the named type is composite
    pub selection_set: Option<SelectionSet>,
}

impl Field {
    /// key under which the value appears in a response
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// `@skip` (inverted) or `@include` guard
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanCondition {
    pub variable_name: String,
    pub inverted: bool,
    pub selection_set: SelectionSet,
}

/// inline fragment narrowed to a type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeCondition {
    pub type_name: String,
    pub selection_set: SelectionSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FragmentSpread {
    pub fragment_name: String,
    /// the spread fragment's own selection set and possible types
    pub selection_set: SelectionSet,
}

/// operation variable
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub variable_type: GraphQlType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub name: String,
    /// `query`, `mutation`, or `subscription`
    pub operation_type: String,
    pub root_type: String,
    pub variables: Vec<Variable>,
    /// canonical source text of the definition
    pub source: String,
    pub file_path: PathBuf,
    pub selection_set: SelectionSet,
}

impl Operation {
    /// names of fragments reachable from this operation, first-encounter order
    pub fn fragments_referenced(&self) -> Vec<String> {
        let mut seen = IndexSet::new();
        collect_fragments_referenced(&self.selection_set, &mut seen);
        seen.into_iter().collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub name: String,
    pub type_condition: String,
    pub source: String,
    pub file_path: PathBuf,
    pub selection_set: SelectionSet,
}

impl Fragment {
    /// names of fragments this fragment spreads, first-encounter order
    pub fn fragments_referenced(&self) -> Vec<String> {
        let mut seen = IndexSet::new();
        collect_fragments_referenced(&self.selection_set, &mut seen);
        seen.into_iter().collect()
    }
}

fn collect_fragments_referenced(selection_set: &SelectionSet, seen: &mut IndexSet<String>) {
    for selection in &selection_set.selections {
        match selection {
            Selection::Field(field) => {
                if let Some(nested) = &field.selection_set {
                    collect_fragments_referenced(nested, seen);
                }
            }
            Selection::BooleanCondition(condition) => {
                collect_fragments_referenced(&condition.selection_set, seen);
            }
            Selection::TypeCondition(condition) => {
                collect_fragments_referenced(&condition.selection_set, seen);
            }
            Selection::FragmentSpread(spread) => {
                if seen.insert(spread.fragment_name.clone()) {
                    collect_fragments_referenced(&spread.selection_set, seen);
                }
            }
        }
    }
}

/// everything the generator consumes
#[derive(Debug, Clone)]
pub struct CompilerContext {
    pub schema: Schema,
    pub operations: IndexMap<String, Operation>,
    pub fragments: IndexMap<String, Fragment>,
    /// enums and input objects referenced by any operation or fragment
    pub used_types: Vec<String>,
}

/// `types` filtered to those also in `within`, keeping the order of `types`
pub(crate) fn intersect_types(types: &[String], within: &[String]) -> Vec<String> {
    types
        .iter()
        .filter(|ty| within.contains(ty))
        .cloned()
        .collect()
}

/// true if every type of `subset` is in `superset`
pub(crate) fn covers(superset: &[String], subset: &[String]) -> bool {
    subset.iter().all(|ty| superset.contains(ty))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str) -> Selection {
        Selection::Field(Field {
            name: name.to_string(),
            alias: None,
            arguments: vec![],
            field_type: GraphQlType::named("String"),
            description: None,
            selection_set: None,
        })
    }

    fn spread(name: &str, selections: Vec<Selection>) -> Selection {
        Selection::FragmentSpread(FragmentSpread {
            fragment_name: name.to_string(),
            selection_set: SelectionSet {
                possible_types: vec!["Human".to_string()],
                selections,
            },
        })
    }

    #[test]
    fn test_type_display() {
        let ty = GraphQlType::non_null(GraphQlType::list(GraphQlType::named("Episode")));
        assert_eq!(ty.to_string(), "[Episode]!");
        assert_eq!(ty.named_type(), "Episode");
        assert!(ty.is_non_null());
        assert_eq!(ty.nullable().to_string(), "[Episode]");
    }

    #[test]
    fn test_response_key() {
        let Selection::Field(mut field) = leaf("name") else {
            unreachable!()
        };
        assert_eq!(field.response_key(), "name");
        field.alias = Some("title".to_string());
        assert_eq!(field.response_key(), "title");
    }

    #[test]
    fn test_fragments_referenced_first_encounter_order() {
        // A spreads C then B; B spreads C again
        let c = spread("C", vec![leaf("c")]);
        let b = spread("B", vec![leaf("b"), c.clone()]);
        let operation = Operation {
            name: "Test".to_string(),
            operation_type: "query".to_string(),
            root_type: "Query".to_string(),
            variables: vec![],
            source: String::new(),
            file_path: PathBuf::from("test.graphql"),
            selection_set: SelectionSet {
                possible_types: vec!["Query".to_string()],
                selections: vec![spread("A", vec![c, leaf("a")]), b],
            },
        };
        assert_eq!(operation.fragments_referenced(), vec!["A", "C", "B"]);
    }

    #[test]
    fn test_intersect_and_covers() {
        let all = vec!["Human".to_string(), "Droid".to_string()];
        let droid = vec!["Droid".to_string()];
        assert_eq!(intersect_types(&all, &droid), droid);
        assert!(covers(&all, &droid));
        assert!(!covers(&droid, &all));
    }
}
