//! field and fragment merging
//!
//! collects every field readable on a set of possible types (following
//! boolean conditions, covering type conditions and, optionally, spread
//! fragments) and merges fields that share a response key.

use crate::error::{Error, Result};
use crate::ir::{covers, intersect_types, Argument, Field, GraphQlType, Selection, SelectionSet};
use indexmap::IndexMap;

/// a merged field, one per response key
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Property {
    pub(crate) response_key: String,
    pub(crate) field_name: String,
    pub(crate) field_type: GraphQlType,
    pub(crate) arguments: Vec<Argument>,
    pub(crate) description: Option<String>,
    /// only read under a boolean condition
    pub(crate) is_conditional: bool,
    /// sub-selections of every merged occurrence
    pub(crate) selection_set: Option<SelectionSet>,
}

impl Property {
    pub(crate) fn is_optional(&self) -> bool {
        self.is_conditional || !self.field_type.is_non_null()
    }

    pub(crate) fn is_composite(&self) -> bool {
        self.selection_set.is_some()
    }
}

/// merged fields readable on every type of `possible_types`
pub(crate) fn collect_and_merge_fields<'s>(
    selections: impl IntoIterator<Item = &'s Selection>,
    possible_types: &[String],
    merge_fragment_fields: bool,
) -> Result<Vec<Property>> {
    let mut collector = FieldCollector {
        possible_types,
        merge_fragment_fields,
        properties: IndexMap::new(),
    };
    collector.collect(selections, false)?;
    Ok(collector.properties.into_values().collect())
}

/// properties usable as constructor parameters, or `None` when no safe
/// constructor exists: spread fragments with composite properties while
/// fragment fields are not merged
pub(crate) fn properties_for_initializer(
    properties: &[Property],
    has_fragment_spreads: bool,
    merge_fragment_fields: bool,
) -> Option<&[Property]> {
    if has_fragment_spreads
        && !merge_fragment_fields
        && properties.iter().any(Property::is_composite)
    {
        None
    } else {
        Some(properties)
    }
}

struct FieldCollector<'p> {
    possible_types: &'p [String],
    merge_fragment_fields: bool,
    properties: IndexMap<String, Property>,
}

impl FieldCollector<'_> {
    fn collect<'s>(
        &mut self,
        selections: impl IntoIterator<Item = &'s Selection>,
        conditional: bool,
    ) -> Result<()> {
        for selection in selections {
            match selection {
                Selection::Field(field) => self.add(field, conditional)?,
                Selection::BooleanCondition(condition) => {
                    self.collect(&condition.selection_set.selections, true)?
                }
                Selection::TypeCondition(condition) => {
                    if covers(&condition.selection_set.possible_types, self.possible_types) {
                        self.collect(&condition.selection_set.selections, conditional)?;
                    }
                }
                Selection::FragmentSpread(spread) => {
                    if self.merge_fragment_fields
                        && covers(&spread.selection_set.possible_types, self.possible_types)
                    {
                        self.collect(&spread.selection_set.selections, conditional)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn add(&mut self, field: &Field, conditional: bool) -> Result<()> {
        let response_key = field.response_key();
        let Some(existing) = self.properties.get_mut(response_key) else {
            self.properties.insert(
                response_key.to_string(),
                Property {
                    response_key: response_key.to_string(),
                    field_name: field.name.clone(),
                    field_type: field.field_type.clone(),
                    arguments: field.arguments.clone(),
                    description: field.description.clone(),
                    is_conditional: conditional,
                    selection_set: field.selection_set.clone(),
                },
            );
            return Ok(());
        };

        let conflict = |reason: String| Error::FieldConflict {
            response_key: response_key.to_string(),
            parent: format!("[{}]", self.possible_types.join(", ")),
            reason,
        };
        if existing.field_name != field.name {
            return Err(conflict(format!(
                "fields `{}` and `{}` share a response key",
                existing.field_name, field.name
            )));
        }
        let composite = existing.selection_set.is_some() && field.selection_set.is_some();
        if !same_response_shape(&existing.field_type, &field.field_type, composite) {
            return Err(conflict(format!(
                "types `{}` and `{}` differ",
                existing.field_type, field.field_type
            )));
        }
        if existing.arguments != field.arguments {
            return Err(conflict("arguments differ".to_string()));
        }

        existing.is_conditional &= conditional;
        if let (Some(merged), Some(incoming)) = (&mut existing.selection_set, &field.selection_set) {
            let narrowed = intersect_types(&merged.possible_types, &incoming.possible_types);
            if narrowed.is_empty() {
                return Err(conflict(format!(
                    "types `{}` and `{}` share no possible type",
                    existing.field_type, field.field_type
                )));
            }
            if narrowed.len() < merged.possible_types.len()
                && covers(&merged.possible_types, &incoming.possible_types)
            {
                existing.field_type = field.field_type.clone();
            }
            merged.possible_types = narrowed;
            for selection in &incoming.selections {
                if !merged.selections.contains(selection) {
                    merged.selections.push(selection.clone());
                }
            }
        }
        Ok(())
    }
}

/// same list and non-null wrapping; leaf types must match exactly while
/// composite types may differ, their selections decide the shape
fn same_response_shape(a: &GraphQlType, b: &GraphQlType, composite: bool) -> bool {
    match (a, b) {
        (GraphQlType::NonNull(a), GraphQlType::NonNull(b))
        | (GraphQlType::List(a), GraphQlType::List(b)) => same_response_shape(a, b, composite),
        (GraphQlType::Named(a), GraphQlType::Named(b)) => composite || a == b,
        _ => false,
    }
}
