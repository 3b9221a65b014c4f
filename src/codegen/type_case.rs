//! type-case resolution
//!
//! partitions a selection set into the selections shared by every possible
//! type (the default) and disjoint variants holding what only applies to a
//! subset of the possible types.
//!
//! variant selections hold only narrowing-specific content; the default's
//! selections implicitly apply to every variant as well. no concrete type
//! appears in two variants.

use crate::ir::{covers, intersect_types, BooleanCondition, FragmentSpread, Selection, SelectionSet};
use std::borrow::Cow;

/// a group of possible types and what is selected for them
#[derive(Debug, Clone)]
pub(crate) struct Variant<'a> {
    pub(crate) possible_types: Vec<String>,
    pub(crate) selections: Vec<Cow<'a, Selection>>,
    pub(crate) fragment_spreads: Vec<SpreadUse<'a>>,
}

/// a fragment spread registered on a case
#[derive(Debug, Clone, Copy)]
pub(crate) struct SpreadUse<'a> {
    pub(crate) spread: &'a FragmentSpread,
    /// every occurrence sits under `@include` or `@skip`
    pub(crate) is_conditional: bool,
}

impl SpreadUse<'_> {
    pub(crate) fn fragment_name(&self) -> &str {
        &self.spread.fragment_name
    }
}

/// add `incoming` to `spreads`; a repeated fragment stays conditional only
/// if every occurrence is
pub(crate) fn merge_spread<'a>(spreads: &mut Vec<SpreadUse<'a>>, incoming: SpreadUse<'a>) {
    match spreads
        .iter_mut()
        .find(|existing| existing.fragment_name() == incoming.fragment_name())
    {
        Some(existing) => existing.is_conditional &= incoming.is_conditional,
        None => spreads.push(incoming),
    }
}

impl<'a> Variant<'a> {
    fn new(possible_types: Vec<String>) -> Self {
        Self {
            possible_types,
            selections: Vec::new(),
            fragment_spreads: Vec::new(),
        }
    }

    fn add_fragment_spread(&mut self, spread: &'a FragmentSpread, is_conditional: bool) {
        merge_spread(
            &mut self.fragment_spreads,
            SpreadUse {
                spread,
                is_conditional,
            },
        );
    }
}

/// resolved partition of a selection set
#[derive(Debug, Clone)]
pub(crate) struct TypeCase<'a> {
    pub(crate) default: Variant<'a>,
    /// first-encounter order
    pub(crate) variants: Vec<Variant<'a>>,
    /// possible types no variant covers, with only the default's content
    pub(crate) remainder: Option<Variant<'a>>,
}

impl<'a> TypeCase<'a> {
    /// index of the variant a concrete type resolves to, if any
    pub(crate) fn variant_index(&self, type_name: &str) -> Option<usize> {
        self.variants
            .iter()
            .position(|variant| variant.possible_types.iter().any(|ty| ty == type_name))
    }
}

/// resolve `selection_set` into a default case and disjoint variants
pub(crate) fn type_case_for_selection_set(
    selection_set: &SelectionSet,
    merge_fragment_fields: bool,
) -> TypeCase<'_> {
    let mut builder = TypeCaseBuilder {
        merge_fragment_fields,
        default: Variant::new(selection_set.possible_types.clone()),
        variants: Vec::new(),
    };
    builder.visit(
        &selection_set.selections,
        &selection_set.possible_types,
        &[],
        Reach {
            fields_included: true,
            conditional: false,
        },
    );

    let TypeCaseBuilder {
        default, variants, ..
    } = builder;

    let uncovered: Vec<String> = default
        .possible_types
        .iter()
        .filter(|ty| !variants.iter().any(|variant| variant.possible_types.contains(*ty)))
        .cloned()
        .collect();
    let remainder = (!variants.is_empty() && !uncovered.is_empty()).then(|| Variant {
        possible_types: uncovered,
        selections: default.selections.clone(),
        fragment_spreads: default.fragment_spreads.clone(),
    });

    TypeCase {
        default,
        variants,
        remainder,
    }
}

/// how a selection was reached while walking
#[derive(Debug, Clone, Copy)]
struct Reach {
    /// unset: only variants and spreads are registered
    fields_included: bool,
    /// under at least one boolean condition
    conditional: bool,
}

#[derive(Debug, Clone, Copy)]
enum Target {
    Default,
    Variant(usize),
}

struct TypeCaseBuilder<'a> {
    merge_fragment_fields: bool,
    default: Variant<'a>,
    variants: Vec<Variant<'a>>,
}

impl<'a> TypeCaseBuilder<'a> {
    fn variant_mut(&mut self, target: Target) -> &mut Variant<'a> {
        match target {
            Target::Default => &mut self.default,
            Target::Variant(index) => &mut self.variants[index],
        }
    }

    /// the cases that together hold exactly `types`, splitting as needed
    fn targets_for(&mut self, types: &[String]) -> Vec<Target> {
        if types.is_empty() {
            return Vec::new();
        }
        if covers(types, &self.default.possible_types) {
            return vec![Target::Default];
        }

        let mut from_default = Vec::new();
        let mut by_variant: Vec<(usize, Vec<String>)> = Vec::new();
        for ty in types {
            match self
                .variants
                .iter()
                .position(|variant| variant.possible_types.contains(ty))
            {
                Some(index) => match by_variant.iter_mut().find(|(i, _)| *i == index) {
                    Some((_, subset)) => subset.push(ty.clone()),
                    None => by_variant.push((index, vec![ty.clone()])),
                },
                None => from_default.push(ty.clone()),
            }
        }

        let mut targets = Vec::new();
        for (index, subset) in by_variant {
            if subset.len() == self.variants[index].possible_types.len() {
                targets.push(Target::Variant(index));
                continue;
            }
            let original = &mut self.variants[index];
            original.possible_types.retain(|ty| !subset.contains(ty));
            let split = Variant {
                possible_types: subset,
                selections: original.selections.clone(),
                fragment_spreads: original.fragment_spreads.clone(),
            };
            self.variants.push(split);
            targets.push(Target::Variant(self.variants.len() - 1));
        }
        if !from_default.is_empty() {
            self.variants.push(Variant::new(from_default));
            targets.push(Target::Variant(self.variants.len() - 1));
        }
        targets
    }

    fn add_selection(&mut self, scope: &[String], selection: Cow<'a, Selection>) {
        for target in self.targets_for(scope) {
            self.variant_mut(target).selections.push(selection.clone());
        }
    }

    /// true if anything below `selections` applies to fewer types than `scope`
    fn narrows(&self, selections: &[Selection], scope: &[String]) -> bool {
        selections.iter().any(|selection| match selection {
            Selection::Field(_) => false,
            Selection::BooleanCondition(condition) => {
                self.narrows(&condition.selection_set.selections, scope)
            }
            Selection::TypeCondition(condition) => {
                let narrowed = intersect_types(scope, &condition.selection_set.possible_types);
                narrowed.len() < scope.len()
                    || self.narrows(&condition.selection_set.selections, &narrowed)
            }
            Selection::FragmentSpread(spread) => {
                let narrowed = intersect_types(scope, &spread.selection_set.possible_types);
                narrowed.len() < scope.len()
                    || (self.merge_fragment_fields
                        && self.narrows(&spread.selection_set.selections, &narrowed))
            }
        })
    }

    /// walk `selections` for values whose type is in `scope`
    fn visit(
        &mut self,
        selections: &'a [Selection],
        scope: &[String],
        conditions: &[&'a BooleanCondition],
        reach: Reach,
    ) {
        if scope.is_empty() {
            return;
        }
        for selection in selections {
            match selection {
                Selection::Field(_) => {
                    if reach.fields_included {
                        self.add_selection(scope, wrap_in_conditions(selection, conditions));
                    }
                }
                Selection::BooleanCondition(condition) => {
                    let nested = &condition.selection_set.selections;
                    let inner_reach = Reach {
                        conditional: true,
                        ..reach
                    };
                    if self.narrows(nested, scope) {
                        let mut inner = conditions.to_vec();
                        inner.push(condition);
                        self.visit(nested, scope, &inner, inner_reach);
                    } else {
                        if reach.fields_included {
                            self.add_selection(scope, wrap_in_conditions(selection, conditions));
                        }
                        self.visit(
                            nested,
                            scope,
                            conditions,
                            Reach {
                                fields_included: false,
                                ..inner_reach
                            },
                        );
                    }
                }
                Selection::TypeCondition(condition) => {
                    let narrowed = intersect_types(scope, &condition.selection_set.possible_types);
                    if !reach.fields_included && narrowed.len() < scope.len() {
                        self.targets_for(&narrowed);
                    }
                    self.visit(&condition.selection_set.selections, &narrowed, conditions, reach);
                }
                Selection::FragmentSpread(spread) => {
                    let narrowed = intersect_types(scope, &spread.selection_set.possible_types);
                    for target in self.targets_for(&narrowed) {
                        let variant = self.variant_mut(target);
                        if reach.fields_included {
                            variant
                                .selections
                                .push(wrap_in_conditions(selection, conditions));
                        }
                        variant.add_fragment_spread(spread, reach.conditional);
                    }
                    if self.merge_fragment_fields {
                        self.visit(
                            &spread.selection_set.selections,
                            &narrowed,
                            conditions,
                            Reach {
                                fields_included: false,
                                ..reach
                            },
                        );
                    }
                }
            }
        }
    }
}

/// `selection` nested in `conditions`, outermost first
fn wrap_in_conditions<'a>(
    selection: &'a Selection,
    conditions: &[&'a BooleanCondition],
) -> Cow<'a, Selection> {
    if conditions.is_empty() {
        return Cow::Borrowed(selection);
    }
    let mut wrapped = selection.clone();
    for condition in conditions.iter().rev() {
        wrapped = Selection::BooleanCondition(BooleanCondition {
            variable_name: condition.variable_name.clone(),
            inverted: condition.inverted,
            selection_set: SelectionSet {
                possible_types: condition.selection_set.possible_types.clone(),
                selections: vec![wrapped],
            },
        });
    }
    Cow::Owned(wrapped)
}
