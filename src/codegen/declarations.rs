//! selection set declarations
//!
//! emits one `GraphQLSelectionSet` struct per selection set: possible types,
//! selection metadata, result-map storage, constructors, typed property
//! accessors, variant narrowing, fragment views, and nested structs for every
//! composite property and variant. the emitted tree mirrors the selection
//! set tree.

use super::builder::CodeBuilder;
use super::merge::{collect_and_merge_fields, properties_for_initializer, Property};
use super::naming::{
    camel_case, escape_identifier, property_name, string_literal, struct_name_for_property,
    upper_first, variant_property_name, variant_struct_name, wrapped_type, TypeNamer,
};
use super::selections::{emit_selections, string_list};
use super::type_case::{merge_spread, type_case_for_selection_set, SpreadUse, TypeCase, Variant};
use crate::error::{Error, Result};
use crate::ir::{covers, FragmentSpread, GraphQlType, Selection, SelectionSet};

/// emits selection set structs
pub(crate) struct SelectionSetEmitter<'a> {
    namer: TypeNamer<'a>,
    merge_fragment_fields: bool,
}

/// constructor parameters for one concrete type
struct Constructor<'p> {
    type_name: &'p str,
    properties: Option<&'p [Property]>,
    /// enclosing struct of composite parameter types, if not the current one
    qualifier: Option<String>,
}

impl<'a> SelectionSetEmitter<'a> {
    pub(crate) fn new(namer: TypeNamer<'a>, merge_fragment_fields: bool) -> Self {
        Self {
            namer,
            merge_fragment_fields,
        }
    }

    pub(crate) fn namer(&self) -> &TypeNamer<'a> {
        &self.namer
    }

    /// `public struct <name>: <adopted_protocol>` for `selection_set`.
    /// `preamble` is emitted verbatim before the generated members.
    pub(crate) fn struct_declaration(
        &self,
        b: &mut CodeBuilder,
        name: &str,
        adopted_protocol: &str,
        selection_set: &SelectionSet,
        preamble: Option<&str>,
    ) -> Result<()> {
        let type_case = type_case_for_selection_set(selection_set, self.merge_fragment_fields);
        let properties = collect_and_merge_fields(
            type_case.default.selections.iter().map(|selection| &**selection),
            &selection_set.possible_types,
            self.merge_fragment_fields,
        )?;
        let spreads = &type_case.default.fragment_spreads;
        tracing::trace!(
            struct_name = name,
            variants = type_case.variants.len(),
            remainder = ?type_case.remainder.as_ref().map(|remainder| &remainder.possible_types),
            "resolved type case"
        );

        let mut variant_properties = Vec::with_capacity(type_case.variants.len());
        for variant in &type_case.variants {
            variant_properties.push(collect_and_merge_fields(
                combined_selections(&type_case, variant),
                &variant.possible_types,
                self.merge_fragment_fields,
            )?);
        }

        b.block(format!("public struct {name}: {adopted_protocol}"), |b| {
            if let Some(preamble) = preamble {
                b.lines(preamble);
                b.blank();
            }
            b.line(format!(
                "public static let possibleTypes: [String] = [{}]",
                string_list(&selection_set.possible_types)
            ));
            b.blank();
            self.selections_property(b, |b| self.type_case_metadata(b, &type_case))?;
            b.blank();
            result_map_storage(b)?;

            let default_initializer = properties_for_initializer(
                &properties,
                !spreads.is_empty(),
                self.merge_fragment_fields,
            );
            let mut constructors = Vec::with_capacity(selection_set.possible_types.len());
            for type_name in &selection_set.possible_types {
                let constructor = match type_case.variant_index(type_name) {
                    Some(index) => {
                        let variant = &type_case.variants[index];
                        let has_spreads =
                            !spreads.is_empty() || !variant.fragment_spreads.is_empty();
                        Constructor {
                            type_name,
                            properties: properties_for_initializer(
                                &variant_properties[index],
                                has_spreads,
                                self.merge_fragment_fields,
                            ),
                            qualifier: Some(variant_struct_name(&variant.possible_types)),
                        }
                    }
                    None => Constructor {
                        type_name,
                        properties: default_initializer,
                        qualifier: None,
                    },
                };
                constructors.push(constructor);
            }
            self.constructors(b, name, &constructors)?;

            for property in &properties {
                b.blank();
                self.property_accessor(b, property)?;
            }
            for variant in &type_case.variants {
                b.blank();
                variant_accessor(b, variant)?;
            }
            if !spreads.is_empty() {
                b.blank();
                fragments_accessor(b, spreads, &selection_set.possible_types)?;
            }
            self.nested_structs(b, &properties)?;
            for (variant, properties) in type_case.variants.iter().zip(&variant_properties) {
                b.blank();
                self.variant_struct(b, &type_case, variant, properties)?;
            }
            Ok(())
        })
    }

    fn variant_struct(
        &self,
        b: &mut CodeBuilder,
        type_case: &TypeCase<'_>,
        variant: &Variant<'_>,
        properties: &[Property],
    ) -> Result<()> {
        let name = variant_struct_name(&variant.possible_types);
        let mut spreads: Vec<SpreadUse<'_>> = type_case.default.fragment_spreads.clone();
        for &spread in &variant.fragment_spreads {
            merge_spread(&mut spreads, spread);
        }

        b.block(format!("public struct {name}: GraphQLSelectionSet"), |b| {
            b.line(format!(
                "public static let possibleTypes: [String] = [{}]",
                string_list(&variant.possible_types)
            ));
            b.blank();
            self.selections_property(b, |b| {
                emit_selections(b, &self.namer, combined_selections(type_case, variant))
            })?;
            b.blank();
            result_map_storage(b)?;

            let initializer = properties_for_initializer(
                properties,
                !spreads.is_empty(),
                self.merge_fragment_fields,
            );
            let constructors: Vec<Constructor<'_>> = variant
                .possible_types
                .iter()
                .map(|type_name| Constructor {
                    type_name,
                    properties: initializer,
                    qualifier: None,
                })
                .collect();
            self.constructors(b, &name, &constructors)?;

            for property in properties {
                b.blank();
                self.property_accessor(b, property)?;
            }
            if !spreads.is_empty() {
                b.blank();
                fragments_accessor(b, &spreads, &variant.possible_types)?;
            }
            self.nested_structs(b, properties)
        })
    }

    /// one struct per composite property; two keys may not share a struct name
    fn nested_structs(&self, b: &mut CodeBuilder, properties: &[Property]) -> Result<()> {
        let mut declared: Vec<(String, &str)> = Vec::new();
        for property in properties {
            let Some(selection_set) = &property.selection_set else {
                continue;
            };
            let name = struct_name_for_property(&property.response_key);
            if let Some((_, other)) = declared.iter().find(|(existing, _)| *existing == name) {
                return Err(Error::FieldConflict {
                    response_key: property.response_key.clone(),
                    parent: format!("[{}]", selection_set.possible_types.join(", ")),
                    reason: format!(
                        "nested struct `{name}` is already declared for `{other}`; alias one of the fields"
                    ),
                });
            }
            b.blank();
            self.struct_declaration(b, &name, "GraphQLSelectionSet", selection_set, None)?;
            declared.push((name, &property.response_key));
        }
        Ok(())
    }

    fn selections_property<F>(&self, b: &mut CodeBuilder, metadata: F) -> Result<()>
    where
        F: FnOnce(&mut CodeBuilder) -> Result<()>,
    {
        b.block("public static var selections: [GraphQLSelection]", |b| {
            b.wrapped("return [", "]", metadata)
        })
    }

    /// flat metadata, or a single type switch when there are variants
    fn type_case_metadata(&self, b: &mut CodeBuilder, type_case: &TypeCase<'_>) -> Result<()> {
        let default = type_case.default.selections.iter().map(|selection| &**selection);
        if type_case.variants.is_empty() {
            return emit_selections(b, &self.namer, default);
        }

        let variants = type_case
            .variants
            .iter()
            .flat_map(|variant| {
                let struct_name = variant_struct_name(&variant.possible_types);
                variant
                    .possible_types
                    .iter()
                    .map(move |ty| format!("{}: {struct_name}.selections", string_literal(ty)))
            })
            .collect::<Vec<_>>()
            .join(", ");
        b.wrapped("GraphQLTypeCase(", "),", |b| {
            b.line(format!("variants: [{variants}],"));
            b.wrapped("default: [", "]", |b| emit_selections(b, &self.namer, default))
        })
    }

    /// `init(...)` for a single concrete type, `makeX(...)` per type otherwise
    fn constructors(
        &self,
        b: &mut CodeBuilder,
        struct_name: &str,
        constructors: &[Constructor<'_>],
    ) -> Result<()> {
        let single = constructors.len() == 1;
        for constructor in constructors {
            let Some(properties) = constructor.properties else {
                continue;
            };
            let mut parameters = Vec::new();
            let mut entries = vec![format!(
                "\"__typename\": {}",
                string_literal(constructor.type_name)
            )];
            for property in properties.iter().filter(|p| p.response_key != "__typename") {
                let parameter = property_name(&property.response_key);
                let nested = property.is_composite().then(|| {
                    let nested = struct_name_for_property(&property.response_key);
                    match &constructor.qualifier {
                        Some(qualifier) => format!("{qualifier}.{nested}"),
                        None => nested,
                    }
                });
                let swift_type = self.namer.property_type_name(
                    &property.field_type,
                    nested.as_deref(),
                    property.is_conditional,
                )?;
                let default = if property.is_optional() { " = nil" } else { "" };
                parameters.push(format!("{parameter}: {swift_type}{default}"));
                entries.push(format!(
                    "{}: {}",
                    string_literal(&property.response_key),
                    write_expression(property, nested.as_deref(), &parameter)
                ));
            }
            let parameters = parameters.join(", ");
            let result_map = format!("[{}]", entries.join(", "));

            b.blank();
            if single {
                b.block(format!("public init({parameters})"), |b| {
                    b.line(format!("self.init(unsafeResultMap: {result_map})"));
                    Ok(())
                })?;
            } else {
                b.block(
                    format!(
                        "public static func make{}({parameters}) -> {struct_name}",
                        upper_first(constructor.type_name)
                    ),
                    |b| {
                        b.line(format!("return {struct_name}(unsafeResultMap: {result_map})"));
                        Ok(())
                    },
                )?;
            }
        }
        Ok(())
    }

    fn property_accessor(&self, b: &mut CodeBuilder, property: &Property) -> Result<()> {
        let name = property_name(&property.response_key);
        let nested = property
            .is_composite()
            .then(|| struct_name_for_property(&property.response_key));
        let swift_type = self.namer.property_type_name(
            &property.field_type,
            nested.as_deref(),
            property.is_conditional,
        )?;
        let key = string_literal(&property.response_key);

        if let Some(description) = &property.description {
            b.doc(description);
        }
        b.block(format!("public var {name}: {swift_type}"), |b| {
            b.block("get", |b| {
                b.line(format!(
                    "return {}",
                    read_expression(property, nested.as_deref(), &swift_type, &key)
                ));
                Ok(())
            })?;
            b.block("set", |b| {
                b.line(format!(
                    "resultMap.updateValue({}, forKey: {key})",
                    write_expression(property, nested.as_deref(), "newValue")
                ));
                Ok(())
            })
        })
    }
}

/// default selections followed by the variant's own
fn combined_selections<'t>(type_case: &'t TypeCase<'_>, variant: &'t Variant<'_>) -> Vec<&'t Selection> {
    type_case
        .default
        .selections
        .iter()
        .chain(&variant.selections)
        .map(|selection| &**selection)
        .collect()
}

fn result_map_storage(b: &mut CodeBuilder) -> Result<()> {
    b.line("public private(set) var resultMap: ResultMap");
    b.blank();
    b.block("public init(unsafeResultMap: ResultMap)", |b| {
        b.line("self.resultMap = unsafeResultMap");
        Ok(())
    })
}

fn variant_accessor(b: &mut CodeBuilder, variant: &Variant<'_>) -> Result<()> {
    let struct_name = variant_struct_name(&variant.possible_types);
    let property = variant_property_name(&variant.possible_types);
    b.block(format!("public var {property}: {struct_name}?"), |b| {
        b.block("get", |b| {
            b.line(format!(
                "if !{struct_name}.possibleTypes.contains(resultMap[\"__typename\"]! as! String) {{ return nil }}"
            ));
            b.line(format!("return {struct_name}(unsafeResultMap: resultMap)"));
            Ok(())
        })?;
        b.block("set", |b| {
            b.line("guard let newValue = newValue else { return }");
            b.line("resultMap = newValue.resultMap");
            Ok(())
        })
    })
}

/// `fragments` view over the same result map, one property per spread;
/// optional when the fragment applies to fewer types than `possible_types`
/// or is only included conditionally
fn fragments_accessor(
    b: &mut CodeBuilder,
    spreads: &[SpreadUse<'_>],
    possible_types: &[String],
) -> Result<()> {
    b.block("public var fragments: Fragments", |b| {
        b.block("get", |b| {
            b.line("return Fragments(unsafeResultMap: resultMap)");
            Ok(())
        })?;
        b.block("set", |b| {
            b.line("resultMap += newValue.resultMap");
            Ok(())
        })
    })?;
    b.blank();
    b.block("public struct Fragments", |b| {
        result_map_storage(b)?;
        for spread in spreads {
            b.blank();
            let fragment = spread.fragment_name();
            let property = escape_identifier(&camel_case(fragment));
            let narrows = !covers(&spread.spread.selection_set.possible_types, possible_types);
            if !narrows && !spread.is_conditional {
                b.block(format!("public var {property}: {fragment}"), |b| {
                    b.block("get", |b| {
                        b.line(format!("return {fragment}(unsafeResultMap: resultMap)"));
                        Ok(())
                    })?;
                    b.block("set", |b| {
                        b.line("resultMap += newValue.resultMap");
                        Ok(())
                    })
                })?;
            } else {
                b.block(format!("public var {property}: {fragment}?"), |b| {
                    b.block("get", |b| {
                        if narrows {
                            b.line(format!(
                                "if !{fragment}.possibleTypes.contains(resultMap[\"__typename\"]! as! String) {{ return nil }}"
                            ));
                        }
                        if let Some(key) = spread.is_conditional.then(|| presence_key(spread.spread)).flatten() {
                            b.line(format!(
                                "if resultMap[{}] == nil {{ return nil }}",
                                string_literal(key)
                            ));
                        }
                        b.line(format!("return {fragment}(unsafeResultMap: resultMap)"));
                        Ok(())
                    })?;
                    b.block("set", |b| {
                        b.line("guard let newValue = newValue else { return }");
                        b.line("resultMap += newValue.resultMap");
                        Ok(())
                    })
                })?;
            }
        }
        Ok(())
    })
}

/// a key every response including `spread` carries, other than `__typename`
fn presence_key(spread: &FragmentSpread) -> Option<&str> {
    spread
        .selection_set
        .selections
        .iter()
        .find_map(|selection| match selection {
            Selection::Field(field) if field.name != "__typename" => Some(field.response_key()),
            _ => None,
        })
}

/// shape of the stored value: conditional fields are always optional
fn stored_shape(property: &Property) -> &GraphQlType {
    if property.is_conditional {
        property.field_type.nullable()
    } else {
        &property.field_type
    }
}

/// swift expression reading a property out of `resultMap`
fn read_expression(property: &Property, nested: Option<&str>, swift_type: &str, key: &str) -> String {
    let Some(nested) = nested else {
        return match swift_type.strip_suffix('?') {
            Some(unwrapped) => format!("resultMap[{key}] as? {unwrapped}"),
            None => format!("resultMap[{key}]! as! {swift_type}"),
        };
    };

    let shape = stored_shape(property);
    let input_type = wrapped_type(shape, "ResultMap", true);
    let cast = match input_type.strip_suffix('?') {
        Some(unwrapped) => format!("(resultMap[{key}] as? {unwrapped})"),
        None if matches!(shape.nullable(), GraphQlType::Named(_)) => {
            format!("resultMap[{key}]! as! {input_type}")
        }
        None => format!("(resultMap[{key}]! as! {input_type})"),
    };
    map_expression(shape, &cast, "ResultMap", nested, &|value: &str| {
        format!("{nested}(unsafeResultMap: {value})")
    })
}

/// swift expression converting `value` into what `resultMap` stores
fn write_expression(property: &Property, nested: Option<&str>, value: &str) -> String {
    match nested {
        Some(nested) => map_expression(stored_shape(property), value, nested, "ResultMap", &|value: &str| {
            format!("{value}.resultMap")
        }),
        None => value.to_string(),
    }
}

/// apply `make` to every leaf of `expression`, preserving list and optional
/// structure. `input` and `output` are the leaf types before and after.
fn map_expression(
    ty: &GraphQlType,
    expression: &str,
    input: &str,
    output: &str,
    make: &dyn Fn(&str) -> String,
) -> String {
    let (inner, optional) = match ty {
        GraphQlType::NonNull(inner) => (inner.as_ref(), false),
        other => (other, true),
    };
    match inner {
        GraphQlType::List(element) => {
            let input_element = wrapped_type(element, input, true);
            let output_element = wrapped_type(element, output, true);
            let body = map_expression(element, "value", input, output, make);
            if optional {
                format!(
                    "{expression}.flatMap {{ (value: [{input_element}]) -> [{output_element}] in value.map {{ (value: {input_element}) -> {output_element} in {body} }} }}"
                )
            } else {
                format!(
                    "{expression}.map {{ (value: {input_element}) -> {output_element} in {body} }}"
                )
            }
        }
        _ if optional => format!(
            "{expression}.flatMap {{ (value: {input}) -> {output} in {} }}",
            make("value")
        ),
        _ => make(expression),
    }
}
