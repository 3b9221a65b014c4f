//! document frontend
//!
//! parses executable graphql documents with `graphql-parser` and lowers them
//! against a [`Schema`] into the [`CompilerContext`] the generator consumes.

use crate::error::{Error, Result};
use crate::ir::{
    intersect_types, Argument, ArgumentValue, BooleanCondition, CompilerContext, Field, Fragment,
    FragmentSpread, GraphQlType, Operation, Selection, SelectionSet, TypeCondition, Variable,
};
use crate::schema::{Schema, TypeKind};
use graphql_parser::query::{
    parse_query, Definition, Directive, Document, Field as AstField, FragmentDefinition,
    OperationDefinition, Selection as AstSelection, SelectionSet as AstSelectionSet,
    TypeCondition as AstTypeCondition, Value,
};
use indexmap::{IndexMap, IndexSet};
use std::path::{Path, PathBuf};

/// an executable document and the path it was read from
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub text: String,
}

impl SourceDocument {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// compile documents against a schema
pub fn compile(schema: Schema, documents: &[SourceDocument]) -> Result<CompilerContext> {
    let mut parsed = Vec::with_capacity(documents.len());
    for document in documents {
        let mut ast = parse_query::<String>(&document.text).map_err(|err| {
            Error::Document(format!("failed to parse {}: {err}", document.path.display()))
        })?;
        add_typename(&mut ast);
        parsed.push((document.path.as_path(), ast));
    }

    let (operations, fragments, used_types) = {
        let mut compiler = Compiler::new(&schema);
        let mut operation_definitions = Vec::new();
        for (path, ast) in &parsed {
            for definition in &ast.definitions {
                match definition {
                    Definition::Fragment(fragment) => compiler.declare_fragment(path, fragment)?,
                    Definition::Operation(operation) => operation_definitions.push((*path, operation)),
                }
            }
        }

        let names: Vec<String> = compiler.definitions.keys().cloned().collect();
        for name in &names {
            if !compiler.fragments.contains_key(name) {
                compiler.compile_fragment(name)?;
            }
        }

        let mut operations = IndexMap::new();
        for (path, definition) in operation_definitions {
            let operation = compiler.compile_operation(path, definition)?;
            if operations.contains_key(&operation.name) {
                return Err(Error::Document(format!(
                    "duplicate operation `{}`",
                    operation.name
                )));
            }
            tracing::debug!(operation = %operation.name, "compiled operation");
            operations.insert(operation.name.clone(), operation);
        }

        // declaration order, not dependency order
        let mut fragments = IndexMap::new();
        for name in &names {
            if let Some(fragment) = compiler.fragments.shift_remove(name) {
                fragments.insert(name.clone(), fragment);
            }
        }

        (operations, fragments, compiler.used_types.into_iter().collect())
    };

    tracing::info!(
        operations = operations.len(),
        fragments = fragments.len(),
        "compiled documents"
    );

    Ok(CompilerContext {
        schema,
        operations,
        fragments,
        used_types,
    })
}

struct Compiler<'a, 'd> {
    schema: &'a Schema,
    definitions: IndexMap<String, (&'a Path, &'a FragmentDefinition<'d, String>)>,
    fragments: IndexMap<String, Fragment>,
    in_progress: Vec<String>,
    used_types: IndexSet<String>,
}

impl<'a, 'd> Compiler<'a, 'd> {
    fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            definitions: IndexMap::new(),
            fragments: IndexMap::new(),
            in_progress: Vec::new(),
            used_types: IndexSet::new(),
        }
    }

    fn declare_fragment(
        &mut self,
        path: &'a Path,
        fragment: &'a FragmentDefinition<'d, String>,
    ) -> Result<()> {
        if self.definitions.contains_key(&fragment.name) {
            return Err(Error::Document(format!(
                "duplicate fragment `{}`",
                fragment.name
            )));
        }
        self.definitions
            .insert(fragment.name.clone(), (path, fragment));
        Ok(())
    }

    fn compile_fragment(&mut self, name: &str) -> Result<()> {
        let schema = self.schema;
        if self.in_progress.iter().any(|pending| pending == name) {
            return Err(Error::Document(format!("fragment `{name}` spreads itself")));
        }
        let (path, definition) = *self
            .definitions
            .get(name)
            .ok_or_else(|| Error::UnknownFragment(name.to_string()))?;

        let AstTypeCondition::On(type_name) = &definition.type_condition;
        if !schema.is_composite(type_name) {
            return Err(Error::Document(format!(
                "fragment `{name}` is declared on non-composite type `{type_name}`"
            )));
        }

        self.in_progress.push(name.to_string());
        let selection_set = self.compile_selection_set(
            type_name,
            schema.possible_types(type_name),
            &definition.selection_set,
        );
        self.in_progress.pop();

        let fragment = Fragment {
            name: name.to_string(),
            type_condition: type_name.clone(),
            source: definition.to_string().trim().to_string(),
            file_path: path.to_path_buf(),
            selection_set: selection_set?,
        };
        tracing::debug!(fragment = %name, "compiled fragment");
        self.fragments.insert(name.to_string(), fragment);
        Ok(())
    }

    fn fragment_selection_set(&mut self, name: &str) -> Result<SelectionSet> {
        if !self.fragments.contains_key(name) {
            self.compile_fragment(name)?;
        }
        self.fragments
            .get(name)
            .map(|fragment| fragment.selection_set.clone())
            .ok_or_else(|| Error::UnknownFragment(name.to_string()))
    }

    fn compile_operation(
        &mut self,
        path: &Path,
        definition: &OperationDefinition<'d, String>,
    ) -> Result<Operation> {
        let schema = self.schema;
        let (keyword, name, variable_definitions, selection_set, root) = match definition {
            OperationDefinition::Query(query) => (
                "query",
                &query.name,
                &query.variable_definitions,
                &query.selection_set,
                Some(schema.query_type()),
            ),
            OperationDefinition::Mutation(mutation) => (
                "mutation",
                &mutation.name,
                &mutation.variable_definitions,
                &mutation.selection_set,
                schema.mutation_type(),
            ),
            OperationDefinition::Subscription(subscription) => (
                "subscription",
                &subscription.name,
                &subscription.variable_definitions,
                &subscription.selection_set,
                schema.subscription_type(),
            ),
            OperationDefinition::SelectionSet(_) => {
                return Err(Error::Document(format!(
                    "{}: anonymous operations are not supported",
                    path.display()
                )))
            }
        };

        let name = name.clone().ok_or_else(|| {
            Error::Document(format!(
                "{}: anonymous {keyword} operations are not supported",
                path.display()
            ))
        })?;
        let root = root
            .ok_or_else(|| Error::Document(format!("schema does not define a {keyword} type")))?
            .to_string();

        let mut variables = Vec::with_capacity(variable_definitions.len());
        for variable in variable_definitions {
            let variable_type = GraphQlType::from(&variable.var_type);
            self.record_input_type(variable_type.named_type())?;
            variables.push(Variable {
                name: variable.name.clone(),
                variable_type,
            });
        }

        let selection_set =
            self.compile_selection_set(&root, vec![root.clone()], selection_set)?;

        Ok(Operation {
            name,
            operation_type: keyword.to_string(),
            root_type: root,
            variables,
            source: definition.to_string().trim().to_string(),
            file_path: path.to_path_buf(),
            selection_set,
        })
    }

    fn compile_selection_set(
        &mut self,
        parent_type: &str,
        possible_types: Vec<String>,
        set: &AstSelectionSet<'d, String>,
    ) -> Result<SelectionSet> {
        let schema = self.schema;
        let mut selections = Vec::with_capacity(set.items.len());
        for item in &set.items {
            let (selection, directives) = match item {
                AstSelection::Field(field) => (
                    Selection::Field(self.compile_field(parent_type, field)?),
                    &field.directives,
                ),
                AstSelection::InlineFragment(inline) => {
                    let type_name = match &inline.type_condition {
                        Some(AstTypeCondition::On(name)) => name.clone(),
                        None => parent_type.to_string(),
                    };
                    if !schema.is_composite(&type_name) {
                        return Err(Error::Document(format!(
                            "inline fragment on non-composite type `{type_name}`"
                        )));
                    }
                    let narrowed =
                        intersect_types(&possible_types, &schema.possible_types(&type_name));
                    let selection_set =
                        self.compile_selection_set(&type_name, narrowed, &inline.selection_set)?;
                    (
                        Selection::TypeCondition(TypeCondition {
                            type_name,
                            selection_set,
                        }),
                        &inline.directives,
                    )
                }
                AstSelection::FragmentSpread(spread) => {
                    let selection_set = self.fragment_selection_set(&spread.fragment_name)?;
                    (
                        Selection::FragmentSpread(FragmentSpread {
                            fragment_name: spread.fragment_name.clone(),
                            selection_set,
                        }),
                        &spread.directives,
                    )
                }
            };
            if let Some(selection) = wrap_in_boolean_conditions(selection, directives, &possible_types)? {
                selections.push(selection);
            }
        }

        Ok(SelectionSet {
            possible_types,
            selections,
        })
    }

    fn compile_field(&mut self, parent_type: &str, field: &AstField<'d, String>) -> Result<Field> {
        let schema = self.schema;
        let (field_type, description) = if field.name == "__typename" {
            (GraphQlType::non_null(GraphQlType::named("String")), None)
        } else {
            let definition = schema.field(parent_type, &field.name).ok_or_else(|| {
                Error::Document(format!(
                    "unknown field `{}` on type `{parent_type}`",
                    field.name
                ))
            })?;
            (definition.field_type.clone(), definition.description.clone())
        };

        let named = field_type.named_type().to_string();
        if schema.kind(&named) == Some(TypeKind::Enum) {
            self.used_types.insert(named.clone());
        }

        let selection_set = if schema.is_composite(&named) {
            if field.selection_set.items.is_empty() {
                return Err(Error::Document(format!(
                    "field `{}` of type `{named}` must have a selection of subfields",
                    field.name
                )));
            }
            Some(self.compile_selection_set(
                &named,
                schema.possible_types(&named),
                &field.selection_set,
            )?)
        } else {
            if !field.selection_set.items.is_empty() {
                return Err(Error::Document(format!(
                    "field `{}` of leaf type `{named}` cannot have a selection of subfields",
                    field.name
                )));
            }
            None
        };

        let mut arguments = Vec::with_capacity(field.arguments.len());
        for (name, value) in &field.arguments {
            arguments.push(Argument {
                name: name.clone(),
                value: argument_value(value)?,
            });
        }

        Ok(Field {
            name: field.name.clone(),
            alias: field.alias.clone(),
            arguments,
            field_type,
            description,
            selection_set,
        })
    }

    fn record_input_type(&mut self, name: &str) -> Result<()> {
        let schema = self.schema;
        match schema.kind(name) {
            Some(TypeKind::Scalar) => Ok(()),
            Some(TypeKind::Enum) => {
                self.used_types.insert(name.to_string());
                Ok(())
            }
            Some(TypeKind::InputObject) => {
                if self.used_types.insert(name.to_string()) {
                    if let Some(input) = schema.get(name) {
                        for field in &input.input_fields {
                            self.record_input_type(field.field_type.named_type())?;
                        }
                    }
                }
                Ok(())
            }
            Some(_) => Err(Error::Document(format!(
                "type `{name}` cannot be used as a variable type"
            ))),
            None => Err(Error::Document(format!("unknown type `{name}`"))),
        }
    }
}

/// wrap a selection in one boolean condition per `@skip`/`@include`, the
/// first directive innermost. `Ok(None)` when a literal argument excludes it.
fn wrap_in_boolean_conditions(
    selection: Selection,
    directives: &[Directive<'_, String>],
    possible_types: &[String],
) -> Result<Option<Selection>> {
    let mut selection = selection;
    for directive in directives {
        let inverted = match directive.name.as_str() {
            "skip" => true,
            "include" => false,
            _ => continue,
        };
        let condition = directive
            .arguments
            .iter()
            .find(|(name, _)| name == "if")
            .map(|(_, value)| value)
            .ok_or_else(|| {
                Error::Document(format!("@{} requires an `if` argument", directive.name))
            })?;
        match condition {
            Value::Variable(variable) => {
                selection = Selection::BooleanCondition(BooleanCondition {
                    variable_name: variable.clone(),
                    inverted,
                    selection_set: SelectionSet {
                        possible_types: possible_types.to_vec(),
                        selections: vec![selection],
                    },
                });
            }
            Value::Boolean(value) if *value == inverted => return Ok(None),
            Value::Boolean(_) => {}
            other => {
                return Err(Error::Document(format!(
                    "@{} expects a boolean or a variable, found `{other}`",
                    directive.name
                )))
            }
        }
    }
    Ok(Some(selection))
}

fn argument_value(value: &Value<'_, String>) -> Result<ArgumentValue> {
    Ok(match value {
        Value::Variable(name) => ArgumentValue::Variable(name.clone()),
        Value::Int(number) => ArgumentValue::Int(number.as_i64().ok_or_else(|| {
            Error::Document("integer argument out of range".to_string())
        })?),
        Value::Float(number) => ArgumentValue::Float(*number),
        Value::String(text) => ArgumentValue::String(text.clone()),
        Value::Boolean(flag) => ArgumentValue::Boolean(*flag),
        Value::Null => ArgumentValue::Null,
        Value::Enum(name) => ArgumentValue::Enum(name.clone()),
        Value::List(items) => ArgumentValue::List(
            items
                .iter()
                .map(argument_value)
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Object(fields) => ArgumentValue::Object(
            fields
                .iter()
                .map(|(name, value)| Ok((name.clone(), argument_value(value)?)))
                .collect::<Result<Vec<_>>>()?,
        ),
    })
}

/// add `__typename` to every fragment and non-root field selection set
fn add_typename(document: &mut Document<'_, String>) {
    for definition in &mut document.definitions {
        match definition {
            Definition::Operation(operation) => {
                let selection_set = match operation {
                    OperationDefinition::SelectionSet(set) => set,
                    OperationDefinition::Query(query) => &mut query.selection_set,
                    OperationDefinition::Mutation(mutation) => &mut mutation.selection_set,
                    OperationDefinition::Subscription(subscription) => {
                        &mut subscription.selection_set
                    }
                };
                add_typename_to_children(selection_set);
            }
            Definition::Fragment(fragment) => add_typename_to_set(&mut fragment.selection_set),
        }
    }
}

fn add_typename_to_set(set: &mut AstSelectionSet<'_, String>) {
    let has_typename = set.items.iter().any(|item| {
        matches!(item, AstSelection::Field(field) if field.name == "__typename" && field.alias.is_none())
    });
    if !has_typename {
        let position = set.span.0;
        set.items.insert(
            0,
            AstSelection::Field(AstField {
                position,
                alias: None,
                name: "__typename".to_string(),
                arguments: Vec::new(),
                directives: Vec::new(),
                selection_set: AstSelectionSet {
                    span: (position, position),
                    items: Vec::new(),
                },
            }),
        );
    }
    add_typename_to_children(set);
}

fn add_typename_to_children(set: &mut AstSelectionSet<'_, String>) {
    for item in &mut set.items {
        match item {
            AstSelection::Field(field) => {
                if !field.selection_set.items.is_empty() {
                    add_typename_to_set(&mut field.selection_set);
                }
            }
            AstSelection::InlineFragment(inline) => add_typename_to_children(&mut inline.selection_set),
            AstSelection::FragmentSpread(_) => {}
        }
    }
}
