//! schema model
//!
//! an owned view of a graphql schema document: named types, their fields,
//! and the possible-types relation for abstract types. built once per run
//! and shared read-only by the frontend and the generator.

use crate::error::{Error, Result};
use crate::ir::GraphQlType;
use graphql_parser::schema::{parse_schema, Definition, Document, TypeDefinition as SdlType};
use indexmap::IndexMap;

const BUILTIN_SCALARS: [&str; 5] = ["String", "Int", "Float", "Boolean", "ID"];

/// category of a named type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
}

impl TypeKind {
    /// object, interface, or union
    pub fn is_composite(self) -> bool {
        matches!(self, TypeKind::Object | TypeKind::Interface | TypeKind::Union)
    }
}

/// output field on an object or interface
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub name: String,
    pub description: Option<String>,
    pub field_type: GraphQlType,
}

/// enum value
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    pub name: String,
    pub description: Option<String>,
}

/// input object field
#[derive(Debug, Clone, PartialEq)]
pub struct InputField {
    pub name: String,
    pub description: Option<String>,
    pub field_type: GraphQlType,
}

/// named type definition
#[derive(Debug, Clone, PartialEq)]
pub struct NamedType {
    pub name: String,
    pub kind: TypeKind,
    pub description: Option<String>,
    /// object and interface fields
    pub fields: Vec<FieldDefinition>,
    /// interfaces implemented by an object
    pub interfaces: Vec<String>,
    /// union members
    pub members: Vec<String>,
    /// enum values
    pub values: Vec<EnumValue>,
    /// input object fields
    pub input_fields: Vec<InputField>,
}

impl NamedType {
    fn new(name: &str, kind: TypeKind, description: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            description,
            fields: Vec::new(),
            interfaces: Vec::new(),
            members: Vec::new(),
            values: Vec::new(),
            input_fields: Vec::new(),
        }
    }
}

/// graphql schema
#[derive(Debug, Clone)]
pub struct Schema {
    types: IndexMap<String, NamedType>,
    query_type: String,
    mutation_type: Option<String>,
    subscription_type: Option<String>,
}

impl Schema {
    /// parse a schema from sdl text
    pub fn parse(sdl: &str) -> Result<Self> {
        let document =
            parse_schema::<String>(sdl).map_err(|err| Error::Schema(err.to_string()))?;
        Self::from_document(&document)
    }

    /// build a schema from a parsed sdl document
    pub fn from_document(doc: &Document<'_, String>) -> Result<Self> {
        let mut types = IndexMap::new();
        for name in BUILTIN_SCALARS {
            types.insert(name.to_string(), NamedType::new(name, TypeKind::Scalar, None));
        }

        let mut query_type = None;
        let mut mutation_type = None;
        let mut subscription_type = None;

        for def in &doc.definitions {
            match def {
                Definition::TypeDefinition(ty) => {
                    let named = match ty {
                        SdlType::Scalar(scalar) => NamedType::new(
                            &scalar.name,
                            TypeKind::Scalar,
                            scalar.description.clone(),
                        ),
                        SdlType::Object(obj) => {
                            let mut named =
                                NamedType::new(&obj.name, TypeKind::Object, obj.description.clone());
                            named.interfaces = obj.implements_interfaces.clone();
                            named.fields = obj
                                .fields
                                .iter()
                                .map(|field| FieldDefinition {
                                    name: field.name.clone(),
                                    description: field.description.clone(),
                                    field_type: GraphQlType::from(&field.field_type),
                                })
                                .collect();
                            named
                        }
                        SdlType::Interface(iface) => {
                            let mut named = NamedType::new(
                                &iface.name,
                                TypeKind::Interface,
                                iface.description.clone(),
                            );
                            named.fields = iface
                                .fields
                                .iter()
                                .map(|field| FieldDefinition {
                                    name: field.name.clone(),
                                    description: field.description.clone(),
                                    field_type: GraphQlType::from(&field.field_type),
                                })
                                .collect();
                            named
                        }
                        SdlType::Union(union_ty) => {
                            let mut named = NamedType::new(
                                &union_ty.name,
                                TypeKind::Union,
                                union_ty.description.clone(),
                            );
                            named.members = union_ty.types.clone();
                            named
                        }
                        SdlType::Enum(enum_ty) => {
                            let mut named = NamedType::new(
                                &enum_ty.name,
                                TypeKind::Enum,
                                enum_ty.description.clone(),
                            );
                            named.values = enum_ty
                                .values
                                .iter()
                                .map(|value| EnumValue {
                                    name: value.name.clone(),
                                    description: value.description.clone(),
                                })
                                .collect();
                            named
                        }
                        SdlType::InputObject(input) => {
                            let mut named = NamedType::new(
                                &input.name,
                                TypeKind::InputObject,
                                input.description.clone(),
                            );
                            named.input_fields = input
                                .fields
                                .iter()
                                .map(|field| InputField {
                                    name: field.name.clone(),
                                    description: field.description.clone(),
                                    field_type: GraphQlType::from(&field.value_type),
                                })
                                .collect();
                            named
                        }
                    };
                    if BUILTIN_SCALARS.contains(&named.name.as_str()) {
                        continue;
                    }
                    if types.contains_key(&named.name) {
                        return Err(Error::Schema(format!("duplicate type `{}`", named.name)));
                    }
                    types.insert(named.name.clone(), named);
                }
                Definition::SchemaDefinition(schema) => {
                    query_type = schema.query.clone();
                    mutation_type = schema.mutation.clone();
                    subscription_type = schema.subscription.clone();
                }
                _ => continue,
            }
        }

        let default_root = |name: &str| types.contains_key(name).then(|| name.to_string());
        let query_type = query_type
            .or_else(|| default_root("Query"))
            .ok_or_else(|| Error::Schema("schema has no query type".to_string()))?;
        let mutation_type = mutation_type.or_else(|| default_root("Mutation"));
        let subscription_type = subscription_type.or_else(|| default_root("Subscription"));

        let schema = Self {
            types,
            query_type,
            mutation_type,
            subscription_type,
        };
        schema.check_references()?;
        Ok(schema)
    }

    fn check_references(&self) -> Result<()> {
        for root in [Some(&self.query_type), self.mutation_type.as_ref(), self.subscription_type.as_ref()]
            .into_iter()
            .flatten()
        {
            if self.kind(root) != Some(TypeKind::Object) {
                return Err(Error::Schema(format!("root type `{root}` is not an object type")));
            }
        }

        for ty in self.types.values() {
            let referenced = ty
                .fields
                .iter()
                .map(|field| field.field_type.named_type())
                .chain(ty.input_fields.iter().map(|field| field.field_type.named_type()))
                .chain(ty.interfaces.iter().map(String::as_str))
                .chain(ty.members.iter().map(String::as_str));
            for name in referenced {
                if !self.types.contains_key(name) {
                    return Err(Error::Schema(format!(
                        "type `{}` references unknown type `{name}`",
                        ty.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// look up a named type
    pub fn get(&self, name: &str) -> Option<&NamedType> {
        self.types.get(name)
    }

    /// category of a named type, if it exists
    pub fn kind(&self, name: &str) -> Option<TypeKind> {
        self.types.get(name).map(|ty| ty.kind)
    }

    /// true for object, interface, and union types
    pub fn is_composite(&self, name: &str) -> bool {
        self.kind(name).is_some_and(TypeKind::is_composite)
    }

    /// concrete object types a value of `name` can have at runtime
    pub fn possible_types(&self, name: &str) -> Vec<String> {
        match self.kind(name) {
            Some(TypeKind::Object) => vec![name.to_string()],
            Some(TypeKind::Interface) => self
                .types
                .values()
                .filter(|ty| ty.kind == TypeKind::Object && ty.interfaces.iter().any(|i| i == name))
                .map(|ty| ty.name.clone())
                .collect(),
            Some(TypeKind::Union) => self
                .types
                .get(name)
                .map(|ty| ty.members.clone())
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// field definition on an object or interface
    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&FieldDefinition> {
        self.types
            .get(type_name)?
            .fields
            .iter()
            .find(|field| field.name == field_name)
    }

    /// root query type name
    pub fn query_type(&self) -> &str {
        &self.query_type
    }

    /// root mutation type name
    pub fn mutation_type(&self) -> Option<&str> {
        self.mutation_type.as_deref()
    }

    /// root subscription type name
    pub fn subscription_type(&self) -> Option<&str> {
        self.subscription_type.as_deref()
    }
}
