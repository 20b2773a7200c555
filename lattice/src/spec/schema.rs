//! The type registry: declared object types, input types and root
//! operations.

use displaydoc::Display;
use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use super::FieldType;
use super::SpecError;
use super::field_type::InvalidValue;
use crate::graphql::OperationKind;
use crate::json_ext::Object;

/// Registration and validation errors for [`Schema`].
#[derive(Error, Display, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchemaError {
    /// type '{0}' is registered more than once
    DuplicateType(String),
    /// invalid type expression '{0}'
    InvalidType(String),
    /// field '{0}.{1}' has inconsistent non-null wrapping
    InvalidWrapping(String, String),
    /// field '{0}.{1}' references unknown type '{2}'
    UnknownReference(String, String, String),
    /// root operation type '{0}' is not registered
    UnknownRootType(String),
    /// field '{0}.{1}' resolves another entity type but has no registered resolver
    MissingResolver(String, String),
}

/// A named record kind and its declared fields, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectType {
    name: String,
    fields: IndexMap<String, FieldType>,
}

impl ObjectType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self, name: &str) -> Option<&FieldType> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldType)> {
        self.fields.iter().map(|(name, ty)| (name.as_str(), ty))
    }

    pub(crate) fn validate_object(&self, object: &Object, schema: &Schema) -> Result<(), InvalidValue> {
        self.fields
            .iter()
            .try_for_each(|(name, ty)| match object.get(name.as_str()) {
                Some(value) => ty.validate_input_value(value, schema),
                None => {
                    if ty.is_non_null() {
                        Err(InvalidValue)
                    } else {
                        Ok(())
                    }
                }
            })
    }
}

/// The declared set of entity types, input types and root operations.
///
/// A schema is built once at startup through [`Schema::builder`] and is
/// immutable afterwards; registration-time validation catches dangling type
/// references and inconsistent wrapping markers before any request runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    object_types: IndexMap<String, ObjectType>,
    input_types: IndexMap<String, ObjectType>,
    query_type: String,
    mutation_type: Option<String>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn object_type(&self, name: &str) -> Result<&ObjectType, SpecError> {
        self.object_types
            .get(name)
            .ok_or_else(|| SpecError::UnknownType(name.to_string()))
    }

    pub fn input_type(&self, name: &str) -> Result<&ObjectType, SpecError> {
        self.input_types
            .get(name)
            .ok_or_else(|| SpecError::UnknownType(name.to_string()))
    }

    pub(crate) fn input_types(&self) -> &IndexMap<String, ObjectType> {
        &self.input_types
    }

    pub(crate) fn object_types(&self) -> &IndexMap<String, ObjectType> {
        &self.object_types
    }

    /// The root type for the given operation kind.
    pub fn root_type(&self, operation: OperationKind) -> Result<&ObjectType, SpecError> {
        let name = match operation {
            OperationKind::Query => Some(self.query_type.as_str()),
            OperationKind::Mutation => self.mutation_type.as_deref(),
        };
        let name = name.ok_or(SpecError::MissingRoot(operation))?;
        self.object_type(name)
    }
}

/// Accumulates type registrations, then validates the whole registry.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    object_types: Vec<ObjectType>,
    input_types: Vec<ObjectType>,
    query_type: Option<String>,
    mutation_type: Option<String>,
}

impl SchemaBuilder {
    /// Registers an entity type with its field specs.
    pub fn object_type<N, F, T>(mut self, name: N, fields: F) -> Self
    where
        N: Into<String>,
        F: IntoIterator<Item = (T, FieldType)>,
        T: Into<String>,
    {
        self.object_types.push(ObjectType {
            name: name.into(),
            fields: fields
                .into_iter()
                .map(|(name, ty)| (name.into(), ty))
                .collect(),
        });
        self
    }

    /// Registers an input type used by mutation payloads.
    pub fn input_type<N, F, T>(mut self, name: N, fields: F) -> Self
    where
        N: Into<String>,
        F: IntoIterator<Item = (T, FieldType)>,
        T: Into<String>,
    {
        self.input_types.push(ObjectType {
            name: name.into(),
            fields: fields
                .into_iter()
                .map(|(name, ty)| (name.into(), ty))
                .collect(),
        });
        self
    }

    /// Names the query root type. Defaults to `Query`.
    pub fn query_type(mut self, name: impl Into<String>) -> Self {
        self.query_type = Some(name.into());
        self
    }

    /// Names the mutation root type. No mutations are accepted when unset.
    pub fn mutation_type(mut self, name: impl Into<String>) -> Self {
        self.mutation_type = Some(name.into());
        self
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        let mut object_types: IndexMap<String, ObjectType> = IndexMap::new();
        for ty in self.object_types {
            let name = ty.name.clone();
            if object_types.insert(name.clone(), ty).is_some() {
                return Err(SchemaError::DuplicateType(name));
            }
        }
        let mut input_types: IndexMap<String, ObjectType> = IndexMap::new();
        for ty in self.input_types {
            let name = ty.name.clone();
            if object_types.contains_key(&name) || input_types.insert(name.clone(), ty).is_some() {
                return Err(SchemaError::DuplicateType(name));
            }
        }

        // Output fields may only reference object types, input fields only
        // input types; both namespaces resolve scalars implicitly.
        for ty in object_types.values() {
            validate_references(ty, &object_types)?;
        }
        for ty in input_types.values() {
            validate_references(ty, &input_types)?;
        }

        let query_type = self.query_type.unwrap_or_else(|| "Query".to_string());
        if !object_types.contains_key(&query_type) {
            return Err(SchemaError::UnknownRootType(query_type));
        }
        if let Some(mutation_type) = &self.mutation_type {
            if !object_types.contains_key(mutation_type) {
                return Err(SchemaError::UnknownRootType(mutation_type.clone()));
            }
        }

        Ok(Schema {
            object_types,
            input_types,
            query_type,
            mutation_type: self.mutation_type,
        })
    }
}

fn validate_references(
    ty: &ObjectType,
    namespace: &IndexMap<String, ObjectType>,
) -> Result<(), SchemaError> {
    for (field, field_type) in &ty.fields {
        if field_type.validate_wrapping().is_err() {
            return Err(SchemaError::InvalidWrapping(ty.name.clone(), field.clone()));
        }
        if let Some(reference) = field_type.inner_type_name() {
            if !namespace.contains_key(reference) {
                return Err(SchemaError::UnknownReference(
                    ty.name.clone(),
                    field.clone(),
                    reference.to_string(),
                ));
            }
        }
    }
    Ok(())
}
