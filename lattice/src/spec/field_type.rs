use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use serde_json_bytes::Value;

use super::Schema;
use super::SchemaError;

#[derive(Debug)]
pub(crate) struct InvalidValue;

/// The declared type of a field: a scalar kind or a reference to another
/// registered type, optionally wrapped in list and non-null markers.
///
/// The wrappers keep the four list/nullability combinations distinct:
/// `[T]`, `[T]!`, `[T!]` and `[T!]!` are all different values of this type
/// and round-trip through [`fmt::Display`] / [`FromStr`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// Named type {0}
    Named(String),
    /// List type {0}
    List(Box<FieldType>),
    /// Non null type {0}
    NonNull(Box<FieldType>),
    /// String
    String,
    /// Int
    Int,
    /// Float
    Float,
    /// Id
    Id,
    /// Boolean
    Boolean,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Named(ty) => write!(f, "{ty}"),
            FieldType::List(ty) => write!(f, "[{ty}]"),
            FieldType::NonNull(ty) => write!(f, "{ty}!"),
            FieldType::String => write!(f, "String"),
            FieldType::Int => write!(f, "Int"),
            FieldType::Float => write!(f, "Float"),
            FieldType::Id => write!(f, "ID"),
            FieldType::Boolean => write!(f, "Boolean"),
        }
    }
}

/// A flattened view of the list and nullability markers on a field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cardinality {
    pub is_list: bool,
    pub list_nullable: bool,
    pub item_nullable: bool,
}

impl FieldType {
    /// Checks that the wrapping markers are internally consistent.
    ///
    /// A non-null marker directly wrapping another non-null marker cannot be
    /// produced by the suffix syntax and is rejected at registration time.
    pub(crate) fn validate_wrapping(&self) -> Result<(), InvalidValue> {
        match self {
            FieldType::NonNull(inner) => {
                if matches!(**inner, FieldType::NonNull(_)) {
                    Err(InvalidValue)
                } else {
                    inner.validate_wrapping()
                }
            }
            FieldType::List(inner) => inner.validate_wrapping(),
            _ => Ok(()),
        }
    }

    // This function validates input values handed to mutations. Each value is
    // checked against the declared kind, recursing through wrappers and input
    // object types.
    pub(crate) fn validate_input_value(
        &self,
        value: &Value,
        schema: &Schema,
    ) -> Result<(), InvalidValue> {
        match (self, value) {
            (FieldType::String, Value::String(_)) => Ok(()),
            (FieldType::Int, Value::Number(number)) if number.is_i64() || number.is_u64() => {
                if number
                    .as_i64()
                    .and_then(|x| i32::try_from(x).ok())
                    .is_some()
                {
                    Ok(())
                } else {
                    Err(InvalidValue)
                }
            }
            (FieldType::Float, Value::Number(_)) => Ok(()),
            // The ID kind is serialized in the same way as a String, but in
            // practice integers work too.
            (FieldType::Id, Value::String(_) | Value::Number(_)) => Ok(()),
            (FieldType::Boolean, Value::Bool(_)) => Ok(()),
            (FieldType::List(inner_ty), Value::Array(vec)) => vec
                .iter()
                .try_for_each(|x| inner_ty.validate_input_value(x, schema)),
            (FieldType::NonNull(inner_ty), value) => {
                if value.is_null() {
                    Err(InvalidValue)
                } else {
                    inner_ty.validate_input_value(value, schema)
                }
            }
            (FieldType::Named(name), Value::Object(object)) => {
                if let Some(object_ty) = schema.input_types().get(name.as_str()) {
                    object_ty
                        .validate_object(object, schema)
                        .map_err(|_| InvalidValue)
                } else {
                    Err(InvalidValue)
                }
            }
            // NOTE: types are all optional by default
            (_, Value::Null) => Ok(()),
            _ => Err(InvalidValue),
        }
    }

    /// return the name of the type on which selections happen
    ///
    /// Example if we get the field `reviews: [Review!]!`, it will return "Review"
    pub fn inner_type_name(&self) -> Option<&str> {
        match self {
            FieldType::Named(name) => Some(name.as_str()),
            FieldType::List(inner) | FieldType::NonNull(inner) => inner.inner_type_name(),
            FieldType::String
            | FieldType::Int
            | FieldType::Float
            | FieldType::Id
            | FieldType::Boolean => None,
        }
    }

    pub fn is_builtin_scalar(&self) -> bool {
        match self {
            FieldType::Named(_) | FieldType::List(_) | FieldType::NonNull(_) => false,
            FieldType::String
            | FieldType::Int
            | FieldType::Float
            | FieldType::Id
            | FieldType::Boolean => true,
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, FieldType::NonNull(_))
    }

    pub fn is_list(&self) -> bool {
        match self {
            FieldType::List(_) => true,
            FieldType::NonNull(inner) => inner.is_list(),
            _ => false,
        }
    }

    /// The tagged cardinality descriptor for this type.
    pub fn cardinality(&self) -> Cardinality {
        let (list_nullable, unwrapped) = match self {
            FieldType::NonNull(inner) => (false, &**inner),
            other => (true, other),
        };
        match unwrapped {
            FieldType::List(item) => Cardinality {
                is_list: true,
                list_nullable,
                item_nullable: !item.is_non_null(),
            },
            _ => Cardinality {
                is_list: false,
                list_nullable,
                item_nullable: list_nullable,
            },
        }
    }
}

impl FromStr for FieldType {
    type Err = SchemaError;

    // Suffix-marker syntax: a trailing `!` marks non-null, surrounding
    // brackets mark a list, e.g. `[Review!]!`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(inner) = s.strip_suffix('!') {
            if inner.ends_with('!') {
                return Err(SchemaError::InvalidType(s.to_string()));
            }
            return Ok(FieldType::NonNull(Box::new(inner.parse()?)));
        }
        if let Some(inner) = s.strip_prefix('[') {
            let inner = inner
                .strip_suffix(']')
                .ok_or_else(|| SchemaError::InvalidType(s.to_string()))?;
            return Ok(FieldType::List(Box::new(inner.parse()?)));
        }
        if s.is_empty() || s.contains(['[', ']', '!']) {
            return Err(SchemaError::InvalidType(s.to_string()));
        }
        Ok(match s {
            "String" => FieldType::String,
            "Int" => FieldType::Int,
            "Float" => FieldType::Float,
            "ID" => FieldType::Id,
            "Boolean" => FieldType::Boolean,
            name => FieldType::Named(name.to_string()),
        })
    }
}
