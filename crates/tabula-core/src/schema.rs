use crate::{
    record::Row,
    value::FieldType,
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// SchemaError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum SchemaError {
    #[error("duplicate field: {name}")]
    DuplicateField { name: String },

    #[error("more than one key field: {first} and {second}")]
    MultipleKeys { first: String, second: String },

    #[error("unknown field: {name}")]
    UnknownField { name: String },

    #[error("field {name} expects {expected}, got {actual}")]
    TypeMismatch {
        name: String,
        expected: FieldType,
        actual: FieldType,
    },
}

///
/// Field
/// One declared field: a name, a value shape, and whether it is the key.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub ty: FieldType,
    pub is_key: bool,
}

impl Field {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            is_key: false,
        }
    }

    /// Mark this field as the record key.
    #[must_use]
    pub const fn key(mut self) -> Self {
        self.is_key = true;
        self
    }
}

///
/// Schema
/// The declared field layout an accessor validates rows and filters
/// against. Field order is declaration order; names are unique; at most
/// one field is the key.
///
/// Built once per accessor and immutable afterwards.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Result<Self, SchemaError> {
        for (i, field) in fields.iter().enumerate() {
            if let Some(dup) = fields[..i].iter().find(|f| f.name == field.name) {
                return Err(SchemaError::DuplicateField {
                    name: dup.name.clone(),
                });
            }
        }

        let mut keys = fields.iter().filter(|f| f.is_key);
        if let (Some(first), Some(second)) = (keys.next(), keys.next()) {
            return Err(SchemaError::MultipleKeys {
                first: first.name.clone(),
                second: second.name.clone(),
            });
        }

        Ok(Self { fields })
    }

    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// The field declared as the record key, when one exists.
    #[must_use]
    pub fn key_field(&self) -> Option<&Field> {
        self.fields.iter().find(|f| f.is_key)
    }

    /// Validate a row against the declared fields.
    ///
    /// Every present value must name a declared field and carry that
    /// field's type. Missing fields are fine; rows are sparse.
    pub fn check_row(&self, row: &Row) -> Result<(), SchemaError> {
        for (name, value) in row.iter() {
            let field = self.get(name).ok_or_else(|| SchemaError::UnknownField {
                name: name.clone(),
            })?;

            let actual = value.field_type();
            if actual != field.ty {
                return Err(SchemaError::TypeMismatch {
                    name: name.clone(),
                    expected: field.ty,
                    actual,
                });
            }
        }

        Ok(())
    }
}

///
/// TESTS
///
