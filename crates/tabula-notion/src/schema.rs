use crate::property::PropertyKind;
use tabula_core::schema::{Field, Schema, SchemaError};

///
/// PropertySchema
/// The database's declared properties: name → kind, in declaration
/// order. The general schema is derived once at construction (a
/// `unique_id` property becomes the key field) and shared with the
/// filter compiler and row validation.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PropertySchema {
    entries: Vec<(String, PropertyKind)>,
    schema: Schema,
}

impl PropertySchema {
    pub fn new<N, I>(entries: I) -> Result<Self, SchemaError>
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, PropertyKind)>,
    {
        let entries: Vec<(String, PropertyKind)> = entries
            .into_iter()
            .map(|(name, kind)| (name.into(), kind))
            .collect();

        let fields = entries
            .iter()
            .map(|(name, kind)| {
                let field = Field::new(name.clone(), kind.field_type());
                if *kind == PropertyKind::UniqueId {
                    field.key()
                } else {
                    field
                }
            })
            .collect();
        let schema = Schema::new(fields)?;

        Ok(Self { entries, schema })
    }

    #[must_use]
    pub fn kind(&self, name: &str) -> Option<PropertyKind> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, kind)| *kind)
    }

    #[must_use]
    pub fn entries(&self) -> &[(String, PropertyKind)] {
        &self.entries
    }

    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Name of the `unique_id` property, when the database declares one.
    #[must_use]
    pub fn key_property(&self) -> Option<&str> {
        self.schema.key_field().map(|field| field.name.as_str())
    }
}

///
/// TESTS
///
