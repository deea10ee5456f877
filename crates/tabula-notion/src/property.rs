use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt::{self, Display};
use tabula_core::{
    date::Date,
    value::{FieldType, Value},
};
use thiserror::Error as ThisError;

///
/// PropertyError
/// Why a row value cannot become a write payload for its declared kind.
///

#[remain::sorted]
#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum PropertyError {
    #[error("expected {expected}, got {actual}")]
    Mismatch {
        expected: FieldType,
        actual: FieldType,
    },

    #[error("{kind} properties are set by the backend")]
    ReadOnly { kind: PropertyKind },
}

///
/// PropertyKind
/// The backend's per-field type tag. It drives three things: the `type`
/// key of compiled filter conditions, how a value is read out of a page's
/// property item, and the payload shape a write wraps the value in.
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    Checkbox,
    CreatedTime,
    Date,
    Email,
    LastEditedTime,
    MultiSelect,
    Number,
    PhoneNumber,
    Relation,
    RichText,
    Select,
    Status,
    Title,
    UniqueId,
    Url,
}

impl PropertyKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Checkbox => "checkbox",
            Self::CreatedTime => "created_time",
            Self::Date => "date",
            Self::Email => "email",
            Self::LastEditedTime => "last_edited_time",
            Self::MultiSelect => "multi_select",
            Self::Number => "number",
            Self::PhoneNumber => "phone_number",
            Self::Relation => "relation",
            Self::RichText => "rich_text",
            Self::Select => "select",
            Self::Status => "status",
            Self::Title => "title",
            Self::UniqueId => "unique_id",
            Self::Url => "url",
        }
    }

    /// The value shape this kind reads and writes.
    #[must_use]
    pub const fn field_type(self) -> FieldType {
        match self {
            Self::Checkbox => FieldType::Bool,
            Self::CreatedTime | Self::Date | Self::LastEditedTime => FieldType::Date,
            Self::Email
            | Self::PhoneNumber
            | Self::Relation
            | Self::RichText
            | Self::Select
            | Self::Status
            | Self::Title
            | Self::Url => FieldType::Text,
            Self::MultiSelect => FieldType::TextList,
            Self::Number | Self::UniqueId => FieldType::Number,
        }
    }

    /// Kinds the backend assigns itself; writes against them are rejected.
    #[must_use]
    pub const fn is_read_only(self) -> bool {
        matches!(self, Self::CreatedTime | Self::LastEditedTime | Self::UniqueId)
    }

    /// Read this kind's value out of one page property item. Payloads
    /// that do not carry the expected shape (including explicit nulls
    /// for unset properties) read back as absent.
    #[must_use]
    pub fn extract(self, property: &serde_json::Value) -> Option<Value> {
        let payload = property.get(self.as_str())?;

        match self {
            Self::Checkbox => payload.as_bool().map(Value::Bool),
            Self::CreatedTime | Self::LastEditedTime => {
                payload.as_str().and_then(Date::parse).map(Value::Date)
            }
            Self::Date => payload
                .get("start")
                .and_then(serde_json::Value::as_str)
                .and_then(Date::parse)
                .map(Value::Date),
            Self::Email | Self::PhoneNumber | Self::Url => {
                payload.as_str().map(|s| Value::Text(s.to_owned()))
            }
            Self::MultiSelect => payload
                .as_array()?
                .iter()
                .map(|option| Some(option.get("name")?.as_str()?.to_owned()))
                .collect::<Option<Vec<_>>>()
                .map(Value::TextList),
            Self::Number => payload.as_f64().map(Value::Number),
            Self::Relation => first_item(payload)?
                .get("id")
                .and_then(serde_json::Value::as_str)
                .map(|s| Value::Text(s.to_owned())),
            Self::RichText | Self::Title => first_item(payload)?
                .get("plain_text")
                .and_then(serde_json::Value::as_str)
                .map(|s| Value::Text(s.to_owned())),
            Self::Select | Self::Status => payload
                .get("name")
                .and_then(serde_json::Value::as_str)
                .map(|s| Value::Text(s.to_owned())),
            Self::UniqueId => payload
                .get("number")
                .and_then(serde_json::Value::as_f64)
                .map(Value::Number),
        }
    }

    /// Wrap a row value in this kind's write payload shape.
    pub fn write_payload(self, value: &Value) -> Result<serde_json::Value, PropertyError> {
        if self.is_read_only() {
            return Err(PropertyError::ReadOnly { kind: self });
        }

        let payload = match (self, value) {
            (Self::Checkbox, Value::Bool(b)) => json!(b),
            (Self::Date, Value::Date(d)) => json!({ "start": d.to_string() }),
            (Self::Email | Self::PhoneNumber | Self::Url, Value::Text(s)) => json!(s),
            (Self::MultiSelect, Value::TextList(names)) => json!(
                names
                    .iter()
                    .map(|name| json!({ "name": name }))
                    .collect::<Vec<_>>()
            ),
            (Self::Number, Value::Number(n)) => json!(n),
            (Self::Relation, Value::Text(id)) => json!([{ "id": id }]),
            (Self::RichText | Self::Title, Value::Text(s)) => {
                json!([{ "text": { "content": s } }])
            }
            (Self::Select | Self::Status, Value::Text(s)) => json!({ "name": s }),
            (kind, other) => {
                return Err(PropertyError::Mismatch {
                    expected: kind.field_type(),
                    actual: other.field_type(),
                });
            }
        };

        Ok(payload)
    }
}

impl Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Property payloads come in two shapes: one object, or an array of them
/// with the value in the first element.
fn first_item(payload: &serde_json::Value) -> Option<&serde_json::Value> {
    match payload {
        serde_json::Value::Array(items) => items.first(),
        other => Some(other),
    }
}

///
/// TESTS
///
