use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tabula_core::{
    date::Date,
    filter::Literal,
    record::Row,
    schema::Schema,
    value::{FieldType, Value},
};

/// One stored item in wire form.
pub type Item = BTreeMap<String, AttrValue>;

///
/// AttrValue
/// Item attribute in the backend's tagged wire form: `{"S": ...}`,
/// `{"N": ...}`, `{"BOOL": ...}`, `{"L": [...]}` or `{"NULL": true}`.
/// Numbers travel as strings, exactly as the backend expects them.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum AttrValue {
    S(String),
    N(String),
    #[serde(rename = "BOOL")]
    Bool(bool),
    L(Vec<AttrValue>),
    #[serde(rename = "NULL")]
    Null(bool),
}

impl AttrValue {
    /// Wire form of a filter literal, typed by the literal's runtime
    /// variant.
    #[must_use]
    pub fn from_literal(literal: &Literal) -> Self {
        match literal {
            Literal::Number(n) => Self::N(n.to_string()),
            Literal::Text(s) => Self::S(s.clone()),
        }
    }

    /// Wire form of a row value.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Bool(b) => Self::Bool(*b),
            Value::Date(d) => Self::S(d.to_string()),
            Value::Number(n) => Self::N(n.to_string()),
            Value::Text(s) => Self::S(s.clone()),
            Value::TextList(items) => Self::L(items.iter().cloned().map(Self::S).collect()),
        }
    }

    /// Narrow a wire attribute to a declared field type. Attributes that
    /// do not fit the declaration (including `NULL`) read back as absent.
    #[must_use]
    pub fn to_value(&self, ty: FieldType) -> Option<Value> {
        match (ty, self) {
            (FieldType::Bool, Self::Bool(b)) => Some(Value::Bool(*b)),
            (FieldType::Date, Self::S(s)) => Date::parse(s).map(Value::Date),
            (FieldType::Number, Self::N(n)) => n.parse().ok().map(Value::Number),
            (FieldType::Text, Self::S(s)) => Some(Value::Text(s.clone())),
            (FieldType::TextList, Self::L(items)) => items
                .iter()
                .map(|item| match item {
                    Self::S(s) => Some(s.clone()),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()
                .map(Value::TextList),
            _ => None,
        }
    }
}

/// Convert a validated row into wire attributes.
#[must_use]
pub fn item_from_row(row: &Row) -> Item {
    row.iter()
        .map(|(field, value)| (field.clone(), AttrValue::from_value(value)))
        .collect()
}

/// Read the schema-declared fields back out of a wire item.
#[must_use]
pub fn row_from_item(schema: &Schema, item: &Item) -> Row {
    schema
        .fields()
        .iter()
        .filter_map(|field| {
            let attr = item.get(&field.name)?;
            let value = attr.to_value(field.ty)?;
            Some((field.name.clone(), value))
        })
        .collect()
}

///
/// ItemOp
/// What to do at the addressed key. `Put` and `Merge` carry only data
/// attributes; the transport composes them with the key.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ItemOp {
    Get,
    Put(Item),
    Merge(Item),
}

///
/// ItemRequest
/// Single-item call against one table key.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ItemRequest {
    pub table: String,
    pub key: Item,
    pub op: ItemOp,
}

///
/// ItemResponse
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ItemResponse {
    pub status: u16,
    pub item: Option<Item>,
}

///
/// KeyCondition
/// Equality condition on the partition key attribute.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct KeyCondition {
    pub name: String,
    pub value: AttrValue,
}

///
/// QueryRequest
/// Partition-scoped query with an optional compiled filter expression.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct QueryRequest {
    pub table: String,
    pub partition: KeyCondition,
    pub filter_expression: Option<String>,
    pub expression_names: BTreeMap<String, String>,
    pub expression_values: BTreeMap<String, AttrValue>,
    pub exclusive_start_key: Option<Item>,
    pub scan_index_forward: Option<bool>,
    pub limit: Option<u32>,
}

///
/// QueryResponse
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct QueryResponse {
    pub status: u16,
    pub items: Vec<Item>,
    pub last_evaluated_key: Option<Item>,
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tabula_core::schema::Field;

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("name", FieldType::Text),
            Field::new("age", FieldType::Number),
            Field::new("active", FieldType::Bool),
            Field::new("tags", FieldType::TextList),
            Field::new("since", FieldType::Date),
        ])
        .expect("valid schema")
    }

    #[test]
    fn attr_values_serialize_in_tagged_form() {
        assert_eq!(
            serde_json::to_value(AttrValue::S("an".into())).expect("serializes"),
            json!({"S": "an"})
        );
        assert_eq!(
            serde_json::to_value(AttrValue::N("18".into())).expect("serializes"),
            json!({"N": "18"})
        );
        assert_eq!(
            serde_json::to_value(AttrValue::Bool(true)).expect("serializes"),
            json!({"BOOL": true})
        );
        assert_eq!(
            serde_json::to_value(AttrValue::Null(true)).expect("serializes"),
            json!({"NULL": true})
        );
        assert_eq!(
            serde_json::to_value(AttrValue::L(vec![AttrValue::S("a".into())]))
                .expect("serializes"),
            json!({"L": [{"S": "a"}]})
        );
    }

    #[test]
    fn integral_numbers_lose_the_decimal_point() {
        assert_eq!(
            AttrValue::from_literal(&Literal::Number(18.0)),
            AttrValue::N("18".to_string())
        );
        assert_eq!(
            AttrValue::from_literal(&Literal::Number(1.5)),
            AttrValue::N("1.5".to_string())
        );
    }

    #[test]
    fn rows_round_trip_through_items() {
        let row = Row::new()
            .with("name", "ada")
            .with("age", 36.0)
            .with("active", true)
            .with("tags", vec!["math".to_string(), "engines".to_string()])
            .with("since", Date::parse("1843-01-01").expect("valid date"));

        let item = item_from_row(&row);
        assert_eq!(item.get("name"), Some(&AttrValue::S("ada".into())));
        assert_eq!(item.get("age"), Some(&AttrValue::N("36".into())));

        let back = row_from_item(&schema(), &item);
        assert_eq!(back, row);
    }

    #[test]
    fn narrowing_skips_attributes_that_do_not_fit() {
        let mut item = Item::new();
        item.insert("name".into(), AttrValue::N("3".into()));
        item.insert("age".into(), AttrValue::N("not a number".into()));
        item.insert("active".into(), AttrValue::Null(true));
        item.insert("extra".into(), AttrValue::S("ignored".into()));

        let row = row_from_item(&schema(), &item);
        assert!(row.is_empty());
    }
}
