use crate::schema::PropertySchema;
use serde_json::json;
use tabula_core::filter::{Filter, FilterError, FilterGroup, FilterLeaf, Literal, Predicate};

/// Lower a filter tree into the backend's native nested filter object.
///
/// Groups map straight onto `{"and": [...]}` / `{"or": [...]}` nodes and
/// each field entry becomes `{"property", "type", <kind>: condition}`,
/// with the `type` key taken from the declared property kind. The format
/// nests arbitrarily, so unlike the expression-string backend there is
/// no placeholder or alias bookkeeping.
///
/// Compilation is pure and fails before any network call: every
/// referenced property must be declared, and empty leaves or groups are
/// rejected.
pub fn compile_filter(
    properties: &PropertySchema,
    filter: &Filter,
) -> Result<serde_json::Value, FilterError> {
    match filter {
        Filter::Leaf(leaf) => compile_leaf(properties, leaf),
        Filter::Group(group) => compile_group(properties, group),
    }
}

fn compile_group(
    properties: &PropertySchema,
    group: &FilterGroup,
) -> Result<serde_json::Value, FilterError> {
    if group.children.is_empty() {
        return Err(FilterError::EmptyGroup);
    }

    let children = group
        .children
        .iter()
        .map(|child| compile_filter(properties, child))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(json!({ (group.op.keyword()): children }))
}

fn compile_leaf(
    properties: &PropertySchema,
    leaf: &FilterLeaf,
) -> Result<serde_json::Value, FilterError> {
    let mut conditions = leaf
        .entries()
        .iter()
        .map(|(field, predicate)| compile_entry(properties, field, predicate))
        .collect::<Result<Vec<_>, _>>()?;

    // All entries of one leaf must hold, whatever group encloses it, so
    // several entries become an `and` node of their own.
    match conditions.len() {
        0 => Err(FilterError::EmptyLeaf),
        1 => Ok(conditions.remove(0)),
        _ => Ok(json!({ "and": conditions })),
    }
}

fn compile_entry(
    properties: &PropertySchema,
    field: &str,
    predicate: &Predicate,
) -> Result<serde_json::Value, FilterError> {
    let Some(kind) = properties.kind(field) else {
        return Err(FilterError::UnknownField {
            field: field.to_owned(),
        });
    };

    Ok(json!({
        "property": field,
        "type": kind.as_str(),
        (kind.as_str()): condition(predicate),
    }))
}

fn condition(predicate: &Predicate) -> serde_json::Value {
    match predicate {
        Predicate::Contains(s) => json!({ "contains": s }),
        Predicate::DoesNotContain(s) => json!({ "does_not_contain": s }),
        Predicate::EndsWith(s) => json!({ "ends_with": s }),
        Predicate::Eq(literal) => json!({ "equals": literal_json(literal) }),
        Predicate::Ge(n) => json!({ "greater_than_or_equal_to": n }),
        Predicate::Gt(n) => json!({ "greater_than": n }),
        Predicate::IsEmpty => json!({ "is_empty": true }),
        Predicate::IsNotEmpty => json!({ "is_not_empty": true }),
        Predicate::Le(n) => json!({ "less_than_or_equal_to": n }),
        Predicate::Lt(n) => json!({ "less_than": n }),
        Predicate::Ne(literal) => json!({ "does_not_equal": literal_json(literal) }),
        Predicate::StartsWith(s) => json!({ "starts_with": s }),
    }
}

fn literal_json(literal: &Literal) -> serde_json::Value {
    match literal {
        Literal::Number(n) => json!(n),
        Literal::Text(s) => json!(s),
    }
}

///
/// TESTS
///
