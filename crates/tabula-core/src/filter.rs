use serde::{Deserialize, Serialize};
use std::ops::{BitAnd, BitOr};
use thiserror::Error as ThisError;

///
/// FilterError
/// Rejections shared by every filter compiler. All of them surface
/// before a request leaves the process.
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum FilterError {
    #[error("filter leaf has no entries")]
    EmptyLeaf,

    #[error("filter group has no children")]
    EmptyGroup,

    #[error("duplicate predicate for field: {field}")]
    DuplicateField { field: String },

    #[error("unknown field: {field}")]
    UnknownField { field: String },

    #[error("unsupported filter option: {predicate}")]
    Unsupported { predicate: &'static str },
}

///
/// Filter
/// Boolean expression tree over field predicates.
///
/// A tree is either a leaf of field comparisons or a group joining child
/// trees with one operator. Builders keep the structural invariants
/// (non-empty leaves and groups); compilers re-check them for trees that
/// were deserialized or assembled by hand.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum Filter {
    Leaf(FilterLeaf),
    Group(FilterGroup),
}

impl Filter {
    fn single(field: impl Into<String>, predicate: Predicate) -> Self {
        Self::Leaf(FilterLeaf::single(field, predicate))
    }

    // --- Equality ---

    pub fn eq(field: impl Into<String>, value: impl Into<Literal>) -> Self {
        Self::single(field, Predicate::Eq(value.into()))
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Literal>) -> Self {
        Self::single(field, Predicate::Ne(value.into()))
    }

    // --- Ordering ---

    pub fn ge(field: impl Into<String>, value: f64) -> Self {
        Self::single(field, Predicate::Ge(value))
    }

    pub fn gt(field: impl Into<String>, value: f64) -> Self {
        Self::single(field, Predicate::Gt(value))
    }

    pub fn le(field: impl Into<String>, value: f64) -> Self {
        Self::single(field, Predicate::Le(value))
    }

    pub fn lt(field: impl Into<String>, value: f64) -> Self {
        Self::single(field, Predicate::Lt(value))
    }

    // --- Text ---

    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::single(field, Predicate::Contains(value.into()))
    }

    pub fn does_not_contain(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::single(field, Predicate::DoesNotContain(value.into()))
    }

    pub fn starts_with(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::single(field, Predicate::StartsWith(value.into()))
    }

    pub fn ends_with(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::single(field, Predicate::EndsWith(value.into()))
    }

    // --- Presence ---

    pub fn is_empty(field: impl Into<String>) -> Self {
        Self::single(field, Predicate::IsEmpty)
    }

    pub fn is_not_empty(field: impl Into<String>) -> Self {
        Self::single(field, Predicate::IsNotEmpty)
    }

    /// Join two trees with `and`, flattening nested `and` groups so
    /// `(a AND b) AND c` becomes one group of three.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::join(JoinOp::And, self, other)
    }

    #[must_use]
    pub fn and_option(self, other: Option<Self>) -> Self {
        match other {
            Some(f) => self.and(f),
            None => self,
        }
    }

    /// Join two trees with `or`, flattening nested `or` groups
    /// similarly to `and`.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::join(JoinOp::Or, self, other)
    }

    #[must_use]
    pub fn or_option(self, other: Option<Self>) -> Self {
        match other {
            Some(f) => self.or(f),
            None => self,
        }
    }

    fn join(op: JoinOp, a: Self, b: Self) -> Self {
        match (a, b) {
            (Self::Group(mut a), Self::Group(mut b)) if a.op == op && b.op == op => {
                a.children.append(&mut b.children);
                Self::Group(a)
            }
            (Self::Group(mut a), b) if a.op == op => {
                a.children.push(b);
                Self::Group(a)
            }
            (a, Self::Group(mut b)) if b.op == op => {
                let mut children = vec![a];
                children.append(&mut b.children);
                Self::Group(FilterGroup { op, children })
            }
            (a, b) => Self::Group(FilterGroup {
                op,
                children: vec![a, b],
            }),
        }
    }
}

impl BitAnd for Filter {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.and(rhs)
    }
}

impl BitOr for Filter {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.or(rhs)
    }
}

///
/// JoinOp
/// The operator a group joins its children with.
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinOp {
    And,
    Or,
}

impl JoinOp {
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

///
/// FilterGroup
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct FilterGroup {
    pub op: JoinOp,
    pub children: Vec<Filter>,
}

///
/// FilterLeaf
/// One or more field predicates, at most one per field. A leaf with
/// several entries requires all of them to hold, whatever group it sits
/// in.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct FilterLeaf {
    entries: Vec<(String, Predicate)>,
}

impl FilterLeaf {
    /// Build a leaf from field predicates, rejecting empty input and
    /// repeated fields.
    pub fn new(entries: Vec<(String, Predicate)>) -> Result<Self, FilterError> {
        if entries.is_empty() {
            return Err(FilterError::EmptyLeaf);
        }

        for (i, (field, _)) in entries.iter().enumerate() {
            if entries[..i].iter().any(|(seen, _)| seen == field) {
                return Err(FilterError::DuplicateField {
                    field: field.clone(),
                });
            }
        }

        Ok(Self { entries })
    }

    #[must_use]
    pub fn single(field: impl Into<String>, predicate: Predicate) -> Self {
        Self {
            entries: vec![(field.into(), predicate)],
        }
    }

    /// Add another field predicate, builder style.
    pub fn with(
        mut self,
        field: impl Into<String>,
        predicate: Predicate,
    ) -> Result<Self, FilterError> {
        let field = field.into();
        if self.entries.iter().any(|(seen, _)| *seen == field) {
            return Err(FilterError::DuplicateField { field });
        }

        self.entries.push((field, predicate));
        Ok(self)
    }

    #[must_use]
    pub fn entries(&self) -> &[(String, Predicate)] {
        &self.entries
    }
}

///
/// Predicate
/// The closed set of per-field comparisons. Which of these a backend can
/// actually execute is that backend's compiler's concern.
///

#[remain::sorted]
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Contains(String),
    DoesNotContain(String),
    EndsWith(String),
    Eq(Literal),
    Ge(f64),
    Gt(f64),
    IsEmpty,
    IsNotEmpty,
    Le(f64),
    Lt(f64),
    Ne(Literal),
    StartsWith(String),
}

impl Predicate {
    /// Name used in error messages and unsupported-option reports.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Contains(_) => "contains",
            Self::DoesNotContain(_) => "does_not_contain",
            Self::EndsWith(_) => "ends_with",
            Self::Eq(_) => "eq",
            Self::Ge(_) => "ge",
            Self::Gt(_) => "gt",
            Self::IsEmpty => "is_empty",
            Self::IsNotEmpty => "is_not_empty",
            Self::Le(_) => "le",
            Self::Lt(_) => "lt",
            Self::Ne(_) => "ne",
            Self::StartsWith(_) => "starts_with",
        }
    }
}

///
/// Literal
/// A comparison operand. The variants are the whole story: anything a
/// predicate can compare against is representable here, and nothing
/// else gets in.
///

#[remain::sorted]
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Number(f64),
    Text(String),
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Literal {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

impl From<u32> for Literal {
    fn from(n: u32) -> Self {
        Self::Number(n.into())
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(field: &str) -> Filter {
        Filter::eq(field, "x")
    }

    #[test]
    fn builders_cover_every_predicate() {
        fn assert_single(filter: Filter, field: &str, predicate: Predicate) {
            match filter {
                Filter::Leaf(leaf) => {
                    assert_eq!(leaf.entries(), &[(field.to_string(), predicate)]);
                }
                Filter::Group(_) => panic!("expected Leaf"),
            }
        }

        assert_single(
            Filter::eq("a", 1),
            "a",
            Predicate::Eq(Literal::Number(1.0)),
        );
        assert_single(
            Filter::ne("a", "x"),
            "a",
            Predicate::Ne(Literal::Text("x".to_string())),
        );
        assert_single(Filter::ge("a", 2.0), "a", Predicate::Ge(2.0));
        assert_single(Filter::gt("a", 2.0), "a", Predicate::Gt(2.0));
        assert_single(Filter::le("a", 2.0), "a", Predicate::Le(2.0));
        assert_single(Filter::lt("a", 2.0), "a", Predicate::Lt(2.0));
        assert_single(
            Filter::contains("a", "an"),
            "a",
            Predicate::Contains("an".to_string()),
        );
        assert_single(
            Filter::does_not_contain("a", "an"),
            "a",
            Predicate::DoesNotContain("an".to_string()),
        );
        assert_single(
            Filter::starts_with("a", "an"),
            "a",
            Predicate::StartsWith("an".to_string()),
        );
        assert_single(
            Filter::ends_with("a", "an"),
            "a",
            Predicate::EndsWith("an".to_string()),
        );
        assert_single(Filter::is_empty("a"), "a", Predicate::IsEmpty);
        assert_single(Filter::is_not_empty("a"), "a", Predicate::IsNotEmpty);
    }

    #[test]
    fn and_flattens_nested_ands() {
        let filter = leaf("a").and(leaf("b")).and(leaf("c"));

        match filter {
            Filter::Group(group) => {
                assert_eq!(group.op, JoinOp::And);
                assert_eq!(group.children.len(), 3);
            }
            Filter::Leaf(_) => panic!("expected Group"),
        }
    }

    #[test]
    fn or_flattens_from_the_right_too() {
        let filter = leaf("a").or(leaf("b").or(leaf("c")));

        match filter {
            Filter::Group(group) => {
                assert_eq!(group.op, JoinOp::Or);
                assert_eq!(group.children.len(), 3);
            }
            Filter::Leaf(_) => panic!("expected Group"),
        }
    }

    #[test]
    fn mixed_operators_do_not_flatten() {
        let filter = leaf("a").and(leaf("b")).or(leaf("c"));

        match filter {
            Filter::Group(group) => {
                assert_eq!(group.op, JoinOp::Or);
                assert_eq!(group.children.len(), 2);
                assert!(matches!(&group.children[0], Filter::Group(inner) if inner.op == JoinOp::And));
            }
            Filter::Leaf(_) => panic!("expected Group"),
        }
    }

    #[test]
    fn bit_operators_mirror_and_or() {
        let filter = (leaf("a") & leaf("b")) | leaf("c");

        match filter {
            Filter::Group(group) => {
                assert_eq!(group.op, JoinOp::Or);
                assert_eq!(group.children.len(), 2);
            }
            Filter::Leaf(_) => panic!("expected Group"),
        }
    }

    #[test]
    fn and_option_none_is_identity() {
        let base = leaf("a");
        assert_eq!(base.clone().and_option(None), base);
    }

    #[test]
    fn or_option_some_joins() {
        let filter = leaf("a").or_option(Some(leaf("b")));
        assert!(matches!(filter, Filter::Group(group) if group.op == JoinOp::Or));
    }

    #[test]
    fn leaf_construction_rejects_empty_and_duplicates() {
        assert_eq!(FilterLeaf::new(vec![]), Err(FilterError::EmptyLeaf));

        let err = FilterLeaf::new(vec![
            ("age".to_string(), Predicate::Ge(1.0)),
            ("age".to_string(), Predicate::Le(9.0)),
        ])
        .expect_err("duplicate field");
        assert_eq!(
            err,
            FilterError::DuplicateField {
                field: "age".to_string()
            }
        );
    }

    #[test]
    fn leaf_with_appends_distinct_fields() {
        let leaf = FilterLeaf::single("age", Predicate::Ge(18.0))
            .with("name", Predicate::Contains("an".to_string()))
            .expect("distinct fields");
        assert_eq!(leaf.entries().len(), 2);

        let err = leaf
            .with("age", Predicate::Lt(99.0))
            .expect_err("repeated field");
        assert_eq!(
            err,
            FilterError::DuplicateField {
                field: "age".to_string()
            }
        );
    }

    // --- properties ---

    use proptest::prelude::*;

    fn arb_filter() -> impl Strategy<Value = Filter> {
        let leaf = ("[a-f]", 0..100i32).prop_map(|(field, n)| Filter::eq(field, n));

        leaf.prop_recursive(3, 24, 3, |inner| {
            (inner.clone(), inner, any::<bool>()).prop_map(|(a, b, use_and)| {
                if use_and { a.and(b) } else { a.or(b) }
            })
        })
    }

    fn no_same_op_nesting(filter: &Filter) -> bool {
        match filter {
            Filter::Leaf(_) => true,
            Filter::Group(group) => group.children.iter().all(|child| {
                let clashes = matches!(child, Filter::Group(inner) if inner.op == group.op);
                !clashes && no_same_op_nesting(child)
            }),
        }
    }

    fn no_empty_nodes(filter: &Filter) -> bool {
        match filter {
            Filter::Leaf(leaf) => !leaf.entries().is_empty(),
            Filter::Group(group) => {
                !group.children.is_empty() && group.children.iter().all(no_empty_nodes)
            }
        }
    }

    proptest! {
        #[test]
        fn joins_flatten_same_operator_groups(filter in arb_filter()) {
            prop_assert!(no_same_op_nesting(&filter));
        }

        #[test]
        fn joins_never_produce_empty_nodes(filter in arb_filter()) {
            prop_assert!(no_empty_nodes(&filter));
        }
    }
}
