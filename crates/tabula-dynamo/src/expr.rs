use crate::wire::AttrValue;
use std::collections::BTreeMap;
use tabula_core::{
    filter::{Filter, FilterError, FilterLeaf, JoinOp, Predicate},
    schema::Schema,
};

///
/// CompiledExpr
/// A filter tree lowered to the backend's expression language: the
/// boolean expression string, the `#field` alias table, and the
/// `:placeholder` value bindings.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CompiledExpr {
    pub expression: String,
    pub names: BTreeMap<String, String>,
    pub values: BTreeMap<String, AttrValue>,
}

/// Lower a filter tree into the expression language.
///
/// `prefix` seeds placeholder derivation (`:{prefix}_{index}_{field}`),
/// so two expressions compiled with different prefixes can share one
/// request without colliding. Field aliases (`#field`) keep reserved
/// words out of the expression itself.
///
/// Each group compiles with its own operator and one surrounding
/// parenthesis pair; a leaf with several entries compiles as an
/// `and`-joined pair of its own. Compilation is pure: the same tree and
/// prefix always produce the same output, and nothing is sent anywhere.
pub fn compile_filter(
    schema: &Schema,
    filter: &Filter,
    prefix: &str,
) -> Result<CompiledExpr, FilterError> {
    let mut out = CompiledExpr::default();

    let expression = match filter {
        Filter::Leaf(leaf) => compile_leaf(schema, leaf, prefix, 0, &mut out)?,
        Filter::Group(group) => {
            compile_group(schema, group.op, &group.children, prefix, &mut out)?
        }
    };
    out.expression = expression;

    Ok(out)
}

fn compile_group(
    schema: &Schema,
    op: JoinOp,
    children: &[Filter],
    prefix: &str,
    out: &mut CompiledExpr,
) -> Result<String, FilterError> {
    if children.is_empty() {
        return Err(FilterError::EmptyGroup);
    }

    let mut fragments = Vec::with_capacity(children.len());

    for (index, child) in children.iter().enumerate() {
        let fragment = match child {
            Filter::Leaf(leaf) => compile_leaf(schema, leaf, prefix, index, out)?,
            Filter::Group(group) => {
                // A nested group derives its children's prefix from its
                // own position and joins with its own operator.
                let child_prefix = format!("{prefix}_{index}");
                compile_group(schema, group.op, &group.children, &child_prefix, out)?
            }
        };

        fragments.push(fragment);
    }

    let keyword = op.keyword();
    Ok(format!("({})", fragments.join(&format!(" {keyword} "))))
}

fn compile_leaf(
    schema: &Schema,
    leaf: &FilterLeaf,
    prefix: &str,
    index: usize,
    out: &mut CompiledExpr,
) -> Result<String, FilterError> {
    let entries = leaf.entries();
    if entries.is_empty() {
        return Err(FilterError::EmptyLeaf);
    }

    let mut fragments = Vec::with_capacity(entries.len());

    for (field, predicate) in entries {
        fragments.push(compile_entry(schema, field, predicate, prefix, index, out)?);
    }

    // Entries of one leaf must all hold; more than one makes a group of
    // its own. Field names are unique within the leaf, so sharing the
    // leaf's index keeps the placeholders distinct.
    let joined = fragments.join(" and ");
    Ok(if fragments.len() == 1 {
        joined
    } else {
        format!("({joined})")
    })
}

fn compile_entry(
    schema: &Schema,
    field: &str,
    predicate: &Predicate,
    prefix: &str,
    index: usize,
    out: &mut CompiledExpr,
) -> Result<String, FilterError> {
    if !schema.contains(field) {
        return Err(FilterError::UnknownField {
            field: field.to_owned(),
        });
    }

    let alias = format!("#{field}");
    let placeholder = format!(":{prefix}_{index}_{field}");

    let (fragment, value) = match predicate {
        Predicate::Eq(literal) => (
            format!("{alias} = {placeholder}"),
            AttrValue::from_literal(literal),
        ),
        Predicate::Ne(literal) => (
            format!("{alias} <> {placeholder}"),
            AttrValue::from_literal(literal),
        ),
        Predicate::Ge(n) => (
            format!("{alias} >= {placeholder}"),
            AttrValue::N(n.to_string()),
        ),
        Predicate::Gt(n) => (
            format!("{alias} > {placeholder}"),
            AttrValue::N(n.to_string()),
        ),
        Predicate::Le(n) => (
            format!("{alias} <= {placeholder}"),
            AttrValue::N(n.to_string()),
        ),
        Predicate::Lt(n) => (
            format!("{alias} < {placeholder}"),
            AttrValue::N(n.to_string()),
        ),
        Predicate::Contains(s) => (
            format!("contains({alias}, {placeholder})"),
            AttrValue::S(s.clone()),
        ),
        other => {
            return Err(FilterError::Unsupported {
                predicate: other.name(),
            });
        }
    };

    out.names.insert(alias, field.to_owned());
    out.values.insert(placeholder, value);

    Ok(fragment)
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::{
        schema::Field,
        value::FieldType,
    };

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("age", FieldType::Number),
            Field::new("name", FieldType::Text),
            Field::new("city", FieldType::Text),
            Field::new("score", FieldType::Number),
        ])
        .expect("valid schema")
    }

    fn names(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn compiles_a_two_leaf_and_group() {
        let filter = Filter::ge("age", 18.0).and(Filter::contains("name", "an"));
        let compiled = compile_filter(&schema(), &filter, "v").expect("compiles");

        assert_eq!(
            compiled.expression,
            "(#age >= :v_0_age and contains(#name, :v_1_name))"
        );
        assert_eq!(
            compiled.names,
            names(&[("#age", "age"), ("#name", "name")])
        );
        assert_eq!(
            compiled.values,
            BTreeMap::from([
                (":v_0_age".to_string(), AttrValue::N("18".to_string())),
                (":v_1_name".to_string(), AttrValue::S("an".to_string())),
            ])
        );
    }

    #[test]
    fn a_bare_leaf_compiles_without_parentheses() {
        let compiled =
            compile_filter(&schema(), &Filter::eq("name", "ada"), "v").expect("compiles");

        assert_eq!(compiled.expression, "#name = :v_0_name");
        assert_eq!(compiled.names, names(&[("#name", "name")]));
    }

    #[test]
    fn nested_groups_use_their_own_operator_and_prefix() {
        let filter = Filter::eq("city", "york")
            .or(Filter::lt("age", 30.0).and(Filter::gt("score", 90.0)));
        let compiled = compile_filter(&schema(), &filter, "v").expect("compiles");

        assert_eq!(
            compiled.expression,
            "(#city = :v_0_city or (#age < :v_1_0_age and #score > :v_1_1_score))"
        );
    }

    #[test]
    fn sibling_or_inside_and_keeps_the_outer_operator_outside() {
        let filter = Filter::Group(tabula_core::filter::FilterGroup {
            op: JoinOp::And,
            children: vec![
                Filter::eq("city", "york"),
                Filter::lt("age", 30.0).or(Filter::gt("score", 90.0)),
            ],
        });
        let compiled = compile_filter(&schema(), &filter, "v").expect("compiles");

        assert_eq!(
            compiled.expression,
            "(#city = :v_0_city and (#age < :v_1_0_age or #score > :v_1_1_score))"
        );
        assert_eq!(
            compiled.values.keys().collect::<Vec<_>>(),
            vec![":v_0_city", ":v_1_0_age", ":v_1_1_score"]
        );
    }

    #[test]
    fn a_multi_entry_leaf_joins_with_and_under_one_index() {
        let leaf = FilterLeaf::single("age", Predicate::Ge(18.0))
            .with("name", Predicate::Contains("an".to_string()))
            .expect("distinct fields");
        let compiled =
            compile_filter(&schema(), &Filter::Leaf(leaf), "p").expect("compiles");

        assert_eq!(
            compiled.expression,
            "(#age >= :p_0_age and contains(#name, :p_0_name))"
        );
    }

    #[test]
    fn ne_compiles_to_the_angle_bracket_pair() {
        let compiled =
            compile_filter(&schema(), &Filter::ne("age", 21), "v").expect("compiles");
        assert_eq!(compiled.expression, "#age <> :v_0_age");
        assert_eq!(
            compiled.values.get(":v_0_age"),
            Some(&AttrValue::N("21".to_string()))
        );
    }

    #[test]
    fn unsupported_options_are_rejected_not_dropped() {
        for (filter, predicate) in [
            (Filter::starts_with("name", "a"), "starts_with"),
            (Filter::ends_with("name", "a"), "ends_with"),
            (Filter::does_not_contain("name", "a"), "does_not_contain"),
            (Filter::is_empty("name"), "is_empty"),
            (Filter::is_not_empty("name"), "is_not_empty"),
        ] {
            let err = compile_filter(&schema(), &filter, "v").expect_err("must reject");
            assert_eq!(err, FilterError::Unsupported { predicate });
        }
    }

    #[test]
    fn unknown_fields_fail_before_anything_compiles() {
        let err = compile_filter(&schema(), &Filter::eq("nickname", "ada"), "v")
            .expect_err("unknown field");
        assert_eq!(
            err,
            FilterError::UnknownField {
                field: "nickname".to_string()
            }
        );
    }

    #[test]
    fn empty_groups_and_leaves_are_rejected() {
        let empty_group = Filter::Group(tabula_core::filter::FilterGroup {
            op: JoinOp::And,
            children: vec![],
        });
        assert_eq!(
            compile_filter(&schema(), &empty_group, "v"),
            Err(FilterError::EmptyGroup)
        );

        // Builders cannot produce an empty leaf, but a deserialized tree can.
        let empty_leaf: FilterLeaf =
            serde_json::from_value(serde_json::json!({ "entries": [] })).expect("deserializes");
        assert_eq!(
            compile_filter(&schema(), &Filter::Leaf(empty_leaf), "v"),
            Err(FilterError::EmptyLeaf)
        );
    }

    #[test]
    fn compilation_is_pure() {
        let filter = Filter::ge("age", 18.0)
            .and(Filter::contains("name", "an").or(Filter::eq("city", "york")));

        let first = compile_filter(&schema(), &filter, "v").expect("compiles");
        let second = compile_filter(&schema(), &filter, "v").expect("compiles");
        assert_eq!(first, second);

        let other_prefix = compile_filter(&schema(), &filter, "w").expect("compiles");
        assert!(other_prefix.values.keys().all(|k| k.starts_with(":w_")));
    }

    // --- properties ---

    use proptest::prelude::*;

    fn arb_predicate() -> impl Strategy<Value = Predicate> {
        prop_oneof![
            (0.0..1000.0).prop_map(|n| Predicate::Eq(tabula_core::filter::Literal::Number(n))),
            "[a-z]{1,8}".prop_map(|s| Predicate::Ne(tabula_core::filter::Literal::Text(s))),
            (0.0..1000.0).prop_map(Predicate::Ge),
            (0.0..1000.0).prop_map(Predicate::Gt),
            (0.0..1000.0).prop_map(Predicate::Le),
            (0.0..1000.0).prop_map(Predicate::Lt),
        ]
    }

    fn arb_tree() -> impl Strategy<Value = Filter> {
        let field = prop_oneof![
            Just("age".to_string()),
            Just("name".to_string()),
            Just("city".to_string()),
            Just("score".to_string()),
        ];
        let leaf = (field, arb_predicate())
            .prop_map(|(field, predicate)| Filter::Leaf(FilterLeaf::single(field, predicate)));

        leaf.prop_recursive(4, 32, 4, |inner| {
            (
                prop_oneof![Just(JoinOp::And), Just(JoinOp::Or)],
                prop::collection::vec(inner, 1..4),
            )
                .prop_map(|(op, children)| {
                    Filter::Group(tabula_core::filter::FilterGroup { op, children })
                })
        })
    }

    fn leaf_count(filter: &Filter) -> usize {
        match filter {
            Filter::Leaf(_) => 1,
            Filter::Group(group) => group.children.iter().map(leaf_count).sum(),
        }
    }

    fn group_count(filter: &Filter) -> usize {
        match filter {
            Filter::Leaf(_) => 0,
            Filter::Group(group) => {
                1 + group.children.iter().map(group_count).sum::<usize>()
            }
        }
    }

    proptest! {
        // Placeholders are derived from the path to each leaf, so the
        // bindings map must hold exactly one entry per leaf at any depth.
        #[test]
        fn placeholders_never_collide(filter in arb_tree()) {
            let compiled = compile_filter(&schema(), &filter, "v").expect("compiles");
            prop_assert_eq!(compiled.values.len(), leaf_count(&filter));
        }

        // With comparison-only leaves the only parentheses are the one
        // pair each group contributes.
        #[test]
        fn parenthesis_pairs_match_group_count(filter in arb_tree()) {
            let compiled = compile_filter(&schema(), &filter, "v").expect("compiles");
            let groups = group_count(&filter);
            prop_assert_eq!(compiled.expression.matches('(').count(), groups);
            prop_assert_eq!(compiled.expression.matches(')').count(), groups);
        }

        #[test]
        fn recompilation_is_byte_identical(filter in arb_tree()) {
            let first = compile_filter(&schema(), &filter, "v").expect("compiles");
            let second = compile_filter(&schema(), &filter, "v").expect("compiles");
            prop_assert_eq!(first, second);
        }

        #[test]
        fn every_alias_maps_hash_name_to_name(filter in arb_tree()) {
            let compiled = compile_filter(&schema(), &filter, "v").expect("compiles");
            for (alias, field) in &compiled.names {
                prop_assert_eq!(alias, &format!("#{field}"));
            }
        }
    }
}
