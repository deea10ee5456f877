use crate::value::Value;
use derive_more::{Deref, DerefMut, IntoIterator};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

///
/// Row
/// An ordered field-to-value map; the unit of data every operation
/// moves. Rows are sparse: a field a schema declares may be absent.
///

#[repr(transparent)]
#[derive(
    Clone, Debug, Default, Deref, DerefMut, Deserialize, IntoIterator, PartialEq, Serialize,
)]
pub struct Row(#[into_iterator(owned, ref)] BTreeMap<String, Value>);

impl Row {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Add a field, builder style.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

///
/// Record
/// A row read back from a backend, plus whatever metadata that backend
/// attaches on reads.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Record<M> {
    pub row: Row,
    pub meta: M,
}

impl<M> Record<M> {
    #[must_use]
    pub const fn new(row: Row, meta: M) -> Self {
        Self { row, meta }
    }
}

///
/// TESTS
///
