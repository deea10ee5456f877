use crate::{
    cursor::Cursor,
    error::AccessorError,
    filter::Filter,
    record::{Record, Row},
    sort::SortKey,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

///
/// ListOptions
/// Everything a `list` call can be narrowed by. All parts are optional;
/// the default lists the whole scope from the start.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ListOptions {
    pub filter: Option<Filter>,
    pub sort: Vec<SortKey>,
    pub cursor: Option<Cursor>,
    pub limit: Option<u32>,
}

impl ListOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn sort(mut self, key: SortKey) -> Self {
        self.sort.push(key);
        self
    }

    #[must_use]
    pub fn cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

///
/// ListPage
/// One page of a listing plus the cursor to ask for the next one.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ListPage<M> {
    pub items: Vec<Record<M>>,
    pub cursor: Cursor,
}

///
/// Accessor
/// Uniform record access over one configured backend scope (a table
/// partition, a database, ...). Implementations validate locally, issue
/// at most the calls the operation needs, and never retry.
///
/// `get` answers `None` for an absent key; a keyed `update` that matches
/// nothing is an error. Backends that cannot perform an operation at all
/// reject it with `AccessorError::Unsupported`.
///

#[async_trait]
pub trait Accessor: Send + Sync {
    /// Metadata the backend attaches to every record it hands back.
    type Meta: Send;

    /// Fetch one record by key.
    async fn get(&self, key: &str) -> Result<Option<Record<Self::Meta>>, AccessorError>;

    /// Write the full row at a caller-chosen key, creating or replacing.
    async fn set(&self, key: &str, row: Row) -> Result<(), AccessorError>;

    /// Create a record and let the backend assign its identity.
    async fn add(&self, row: Row) -> Result<Self::Meta, AccessorError>;

    /// Merge a partial row into the record at `key`.
    async fn update(&self, key: &str, patch: Row) -> Result<(), AccessorError>;

    /// Scan the scope: filtered, sorted, and resumable via the returned
    /// cursor.
    async fn list(&self, options: ListOptions) -> Result<ListPage<Self::Meta>, AccessorError>;
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_options_build_up() {
        let options = ListOptions::new()
            .filter(Filter::eq("name", "ada"))
            .sort(SortKey::descending("when"))
            .cursor(Cursor::start())
            .limit(25);

        assert!(options.filter.is_some());
        assert_eq!(options.sort.len(), 1);
        assert_eq!(options.limit, Some(25));
    }

    #[test]
    fn default_lists_everything_from_the_start() {
        let options = ListOptions::default();
        assert!(options.filter.is_none());
        assert!(options.sort.is_empty());
        assert!(options.cursor.is_none());
        assert!(options.limit.is_none());
    }
}
