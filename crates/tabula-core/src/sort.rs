use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// SortError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum SortError {
    #[error("at most one sort key is supported, got {count}")]
    TooMany { count: usize },

    #[error("cannot sort by property: {property}")]
    Unsortable { property: String },
}

///
/// Direction
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    #[must_use]
    pub const fn is_ascending(self) -> bool {
        matches!(self, Self::Ascending)
    }
}

///
/// SortKey
/// One property to order a listing by. Which properties are sortable is
/// backend-specific and checked before any call goes out.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SortKey {
    pub property: String,
    pub direction: Direction,
}

impl SortKey {
    #[must_use]
    pub fn ascending(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: Direction::Ascending,
        }
    }

    #[must_use]
    pub fn descending(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: Direction::Descending,
        }
    }
}

/// Enforce the shared one-key ceiling and hand back the key when present.
pub fn single_sort_key(keys: &[SortKey]) -> Result<Option<&SortKey>, SortError> {
    match keys {
        [] => Ok(None),
        [key] => Ok(Some(key)),
        _ => Err(SortError::TooMany { count: keys.len() }),
    }
}

///
/// TESTS
///
