//! Shared contract for tabula accessors: the schema and value model, the
//! filter tree, sort and cursor primitives, and the `Accessor` trait each
//! backend crate implements.

pub mod accessor;
pub mod cursor;
pub mod date;
pub mod error;
pub mod filter;
pub mod record;
pub mod schema;
pub mod sort;
pub mod value;

///
/// Prelude
///
/// Domain vocabulary only; transports and wire types stay in the backend
/// crates.
///

pub mod prelude {
    pub use crate::{
        accessor::{Accessor, ListOptions, ListPage},
        cursor::Cursor,
        date::Date,
        error::{AccessorError, Operation},
        filter::{Filter, FilterGroup, FilterLeaf, JoinOp, Literal, Predicate},
        record::{Record, Row},
        schema::{Field, Schema},
        sort::{Direction, SortKey},
        value::{FieldType, Value},
    };
}
