//! Key-value backend for tabula. Records live as items in one partition
//! of one table; filters compile to the backend's boolean expression
//! language with `#field` aliases and `:placeholder` value bindings.

pub mod accessor;
pub mod expr;
pub mod transport;
pub mod wire;

pub use accessor::{DynamoAccessor, TableConfig};
pub use transport::DynamoTransport;
