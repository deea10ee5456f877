//! Document backend for tabula. Records live as pages in one database;
//! properties carry typed payloads keyed by their kind, and filters
//! compile to the backend's nested filter objects.

pub mod accessor;
pub mod filter;
pub mod property;
pub mod schema;
pub mod transport;

pub use accessor::{NotionAccessor, PageMeta};
pub use property::PropertyKind;
pub use schema::PropertySchema;
pub use transport::NotionTransport;
