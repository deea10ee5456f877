use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tabula_core::{error::BoxError, sort::Direction};

///
/// SortPayload
/// One sort instruction in the backend's wire form.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SortPayload {
    pub property: String,
    pub direction: Direction,
}

///
/// QueryDatabaseRequest
/// Database-scoped read: filter, sorts, and paging.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct QueryDatabaseRequest {
    pub database_id: String,
    pub filter: Option<serde_json::Value>,
    pub sorts: Vec<SortPayload>,
    pub start_cursor: Option<String>,
    pub page_size: Option<u32>,
}

///
/// Page
/// One result page object: its id and the raw property items, keyed by
/// property name. Extraction into typed values happens per declared
/// kind.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Page {
    pub id: String,
    pub properties: serde_json::Map<String, serde_json::Value>,
}

///
/// QueryDatabaseResponse
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct QueryDatabaseResponse {
    pub status: u16,
    pub results: Vec<Page>,
    pub next_cursor: Option<String>,
}

///
/// CreatePageRequest
/// Create a page in the database; the backend assigns its identity.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CreatePageRequest {
    pub database_id: String,
    pub properties: serde_json::Map<String, serde_json::Value>,
}

///
/// UpdatePageRequest
/// Patch the named properties of one existing page.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct UpdatePageRequest {
    pub page_id: String,
    pub properties: serde_json::Map<String, serde_json::Value>,
}

///
/// PageResponse
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PageResponse {
    pub status: u16,
    pub page_id: Option<String>,
}

///
/// NotionTransport
/// The caller-provided network client the accessor issues calls
/// through. Implementations own authentication, endpoints, and
/// connection lifecycle; the accessor owns nothing below the request
/// shapes.
///
/// A transport error means no usable response was produced. Backend
/// rejections travel inside the response as a status code.
///

#[async_trait]
pub trait NotionTransport: Send + Sync {
    /// Execute a database query.
    async fn query_database(
        &self,
        request: QueryDatabaseRequest,
    ) -> Result<QueryDatabaseResponse, BoxError>;

    /// Create a page.
    async fn create_page(&self, request: CreatePageRequest) -> Result<PageResponse, BoxError>;

    /// Patch a page.
    async fn update_page(&self, request: UpdatePageRequest) -> Result<PageResponse, BoxError>;
}

#[async_trait]
impl<T: NotionTransport + ?Sized> NotionTransport for Box<T> {
    async fn query_database(
        &self,
        request: QueryDatabaseRequest,
    ) -> Result<QueryDatabaseResponse, BoxError> {
        (**self).query_database(request).await
    }

    async fn create_page(&self, request: CreatePageRequest) -> Result<PageResponse, BoxError> {
        (**self).create_page(request).await
    }

    async fn update_page(&self, request: UpdatePageRequest) -> Result<PageResponse, BoxError> {
        (**self).update_page(request).await
    }
}
