use crate::wire::{ItemRequest, ItemResponse, QueryRequest, QueryResponse};
use async_trait::async_trait;
use tabula_core::error::BoxError;

///
/// DynamoTransport
/// The caller-provided network client the accessor issues calls
/// through. Implementations own signing, endpoints, and connection
/// lifecycle; the accessor owns nothing below the request shapes.
///
/// A transport error means no usable response was produced. Backend
/// rejections travel inside the response as a status code.
///

#[async_trait]
pub trait DynamoTransport: Send + Sync {
    /// Execute a single-item call.
    async fn item(&self, request: ItemRequest) -> Result<ItemResponse, BoxError>;

    /// Execute a partition query.
    async fn query(&self, request: QueryRequest) -> Result<QueryResponse, BoxError>;
}

#[async_trait]
impl<T: DynamoTransport + ?Sized> DynamoTransport for Box<T> {
    async fn item(&self, request: ItemRequest) -> Result<ItemResponse, BoxError> {
        (**self).item(request).await
    }

    async fn query(&self, request: QueryRequest) -> Result<QueryResponse, BoxError> {
        (**self).query(request).await
    }
}
