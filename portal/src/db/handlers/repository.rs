//! Base repository trait for table access.

use crate::db::errors::Result;

/// CRUD over one table, borrowed from a single pooled connection.
///
/// Every method issues exactly one statement, so each write is atomic on its own.
#[async_trait::async_trait]
pub trait Repository {
    type CreateRequest;
    type UpdateRequest;
    type Response;
    type Id: Send + Sync;
    type Filter: Send + Sync;

    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response>;

    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>>;

    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>>;

    /// Returns whether a row with `id` existed
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<bool>;

    /// Returns whether a row was removed
    async fn delete(&mut self, id: Self::Id) -> Result<bool>;
}
