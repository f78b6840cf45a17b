//! Request and response types for the JSON API.

pub mod auth;
pub mod employees;
pub mod slides;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// `data` payload of create, update and delete responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IdResponse {
    pub id: i64,
}
