use crate::types::SlideId;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct SlideDBRequest {
    pub title: String,
    pub description: String,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct SlideDBResponse {
    pub id: SlideId,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}
