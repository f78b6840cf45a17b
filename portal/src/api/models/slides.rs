use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use utoipa::ToSchema;

use crate::{
    api::envelope::{Action, RequiredFields},
    db::models::slides::{SlideDBRequest, SlideDBResponse},
    errors::{Error, Result},
    types::{Operation, Resource, SlideId},
};

/// POST body for `/api/slideshow`
#[derive(Debug, Deserialize, ToSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SlideshowAction {
    Create(SlideInput),
    Update(SlideInput),
    Delete(SlideInput),
}

impl Action for SlideshowAction {
    const RESOURCE: Resource = Resource::Slideshow;
    const NAMES: &'static [&'static str] = &["create", "update", "delete"];

    fn operation(&self) -> Operation {
        match self {
            SlideshowAction::Create(_) => Operation::Create,
            SlideshowAction::Update(_) => Operation::Update,
            SlideshowAction::Delete(_) => Operation::Delete,
        }
    }
}

#[serde_as]
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SlideInput {
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[schema(value_type = Option<i64>)]
    pub id: Option<SlideId>,
    #[serde(alias = "titulo")]
    pub title: Option<String>,
    #[serde(alias = "descripcion")]
    pub description: Option<String>,
    #[serde(alias = "image-url", alias = "imagen_url")]
    pub image_url: Option<String>,
}

impl SlideInput {
    pub fn into_db_request(self) -> Result<SlideDBRequest> {
        let mut required = RequiredFields::default();
        let title = required.take("title", &self.title);
        let description = required.take("description", &self.description);
        let image_url = required.take("image_url", &self.image_url);
        required.finish()?;

        Ok(SlideDBRequest {
            title: title.to_string(),
            description: description.to_string(),
            image_url: image_url.to_string(),
        })
    }

    pub fn require_id(&self) -> Result<SlideId> {
        self.id.ok_or_else(|| Error::BadRequest {
            message: "Missing required fields: id".to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SlideResponse {
    pub id: SlideId,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

impl From<SlideDBResponse> for SlideResponse {
    fn from(db: SlideDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            description: db.description,
            image_url: db.image_url,
            created_at: db.created_at,
        }
    }
}
