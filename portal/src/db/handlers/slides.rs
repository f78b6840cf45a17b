use crate::{
    db::{
        errors::Result,
        handlers::repository::Repository,
        models::slides::{SlideDBRequest, SlideDBResponse},
    },
    types::SlideId,
};
use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::instrument;

const SLIDE_COLUMNS: &str = "SELECT id, title, description, image_url, created_at FROM slides";

pub struct Slides<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Slides<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Slides<'c> {
    type CreateRequest = SlideDBRequest;
    type UpdateRequest = SlideDBRequest;
    type Response = SlideDBResponse;
    type Id = SlideId;
    type Filter = ();

    #[instrument(skip(self, request), fields(title = %request.title), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let created_at = Utc::now();
        let id = sqlx::query("INSERT INTO slides (title, description, image_url, created_at) VALUES (?, ?, ?, ?)")
            .bind(&request.title)
            .bind(&request.description)
            .bind(&request.image_url)
            .bind(created_at)
            .execute(&mut *self.db)
            .await?
            .last_insert_rowid();

        Ok(SlideDBResponse {
            id,
            title: request.title.clone(),
            description: request.description.clone(),
            image_url: request.image_url.clone(),
            created_at,
        })
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let slide = sqlx::query_as::<_, SlideDBResponse>(&format!("{SLIDE_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(slide)
    }

    /// Newest first
    #[instrument(skip(self), err)]
    async fn list(&mut self, _filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let slides = sqlx::query_as::<_, SlideDBResponse>(&format!("{SLIDE_COLUMNS} ORDER BY id DESC"))
            .fetch_all(&mut *self.db)
            .await?;
        Ok(slides)
    }

    /// `created_at` is never touched
    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<bool> {
        let result = sqlx::query("UPDATE slides SET title = ?, description = ?, image_url = ? WHERE id = ?")
            .bind(&request.title)
            .bind(&request.description)
            .bind(&request.image_url)
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM slides WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
