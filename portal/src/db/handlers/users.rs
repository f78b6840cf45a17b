use crate::{
    db::{
        errors::Result,
        models::users::{ProfileUpdateDBRequest, UserCreateDBRequest, UserDBResponse},
    },
    types::UserId,
};
use sqlx::SqliteConnection;
use tracing::instrument;

const USER_COLUMNS: &str = "SELECT id, name, email, password_hash, profile, photo_url FROM users";

/// Accounts are provisioned outside the API, so there is no list or delete here.
pub struct Users<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(email = %request.email, profile = %request.profile), err)]
    pub async fn create(&mut self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        let id = sqlx::query("INSERT INTO users (name, email, password_hash, profile, photo_url) VALUES (?, ?, ?, ?, ?)")
            .bind(&request.name)
            .bind(&request.email)
            .bind(&request.password_hash)
            .bind(request.profile)
            .bind(&request.photo_url)
            .execute(&mut *self.db)
            .await?
            .last_insert_rowid();

        Ok(UserDBResponse {
            id,
            name: request.name.clone(),
            email: request.email.clone(),
            password_hash: request.password_hash.clone(),
            profile: request.profile,
            photo_url: request.photo_url.clone(),
        })
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: UserId) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>(&format!("{USER_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(user)
    }

    #[instrument(skip(self, email), err)]
    pub async fn get_user_by_email(&mut self, email: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>(&format!("{USER_COLUMNS} WHERE email = ?"))
            .bind(email)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(user)
    }

    /// Returns whether the user exists
    #[instrument(skip(self, request), err)]
    pub async fn update_profile(&mut self, id: UserId, request: &ProfileUpdateDBRequest) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET name = ?, photo_url = ? WHERE id = ?")
            .bind(&request.name)
            .bind(&request.photo_url)
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, password_hash), err)]
    pub async fn update_password(&mut self, id: UserId, password_hash: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
