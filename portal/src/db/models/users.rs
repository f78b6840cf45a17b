use crate::types::{Profile, UserId};

#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub name: String,
    pub email: String,
    /// `None` leaves the account without a usable password
    pub password_hash: Option<String>,
    pub profile: Profile,
    pub photo_url: Option<String>,
}

/// Self-service profile edit
#[derive(Debug, Clone)]
pub struct ProfileUpdateDBRequest {
    pub name: String,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserDBResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub profile: Profile,
    pub photo_url: Option<String>,
}
