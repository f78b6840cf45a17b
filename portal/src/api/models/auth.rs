use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::envelope::Action,
    auth::session::SessionData,
    db::models::users::UserDBResponse,
    types::{Operation, Profile, Resource, UserId},
};

/// POST body for `/api/auth`
#[derive(Deserialize, ToSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AuthAction {
    Login(LoginRequest),
    Logout,
    CheckSession,
    UpdateProfile(ProfileUpdate),
    ChangePassword(PasswordChange),
}

impl Action for AuthAction {
    const RESOURCE: Resource = Resource::Account;
    const NAMES: &'static [&'static str] = &["login", "logout", "check_session", "update_profile", "change_password"];

    fn operation(&self) -> Operation {
        match self {
            AuthAction::Login(_) | AuthAction::Logout | AuthAction::CheckSession => Operation::Session,
            AuthAction::UpdateProfile(_) | AuthAction::ChangePassword(_) => Operation::UpdateOwn,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ProfileUpdate {
    #[serde(alias = "nombre")]
    pub name: Option<String>,
    #[serde(alias = "foto_url")]
    pub photo_url: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct PasswordChange {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// Query string for `GET /api/auth`
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct AuthQuery {
    /// Only `get_profile` is served over GET
    pub action: Option<String>,
}

/// Who the session belongs to; returned by login and check_session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SessionUser {
    pub id: UserId,
    pub name: String,
    pub profile: Profile,
}

impl From<&SessionData> for SessionUser {
    fn from(session: &SessionData) -> Self {
        Self {
            id: session.user_id,
            name: session.user_name.clone(),
            profile: session.profile,
        }
    }
}

/// The caller's own account, without the password hash
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub profile: Profile,
    pub photo_url: Option<String>,
}

impl From<UserDBResponse> for ProfileResponse {
    fn from(user: UserDBResponse) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            profile: user.profile,
            photo_url: user.photo_url,
        }
    }
}
