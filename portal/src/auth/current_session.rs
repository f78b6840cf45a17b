use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{instrument, trace};

use crate::{
    AppState,
    auth::session::{SessionData, SessionToken, token_from_cookie_header},
    errors::{Error, Result},
};

/// The caller's session, resolved from the session cookie.
///
/// Extraction never fails for a missing or unknown token; it only rejects when the session
/// store itself errors. `token` is kept even when the store has no entry for it, so handlers
/// can still clear or rotate it.
#[derive(Debug, Clone, Default)]
pub struct CurrentSession {
    pub token: Option<SessionToken>,
    pub data: Option<SessionData>,
}

impl CurrentSession {
    pub fn user(&self) -> Option<&SessionData> {
        self.data.as_ref()
    }

    /// The session data, or 401 when there is none.
    pub fn require(&self) -> Result<&SessionData> {
        self.data.as_ref().ok_or_else(|| Error::Unauthenticated {
            message: Some("Authentication required".to_string()),
        })
    }
}

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = Error;

    #[instrument(skip_all)]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> std::result::Result<Self, Self::Rejection> {
        let cookie_name = &state.config.auth.session.cookie_name;
        let token = parts
            .headers
            .get_all(axum::http::header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(|header| token_from_cookie_header(header, cookie_name));

        let Some(token) = token else {
            return Ok(Self::default());
        };

        let data = state.sessions.get(&token).await?;
        trace!(found = data.is_some(), "Resolved session cookie");
        Ok(Self { token: Some(token), data })
    }
}
