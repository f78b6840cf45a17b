use axum::{
    body::Bytes,
    extract::{Query, State},
    http::header::SET_COOKIE,
    response::{IntoResponse, Response},
};
use tracing::info;

use crate::{
    AppState,
    api::{
        envelope::{Action, ApiResponse, Envelope, decode_action, present},
        models::auth::{AuthAction, AuthQuery, LoginRequest, PasswordChange, ProfileResponse, ProfileUpdate, SessionUser},
    },
    auth::{
        current_session::CurrentSession,
        password::{self, Argon2Params},
        policy::authorize,
        session::{SessionData, SessionToken, clear_session_cookie, session_cookie},
    },
    db::{handlers::Users, models::users::ProfileUpdateDBRequest},
    errors::Error,
    types::{Operation, Resource},
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const WRONG_CURRENT_PASSWORD: &str = "Current password is incorrect";

/// Read the caller's own profile (`action=get_profile`)
#[utoipa::path(
    get,
    path = "/api/auth",
    tag = "auth",
    params(AuthQuery),
    responses(
        (status = 200, description = "Profile of the session's user", body = Envelope),
        (status = 401, description = "No session", body = Envelope),
        (status = 404, description = "Session user no longer exists", body = Envelope),
        (status = 405, description = "Any other action", body = Envelope),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn auth_query(
    State(state): State<AppState>,
    session: CurrentSession,
    Query(query): Query<AuthQuery>,
) -> Result<Response, Error> {
    match query.action.as_deref() {
        Some("get_profile") => {
            authorize(session.user(), Resource::Account, Operation::ReadOwn, &state.config.access).into_result()?;
            get_profile(&state, &session).await
        }
        other => Err(Error::UnrecognizedAction {
            action: other.unwrap_or_default().to_string(),
            resource: Resource::Account,
        }),
    }
}

/// Session and own-account actions, selected by the `action` field
#[utoipa::path(
    post,
    path = "/api/auth",
    tag = "auth",
    request_body = AuthAction,
    responses(
        (status = 200, description = "Action succeeded", body = Envelope),
        (status = 400, description = "Malformed body or missing fields", body = Envelope),
        (status = 401, description = "Bad credentials or no session", body = Envelope),
        (status = 405, description = "Unrecognized action", body = Envelope),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn auth_action(State(state): State<AppState>, session: CurrentSession, body: Bytes) -> Result<Response, Error> {
    let action: AuthAction = decode_action(&body)?;
    authorize(session.user(), AuthAction::RESOURCE, action.operation(), &state.config.access).into_result()?;

    match action {
        AuthAction::Login(request) => login(&state, &session, request).await,
        AuthAction::Logout => logout(&state, &session).await,
        AuthAction::CheckSession => check_session(&state, &session).await,
        AuthAction::UpdateProfile(request) => update_profile(&state, &session, request).await,
        AuthAction::ChangePassword(request) => change_password(&state, &session, request).await,
    }
}

fn invalid_credentials() -> Error {
    Error::Unauthenticated {
        message: Some(INVALID_CREDENTIALS.to_string()),
    }
}

async fn login(state: &AppState, session: &CurrentSession, request: LoginRequest) -> Result<Response, Error> {
    let email = present(&request.email);
    let password = request.password.filter(|p| !p.is_empty());
    let (Some(email), Some(password)) = (email, password) else {
        return Err(Error::BadRequest {
            message: "Email and password are required".to_string(),
        });
    };

    let user = {
        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        Users::new(&mut conn).get_user_by_email(email).await?
    };

    // Unknown email, passwordless account and wrong password all look the same to the caller,
    // and each runs exactly one Argon2 verification
    let Some((user, hash)) = user.and_then(|u| u.password_hash.clone().map(|hash| (u, hash))) else {
        password::verify_dummy_blocking(password, Argon2Params::from(&state.config.auth.password)).await?;
        return Err(invalid_credentials());
    };
    if !password::verify_password_blocking(password, hash).await? {
        return Err(invalid_credentials());
    }

    if let Some(previous) = &session.token {
        state.sessions.destroy(previous).await?;
    }

    let data = SessionData {
        user_id: user.id,
        user_name: user.name,
        profile: user.profile,
    };
    let token = SessionToken::generate();
    state.sessions.set(&token, data.clone()).await?;
    info!(user_id = data.user_id, profile = %data.profile, "User logged in");

    let cookie = session_cookie(&token, &state.config.auth.session);
    let response = ApiResponse::ok("Login successful").with_data(SessionUser::from(&data))?;
    Ok(([(SET_COOKIE, cookie)], response).into_response())
}

async fn logout(state: &AppState, session: &CurrentSession) -> Result<Response, Error> {
    if let Some(token) = &session.token {
        state.sessions.destroy(token).await?;
    }
    if let Some(data) = session.user() {
        info!(user_id = data.user_id, "User logged out");
    }

    let cookie = clear_session_cookie(&state.config.auth.session);
    Ok(([(SET_COOKIE, cookie)], ApiResponse::ok("Session closed")).into_response())
}

async fn check_session(state: &AppState, session: &CurrentSession) -> Result<Response, Error> {
    let data = session.user().ok_or_else(|| Error::Unauthenticated {
        message: Some("No active session".to_string()),
    })?;

    let user = {
        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        Users::new(&mut conn).get_by_id(data.user_id).await?
    };

    if user.is_none() {
        if let Some(token) = &session.token {
            state.sessions.destroy(token).await?;
        }
        info!(user_id = data.user_id, "Discarded session of a user that no longer exists");
        let cookie = clear_session_cookie(&state.config.auth.session);
        let error = Error::Unauthenticated {
            message: Some("Session is no longer valid".to_string()),
        };
        return Ok(([(SET_COOKIE, cookie)], error).into_response());
    }

    Ok(ApiResponse::ok("Active session").with_data(SessionUser::from(data))?.into_response())
}

async fn get_profile(state: &AppState, session: &CurrentSession) -> Result<Response, Error> {
    let data = session.require()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .get_by_id(data.user_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "User".to_string(),
            id: data.user_id.to_string(),
        })?;

    Ok(ApiResponse::ok("Profile retrieved")
        .with_data(ProfileResponse::from(user))?
        .into_response())
}

async fn update_profile(state: &AppState, session: &CurrentSession, request: ProfileUpdate) -> Result<Response, Error> {
    let data = session.require()?;
    let name = present(&request.name).ok_or_else(|| Error::BadRequest {
        message: "Missing required fields: name".to_string(),
    })?;
    let update = ProfileUpdateDBRequest {
        name: name.to_string(),
        photo_url: present(&request.photo_url).map(str::to_string),
    };

    {
        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        // Zero affected rows is still reported as success
        Users::new(&mut conn).update_profile(data.user_id, &update).await?;
    }

    let refreshed = SessionData {
        user_name: update.name,
        ..data.clone()
    };
    if let Some(token) = &session.token {
        state.sessions.set(token, refreshed.clone()).await?;
    }

    Ok(ApiResponse::ok("Profile updated")
        .with_data(SessionUser::from(&refreshed))?
        .into_response())
}

async fn change_password(state: &AppState, session: &CurrentSession, request: PasswordChange) -> Result<Response, Error> {
    let data = session.require()?;
    let (Some(current), Some(new)) = (
        request.current_password.filter(|p| !p.is_empty()),
        request.new_password.filter(|p| !p.is_empty()),
    ) else {
        return Err(Error::BadRequest {
            message: "Missing required fields: current_password, new_password".to_string(),
        });
    };

    let rules = &state.config.auth.password;
    let length = new.chars().count();
    if length < rules.min_length {
        return Err(Error::BadRequest {
            message: format!("New password must be at least {} characters", rules.min_length),
        });
    }
    if length > rules.max_length {
        return Err(Error::BadRequest {
            message: format!("New password must be at most {} characters", rules.max_length),
        });
    }

    let wrong_password = || Error::Unauthenticated {
        message: Some(WRONG_CURRENT_PASSWORD.to_string()),
    };
    let user = {
        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        Users::new(&mut conn).get_by_id(data.user_id).await?
    };
    let hash = user.and_then(|u| u.password_hash).ok_or_else(wrong_password)?;
    if !password::verify_password_blocking(current, hash).await? {
        return Err(wrong_password());
    }

    // No pooled connection is held while Argon2 runs
    let new_hash = password::hash_password_blocking(new, Argon2Params::from(rules)).await?;
    {
        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        Users::new(&mut conn).update_password(data.user_id, &new_hash).await?;
    }

    if let Some(token) = &session.token {
        state.sessions.destroy(token).await?;
    }
    info!(user_id = data.user_id, "Password changed, session closed");

    let cookie = clear_session_cookie(&state.config.auth.session);
    let response = ApiResponse::ok("Password changed. Please log in again.");
    Ok(([(SET_COOKIE, cookie)], response).into_response())
}

#[cfg(test)]
mod tests {
    use crate::{
        test_utils::{TEST_ARGON2, TEST_PASSWORD, create_test_config, create_test_pool, create_test_server, create_test_user, login, session_cookie_from},
        types::Profile,
    };
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_login_success_sets_cookie_and_returns_user() {
        let pool = create_test_pool().await;
        let user = create_test_user(&pool, "ana@corp.example", Profile::Diseno).await;
        let server = create_test_server(pool, create_test_config());

        let response = server
            .post("/api/auth")
            .json(&json!({"action": "login", "email": "ana@corp.example", "password": TEST_PASSWORD}))
            .await;

        response.assert_status_ok();
        let cookie = response.headers().get("set-cookie").unwrap().to_str().unwrap().to_string();
        assert!(cookie.starts_with("portal_session="));
        assert!(cookie.contains("HttpOnly"));

        let body: Value = response.json();
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["id"], user.id);
        assert_eq!(body["data"]["profile"], "diseno");
        assert!(body["data"].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_are_indistinguishable() {
        let pool = create_test_pool().await;
        create_test_user(&pool, "ana@corp.example", Profile::Usuario).await;
        let server = create_test_server(pool, create_test_config());

        let wrong_password = server
            .post("/api/auth")
            .json(&json!({"action": "login", "email": "ana@corp.example", "password": "not-it"}))
            .await;
        let unknown_email = server
            .post("/api/auth")
            .json(&json!({"action": "login", "email": "ghost@corp.example", "password": "not-it"}))
            .await;

        wrong_password.assert_status(StatusCode::UNAUTHORIZED);
        unknown_email.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password.json::<Value>(), unknown_email.json::<Value>());
        assert_eq!(wrong_password.json::<Value>()["message"], "Invalid email or password");
    }

    #[tokio::test]
    async fn test_login_email_ignores_case() {
        let pool = create_test_pool().await;
        let user = create_test_user(&pool, "ana@corp.example", Profile::Usuario).await;
        let server = create_test_server(pool, create_test_config());

        let response = server
            .post("/api/auth")
            .json(&json!({"action": "login", "email": "Ana@Corp.EXAMPLE", "password": TEST_PASSWORD}))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["data"]["id"], user.id);
    }

    #[tokio::test]
    async fn test_passwordless_account_gets_uniform_failure() {
        let pool = create_test_pool().await;
        crate::create_initial_admin_user("nopass@corp.example", None, TEST_ARGON2, &pool)
            .await
            .unwrap();
        let server = create_test_server(pool, create_test_config());

        let response = server
            .post("/api/auth")
            .json(&json!({"action": "login", "email": "nopass@corp.example", "password": "anything"}))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<Value>()["message"], "Invalid email or password");
    }

    #[tokio::test]
    async fn test_login_requires_both_credentials() {
        let pool = create_test_pool().await;
        let server = create_test_server(pool, create_test_config());

        for body in [
            json!({"action": "login", "email": "ana@corp.example"}),
            json!({"action": "login", "password": "x"}),
            json!({"action": "login", "email": "  ", "password": ""}),
        ] {
            server.post("/api/auth").json(&body).await.assert_status(StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_malformed_and_unknown_actions() {
        let pool = create_test_pool().await;
        let server = create_test_server(pool, create_test_config());

        let invalid_json = server.post("/api/auth").text("{nope").await;
        invalid_json.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(invalid_json.json::<Value>()["status"], "error");

        server
            .post("/api/auth")
            .json(&json!({"email": "a@x.com"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        server
            .post("/api/auth")
            .json(&json!({"action": "register"}))
            .await
            .assert_status(StatusCode::METHOD_NOT_ALLOWED);

        server
            .get("/api/auth")
            .add_query_param("action", "check_session")
            .await
            .assert_status(StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_logout_then_check_session_is_unauthenticated() {
        let pool = create_test_pool().await;
        create_test_user(&pool, "ana@corp.example", Profile::Usuario).await;
        let server = create_test_server(pool, create_test_config());
        let cookie = login(&server, "ana@corp.example").await;

        let check = server
            .post("/api/auth")
            .add_header("cookie", &cookie)
            .json(&json!({"action": "check_session"}))
            .await;
        check.assert_status_ok();
        assert_eq!(check.json::<Value>()["data"]["name"], "Test usuario");

        let logout = server
            .post("/api/auth")
            .add_header("cookie", &cookie)
            .json(&json!({"action": "logout"}))
            .await;
        logout.assert_status_ok();
        assert!(session_cookie_from(&logout).ends_with('='));

        server
            .post("/api/auth")
            .add_header("cookie", &cookie)
            .json(&json!({"action": "check_session"}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        // Logging out again, or without any session, still succeeds
        server
            .post("/api/auth")
            .add_header("cookie", &cookie)
            .json(&json!({"action": "logout"}))
            .await
            .assert_status_ok();
        server
            .post("/api/auth")
            .json(&json!({"action": "logout"}))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn test_login_rotates_existing_session() {
        let pool = create_test_pool().await;
        create_test_user(&pool, "ana@corp.example", Profile::Usuario).await;
        let server = create_test_server(pool, create_test_config());
        let first = login(&server, "ana@corp.example").await;

        let relogin = server
            .post("/api/auth")
            .add_header("cookie", &first)
            .json(&json!({"action": "login", "email": "ana@corp.example", "password": TEST_PASSWORD}))
            .await;
        relogin.assert_status_ok();
        let second = session_cookie_from(&relogin);
        assert_ne!(first, second);

        server
            .post("/api/auth")
            .add_header("cookie", &first)
            .json(&json!({"action": "check_session"}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server
            .post("/api/auth")
            .add_header("cookie", &second)
            .json(&json!({"action": "check_session"}))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn test_check_session_discards_session_of_deleted_user() {
        let pool = create_test_pool().await;
        let user = create_test_user(&pool, "gone@corp.example", Profile::Usuario).await;
        let server = create_test_server(pool.clone(), create_test_config());
        let cookie = login(&server, "gone@corp.example").await;

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user.id)
            .execute(&pool)
            .await
            .unwrap();

        let check = server
            .post("/api/auth")
            .add_header("cookie", &cookie)
            .json(&json!({"action": "check_session"}))
            .await;
        check.assert_status(StatusCode::UNAUTHORIZED);
        assert!(session_cookie_from(&check).ends_with('='));

        // The session is gone, not just reported as invalid
        server
            .post("/api/auth")
            .add_header("cookie", &cookie)
            .json(&json!({"action": "update_profile", "name": "Ghost"}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_get_profile_of_deleted_user_is_not_found() {
        let pool = create_test_pool().await;
        let user = create_test_user(&pool, "vanished@corp.example", Profile::Diseno).await;
        let server = create_test_server(pool.clone(), create_test_config());
        let cookie = login(&server, "vanished@corp.example").await;

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user.id)
            .execute(&pool)
            .await
            .unwrap();

        let response = server
            .get("/api/auth")
            .add_header("cookie", &cookie)
            .add_query_param("action", "get_profile")
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["status"], "error");
    }

    #[tokio::test]
    async fn test_get_profile() {
        let pool = create_test_pool().await;
        let user = create_test_user(&pool, "ana@corp.example", Profile::AdminGlobal).await;
        let server = create_test_server(pool, create_test_config());

        server
            .get("/api/auth")
            .add_query_param("action", "get_profile")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        let cookie = login(&server, "ana@corp.example").await;
        let response = server
            .get("/api/auth")
            .add_query_param("action", "get_profile")
            .add_header("cookie", &cookie)
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(
            body["data"],
            json!({
                "id": user.id,
                "name": "Test admin_global",
                "email": "ana@corp.example",
                "profile": "admin_global",
                "photo_url": null,
            })
        );
    }

    #[tokio::test]
    async fn test_update_profile_refreshes_session_name() {
        let pool = create_test_pool().await;
        create_test_user(&pool, "ana@corp.example", Profile::Usuario).await;
        let server = create_test_server(pool, create_test_config());
        let cookie = login(&server, "ana@corp.example").await;

        server
            .post("/api/auth")
            .add_header("cookie", &cookie)
            .json(&json!({"action": "update_profile", "photo_url": "https://img.example/a.png"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        server
            .post("/api/auth")
            .add_header("cookie", &cookie)
            .json(&json!({"action": "update_profile", "name": "Ana Gómez", "photo_url": "https://img.example/a.png"}))
            .await
            .assert_status_ok();

        let check = server
            .post("/api/auth")
            .add_header("cookie", &cookie)
            .json(&json!({"action": "check_session"}))
            .await;
        assert_eq!(check.json::<Value>()["data"]["name"], "Ana Gómez");

        let profile = server
            .get("/api/auth")
            .add_query_param("action", "get_profile")
            .add_header("cookie", &cookie)
            .await;
        assert_eq!(profile.json::<Value>()["data"]["photo_url"], "https://img.example/a.png");
    }

    #[tokio::test]
    async fn test_own_account_actions_require_session() {
        let pool = create_test_pool().await;
        let server = create_test_server(pool, create_test_config());

        for body in [
            json!({"action": "update_profile", "name": "X"}),
            json!({"action": "change_password", "current_password": "a", "new_password": "abcdefg"}),
            json!({"action": "check_session"}),
        ] {
            server.post("/api/auth").json(&body).await.assert_status(StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn test_change_password_invalidates_session() {
        let pool = create_test_pool().await;
        create_test_user(&pool, "ana@corp.example", Profile::Usuario).await;
        let server = create_test_server(pool, create_test_config());
        let cookie = login(&server, "ana@corp.example").await;

        let changed = server
            .post("/api/auth")
            .add_header("cookie", &cookie)
            .json(&json!({"action": "change_password", "current_password": TEST_PASSWORD, "new_password": "brand-new-pass"}))
            .await;
        changed.assert_status_ok();

        server
            .post("/api/auth")
            .add_header("cookie", &cookie)
            .json(&json!({"action": "check_session"}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        server
            .post("/api/auth")
            .json(&json!({"action": "login", "email": "ana@corp.example", "password": TEST_PASSWORD}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server
            .post("/api/auth")
            .json(&json!({"action": "login", "email": "ana@corp.example", "password": "brand-new-pass"}))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn test_change_password_validation() {
        let pool = create_test_pool().await;
        create_test_user(&pool, "ana@corp.example", Profile::Usuario).await;
        let server = create_test_server(pool, create_test_config());
        let cookie = login(&server, "ana@corp.example").await;

        let too_short = server
            .post("/api/auth")
            .add_header("cookie", &cookie)
            .json(&json!({"action": "change_password", "current_password": TEST_PASSWORD, "new_password": "12345"}))
            .await;
        too_short.assert_status(StatusCode::BAD_REQUEST);

        server
            .post("/api/auth")
            .add_header("cookie", &cookie)
            .json(&json!({"action": "change_password", "new_password": "123456"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let wrong_current = server
            .post("/api/auth")
            .add_header("cookie", &cookie)
            .json(&json!({"action": "change_password", "current_password": "guess", "new_password": "123456"}))
            .await;
        wrong_current.assert_status(StatusCode::UNAUTHORIZED);

        // Failed attempts leave the session alone
        server
            .post("/api/auth")
            .add_header("cookie", &cookie)
            .json(&json!({"action": "check_session"}))
            .await
            .assert_status_ok();
    }
}
