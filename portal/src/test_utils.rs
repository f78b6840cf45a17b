//! Helpers shared by the unit and HTTP tests.

use std::sync::Arc;

use axum_test::{TestResponse, TestServer};
use serde_json::json;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};

use crate::{
    AppState,
    auth::{
        password::{self, Argon2Params},
        session::MemorySessionStore,
    },
    config::Config,
    db::{
        handlers::Users,
        models::users::{UserCreateDBRequest, UserDBResponse},
    },
    types::Profile,
};

/// Cheap Argon2 costs so hashing does not dominate test time
pub const TEST_ARGON2: Argon2Params = Argon2Params {
    memory_kib: 1024,
    iterations: 1,
    parallelism: 1,
};

pub const TEST_PASSWORD: &str = "correct-horse";

pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.database.url = "sqlite::memory:".to_string();
    config.auth.password.argon2_memory_kib = TEST_ARGON2.memory_kib;
    config.auth.password.argon2_iterations = TEST_ARGON2.iterations;
    config.auth.password.argon2_parallelism = TEST_ARGON2.parallelism;
    config.auth.session.cookie_secure = false;
    config
}

/// A migrated in-memory database. One connection that never expires, since every new
/// in-memory connection would be a fresh, empty database.
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    crate::migrator().run(&pool).await.expect("Failed to run migrations");
    pool
}

pub fn create_test_state(pool: SqlitePool, config: Config) -> AppState {
    let sessions = Arc::new(MemorySessionStore::from_config(&config.auth.session));
    AppState::builder().db(pool).config(config).sessions(sessions).build()
}

pub fn create_test_server(pool: SqlitePool, config: Config) -> TestServer {
    let router = crate::build_router(create_test_state(pool, config)).expect("Failed to build router");
    TestServer::new(router).expect("Failed to create test server")
}

pub async fn create_test_user(pool: &SqlitePool, email: &str, profile: Profile) -> UserDBResponse {
    let password_hash = password::hash_password(TEST_PASSWORD, TEST_ARGON2).expect("Failed to hash password");
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            name: format!("Test {profile}"),
            email: email.to_string(),
            password_hash: Some(password_hash),
            profile,
            photo_url: None,
        })
        .await
        .expect("Failed to create test user")
}

/// `name=value` part of the response's `Set-Cookie` header
pub fn session_cookie_from(response: &TestResponse) -> String {
    let header = response
        .headers()
        .get("set-cookie")
        .expect("Response has no Set-Cookie header")
        .to_str()
        .expect("Set-Cookie is not ASCII");
    header.split(';').next().unwrap_or_default().to_string()
}

/// Logs in with [`TEST_PASSWORD`] and returns the cookie to send on later requests.
pub async fn login(server: &TestServer, email: &str) -> String {
    let response = server
        .post("/api/auth")
        .json(&json!({"action": "login", "email": email, "password": TEST_PASSWORD}))
        .await;
    response.assert_status_ok();
    session_cookie_from(&response)
}

/// Creates a user with `profile` and logs them in.
pub async fn login_as(server: &TestServer, pool: &SqlitePool, profile: Profile) -> String {
    let email = format!("{profile}@corp.example");
    create_test_user(pool, &email, profile).await;
    login(server, &email).await
}
