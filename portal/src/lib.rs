//! # portal: employee portal backend
//!
//! A JSON-over-HTTP service behind an internal employee portal:
//!
//! - `/api/auth`: login, logout, session checks, own-profile edits and password changes
//! - `/api/directory`: employee directory with search and department filters
//! - `/api/slideshow`: homepage slideshow managed by the design team
//!
//! Every response uses the `{status, message, data?}` envelope from [`api::envelope`]. Sessions
//! are server-side ([`auth::session`]) and every action passes the [`auth::policy`] before
//! touching the SQLite store ([`db`]).
//!
//! ## Startup
//!
//! [`Application::new`] opens the pool, runs the embedded migrations, ensures the configured
//! admin account exists, and builds the router. [`Application::serve`] binds the listener and
//! runs until the shutdown future resolves.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use std::{str::FromStr, sync::Arc};

use axum::{
    Json, Router,
    http::{self, HeaderValue},
    routing::get,
};
use bon::Builder;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info, instrument};
use utoipa::OpenApi;

use crate::{
    api::{envelope::method_not_allowed, handlers},
    auth::{
        password::{self, Argon2Params},
        session::{MemorySessionStore, SessionStore},
    },
    config::{CorsOrigin, DatabaseConfig},
    db::{handlers::Users, models::users::UserCreateDBRequest},
    errors::Error,
    openapi::ApiDoc,
    types::{Profile, UserId},
};

pub use config::Config;

/// Shared by every handler.
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .sessions(Arc::new(MemorySessionStore::new(timeout)))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    pub sessions: Arc<dyn SessionStore>,
}

pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Opens the pool described by `config` and applies pending migrations.
#[instrument(skip_all)]
pub async fn setup_database(config: &DatabaseConfig) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.pool.max_connections)
        .min_connections(config.pool.min_connections)
        .acquire_timeout(config.pool.acquire_timeout())
        .idle_timeout(config.pool.idle_timeout())
        .max_lifetime(config.pool.max_lifetime())
        .connect_with(options)
        .await?;

    migrator().run(&pool).await?;
    info!("Database ready");
    Ok(pool)
}

/// Ensures an `admin_global` account exists for `email`.
///
/// Idempotent: an existing account keeps its id and profile, and only has its password reset
/// when `password` is given. Without a password a new account cannot log in until one is set.
#[instrument(skip(password, params, db), err)]
pub async fn create_initial_admin_user(
    email: &str,
    password: Option<&str>,
    params: Argon2Params,
    db: &SqlitePool,
) -> Result<UserId, Error> {
    let password_hash = match password {
        Some(password) => Some(password::hash_password_blocking(password.to_string(), params).await?),
        None => None,
    };

    let mut tx = db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut tx);

    let id = match users.get_user_by_email(email).await? {
        Some(existing) => {
            if let Some(hash) = &password_hash {
                users.update_password(existing.id, hash).await?;
            }
            existing.id
        }
        None => {
            let request = UserCreateDBRequest {
                name: "Administrator".to_string(),
                email: email.to_string(),
                password_hash,
                profile: Profile::AdminGlobal,
                photo_url: None,
            };
            users.create(&request).await?.id
        }
    };

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;
    Ok(id)
}

fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.auth.security.cors;
    let mut origins = Vec::new();
    for origin in &cors_config.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            // Url always serializes with a trailing slash; browsers send origins without it
            CorsOrigin::Url(url) => url.as_str().trim_end_matches('/').parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([http::Method::GET, http::Method::POST])
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_credentials(cors_config.allow_credentials);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

async fn healthz() -> &'static str {
    "OK"
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// All routes plus CORS and request tracing.
///
/// Each resource path serves GET and POST; any other method gets a 405 envelope.
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let cors = create_cors_layer(&state.config)?;

    let router = Router::new()
        .route("/healthz", get(healthz))
        .route("/api-docs/openapi.json", get(openapi_json))
        .route(
            "/api/auth",
            get(handlers::auth::auth_query)
                .post(handlers::auth::auth_action)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/directory",
            get(handlers::directory::directory_query)
                .post(handlers::directory::directory_action)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/slideshow",
            get(handlers::slideshow::list_slides)
                .post(handlers::slideshow::slideshow_action)
                .fallback(method_not_allowed),
        )
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(cors),
        );

    Ok(router)
}

pub struct Application {
    router: Router,
    config: Config,
    pool: SqlitePool,
}

impl Application {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let pool = setup_database(&config.database).await?;

        let admin_id = create_initial_admin_user(
            &config.admin_email,
            config.admin_password.as_deref(),
            Argon2Params::from(&config.auth.password),
            &pool,
        )
        .await?;
        info!(admin_id, email = %config.admin_email, "Admin account ready");

        let state = AppState::builder()
            .db(pool.clone())
            .config(config.clone())
            .sessions(Arc::new(MemorySessionStore::from_config(&config.auth.session)) as Arc<dyn SessionStore>)
            .build();
        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("Portal listening on http://{bind_addr}");

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
