use axum::{body::Bytes, extract::State};
use tracing::info;

use crate::{
    AppState,
    api::{
        envelope::{Action, ApiResponse, Envelope, decode_action},
        models::{
            IdResponse,
            slides::{SlideResponse, SlideshowAction},
        },
    },
    auth::{current_session::CurrentSession, policy::authorize},
    db::handlers::{Repository, Slides},
    errors::Error,
    types::{Operation, Resource},
};

/// List every slide, newest first. Always public.
#[utoipa::path(
    get,
    path = "/api/slideshow",
    tag = "slideshow",
    responses(
        (status = 200, description = "All slides, newest first", body = Envelope),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_slides(State(state): State<AppState>, session: CurrentSession) -> Result<ApiResponse, Error> {
    authorize(session.user(), Resource::Slideshow, Operation::Read, &state.config.access).into_result()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let slides: Vec<SlideResponse> = Slides::new(&mut conn).list(&()).await?.into_iter().map(Into::into).collect();

    ApiResponse::ok(format!("{} slides found", slides.len())).with_data(slides)
}

/// Create, update or delete a slide (`admin_global` or `diseno`)
#[utoipa::path(
    post,
    path = "/api/slideshow",
    tag = "slideshow",
    request_body = SlideshowAction,
    responses(
        (status = 200, description = "Change applied; data holds the slide id", body = Envelope),
        (status = 400, description = "Malformed body or missing fields", body = Envelope),
        (status = 401, description = "No session", body = Envelope),
        (status = 403, description = "Caller is neither admin_global nor diseno", body = Envelope),
        (status = 404, description = "Slide not found (delete)", body = Envelope),
        (status = 405, description = "Unrecognized action", body = Envelope),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn slideshow_action(State(state): State<AppState>, session: CurrentSession, body: Bytes) -> Result<ApiResponse, Error> {
    let action: SlideshowAction = decode_action(&body)?;
    authorize(session.user(), SlideshowAction::RESOURCE, action.operation(), &state.config.access).into_result()?;

    match action {
        SlideshowAction::Create(input) => {
            let request = input.into_db_request()?;
            let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
            let slide = Slides::new(&mut conn).create(&request).await?;

            info!(slide_id = slide.id, "Slide created");
            ApiResponse::ok("Slide created").with_data(IdResponse { id: slide.id })
        }
        SlideshowAction::Update(input) => {
            let id = input.require_id()?;
            let request = input.into_db_request()?;
            let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
            let updated = Slides::new(&mut conn).update(id, &request).await?;

            let message = if updated {
                "Slide updated"
            } else {
                "Slide updated (or no changes found)"
            };
            ApiResponse::ok(message).with_data(IdResponse { id })
        }
        SlideshowAction::Delete(input) => {
            let id = input.require_id()?;
            let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
            if !Slides::new(&mut conn).delete(id).await? {
                return Err(Error::NotFound {
                    resource: "Slide".to_string(),
                    id: id.to_string(),
                });
            }

            info!(slide_id = id, "Slide deleted");
            ApiResponse::ok("Slide deleted").with_data(IdResponse { id })
        }
    }
}
