//! OpenAPI document for the portal API, served at `/api-docs/openapi.json`.

use utoipa::OpenApi;

use crate::api::{
    envelope::{Envelope, Status},
    handlers,
    models::{
        IdResponse,
        auth::{AuthAction, LoginRequest, PasswordChange, ProfileResponse, ProfileUpdate, SessionUser},
        employees::{DirectoryAction, EmployeeInput, EmployeeResponse},
        slides::{SlideInput, SlideResponse, SlideshowAction},
    },
};
use crate::types::Profile;

#[derive(OpenApi)]
#[openapi(
    info(title = "Employee Portal API", description = "Session authentication, employee directory and slideshow"),
    paths(
        handlers::auth::auth_query,
        handlers::auth::auth_action,
        handlers::directory::directory_query,
        handlers::directory::directory_action,
        handlers::slideshow::list_slides,
        handlers::slideshow::slideshow_action,
    ),
    components(schemas(
        Envelope,
        Status,
        Profile,
        IdResponse,
        AuthAction,
        LoginRequest,
        ProfileUpdate,
        PasswordChange,
        SessionUser,
        ProfileResponse,
        DirectoryAction,
        EmployeeInput,
        EmployeeResponse,
        SlideshowAction,
        SlideInput,
        SlideResponse,
    )),
    tags(
        (name = "auth", description = "Login, logout and own-account management"),
        (name = "directory", description = "Employee directory"),
        (name = "slideshow", description = "Homepage slideshow"),
    )
)]
pub struct ApiDoc;
