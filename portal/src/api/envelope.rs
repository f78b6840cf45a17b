//! The JSON envelope every endpoint answers with, and decoding of action requests.
//!
//! Responses always have the shape `{"status": "success"|"error", "message": ..., "data"?: ...}`.
//! Successes go through [`ApiResponse`]; failures through [`crate::errors::Error`]'s
//! `IntoResponse`, which renders the same envelope.
//!
//! Write requests carry the action name in the body (`{"action": "create", ...}`). Each resource
//! describes its closed set of actions as a serde-tagged enum implementing [`Action`], and
//! [`decode_action`] turns a raw body into that enum or the matching client error:
//!
//! - body empty, not JSON, or not a JSON object: 400
//! - no `action` string: 400
//! - `action` outside the resource's set: 405
//! - fields of the wrong JSON type: 400

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use utoipa::ToSchema;

use crate::{
    errors::{Error, Result},
    types::{Operation, Resource},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Envelope {
    pub status: Status,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Envelope {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: message.into(),
            data: None,
        }
    }
}

/// A successful outcome: HTTP status, message and optional payload.
#[derive(Debug)]
pub struct ApiResponse {
    status: StatusCode,
    message: String,
    data: Option<serde_json::Value>,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data<T: Serialize>(mut self, data: T) -> Result<Self> {
        let value = serde_json::to_value(data).map_err(|e| Error::Internal {
            operation: format!("serialize response data: {e}"),
        })?;
        self.data = Some(value);
        Ok(self)
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let envelope = Envelope {
            status: Status::Success,
            message: self.message,
            data: self.data,
        };
        (self.status, Json(envelope)).into_response()
    }
}

/// A resource's closed set of write actions.
pub trait Action: DeserializeOwned {
    const RESOURCE: Resource;

    /// Every value the `action` field may take
    const NAMES: &'static [&'static str];

    /// What the policy is asked to allow
    fn operation(&self) -> Operation;
}

pub fn decode_action<A: Action>(body: &[u8]) -> Result<A> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(Error::BadRequest {
            message: "Request body is empty".to_string(),
        });
    }

    let value: serde_json::Value = serde_json::from_slice(body).map_err(|e| Error::BadRequest {
        message: format!("Invalid JSON body: {e}"),
    })?;

    let Some(object) = value.as_object() else {
        return Err(Error::BadRequest {
            message: "Request body must be a JSON object".to_string(),
        });
    };

    let action = match object.get("action") {
        Some(serde_json::Value::String(action)) => action.clone(),
        _ => {
            return Err(Error::BadRequest {
                message: "Missing action".to_string(),
            });
        }
    };

    if !A::NAMES.contains(&action.as_str()) {
        return Err(Error::UnrecognizedAction {
            action,
            resource: A::RESOURCE,
        });
    }

    serde_json::from_value(value).map_err(|e| Error::BadRequest {
        message: format!("Invalid fields for action '{action}': {e}"),
    })
}

/// Returns the trimmed value when present and non-blank.
pub fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Collects required string fields, then fails with one 400 naming every missing field.
#[derive(Debug, Default)]
pub struct RequiredFields {
    missing: Vec<&'static str>,
}

impl RequiredFields {
    /// The trimmed value, or `""` after recording `name` as missing
    pub fn take<'a>(&mut self, name: &'static str, value: &'a Option<String>) -> &'a str {
        present(value).unwrap_or_else(|| {
            self.missing.push(name);
            ""
        })
    }

    pub fn finish(self) -> Result<()> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(Error::BadRequest {
                message: format!("Missing required fields: {}", self.missing.join(", ")),
            })
        }
    }
}

/// 405 envelope for HTTP methods a resource does not serve.
pub async fn method_not_allowed() -> Response {
    (StatusCode::METHOD_NOT_ALLOWED, Json(Envelope::error("Method not allowed"))).into_response()
}
