//! HTTP handlers. Each resource has one GET and one POST handler; the POST handler decodes the
//! body into the resource's action enum, asks the policy, then dispatches with a `match`.

pub mod auth;
pub mod directory;
pub mod slideshow;
