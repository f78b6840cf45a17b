//! Row models for the `users`, `employees` and `slides` tables.
//!
//! These are kept apart from the API models in [`crate::api::models`] so the storage and the
//! wire representation can change independently; conversions live next to the API types.

pub mod employees;
pub mod slides;
pub mod users;
