//! Storage layer: SQLite repositories and their row models.

pub mod errors;
pub mod handlers;
pub mod models;
