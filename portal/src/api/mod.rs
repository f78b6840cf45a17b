pub mod envelope;
pub mod handlers;
pub mod models;
