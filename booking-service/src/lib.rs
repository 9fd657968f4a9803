pub mod api;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod models;
pub mod outbox;
pub mod pricing;
pub mod schema;
pub mod slots;
