//! Web service surface for the annotation pipeline
//!
//! Feature-gated behind `web-service`. The handlers validate request
//! parameters, hand them to the [`Annotator`](crate::annotator::Annotator),
//! and render whatever it returns; all resolution logic lives in the
//! core modules.

pub mod config;
pub mod handlers;
pub mod server;
pub mod types;
pub mod validation;

pub use config::ServiceConfig;
pub use server::{create_app, AppState};
