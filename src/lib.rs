//! Core library surface for the manga recommender terminal client.
//!
//! The binary wires these pieces together; they are exposed from the library
//! so the orchestration can be driven without a terminal.
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod ui;

pub use api::{HttpApi, RecommendationApi};
pub use config::Config;
pub use db::ensure_schema;
pub use error::{ApiError, ApiResult};
pub use models::{RecommendationQuery, RecommendationRecord, ThemePreference};
pub use ui::{detect_system_theme, run_app, App};
