//! HTTP surface of the dashboard: axum router, shared state, error mapping.

pub mod app;
pub mod error;
pub mod routes;
pub mod state;

pub use app::create_app;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
