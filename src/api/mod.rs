//! HTTP module for pages, the JSON API and metrics.

pub mod handlers;
pub mod pages;
pub mod render;
pub mod response;
pub mod routes;

pub use handlers::AppState;
pub use response::{ApiError, ApiResult, PageError, PageResult};
pub use routes::create_router;
