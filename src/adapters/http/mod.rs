//! HTTP surface: axum routes and webhook handlers.

mod handlers;
mod routes;

pub use handlers::AppState;
pub use routes::app_router;
