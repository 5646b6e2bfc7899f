//! HTTP surface: routing, handlers, shared state, and error rendering.

mod error;
mod health;
mod orders;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::build_router;
pub use state::AppState;
