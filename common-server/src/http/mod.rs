//! HTTP layer
//!
//! Axum server with:
//! - Dispatch of units of work with one envelope per request
//! - CORS (localhost only by default)
//! - Request tracing
//! - Graceful shutdown

pub mod dispatch;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod server;

pub use dispatch::Dispatcher;
pub use error::{ApiError, Reply};
pub use extractors::{JsonBody, ValidId};
pub use server::{build_router, run_server, ServerConfig, ServerError};
