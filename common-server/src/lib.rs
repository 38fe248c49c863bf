//! common-server: request dispatch over axum
//!
//! Handlers hand their business logic to the [`Dispatcher`](http::Dispatcher)
//! and get back exactly one envelope per request. The database handle behind
//! [`AppState`] is shared by every handler and reconnects on its own.

pub mod config;
pub mod http;
pub mod state;
pub mod tracing_setup;

pub use config::ServeArgs;
pub use http::{
    build_router, run_server, ApiError, Dispatcher, JsonBody, Reply, ServerConfig, ValidId,
};
pub use state::AppState;
