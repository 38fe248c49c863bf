//! common-db: resilient database handle and generic data access
//!
//! # Design Principles
//!
//! - One handle per process, owned by [`ConnectionManager`] and passed
//!   around explicitly (no globals)
//! - A database that is down at startup or drops later costs latency, not
//!   errors: the manager retries with exponential backoff until it connects
//! - CRUD works for any row shape implementing [`Record`]
//! - Driver errors are classified once ([`DbError`]) and mapped onto the
//!   shared error taxonomy

pub mod backoff;
pub mod config;
pub mod connection;
pub mod error;
pub mod pagination;
pub mod query;
pub mod record;
pub mod repo;

pub use backoff::Backoff;
pub use config::{ConfigError, ConnectionSettings, DB_URL_ENV};
pub use connection::{ConnectionManager, Connector, Lease, PgConnector};
pub use error::DbError;
pub use pagination::Page;
pub use query::{Op, Order};
pub use record::{Record, SqlValue};
pub use repo::{PageQuery, Repository};
