//! common-core: shared vocabulary for backend services
//!
//! - [`error`] - the error taxonomy: stable (status, code, message) triples
//! - [`envelope`] - the `{"response": ..}` / `{"error": ..}` wire shapes
//! - [`payload`] - small shared payloads (bulk ids, acknowledgements)
//! - [`status`] - the lifecycle status vocabulary records share
//! - [`codec`] - JSON decode/encode over `std::io` streams

pub mod codec;
pub mod envelope;
pub mod error;
pub mod payload;
pub mod status;

pub use envelope::{Envelope, EnvelopeError, ErrorDto, Failure, Success};
pub use error::{AppError, Category, ErrorDef, Outcome};
pub use payload::{Ack, Ids};
pub use status::Status;
