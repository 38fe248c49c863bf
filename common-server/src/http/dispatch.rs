//! Request dispatch.
//!
//! A handler hands its business logic (the unit of work) to [`Dispatcher`].
//! The work runs on its own tokio task, so it may block on the database
//! handle without holding up anything else; its [`Outcome`] comes back over
//! a one-shot channel and is rendered as exactly one envelope.
//!
//! ```ignore
//! async fn get_order(State(state): State<AppState>, ValidId(id): ValidId) -> Reply<Order> {
//!     let repo = state.repo().clone();
//!     state
//!         .dispatcher()
//!         .dispatch(async move { Ok(repo.find::<Order>(id).await?) })
//!         .await
//! }
//! ```

use std::any::Any;
use std::future::Future;
use std::time::Duration;

use tokio::sync::oneshot;

use common_core::{AppError, Outcome};

use super::error::Reply;

/// Runs units of work and collects their outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dispatcher {
    timeout: Option<Duration>,
}

impl Dispatcher {
    /// `None` waits for the work however long it takes.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run `work` and render its outcome.
    pub async fn dispatch<T, F>(&self, work: F) -> Reply<T>
    where
        F: Future<Output = Outcome<T>> + Send + 'static,
        T: Send + 'static,
    {
        Reply(self.run(work).await)
    }

    /// Run `work` on its own task and wait for its outcome.
    ///
    /// On timeout the task is aborted and the caller gets a timeout error.
    /// Work that panics resolves to an unknown error carrying the panic message.
    pub async fn run<T, F>(&self, work: F) -> Outcome<T>
    where
        F: Future<Output = Outcome<T>> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            // The receiver is gone only if the dispatch already timed out.
            let _ = tx.send(work.await);
        });

        let received = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(received) => received,
                Err(_) => {
                    task.abort();
                    tracing::warn!(timeout_ms = limit.as_millis() as u64, "unit of work timed out");
                    return Err(AppError::timeout());
                }
            },
            None => rx.await,
        };

        match received {
            Ok(outcome) => outcome,
            // The sender only drops unsent when the task panicked.
            Err(_) => {
                let message = match task.await {
                    Err(err) if err.is_panic() => panic_message(err.into_panic()),
                    _ => "unit of work ended without producing an outcome".to_owned(),
                };
                tracing::error!(error = %message, "unit of work panicked");
                Err(AppError::unknown(message))
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(message) => (*message).to_owned(),
            Err(_) => "unit of work panicked".to_owned(),
        },
    }
}
