//! Generic data-access layer.
//!
//! Every operation first obtains the shared handle from the
//! [`ConnectionManager`], which may block while the database is unreachable.
//! Failures come back as [`DbError`]; transport failures also invalidate the
//! handle so the next operation reconnects.
//!
//! - `create`: insert; a uniqueness violation is [`DbError::Conflict`]
//! - `update`: write changed columns by identity; no match is [`DbError::NotFound`]
//! - `delete`: remove by identity; deleting an absent record succeeds with `false`
//! - `paginate`: a [`PageQuery`] already windowed, open for more filters

use std::marker::PhantomData;
use std::sync::Arc;

use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool};
use tracing::debug;

use crate::connection::{ConnectionManager, Connector, Lease, PgConnector};
use crate::error::DbError;
use crate::pagination::Page;
use crate::query::{self, Op, Order, Select};
use crate::record::{Record, SqlValue};

/// CRUD over any [`Record`] shape, sharing one [`ConnectionManager`].
///
/// Any connector that hands out a [`PgPool`] will do.
pub struct Repository<C: Connector<Handle = PgPool> = PgConnector> {
    manager: Arc<ConnectionManager<C>>,
}

impl<C: Connector<Handle = PgPool>> Clone for Repository<C> {
    fn clone(&self) -> Self {
        Self {
            manager: Arc::clone(&self.manager),
        }
    }
}

impl<C: Connector<Handle = PgPool>> Repository<C> {
    pub fn new(manager: Arc<ConnectionManager<C>>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &Arc<ConnectionManager<C>> {
        &self.manager
    }

    /// Insert `record`.
    pub async fn create<R: Record>(&self, record: &R) -> Result<(), DbError> {
        let lease = self.manager.lease().await;
        let mut qb = query::insert(record);

        match qb.build().execute(lease.handle()).await {
            Ok(_) => {
                debug!(table = R::TABLE, "record created");
                Ok(())
            }
            Err(err) => Err(self.observe(&lease, err, R::NAME, record.id()).await),
        }
    }

    /// Write [`Record::changes`] to the row with the record's identity.
    ///
    /// A record with no changes is a no-op.
    pub async fn update<R: Record>(&self, record: &R) -> Result<(), DbError> {
        let Some(mut qb) = query::update(record) else {
            debug!(table = R::TABLE, id = %record.id(), "update with no changes skipped");
            return Ok(());
        };

        let lease = self.manager.lease().await;
        match qb.build().execute(lease.handle()).await {
            Ok(result) if result.rows_affected() == 0 => Err(DbError::NotFound {
                table: R::NAME,
                id: record.id().to_string(),
            }),
            Ok(_) => {
                debug!(table = R::TABLE, id = %record.id(), "record updated");
                Ok(())
            }
            Err(err) => Err(self.observe(&lease, err, R::NAME, record.id()).await),
        }
    }

    /// Remove the row with the record's identity.
    ///
    /// Returns whether a row was removed; an absent record is not an error.
    pub async fn delete<R: Record>(&self, record: &R) -> Result<bool, DbError> {
        let lease = self.manager.lease().await;
        let mut qb = query::delete(record);

        match qb.build().execute(lease.handle()).await {
            Ok(result) => {
                let removed = result.rows_affected() > 0;
                debug!(table = R::TABLE, id = %record.id(), removed, "record deleted");
                Ok(removed)
            }
            Err(err) => Err(self.observe(&lease, err, R::NAME, record.id()).await),
        }
    }

    /// Load one record by identity.
    pub async fn find<R>(&self, id: impl Into<SqlValue>) -> Result<R, DbError>
    where
        R: Record + for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let id = id.into();
        let lease = self.manager.lease().await;
        let mut qb = query::find::<R>(id.clone());

        match qb.build_query_as::<R>().fetch_optional(lease.handle()).await {
            Ok(Some(record)) => Ok(record),
            Ok(None) => Err(DbError::NotFound {
                table: R::NAME,
                id: id.to_string(),
            }),
            Err(err) => Err(self.observe(&lease, err, R::NAME, id).await),
        }
    }

    /// Start a page query: `OFFSET page_index * page_size`, `LIMIT page_size`
    /// (no limit when `page_size <= 0`). Page indices are zero-based.
    pub async fn paginate<R: Record>(
        &self,
        page_index: i64,
        page_size: i64,
    ) -> PageQuery<R, C> {
        let lease = self.manager.lease().await;
        PageQuery {
            repo: self.clone(),
            lease,
            select: Select::new(R::TABLE, Page::new(page_index, page_size)),
            _record: PhantomData,
        }
    }

    async fn observe(
        &self,
        lease: &Lease<PgPool>,
        err: sqlx::Error,
        table: &'static str,
        id: SqlValue,
    ) -> DbError {
        let err = DbError::classify(err, table, id);
        if err.is_unavailable() {
            self.manager.invalidate(lease.generation()).await;
        }
        err
    }
}

/// A windowed query bound to the current handle.
pub struct PageQuery<R, C: Connector<Handle = PgPool> = PgConnector> {
    repo: Repository<C>,
    lease: Lease<PgPool>,
    select: Select,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record, C: Connector<Handle = PgPool>> PageQuery<R, C> {
    pub fn page(&self) -> Page {
        self.select.page()
    }

    pub fn filter(mut self, column: &'static str, op: Op, value: impl Into<SqlValue>) -> Self {
        self.select.filter(column, op, value.into());
        self
    }

    pub fn eq(self, column: &'static str, value: impl Into<SqlValue>) -> Self {
        self.filter(column, Op::Eq, value)
    }

    pub fn order_by(mut self, column: &'static str, order: Order) -> Self {
        self.select.order_by(column, order);
        self
    }

    /// The SQL that [`fetch_all`](Self::fetch_all) will run.
    pub fn sql(&self) -> String {
        self.select.build().sql().to_owned()
    }

    pub async fn fetch_all(self) -> Result<Vec<R>, DbError>
    where
        R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut qb = self.select.build();
        match qb.build_query_as::<R>().fetch_all(self.lease.handle()).await {
            Ok(rows) => Ok(rows),
            Err(err) => Err(self
                .repo
                .observe(&self.lease, err, R::NAME, SqlValue::Null)
                .await),
        }
    }
}
