//! Record capability: what the data-access layer needs to know about a row.
//!
//! The layer never looks inside a record beyond what this trait exposes:
//! where it lives, which value identifies it, and which column values to
//! write. Any struct can opt in.
//!
//! ```ignore
//! struct Order { id: Option<i64>, status: i32, note: Option<String> }
//!
//! impl Record for Order {
//!     const TABLE: &'static str = "orders";
//!     const NAME: &'static str = "order";
//!
//!     fn id(&self) -> SqlValue { self.id.into() }
//!
//!     fn fields(&self) -> Vec<(&'static str, SqlValue)> {
//!         vec![("status", self.status.into()), ("note", self.note.clone().into())]
//!     }
//! }
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A column value the layer can bind into a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Json(serde_json::Value),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Text(v) => f.write_str(v),
            Self::Uuid(v) => write!(f, "{}", v),
            Self::Timestamp(v) => f.write_str(&v.to_rfc3339()),
            Self::Json(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<Uuid> for SqlValue {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl From<serde_json::Value> for SqlValue {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// A persistable row shape.
pub trait Record: Send + Sync {
    /// Table the record lives in.
    const TABLE: &'static str;

    /// Identity column.
    const ID_COLUMN: &'static str = "id";

    /// Noun used in client-facing messages ("order is not exist").
    const NAME: &'static str = Self::TABLE;

    /// Identity value. `Null` lets the store assign one on insert.
    fn id(&self) -> SqlValue;

    /// Non-identity columns written on insert.
    fn fields(&self) -> Vec<(&'static str, SqlValue)>;

    /// Columns written on update. Defaults to every non-null field, so
    /// unset optional fields leave the stored value alone.
    fn changes(&self) -> Vec<(&'static str, SqlValue)> {
        self.fields()
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .collect()
    }
}
