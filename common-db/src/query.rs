//! SQL statement builders for [`Record`] shapes.
//!
//! Identifiers come from `&'static str` constants on the record type and are
//! always double-quoted. Values are bound as parameters, except `NULL` which
//! is written literally so it adopts the column's type.

use sqlx::{Postgres, QueryBuilder};

use crate::pagination::Page;
use crate::record::{Record, SqlValue};

pub type Builder = QueryBuilder<'static, Postgres>;

pub(crate) fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn push_value(qb: &mut Builder, value: SqlValue) {
    match value {
        SqlValue::Null => {
            qb.push("NULL");
        }
        SqlValue::Bool(v) => {
            qb.push_bind(v);
        }
        SqlValue::Int(v) => {
            qb.push_bind(v);
        }
        SqlValue::Float(v) => {
            qb.push_bind(v);
        }
        SqlValue::Text(v) => {
            qb.push_bind(v);
        }
        SqlValue::Uuid(v) => {
            qb.push_bind(v);
        }
        SqlValue::Timestamp(v) => {
            qb.push_bind(v);
        }
        SqlValue::Json(v) => {
            qb.push_bind(sqlx::types::Json(v));
        }
    }
}

/// `INSERT INTO t (cols) VALUES (...)`. The identity column is included only
/// when the record carries one.
pub fn insert<R: Record>(record: &R) -> Builder {
    let mut columns = Vec::new();
    let id = record.id();
    if !id.is_null() {
        columns.push((R::ID_COLUMN, id));
    }
    columns.extend(record.fields());

    let mut qb = Builder::new(format!("INSERT INTO {}", quote_ident(R::TABLE)));
    if columns.is_empty() {
        qb.push(" DEFAULT VALUES");
        return qb;
    }

    let names: Vec<String> = columns.iter().map(|(name, _)| quote_ident(name)).collect();
    qb.push(format!(" ({}) VALUES (", names.join(", ")));
    for (i, (_, value)) in columns.into_iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        push_value(&mut qb, value);
    }
    qb.push(")");
    qb
}

/// `UPDATE t SET ... WHERE id = ?` over [`Record::changes`].
///
/// `None` when there is nothing to change.
pub fn update<R: Record>(record: &R) -> Option<Builder> {
    let changes = record.changes();
    if changes.is_empty() {
        return None;
    }

    let mut qb = Builder::new(format!("UPDATE {} SET ", quote_ident(R::TABLE)));
    for (i, (column, value)) in changes.into_iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        qb.push(format!("{} = ", quote_ident(column)));
        push_value(&mut qb, value);
    }
    push_id_filter::<R>(&mut qb, record.id());
    Some(qb)
}

/// `DELETE FROM t WHERE id = ?`.
pub fn delete<R: Record>(record: &R) -> Builder {
    let mut qb = Builder::new(format!("DELETE FROM {}", quote_ident(R::TABLE)));
    push_id_filter::<R>(&mut qb, record.id());
    qb
}

/// `SELECT * FROM t WHERE id = ?`.
pub fn find<R: Record>(id: SqlValue) -> Builder {
    let mut qb = Builder::new(format!("SELECT * FROM {}", quote_ident(R::TABLE)));
    push_id_filter::<R>(&mut qb, id);
    qb
}

fn push_id_filter<R: Record>(qb: &mut Builder, id: SqlValue) {
    qb.push(format!(" WHERE {}", quote_ident(R::ID_COLUMN)));
    if id.is_null() {
        qb.push(" IS NULL");
    } else {
        qb.push(" = ");
        push_value(qb, id);
    }
}

/// Comparison operator for [`Select`] filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
}

impl Op {
    fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Like => "LIKE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
struct Filter {
    column: &'static str,
    op: Op,
    value: SqlValue,
}

/// Paged `SELECT` over one table, with filters composed by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    table: &'static str,
    page: Page,
    filters: Vec<Filter>,
    order: Vec<(&'static str, Order)>,
}

impl Select {
    pub fn new(table: &'static str, page: Page) -> Self {
        Self {
            table,
            page,
            filters: Vec::new(),
            order: Vec::new(),
        }
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn filter(&mut self, column: &'static str, op: Op, value: SqlValue) {
        self.filters.push(Filter { column, op, value });
    }

    pub fn order_by(&mut self, column: &'static str, order: Order) {
        self.order.push((column, order));
    }

    pub fn build(&self) -> Builder {
        let mut qb = Builder::new(format!("SELECT * FROM {}", quote_ident(self.table)));

        for (i, filter) in self.filters.iter().enumerate() {
            qb.push(if i == 0 { " WHERE " } else { " AND " });
            qb.push(quote_ident(filter.column));
            match (&filter.value, filter.op) {
                (SqlValue::Null, Op::Eq) => {
                    qb.push(" IS NULL");
                }
                (SqlValue::Null, Op::Ne) => {
                    qb.push(" IS NOT NULL");
                }
                (value, op) => {
                    qb.push(format!(" {} ", op.as_sql()));
                    push_value(&mut qb, value.clone());
                }
            }
        }

        if !self.order.is_empty() {
            let terms: Vec<String> = self
                .order
                .iter()
                .map(|(column, order)| {
                    let dir = match order {
                        Order::Asc => "ASC",
                        Order::Desc => "DESC",
                    };
                    format!("{} {}", quote_ident(column), dir)
                })
                .collect();
            qb.push(format!(" ORDER BY {}", terms.join(", ")));
        }

        if let Some(limit) = self.page.limit() {
            qb.push(" LIMIT ");
            qb.push_bind(limit);
        }

        let offset = self.page.offset();
        if offset > 0 {
            qb.push(" OFFSET ");
            qb.push_bind(offset);
        }

        qb
    }
}
