//! The query executor.
//!
//! Each call acquires a fresh connection, binds the session context, runs one
//! parameterized statement and drops the connection before returning. Reads
//! are materialized eagerly; writes run in their own transaction and are
//! committed.
//!
//! Failures never propagate past [`QueryExecutor::execute`]: they are logged,
//! turned into an error notice for the user, and the caller receives `None`,
//! meaning the operation did not happen.
//!
//! User-supplied values must always travel as bound parameters. Only
//! identifiers verified against the catalog may be spliced into SQL text.

use rusqlite::{Connection, params_from_iter};
use serde::Serialize;
use tracing::{debug, warn};

use crate::connection::ConnectionProvider;
use crate::context::SessionContextBinder;
use crate::datatype::Value;
use crate::error::{HmsError, Result};
use crate::notice::Notices;
use crate::session::{PrincipalId, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    Rows,
    Commit,
}

/// A statement with positional `?` placeholders and its bound values.
#[derive(Debug, Clone)]
pub struct Query {
    sql: String,
    params: Vec<Value>,
    expect: Expect,
}

impl Query {
    pub fn select(sql: impl Into<String>) -> Self {
        Self { sql: sql.into(), params: Vec::new(), expect: Expect::Rows }
    }
    pub fn mutate(sql: impl Into<String>) -> Self {
        Self { sql: sql.into(), params: Vec::new(), expect: Expect::Commit }
    }
    pub fn new(sql: impl Into<String>, expect: Expect) -> Self {
        Self { sql: sql.into(), params: Vec::new(), expect }
    }
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }
    pub fn bind_all<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.params.extend(values.into_iter().map(Into::into));
        self
    }
    pub fn sql(&self) -> &str {
        &self.sql
    }
    pub fn params(&self) -> &[Value] {
        &self.params
    }
    pub fn expect(&self) -> Expect {
        self.expect
    }
}

/// Ordered rows with named columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// One row seen through its row-set's column names.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> Row<'a> {
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
    }
    pub fn values(&self) -> &'a [Value] {
        self.values
    }
}

impl RowSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        self.rows.get(index).map(|values| Row { columns: &self.columns, values })
    }
    pub fn iter(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|values| Row { columns: &self.columns, values })
    }
    /// First value of the named column, handy for scalar queries.
    pub fn scalar(&self, column: &str) -> Option<&Value> {
        self.row(0).and_then(|r| r.get(column))
    }
    /// All values of one column.
    pub fn column(&self, column: &str) -> Vec<Value> {
        match self.column_index(column) {
            Some(i) => self.rows.iter().filter_map(|r| r.get(i).cloned()).collect(),
            None => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum QueryResult {
    Rows(RowSet),
    Committed { affected: usize },
}

#[derive(Debug, Clone)]
pub struct QueryExecutor {
    provider: ConnectionProvider,
    binder: SessionContextBinder,
}

impl QueryExecutor {
    pub fn new(provider: ConnectionProvider, binder: SessionContextBinder) -> Self {
        Self { provider, binder }
    }

    pub fn provider(&self) -> &ConnectionProvider {
        &self.provider
    }

    /// Run `query` on behalf of `session`. `None` means nothing happened;
    /// the reason has been added to `notices`.
    pub fn execute(&self, session: &Session, query: &Query, notices: &mut Notices) -> Option<QueryResult> {
        match self.run(session.principal_id(), query) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(error = %e, principal = session.principal_id(), "statement failed");
                notices.error(format!("⚠️ Database Error: {e}"));
                None
            }
        }
    }

    /// Read path for composite operations.
    pub fn fetch(&self, session: &Session, query: &Query, notices: &mut Notices) -> Result<RowSet> {
        match self.execute(session, query, notices) {
            Some(QueryResult::Rows(rows)) => Ok(rows),
            Some(QueryResult::Committed { .. }) | None => Err(HmsError::Incomplete),
        }
    }

    /// Write path for composite operations, yields the affected row count.
    pub fn apply(&self, session: &Session, query: &Query, notices: &mut Notices) -> Result<usize> {
        match self.execute(session, query, notices) {
            Some(QueryResult::Committed { affected }) => Ok(affected),
            Some(QueryResult::Rows(_)) | None => Err(HmsError::Incomplete),
        }
    }

    fn run(&self, principal: PrincipalId, query: &Query) -> Result<QueryResult> {
        let mut connection = self.provider.acquire()?;
        self.binder.bind(&connection, principal)?;
        let result = match query.expect {
            Expect::Rows => Self::materialize(&connection, query).map(QueryResult::Rows),
            Expect::Commit => Self::commit(&mut connection, query)
                .map(|affected| QueryResult::Committed { affected }),
        };
        drop(connection);
        debug!("connection released");
        result
    }

    fn materialize(connection: &Connection, query: &Query) -> Result<RowSet> {
        let mut statement = connection.prepare(&query.sql)?;
        let columns: Vec<String> = statement
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let width = columns.len();
        let mut rows = Vec::new();
        let mut cursor = statement.query(params_from_iter(query.params.iter()))?;
        while let Some(row) = cursor.next()? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(row.get::<_, Value>(i)?);
            }
            rows.push(values);
        }
        Ok(RowSet { columns, rows })
    }

    fn commit(connection: &mut Connection, query: &Query) -> Result<usize> {
        let transaction = connection.transaction()?;
        let affected = transaction.execute(&query.sql, params_from_iter(query.params.iter()))?;
        transaction.commit()?;
        Ok(affected)
    }
}
