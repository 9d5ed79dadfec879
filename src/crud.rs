//! Generic table CRUD.
//!
//! Works on any table the caller picks without schema-specific code. Column
//! names are first read from the catalog into a [`TableSchema`], and SQL is
//! built only from those verified names (always quoted). Values are bound.
//!
//! The engine assumes the first column of every table is a unique primary
//! key and never checks it. A table that breaks this will have the wrong
//! rows edited or deleted.
//!
//! All form input is bound as text; the engine does no per-column
//! coercion. A non-numeric value for a numeric column fails as an ordinary
//! statement error.
//!
//! The audit and failed-login tables are append-only: they can be listed
//! but never added to, edited or deleted from here, not even by the
//! elevated role.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::datatype::{Affinity, Value};
use crate::error::{HmsError, Result};
use crate::executor::{Query, QueryExecutor, RowSet};
use crate::navigator::{PageId, RolePolicy};
use crate::notice::Notices;
use crate::session::Session;

const LIST_TABLES: &str = "
    select name
        from sqlite_master
        where type = 'table'
        and name not like 'sqlite_%'
        order by name
";

const TABLE_INFO: &str = "
    select name, type, pk
        from pragma_table_info(?)
        order by cid
";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub declared_type: String,
    pub affinity: Affinity,
    pub primary_key: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
}

impl TableSchema {
    /// The column treated as the primary key: always the first one.
    pub fn key(&self) -> Option<&ColumnDescriptor> {
        self.columns.first()
    }

    /// Columns the add form asks for. The key is skipped as auto-generated,
    /// unless it is the only column.
    pub fn input_columns(&self) -> &[ColumnDescriptor] {
        if self.columns.len() > 1 {
            &self.columns[1..]
        } else {
            &self.columns
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Bind a key typed in as text the way the key column stores it, so
    /// `"007"` stays text for a text key and `"7"` becomes 7 for an integer one.
    pub fn key_value(&self, key: &Value) -> Value {
        let (Some(column), Value::Text(raw)) = (self.key(), key) else {
            return key.clone();
        };
        let raw = raw.trim();
        match column.affinity {
            Affinity::Integer => raw.parse::<i64>().map(Value::Integer).unwrap_or_else(|_| key.clone()),
            Affinity::Real | Affinity::Numeric => raw
                .parse::<i64>()
                .map(Value::Integer)
                .or_else(|_| raw.parse::<f64>().map(Value::Real))
                .unwrap_or_else(|_| key.clone()),
            Affinity::Text | Affinity::Blob => key.clone(),
        }
    }
}

/// Quote a catalog-verified identifier.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub struct TableCrud<'a> {
    executor: &'a QueryExecutor,
    policy: &'a RolePolicy,
}

impl<'a> TableCrud<'a> {
    pub fn new(executor: &'a QueryExecutor, policy: &'a RolePolicy) -> Self {
        Self { executor, policy }
    }

    fn catalog(&self, session: &Session, notices: &mut Notices) -> Result<Vec<String>> {
        let rows = self.executor.fetch(session, &Query::select(LIST_TABLES), notices)?;
        Ok(rows
            .column("name")
            .into_iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect())
    }

    /// Tables the session's role may browse, optionally narrowed by a
    /// case-insensitive substring.
    pub fn tables(&self, session: &Session, search: Option<&str>, notices: &mut Notices) -> Result<Vec<String>> {
        self.policy.permits(session, PageId::TableExplorer)?;
        let role = session.role().unwrap_or_default();
        let visible = self.policy.visible_tables(role, &self.catalog(session, notices)?);
        Ok(match search.map(str::trim).filter(|s| !s.is_empty()) {
            Some(needle) => {
                let needle = needle.to_lowercase();
                visible
                    .into_iter()
                    .filter(|t| t.to_lowercase().contains(&needle))
                    .collect()
            }
            None => visible,
        })
    }

    /// Introspect `table`. It must exist and be visible to the session's role.
    pub fn describe(&self, session: &Session, table: &str, notices: &mut Notices) -> Result<TableSchema> {
        self.policy.permits(session, PageId::TableExplorer)?;
        let catalog = self.catalog(session, notices)?;
        let Some(name) = catalog.iter().find(|t| t.eq_ignore_ascii_case(table)).cloned() else {
            return Err(HmsError::Validation(format!("No table named {table}.")));
        };
        let role = session.role().unwrap_or_default();
        if !self.policy.sees_sensitive_tables(role) && self.policy.is_sensitive(&name) {
            return Err(HmsError::Forbidden(format!("table {name} is restricted")));
        }
        let info = self
            .executor
            .fetch(session, &Query::select(TABLE_INFO).bind(name.as_str()), notices)?;
        let columns = info
            .iter()
            .filter_map(|row| {
                let column = row.get("name")?.as_str()?.to_string();
                let declared_type = row.get("type").and_then(Value::as_str).unwrap_or_default().to_string();
                Some(ColumnDescriptor {
                    affinity: Affinity::from_declared(&declared_type),
                    primary_key: row.get("pk").and_then(Value::as_i64).unwrap_or(0) > 0,
                    name: column,
                    declared_type,
                })
            })
            .collect();
        Ok(TableSchema { name, columns })
    }

    /// Like `describe`, but refuses the append-only log tables whatever the role.
    fn describe_writable(&self, session: &Session, table: &str, notices: &mut Notices) -> Result<TableSchema> {
        let schema = self.describe(session, table, notices)?;
        if self.policy.is_append_only(&schema.name) {
            return Err(HmsError::Forbidden(format!("{} is append-only", schema.name)));
        }
        Ok(schema)
    }

    /// Every row of the table, unfiltered and unpaginated.
    pub fn list(&self, session: &Session, table: &str, notices: &mut Notices) -> Result<RowSet> {
        let schema = self.describe(session, table, notices)?;
        let query = Query::select(format!("select * from {}", quote_ident(&schema.name)));
        self.executor.fetch(session, &query, notices)
    }

    /// Insert one row from a column→text map covering the input columns.
    pub fn add(
        &self,
        session: &Session,
        table: &str,
        fields: &BTreeMap<String, String>,
        notices: &mut Notices,
    ) -> Result<usize> {
        let schema = self.describe_writable(session, table, notices)?;
        let inputs = schema.input_columns();
        if let Some(unknown) = fields.keys().find(|k| !inputs.iter().any(|c| &c.name == *k)) {
            return Err(HmsError::Validation(format!("{} has no input column {unknown}.", schema.name)));
        }
        let mut values = Vec::with_capacity(inputs.len());
        for column in inputs {
            match fields.get(&column.name) {
                Some(value) => values.push(value.clone()),
                None => {
                    return Err(HmsError::Validation(format!("Enter {}.", column.name)));
                }
            }
        }
        let columns: Vec<String> = inputs.iter().map(|c| quote_ident(&c.name)).collect();
        let placeholders = vec!["?"; inputs.len()].join(", ");
        let query = Query::mutate(format!(
            "insert into {} ({}) values ({placeholders})",
            quote_ident(&schema.name),
            columns.join(", ")
        ))
        .bind_all(values);
        let affected = self.executor.apply(session, &query, notices)?;
        info!(table = %schema.name, "record added");
        notices.success("✅ Record Added Successfully!");
        Ok(affected)
    }

    /// Overwrite one cell of the row whose key equals `key`.
    pub fn edit(
        &self,
        session: &Session,
        table: &str,
        key: &Value,
        column: &str,
        value: &str,
        notices: &mut Notices,
    ) -> Result<usize> {
        let schema = self.describe_writable(session, table, notices)?;
        let Some(target) = schema.column(column) else {
            return Err(HmsError::Validation(format!("{} has no column {column}.", schema.name)));
        };
        let Some(key_column) = schema.key() else {
            return Err(HmsError::Validation(format!("{} has no columns.", schema.name)));
        };
        let query = Query::mutate(format!(
            "update {} set {} = ? where {} = ?",
            quote_ident(&schema.name),
            quote_ident(&target.name),
            quote_ident(&key_column.name)
        ))
        .bind(value)
        .bind(schema.key_value(key));
        let affected = self.executor.apply(session, &query, notices)?;
        if affected == 0 {
            notices.warning(format!("No row with {} = {key}.", key_column.name));
        } else {
            info!(table = %schema.name, column = %target.name, key = %key, "record updated");
            notices.success("✅ Record Updated!");
        }
        Ok(affected)
    }

    /// Remove the row whose key equals `key`. Deleting a missing key affects
    /// zero rows and is reported, not treated as an error.
    pub fn delete(&self, session: &Session, table: &str, key: &Value, notices: &mut Notices) -> Result<usize> {
        let schema = self.describe_writable(session, table, notices)?;
        let Some(key_column) = schema.key() else {
            return Err(HmsError::Validation(format!("{} has no columns.", schema.name)));
        };
        let query = Query::mutate(format!(
            "delete from {} where {} = ?",
            quote_ident(&schema.name),
            quote_ident(&key_column.name)
        ))
        .bind(schema.key_value(key));
        let affected = self.executor.apply(session, &query, notices)?;
        if affected == 0 {
            notices.warning(format!("No row with {} = {key}.", key_column.name));
        } else {
            info!(table = %schema.name, key = %key, "record deleted");
            notices.warning("🗑️ Record Deleted.");
        }
        Ok(affected)
    }
}
