//! Ad-hoc SQL console.
//!
//! An unrestricted escape hatch for the elevated role: whatever the operator
//! types is executed as-is. Gating is by page permission only.
//!
//! Read or write is decided by sniffing the leading keyword. Only a `select`
//! prefix takes the read path, so a CTE (`with ... select`) or a
//! multi-statement script goes down the write path and fails there.
// TODO: decide whether `with`/`values`/`pragma` should take the read path and say so in the page help.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::info;

use crate::error::{HmsError, Result};
use crate::executor::{Expect, Query, QueryExecutor, QueryResult};
use crate::navigator::{PageId, RolePolicy};
use crate::notice::Notices;
use crate::session::Session;

lazy_static! {
    static ref READ_PREFIX: Regex = Regex::new(r"(?i)^\s*select\b").unwrap();
}

pub fn is_read_statement(sql: &str) -> bool {
    READ_PREFIX.is_match(sql)
}

pub struct SqlConsole<'a> {
    executor: &'a QueryExecutor,
    policy: &'a RolePolicy,
}

impl<'a> SqlConsole<'a> {
    pub fn new(executor: &'a QueryExecutor, policy: &'a RolePolicy) -> Self {
        Self { executor, policy }
    }

    pub fn run(&self, session: &Session, sql: &str, notices: &mut Notices) -> Result<QueryResult> {
        self.policy.permits(session, PageId::SqlConsole)?;
        if sql.trim().is_empty() {
            return Err(HmsError::Validation("Enter a command to run.".to_string()));
        }
        let expect = if is_read_statement(sql) { Expect::Rows } else { Expect::Commit };
        info!(user = session.username().unwrap_or("anonymous"), ?expect, "console command");
        let result = self
            .executor
            .execute(session, &Query::new(sql, expect), notices)
            .ok_or(HmsError::Incomplete)?;
        notices.success("Success");
        Ok(result)
    }
}
