//! Session context binding.
//!
//! Before any statement runs, the acting principal's id is pinned into the
//! database session. SQLite has no `sp_set_session_context`, so the binding
//! is a connection-scoped SQL function:
//!
//! ```sql
//! select session_context('UserID');   -- the bound principal id
//! ```
//!
//! It disappears with the connection. Audit triggers in the schema read it to
//! attribute writes; an unknown key yields NULL.

use rusqlite::Connection;
use rusqlite::functions::FunctionFlags;
use tracing::debug;

use crate::error::{HmsError, Result};
use crate::session::PrincipalId;

pub const CONTEXT_FUNCTION: &str = "session_context";
pub const USER_ID_KEY: &str = "UserID";

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionContextBinder;

impl SessionContextBinder {
    pub fn new() -> Self {
        Self
    }

    pub fn bind(&self, connection: &Connection, principal: PrincipalId) -> Result<()> {
        connection
            .create_scalar_function(
                CONTEXT_FUNCTION,
                1,
                FunctionFlags::SQLITE_UTF8
                    | FunctionFlags::SQLITE_DETERMINISTIC
                    | FunctionFlags::SQLITE_INNOCUOUS,
                move |ctx| {
                    let key = ctx.get::<Option<String>>(0)?;
                    Ok(match key.as_deref() {
                        Some(USER_ID_KEY) => Some(principal),
                        _ => None,
                    })
                },
            )
            .map_err(|e| HmsError::Connection(format!("cannot bind session context: {e}")))?;
        debug!(principal, "session context bound");
        Ok(())
    }
}
