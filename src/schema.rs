use rusqlite::{OptionalExtension, params};
use tracing::{info, warn};

use crate::context::SessionContextBinder;
use crate::connection::ConnectionProvider;
use crate::error::{HmsError, Result};
use crate::password::{PasswordScheme, generate_password, hash_password};
use crate::session::ANONYMOUS_PRINCIPAL;
use crate::settings::BootstrapSettings;

/// Schema SQL embedded at compile time.
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Create the tables, default roles and audit triggers when missing, then
/// make sure at least one administrator exists. Safe to run on every start.
pub fn bootstrap(
    provider: &ConnectionProvider,
    binder: &SessionContextBinder,
    settings: &BootstrapSettings,
    scheme: PasswordScheme,
) -> Result<()> {
    let connection = provider.acquire_or_create()?;
    binder.bind(&connection, ANONYMOUS_PRINCIPAL)?;
    if settings.create_schema {
        connection.execute_batch(SCHEMA_SQL)?;
        info!(path = %provider.settings().path.display(), "schema ready");
    }

    let users: i64 = connection.query_row("select count(*) from System_Users", [], |r| r.get(0))?;
    if users > 0 {
        return Ok(());
    }
    let role_id: Option<i64> = connection
        .query_row(
            "select SecRoleID from User_Roles_Security where RoleName = ?",
            params![settings.admin_role],
            |r| r.get(0),
        )
        .optional()?;
    let Some(role_id) = role_id else {
        return Err(HmsError::Config(format!("bootstrap role {} does not exist", settings.admin_role)));
    };
    let password = match &settings.admin_password {
        Some(password) => password.clone(),
        None => {
            let generated = generate_password();
            eprintln!("=== FIRST STARTUP: administrator account created ===");
            eprintln!("  username: {}", settings.admin_username);
            eprintln!("  password: {generated}");
            eprintln!("  CHANGE THIS PASSWORD IMMEDIATELY");
            eprintln!("====================================================");
            generated
        }
    };
    connection.execute(
        "insert into System_Users (Username, PasswordHash, RoleID) values (?, ?, ?)",
        params![settings.admin_username, hash_password(scheme, &password)?, role_id],
    )?;
    warn!(username = %settings.admin_username, "no accounts found, administrator created");
    Ok(())
}
