//! Process-wide settings.
//!
//! Settings are read with the `config` crate from an optional TOML file
//! (`grandpearl.toml` in the working directory, or an explicit path) and
//! then overridden by `GRANDPEARL__<SECTION>__<KEY>` environment variables.
//! Every field has a default, so an empty environment yields a usable
//! configuration pointing at `grand_pearl.db`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;
use crate::navigator::{PageId, RoleGrant};
use crate::password::PasswordScheme;

pub const DEFAULT_CONFIG_NAME: &str = "grandpearl";
pub const ENV_PREFIX: &str = "GRANDPEARL";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub server: ServerSettings,
    pub auth: AuthSettings,
    pub access: AccessSettings,
    pub bootstrap: BootstrapSettings,
    pub log: LogSettings,
}

impl Settings {
    /// Load settings, layering the file (if any) under the environment.
    ///
    /// An explicit `path` must exist; the default file name is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };
        let settings = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize::<Settings>()?;
        Ok(settings)
    }
}

/// Fixed catalog parameters for every connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: PathBuf,
    pub busy_timeout_ms: u64,
    pub foreign_keys: bool,
    /// When false a missing database file is treated as unreachable.
    pub create_if_missing: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("grand_pearl.db"),
            busy_timeout_ms: 5_000,
            foreign_keys: true,
            create_if_missing: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
    /// Recorded with failed logins when the peer address is unknown.
    pub fallback_source_address: String,
    /// Bearer sessions unused for this long are forgotten.
    pub session_idle_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            fallback_source_address: "127.0.0.1".to_string(),
            session_idle_secs: 30 * 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub password_scheme: PasswordScheme,
    pub upgrade_legacy_hashes: bool,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            password_scheme: PasswordScheme::Argon2,
            upgrade_legacy_hashes: true,
        }
    }
}

/// Page grants per role, the tables hidden from roles without
/// `sensitive_tables`, and the log tables no role may change through the
/// table explorer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AccessSettings {
    pub baseline_pages: Vec<PageId>,
    pub roles: HashMap<String, RoleGrant>,
    pub sensitive_tables: Vec<String>,
    pub append_only_tables: Vec<String>,
}

impl Default for AccessSettings {
    fn default() -> Self {
        let mut roles = HashMap::new();
        roles.insert(
            "SuperAdmin".to_string(),
            RoleGrant {
                pages: vec![
                    PageId::GuestInquiries,
                    PageId::UserManagement,
                    PageId::ExecutiveDashboard,
                    PageId::SecurityLogs,
                    PageId::SqlConsole,
                ],
                sensitive_tables: true,
            },
        );
        Self {
            baseline_pages: vec![PageId::TableExplorer, PageId::QuickInsights],
            roles,
            sensitive_tables: vec![
                "Audit_Logs".to_string(),
                "Failed_Logins".to_string(),
                "System_Users".to_string(),
                "User_Roles_Security".to_string(),
            ],
            append_only_tables: vec!["Audit_Logs".to_string(), "Failed_Logins".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BootstrapSettings {
    pub create_schema: bool,
    pub admin_username: String,
    /// Generated and printed once when absent.
    pub admin_password: Option<String>,
    pub admin_role: String,
}

impl Default for BootstrapSettings {
    fn default() -> Self {
        Self {
            create_schema: true,
            admin_username: "admin".to_string(),
            admin_password: None,
            admin_role: "SuperAdmin".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}
