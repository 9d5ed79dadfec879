use chrono::Utc;
use tracing::{info, warn};

use crate::error::{HmsError, Result};
use crate::executor::{Query, QueryExecutor};
use crate::notice::Notices;
use crate::password::{PasswordScheme, hash_password, is_legacy, verify_password};
use crate::session::{Principal, Session};
use crate::settings::AuthSettings;

const LOOKUP_PRINCIPAL: &str = "
    select U.UserID, U.Username, U.PasswordHash, R.RoleName
        from System_Users U
        join User_Roles_Security R
        on U.RoleID = R.SecRoleID
        where U.Username = ?
        order by U.UserID
";

const RECORD_FAILED_LOGIN: &str = "
    insert into Failed_Logins (
        Username,
        IP_Address,
        AttemptTime
    ) values (?, ?, ?)
";

const UPGRADE_HASH: &str = "
    update System_Users
        set PasswordHash = ?
        where UserID = ?
";

/// Validates credentials and establishes the session principal.
///
/// There is no lockout or throttling: every failed attempt is recorded and
/// the caller may simply try again.
pub struct Authenticator<'a> {
    executor: &'a QueryExecutor,
    settings: &'a AuthSettings,
}

impl<'a> Authenticator<'a> {
    pub fn new(executor: &'a QueryExecutor, settings: &'a AuthSettings) -> Self {
        Self { executor, settings }
    }

    /// Look the user up, verify the password and, on success, establish
    /// `session`. A failure of any kind appends one Failed_Logins row.
    pub fn login(
        &self,
        session: &mut Session,
        username: &str,
        password: &str,
        source: &str,
        notices: &mut Notices,
    ) -> Result<Principal> {
        // lookups and failure records are attributed to nobody
        let anonymous = Session::new();
        let candidates = self
            .executor
            .fetch(&anonymous, &Query::select(LOOKUP_PRINCIPAL).bind(username), notices)
            .ok();

        let matched = candidates.as_ref().and_then(|rows| {
            rows.iter().find_map(|row| {
                let stored = row.get("PasswordHash")?.as_str()?;
                if !verify_password(stored, password) {
                    return None;
                }
                let principal = Principal {
                    id: row.get("UserID")?.as_i64()?,
                    username: row.get("Username")?.as_str()?.to_string(),
                    role: row.get("RoleName")?.as_str()?.trim().to_string(),
                };
                Some((principal, is_legacy(stored)))
            })
        });

        let Some((principal, legacy)) = matched else {
            self.record_failed_login(&anonymous, username, source, notices);
            notices.error("Invalid Login Credentials.");
            warn!(username, source, "login failed");
            return Err(HmsError::InvalidCredentials);
        };

        session.establish(principal.clone());
        info!(username = %principal.username, role = %principal.role, "login");

        if legacy
            && self.settings.upgrade_legacy_hashes
            && self.settings.password_scheme == PasswordScheme::Argon2
        {
            self.upgrade_hash(session, &principal, password);
        }
        Ok(principal)
    }

    /// Reset the session to the logged-out default. Idempotent.
    pub fn logout(&self, session: &mut Session) {
        if let Some(username) = session.username() {
            info!(username, "logout");
        }
        session.clear();
    }

    fn record_failed_login(&self, anonymous: &Session, username: &str, source: &str, notices: &mut Notices) {
        let attempted = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string();
        let query = Query::mutate(RECORD_FAILED_LOGIN)
            .bind(username)
            .bind(source)
            .bind(attempted);
        // the executor has already surfaced any failure
        let _ = self.executor.execute(anonymous, &query, notices);
    }

    fn upgrade_hash(&self, session: &Session, principal: &Principal, password: &str) {
        let hashed = match hash_password(PasswordScheme::Argon2, password) {
            Ok(hashed) => hashed,
            Err(e) => {
                warn!(error = %e, "could not rehash legacy password");
                return;
            }
        };
        // a failed upgrade leaves the legacy digest usable; keep it off the user's screen
        let mut quiet = Notices::new();
        let query = Query::mutate(UPGRADE_HASH).bind(hashed).bind(principal.id);
        if self.executor.execute(session, &query, &mut quiet).is_some() {
            info!(username = %principal.username, "legacy password digest upgraded");
        }
    }
}
