use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use rand::RngCore;
use serde::Serialize;
use tracing::debug;

use crate::error::{HmsError, Result};

pub type PrincipalId = i64;

/// Bound into the database session whenever nobody is logged in. Account ids
/// start at 1, so anonymous work is never attributed to a real account.
pub const ANONYMOUS_PRINCIPAL: PrincipalId = 0;

/// The authenticated identity executing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: PrincipalId,
    pub username: String,
    pub role: String,
}

/// Per-user session record, logged out by default.
#[derive(Debug, Clone, Default)]
pub struct Session {
    principal: Option<Principal>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn is_logged_in(&self) -> bool {
        self.principal.is_some()
    }
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }
    /// The id to pin into the database session.
    pub fn principal_id(&self) -> PrincipalId {
        self.principal.as_ref().map_or(ANONYMOUS_PRINCIPAL, |p| p.id)
    }
    pub fn username(&self) -> Option<&str> {
        self.principal.as_ref().map(|p| p.username.as_str())
    }
    pub fn role(&self) -> Option<&str> {
        self.principal.as_ref().map(|p| p.role.trim())
    }
    pub fn establish(&mut self, principal: Principal) {
        self.principal = Some(principal);
    }
    /// Back to the logged-out default. Idempotent.
    pub fn clear(&mut self) {
        self.principal = None;
    }
}

/// Opaque bearer token handed out at login.
pub type SessionToken = String;

/// How long a bearer session may sit unused before it is forgotten.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

#[derive(Debug)]
struct Entry {
    session: Session,
    last_seen: Instant,
}

/// Sessions of all connected users, one record per token and never shared
/// across principals.
///
/// A client that disappears without logging out cannot say so; its session
/// is dropped once it has been idle for the configured timeout. Expired
/// entries are swept whenever a session is opened or looked up.
#[derive(Debug)]
pub struct SessionRegistry {
    active: Mutex<HashMap<SessionToken, Entry>>,
    idle_timeout: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self { active: Mutex::new(HashMap::new()), idle_timeout }
    }

    fn allocate_token() -> SessionToken {
        let mut bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut bytes);
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<SessionToken, Entry>>> {
        self.active.lock().map_err(|e| HmsError::Lock(e.to_string()))
    }

    fn sweep(&self, active: &mut HashMap<SessionToken, Entry>) {
        let before = active.len();
        active.retain(|_, entry| entry.last_seen.elapsed() < self.idle_timeout);
        let expired = before - active.len();
        if expired > 0 {
            debug!(expired, "idle sessions dropped");
        }
    }

    pub fn open(&self, session: Session) -> Result<SessionToken> {
        let token = Self::allocate_token();
        let mut active = self.lock()?;
        self.sweep(&mut active);
        active.insert(token.clone(), Entry { session, last_seen: Instant::now() });
        Ok(token)
    }

    /// Unknown, missing or expired tokens resolve to the logged-out default.
    /// A hit counts as activity.
    pub fn get(&self, token: Option<&str>) -> Result<Session> {
        let mut active = self.lock()?;
        self.sweep(&mut active);
        let Some(token) = token else {
            return Ok(Session::default());
        };
        Ok(match active.get_mut(token) {
            Some(entry) => {
                entry.last_seen = Instant::now();
                entry.session.clone()
            }
            None => Session::default(),
        })
    }

    /// Forget the token. Returns whether a session was open under it.
    pub fn close(&self, token: &str) -> Result<bool> {
        let removed = self.lock()?.remove(token);
        Ok(match removed {
            Some(mut entry) => {
                entry.session.clear();
                true
            }
            None => false,
        })
    }

    pub fn len(&self) -> usize {
        self.active.lock().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
