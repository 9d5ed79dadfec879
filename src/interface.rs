//! The dashboard: one shared value wiring settings, the executor, the role
//! policy and the session registry together.
//!
//! Page components borrow from it for the duration of one interaction, e.g.
//! `dashboard.tables().list(&session, "Rooms", &mut notices)`. Nothing here
//! holds a connection; every operation opens and closes its own.

use std::time::Duration;

use crate::auth::Authenticator;
use crate::connection::ConnectionProvider;
use crate::console::SqlConsole;
use crate::context::SessionContextBinder;
use crate::crud::TableCrud;
use crate::error::Result;
use crate::executor::QueryExecutor;
use crate::inquiry::Inquiries;
use crate::navigator::RolePolicy;
use crate::reports::Reports;
use crate::schema;
use crate::session::SessionRegistry;
use crate::settings::Settings;
use crate::users::UserAdmin;

pub struct Dashboard {
    settings: Settings,
    executor: QueryExecutor,
    policy: RolePolicy,
    sessions: SessionRegistry,
}

impl Dashboard {
    pub fn new(settings: Settings) -> Self {
        let provider = ConnectionProvider::new(settings.database.clone());
        let executor = QueryExecutor::new(provider, SessionContextBinder::new());
        let policy = RolePolicy::new(&settings.access);
        let sessions =
            SessionRegistry::with_idle_timeout(Duration::from_secs(settings.server.session_idle_secs));
        Self { settings, executor, policy, sessions }
    }

    /// Prepare the database; see [`schema::bootstrap`].
    pub fn bootstrap(&self) -> Result<()> {
        schema::bootstrap(
            self.executor.provider(),
            &SessionContextBinder::new(),
            &self.settings.bootstrap,
            self.settings.auth.password_scheme,
        )
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
    pub fn executor(&self) -> &QueryExecutor {
        &self.executor
    }
    pub fn policy(&self) -> &RolePolicy {
        &self.policy
    }
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn authenticator(&self) -> Authenticator<'_> {
        Authenticator::new(&self.executor, &self.settings.auth)
    }
    pub fn users(&self) -> UserAdmin<'_> {
        UserAdmin::new(&self.executor, &self.policy, &self.settings.auth)
    }
    pub fn tables(&self) -> TableCrud<'_> {
        TableCrud::new(&self.executor, &self.policy)
    }
    pub fn inquiries(&self) -> Inquiries<'_> {
        Inquiries::new(&self.executor, &self.policy)
    }
    pub fn console(&self) -> SqlConsole<'_> {
        SqlConsole::new(&self.executor, &self.policy)
    }
    pub fn reports(&self) -> Reports<'_> {
        Reports::new(&self.executor, &self.policy)
    }
}
