//! Role-gated navigation.
//!
//! Every role holds an explicit permission set: the baseline pages granted to
//! any authenticated principal, the pages its grant adds, and whether it may
//! see the sensitive tables. The elevated role is therefore just a role whose
//! grant happens to be large, no branching on its name.
//!
//! Table visibility is an allow/deny filter: any table not on the deny-list is
//! visible to every authenticated principal.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{HmsError, Result};
use crate::session::Session;
use crate::settings::AccessSettings;

/// Functional pages of the admin console, in navigation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageId {
    TableExplorer,
    QuickInsights,
    GuestInquiries,
    UserManagement,
    ExecutiveDashboard,
    SecurityLogs,
    SqlConsole,
}

impl PageId {
    pub const ALL: [PageId; 7] = [
        PageId::TableExplorer,
        PageId::QuickInsights,
        PageId::GuestInquiries,
        PageId::UserManagement,
        PageId::ExecutiveDashboard,
        PageId::SecurityLogs,
        PageId::SqlConsole,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PageId::TableExplorer => "📁 Table Explorer",
            PageId::QuickInsights => "📊 Quick Insights",
            PageId::GuestInquiries => "📞 Guest Inquiries",
            PageId::UserManagement => "👤 User Management",
            PageId::ExecutiveDashboard => "📈 Executive Dashboard",
            PageId::SecurityLogs => "🛡️ Security Logs",
            PageId::SqlConsole => "🛠️ SQL Console",
        }
    }

    pub fn from_label(label: &str) -> Option<PageId> {
        PageId::ALL.into_iter().find(|p| p.label() == label)
    }
}

/// What one role adds on top of the baseline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleGrant {
    pub pages: Vec<PageId>,
    pub sensitive_tables: bool,
}

#[derive(Debug, Clone)]
pub struct RolePolicy {
    baseline: BTreeSet<PageId>,
    // keyed by trimmed, lowercased role name
    grants: HashMap<String, RoleGrant>,
    deny_list: Vec<String>,
    append_only: Vec<String>,
}

fn role_key(role: &str) -> String {
    role.trim().to_lowercase()
}

impl RolePolicy {
    pub fn new(settings: &AccessSettings) -> Self {
        Self {
            baseline: settings.baseline_pages.iter().copied().collect(),
            grants: settings
                .roles
                .iter()
                .map(|(role, grant)| (role_key(role), grant.clone()))
                .collect(),
            deny_list: settings.sensitive_tables.clone(),
            append_only: settings.append_only_tables.clone(),
        }
    }

    pub fn deny_list(&self) -> &[String] {
        &self.deny_list
    }

    pub fn visible_pages(&self, role: &str) -> BTreeSet<PageId> {
        let mut pages = self.baseline.clone();
        if let Some(grant) = self.grants.get(&role_key(role)) {
            pages.extend(grant.pages.iter().copied());
        }
        pages
    }

    pub fn sees_sensitive_tables(&self, role: &str) -> bool {
        self.grants
            .get(&role_key(role))
            .is_some_and(|grant| grant.sensitive_tables)
    }

    pub fn is_sensitive(&self, table: &str) -> bool {
        self.deny_list.iter().any(|t| t.eq_ignore_ascii_case(table))
    }

    /// Log tables may be read by whoever sees them but never changed row by row.
    pub fn is_append_only(&self, table: &str) -> bool {
        self.append_only.iter().any(|t| t.eq_ignore_ascii_case(table))
    }

    /// Filter a catalog listing down to what `role` may reach, keeping order.
    pub fn visible_tables(&self, role: &str, all_tables: &[String]) -> Vec<String> {
        if self.sees_sensitive_tables(role) {
            return all_tables.to_vec();
        }
        all_tables
            .iter()
            .filter(|t| !self.is_sensitive(t))
            .cloned()
            .collect()
    }

    /// Gate for page operations.
    pub fn permits(&self, session: &Session, page: PageId) -> Result<()> {
        let role = session.role().ok_or(HmsError::NotAuthenticated)?;
        if self.visible_pages(role).contains(&page) {
            Ok(())
        } else {
            Err(HmsError::Forbidden(format!("{} is not available to role {role}", page.label())))
        }
    }
}
