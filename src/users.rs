use tracing::info;

use crate::datatype::Value;
use crate::error::{HmsError, Result};
use crate::executor::{Query, QueryExecutor, RowSet};
use crate::navigator::{PageId, RolePolicy};
use crate::notice::Notices;
use crate::password::hash_password;
use crate::session::Session;
use crate::settings::AuthSettings;

const LIST_USERS: &str = "
    select U.UserID, U.Username, R.RoleName, E.FullName
        from System_Users U
        join User_Roles_Security R
        on U.RoleID = R.SecRoleID
        left join Employees E
        on U.EmpID = E.EmpID
        order by U.UserID
";

/// Fields of the "Register New Staff Access" form.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub employee_id: Option<i64>,
    pub username: String,
    pub password: String,
    pub role_id: i64,
}

/// Account administration, reachable from the user management page only.
pub struct UserAdmin<'a> {
    executor: &'a QueryExecutor,
    policy: &'a RolePolicy,
    settings: &'a AuthSettings,
}

impl<'a> UserAdmin<'a> {
    pub fn new(executor: &'a QueryExecutor, policy: &'a RolePolicy, settings: &'a AuthSettings) -> Self {
        Self { executor, policy, settings }
    }

    pub fn list_users(&self, session: &Session, notices: &mut Notices) -> Result<RowSet> {
        self.policy.permits(session, PageId::UserManagement)?;
        self.executor.fetch(session, &Query::select(LIST_USERS), notices)
    }

    pub fn roles(&self, session: &Session, notices: &mut Notices) -> Result<RowSet> {
        self.policy.permits(session, PageId::UserManagement)?;
        let query = Query::select("select SecRoleID, RoleName from User_Roles_Security order by SecRoleID");
        self.executor.fetch(session, &query, notices)
    }

    pub fn employees(&self, session: &Session, notices: &mut Notices) -> Result<RowSet> {
        self.policy.permits(session, PageId::UserManagement)?;
        let query = Query::select("select EmpID, FullName from Employees order by EmpID");
        self.executor.fetch(session, &query, notices)
    }

    pub fn create_user(&self, session: &Session, user: &NewUser, notices: &mut Notices) -> Result<()> {
        self.policy.permits(session, PageId::UserManagement)?;
        let username = user.username.trim();
        if username.is_empty() || user.password.is_empty() {
            return Err(HmsError::Validation("Username and password are required.".to_string()));
        }
        let existing = self.executor.fetch(
            session,
            &Query::select("select count(*) as c from System_Users where Username = ?").bind(username),
            notices,
        )?;
        if existing.scalar("c").and_then(Value::as_i64).unwrap_or(0) > 0 {
            return Err(HmsError::Validation(format!("❌ Username {username} is already taken.")));
        }
        let hashed = hash_password(self.settings.password_scheme, &user.password)?;
        let query = Query::mutate(
            "insert into System_Users (EmpID, Username, PasswordHash, RoleID) values (?, ?, ?, ?)",
        )
        .bind(user.employee_id)
        .bind(username)
        .bind(hashed)
        .bind(user.role_id);
        self.executor.apply(session, &query, notices)?;
        info!(username, role_id = user.role_id, "user created");
        notices.success(format!("✅ Account created for {username}"));
        Ok(())
    }

    pub fn change_password(
        &self,
        session: &Session,
        username: &str,
        new_password: &str,
        confirm: &str,
        notices: &mut Notices,
    ) -> Result<()> {
        self.policy.permits(session, PageId::UserManagement)?;
        if new_password != confirm {
            return Err(HmsError::Validation("❌ Passwords do not match!".to_string()));
        }
        if new_password.is_empty() {
            return Err(HmsError::Validation("Password must not be empty.".to_string()));
        }
        let hashed = hash_password(self.settings.password_scheme, new_password)?;
        let query = Query::mutate("update System_Users set PasswordHash = ? where Username = ?")
            .bind(hashed)
            .bind(username);
        let affected = self.executor.apply(session, &query, notices)?;
        if affected == 0 {
            notices.warning(format!("No account named {username}."));
        } else {
            notices.success(format!("✅ Password updated for {username}"));
        }
        Ok(())
    }

    /// Remove an account. The logged-in account cannot remove itself.
    pub fn delete_user(&self, session: &Session, username: &str, notices: &mut Notices) -> Result<()> {
        self.policy.permits(session, PageId::UserManagement)?;
        if session.username() == Some(username) {
            return Err(HmsError::Validation(
                "❌ Error: You cannot delete your own account while logged in!".to_string(),
            ));
        }
        let query = Query::mutate("delete from System_Users where Username = ?").bind(Value::from(username));
        let affected = self.executor.apply(session, &query, notices)?;
        if affected == 0 {
            notices.warning(format!("No account named {username}."));
        } else {
            info!(username, "user deleted");
            notices.warning(format!("🗑️ User account `{username}` removed."));
        }
        Ok(())
    }
}
