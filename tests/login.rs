mod common;

use grandpearl::HmsError;
use grandpearl::datatype::Value;
use grandpearl::executor::Query;
use grandpearl::navigator::PageId;
use grandpearl::notice::Notices;
use grandpearl::password::is_legacy;
use grandpearl::session::Session;

fn stored_hash(fx: &common::Fixture, username: &str) -> String {
    let mut notices = Notices::new();
    let rows = fx
        .dashboard
        .executor()
        .fetch(
            &Session::new(),
            &Query::select("select PasswordHash from System_Users where Username = ?").bind(username),
            &mut notices,
        )
        .expect("hash query");
    rows.scalar("PasswordHash")
        .and_then(Value::as_str)
        .map(String::from)
        .expect("stored hash")
}

#[test]
fn valid_credentials_establish_the_principal() {
    let fx = common::fixture();
    let mut session = Session::new();
    let mut notices = Notices::new();
    let principal = fx
        .dashboard
        .authenticator()
        .login(&mut session, common::MANAGER, common::MANAGER_PASSWORD, "10.0.0.7", &mut notices)
        .expect("login");
    assert_eq!(principal.username, common::MANAGER);
    assert_eq!(principal.role, "SuperAdmin");
    assert!(session.is_logged_in());
    assert_eq!(session.principal(), Some(&principal));
    assert!(fx.dashboard.policy().visible_pages("SuperAdmin").contains(&PageId::SqlConsole));
    assert_eq!(PageId::SqlConsole.label(), "🛠️ SQL Console");
    assert_eq!(common::count(&fx, "select count(*) from Failed_Logins"), 0);
}

#[test]
fn wrong_password_records_exactly_one_attempt() {
    let fx = common::fixture();
    let mut session = Session::new();
    let mut notices = Notices::new();
    let before = common::count(&fx, "select count(*) from Failed_Logins");
    let result = fx
        .dashboard
        .authenticator()
        .login(&mut session, common::MANAGER, "wrong", "10.0.0.7", &mut notices);
    assert!(matches!(result, Err(HmsError::InvalidCredentials)));
    assert!(!session.is_logged_in());
    assert_eq!(notices.last_error(), Some("Invalid Login Credentials."));
    assert_eq!(common::count(&fx, "select count(*) from Failed_Logins"), before + 1);
    assert_eq!(
        common::count(
            &fx,
            "select count(*) from Failed_Logins where Username = 'mgr1' and IP_Address = '10.0.0.7'"
        ),
        1
    );
}

#[test]
fn unknown_user_is_indistinguishable_from_a_bad_password() {
    let fx = common::fixture();
    let mut session = Session::new();
    let mut notices = Notices::new();
    let result = fx
        .dashboard
        .authenticator()
        .login(&mut session, "nobody", "whatever", "192.168.1.20", &mut notices);
    assert!(matches!(result, Err(HmsError::InvalidCredentials)));
    assert_eq!(notices.last_error(), Some("Invalid Login Credentials."));
    assert_eq!(common::count(&fx, "select count(*) from Failed_Logins where Username = 'nobody'"), 1);
}

#[test]
fn failed_attempt_leaves_an_existing_session_alone() {
    let fx = common::fixture();
    let mut session = common::clerk(&fx);
    let mut notices = Notices::new();
    let result = fx
        .dashboard
        .authenticator()
        .login(&mut session, common::MANAGER, "wrong", "10.0.0.7", &mut notices);
    assert!(result.is_err());
    assert_eq!(session.username(), Some(common::CLERK));
}

#[test]
fn legacy_digest_is_upgraded_on_login() {
    let fx = common::fixture();
    assert!(is_legacy(&stored_hash(&fx, common::MANAGER)));

    let session = common::manager(&fx);
    let upgraded = stored_hash(&fx, common::MANAGER);
    assert!(upgraded.starts_with("$argon2"));

    // the upgraded hash still verifies, and is attributed to the account itself
    common::manager(&fx);
    assert_eq!(
        common::count(
            &fx,
            &format!(
                "select count(*) from Audit_Logs where TableAffected = 'System_Users' and Action = 'UPDATE' and UserID = {}",
                session.principal_id()
            )
        ),
        1
    );
}

#[test]
fn argon2_accounts_are_left_untouched() {
    let fx = common::fixture();
    let before = stored_hash(&fx, common::CLERK);
    let session = common::clerk(&fx);
    assert_eq!(session.role(), Some("Staff"));
    assert_eq!(stored_hash(&fx, common::CLERK), before);
}

#[test]
fn logout_is_idempotent() {
    let fx = common::fixture();
    let mut session = common::manager(&fx);
    let authenticator = fx.dashboard.authenticator();
    authenticator.logout(&mut session);
    assert!(!session.is_logged_in());
    assert_eq!(session.principal_id(), 0);
    authenticator.logout(&mut session);
    assert!(!session.is_logged_in());
    assert!(session.role().is_none());
}

#[test]
fn registry_hands_out_tokens_for_sessions() {
    let fx = common::fixture();
    let registry = fx.dashboard.sessions();
    let token = registry.open(common::clerk(&fx)).expect("open");
    assert_eq!(token.len(), 64);
    assert_eq!(registry.len(), 1);

    let session = registry.get(Some(token.as_str())).expect("get");
    assert_eq!(session.username(), Some(common::CLERK));
    // unknown and missing tokens are simply logged out
    assert!(!registry.get(Some("not-a-token")).expect("get").is_logged_in());
    assert!(!registry.get(None).expect("get").is_logged_in());

    assert!(registry.close(&token).expect("close"));
    assert!(!registry.close(&token).expect("close again"));
    assert!(registry.is_empty());
}

#[test]
fn idle_sessions_are_forgotten() {
    let fx = common::fixture();
    let registry = grandpearl::session::SessionRegistry::with_idle_timeout(std::time::Duration::ZERO);
    let token = registry.open(common::clerk(&fx)).expect("open");
    assert!(!registry.get(Some(token.as_str())).expect("get").is_logged_in());
    assert!(registry.is_empty());
    assert!(!registry.close(&token).expect("close"));

    let registry = grandpearl::session::SessionRegistry::with_idle_timeout(std::time::Duration::from_secs(3600));
    let token = registry.open(common::clerk(&fx)).expect("open");
    assert!(registry.get(Some(token.as_str())).expect("get").is_logged_in());
    assert_eq!(registry.len(), 1);
}

#[test]
fn dashboard_sessions_use_the_configured_idle_timeout() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut settings = common::settings_in(&dir);
    settings.server.session_idle_secs = 0;
    let dashboard = grandpearl::interface::Dashboard::new(settings);
    let token = dashboard.sessions().open(Session::new()).expect("open");
    dashboard.sessions().get(Some(token.as_str())).expect("get");
    assert!(dashboard.sessions().is_empty());
}
