mod common;

use grandpearl::connection::ConnectionProvider;
use grandpearl::context::SessionContextBinder;
use grandpearl::datatype::Value;
use grandpearl::executor::Query;
use grandpearl::notice::Notices;
use grandpearl::session::{ANONYMOUS_PRINCIPAL, Session};

#[test]
fn bound_principal_is_visible_to_statements() {
    let fx = common::fixture();
    let session = common::manager(&fx);
    let mut notices = Notices::new();
    let rows = fx
        .dashboard
        .executor()
        .fetch(&session, &Query::select("select session_context('UserID') as uid"), &mut notices)
        .expect("context query");
    assert_eq!(rows.scalar("uid"), Some(&Value::Integer(session.principal_id())));
    assert!(session.principal_id() != ANONYMOUS_PRINCIPAL);
}

#[test]
fn anonymous_work_binds_the_sentinel() {
    let fx = common::fixture();
    let mut notices = Notices::new();
    let rows = fx
        .dashboard
        .executor()
        .fetch(&Session::new(), &Query::select("select session_context('UserID') as uid"), &mut notices)
        .expect("context query");
    assert_eq!(rows.scalar("uid"), Some(&Value::Integer(ANONYMOUS_PRINCIPAL)));
    // the sentinel is not a real account
    let real = common::count(&fx, "select count(*) from System_Users where UserID = 0");
    assert_eq!(real, 0);
}

#[test]
fn unknown_keys_are_null() {
    let fx = common::fixture();
    let connection = ConnectionProvider::new(fx.dashboard.settings().database.clone())
        .acquire()
        .expect("connection");
    SessionContextBinder::new().bind(&connection, 42).expect("bind");
    let uid: i64 = connection
        .query_row("select session_context('UserID')", [], |r| r.get(0))
        .expect("uid");
    let other: Option<i64> = connection
        .query_row("select session_context('TenantID')", [], |r| r.get(0))
        .expect("other");
    assert_eq!(uid, 42);
    assert_eq!(other, None);
}

#[test]
fn audit_triggers_attribute_writes_to_the_acting_principal() {
    let fx = common::fixture();
    let session = common::manager(&fx);
    let mut notices = Notices::new();
    fx.dashboard
        .tables()
        .edit(&session, "Rooms", &Value::Integer(2), "Status", "Occupied", &mut notices)
        .expect("edit");
    let rows = fx
        .dashboard
        .executor()
        .fetch(
            &Session::new(),
            &Query::select("select UserID, Action, TableAffected from Audit_Logs order by LogID desc limit 1"),
            &mut notices,
        )
        .expect("audit");
    let last = rows.row(0).expect("audit row");
    assert_eq!(last.get("UserID"), Some(&Value::Integer(session.principal_id())));
    assert_eq!(last.get("Action"), Some(&Value::from("UPDATE")));
    assert_eq!(last.get("TableAffected"), Some(&Value::from("Rooms")));

    // seeding ran as nobody
    let anonymous = common::count(&fx, "select count(*) from Audit_Logs where UserID = 0 and TableAffected = 'Rooms'");
    assert_eq!(anonymous, 4);
}
