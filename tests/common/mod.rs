#![allow(dead_code)]

use grandpearl::interface::Dashboard;
use grandpearl::executor::Query;
use grandpearl::notice::Notices;
use grandpearl::password::{PasswordScheme, hash_password};
use grandpearl::session::Session;
use grandpearl::settings::Settings;
use tempfile::TempDir;

pub const MANAGER: &str = "mgr1";
pub const MANAGER_PASSWORD: &str = "pearl#2025";
pub const CLERK: &str = "clerk1";
pub const CLERK_PASSWORD: &str = "front-desk";

/// A bootstrapped dashboard on a throw-away database file.
pub struct Fixture {
    // keeps the database directory alive for the test
    _dir: TempDir,
    pub dashboard: Dashboard,
}

pub fn settings_in(dir: &TempDir) -> Settings {
    let mut settings = Settings::default();
    settings.database.path = dir.path().join("grand_pearl.db");
    settings.bootstrap.admin_password = Some("bootstrap-admin".to_string());
    settings
}

pub fn fixture() -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let dashboard = Dashboard::new(settings_in(&dir));
    dashboard.bootstrap().expect("bootstrap");
    seed(&dashboard);
    Fixture { _dir: dir, dashboard }
}

/// Runs a statement as nobody and insists that it worked.
pub fn exec(dashboard: &Dashboard, query: Query) -> usize {
    let mut notices = Notices::new();
    dashboard
        .executor()
        .apply(&Session::new(), &query, &mut notices)
        .unwrap_or_else(|e| panic!("seed failed: {e}: {notices:?}"))
}

fn seed(dashboard: &Dashboard) {
    // the manager still carries a legacy unsalted digest
    exec(
        dashboard,
        Query::mutate("insert into Departments (DeptID, DeptName) values (1, 'Housekeeping'), (2, 'Front Office')"),
    );
    exec(
        dashboard,
        Query::mutate("insert into Designations (DesigID, Title) values (1, 'Supervisor'), (2, 'Receptionist')"),
    );
    exec(
        dashboard,
        Query::mutate(
            "insert into Employees (EmpID, FullName, DeptID, DesigID, Salary) values
                (1, 'Sana Iqbal', 1, 1, 85000),
                (2, 'Bilal Ahmed', 2, 2, 60000)",
        ),
    );
    exec(
        dashboard,
        Query::mutate("insert into System_Users (EmpID, Username, PasswordHash, RoleID) values (?, ?, ?, 1)")
            .bind(1_i64)
            .bind(MANAGER)
            .bind(hash_password(PasswordScheme::Sha256, MANAGER_PASSWORD).expect("digest")),
    );
    exec(
        dashboard,
        Query::mutate("insert into System_Users (EmpID, Username, PasswordHash, RoleID) values (?, ?, ?, 2)")
            .bind(2_i64)
            .bind(CLERK)
            .bind(hash_password(PasswordScheme::Argon2, CLERK_PASSWORD).expect("hash")),
    );
    exec(
        dashboard,
        Query::mutate(
            "insert into Room_Types (TypeID, TypeName, BasePrice, Description) values
                (1, 'Deluxe Suite', 45000, 'King bed, city view'),
                (2, 'Standard Room', 18000, 'Queen bed')",
        ),
    );
    exec(
        dashboard,
        Query::mutate(
            "insert into Rooms (RoomID, RoomNumber, TypeID, Status) values
                (1, '101', 1, 'Occupied'),
                (2, '102', 2, 'Available'),
                (3, '201', 1, 'Available'),
                (4, '202', 2, 'Occupied')",
        ),
    );
}

pub fn login(fixture: &Fixture, username: &str, password: &str) -> Session {
    let mut session = Session::new();
    let mut notices = Notices::new();
    fixture
        .dashboard
        .authenticator()
        .login(&mut session, username, password, "10.0.0.7", &mut notices)
        .expect("login");
    session
}

pub fn manager(fixture: &Fixture) -> Session {
    login(fixture, MANAGER, MANAGER_PASSWORD)
}

pub fn clerk(fixture: &Fixture) -> Session {
    login(fixture, CLERK, CLERK_PASSWORD)
}

pub fn count(fixture: &Fixture, sql: &str) -> i64 {
    let mut notices = Notices::new();
    let rows = fixture
        .dashboard
        .executor()
        .fetch(&Session::new(), &Query::select(sql), &mut notices)
        .expect("count query");
    rows.row(0)
        .and_then(|r| r.values().first().and_then(|v| v.as_i64()))
        .expect("count value")
}
