mod common;

use std::collections::BTreeSet;

use grandpearl::HmsError;
use grandpearl::navigator::{PageId, RoleGrant, RolePolicy};
use grandpearl::notice::Notices;
use grandpearl::session::{Principal, Session};
use grandpearl::settings::AccessSettings;

fn session_as(role: &str) -> Session {
    let mut session = Session::new();
    session.establish(Principal { id: 7, username: "someone".to_string(), role: role.to_string() });
    session
}

fn catalog() -> Vec<String> {
    [
        "Audit_Logs",
        "Booking_Inquiries",
        "Employees",
        "Failed_Logins",
        "Rooms",
        "System_Users",
        "User_Roles_Security",
    ]
    .iter()
    .map(|t| t.to_string())
    .collect()
}

#[test]
fn non_elevated_roles_never_see_denied_tables() {
    let policy = RolePolicy::new(&AccessSettings::default());
    for role in ["Staff", "Housekeeping", "", "guest"] {
        let visible = policy.visible_tables(role, &catalog());
        assert!(visible.iter().all(|t| !policy.is_sensitive(t)), "{role}: {visible:?}");
        assert_eq!(visible, vec!["Booking_Inquiries", "Employees", "Rooms"]);
    }
}

#[test]
fn elevated_role_sees_the_whole_catalog() {
    let policy = RolePolicy::new(&AccessSettings::default());
    assert_eq!(policy.visible_tables("SuperAdmin", &catalog()), catalog());
    // role names compare trimmed and case-insensitively
    assert_eq!(policy.visible_tables(" superadmin ", &catalog()), catalog());
}

#[test]
fn elevated_pages_are_a_superset_of_the_baseline() {
    let policy = RolePolicy::new(&AccessSettings::default());
    let staff = policy.visible_pages("Staff");
    let admin = policy.visible_pages("SuperAdmin");
    assert_eq!(staff, BTreeSet::from([PageId::TableExplorer, PageId::QuickInsights]));
    assert!(admin.is_superset(&staff));
    assert_eq!(admin.len(), PageId::ALL.len());
    assert!(!staff.contains(&PageId::SqlConsole));
}

#[test]
fn pages_come_back_in_navigation_order() {
    let policy = RolePolicy::new(&AccessSettings::default());
    let pages: Vec<PageId> = policy.visible_pages("SuperAdmin").into_iter().collect();
    assert_eq!(pages, PageId::ALL.to_vec());
    for page in PageId::ALL {
        assert_eq!(PageId::from_label(page.label()), Some(page));
    }
}

#[test]
fn permits_distinguishes_anonymous_from_forbidden() {
    let policy = RolePolicy::new(&AccessSettings::default());
    assert!(matches!(
        policy.permits(&Session::new(), PageId::TableExplorer),
        Err(HmsError::NotAuthenticated)
    ));
    assert!(matches!(
        policy.permits(&session_as("Staff"), PageId::SqlConsole),
        Err(HmsError::Forbidden(_))
    ));
    assert!(policy.permits(&session_as("Staff"), PageId::QuickInsights).is_ok());
    assert!(policy.permits(&session_as("SuperAdmin"), PageId::SecurityLogs).is_ok());
}

#[test]
fn extra_roles_can_be_granted_pages_without_sensitive_tables() {
    let mut access = AccessSettings::default();
    access.roles.insert(
        "FrontDesk".to_string(),
        RoleGrant { pages: vec![PageId::GuestInquiries], sensitive_tables: false },
    );
    let policy = RolePolicy::new(&access);
    let pages = policy.visible_pages("frontdesk");
    assert!(pages.contains(&PageId::GuestInquiries));
    assert!(!pages.contains(&PageId::UserManagement));
    assert!(!policy.sees_sensitive_tables("FrontDesk"));
}

#[test]
fn clerk_listing_hides_sensitive_tables_in_a_live_catalog() {
    let fx = common::fixture();
    let clerk = common::clerk(&fx);
    let manager = common::manager(&fx);
    let mut notices = Notices::new();
    let clerk_tables = fx.dashboard.tables().tables(&clerk, None, &mut notices).expect("clerk tables");
    let manager_tables = fx.dashboard.tables().tables(&manager, None, &mut notices).expect("manager tables");
    for denied in fx.dashboard.policy().deny_list() {
        assert!(!clerk_tables.contains(denied), "{denied} leaked");
        assert!(manager_tables.contains(denied), "{denied} missing");
    }
    assert_eq!(manager_tables.len(), clerk_tables.len() + fx.dashboard.policy().deny_list().len());
}
