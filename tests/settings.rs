use std::io::Write;
use std::path::PathBuf;

use grandpearl::HmsError;
use grandpearl::navigator::{PageId, RolePolicy};
use grandpearl::password::PasswordScheme;
use grandpearl::settings::Settings;

#[test]
fn defaults_point_at_the_local_database() {
    let settings = Settings::default();
    assert_eq!(settings.database.path, PathBuf::from("grand_pearl.db"));
    assert!(settings.database.foreign_keys);
    assert!(!settings.database.create_if_missing);
    assert_eq!(settings.auth.password_scheme, PasswordScheme::Argon2);
    assert!(settings.auth.upgrade_legacy_hashes);
    assert_eq!(settings.bootstrap.admin_role, "SuperAdmin");
    assert_eq!(settings.access.sensitive_tables.len(), 4);
}

#[test]
fn file_values_override_defaults() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().expect("tempfile");
    write!(
        file,
        r#"
[database]
path = "/var/lib/grandpearl/hotel.db"
busy_timeout_ms = 250

[server]
bind = "0.0.0.0:9000"

[auth]
password_scheme = "sha256"

[access.roles.FrontDesk]
pages = ["guest_inquiries"]
sensitive_tables = false
"#
    )
    .expect("write settings");

    let settings = Settings::load(Some(file.path())).expect("load");
    assert_eq!(settings.database.path, PathBuf::from("/var/lib/grandpearl/hotel.db"));
    assert_eq!(settings.database.busy_timeout_ms, 250);
    assert!(settings.database.foreign_keys);
    assert_eq!(settings.server.bind, "0.0.0.0:9000");
    assert_eq!(settings.auth.password_scheme, PasswordScheme::Sha256);

    let policy = RolePolicy::new(&settings.access);
    assert!(policy.visible_pages("FrontDesk").contains(&PageId::GuestInquiries));
    assert!(policy.visible_pages("FrontDesk").contains(&PageId::TableExplorer));
}

#[test]
fn explicit_file_must_exist() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("absent.toml");
    assert!(matches!(Settings::load(Some(missing.as_path())), Err(HmsError::Config(_))));
}
