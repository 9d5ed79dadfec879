//! Grand Pearl – data access and session authorization for a hotel dashboard.
//!
//! The dashboard has two faces: a public booking-inquiry page and an internal
//! admin console. Both sit on a relational database of rooms, guests,
//! reservations, staff, inventory and billing. This crate is the layer every
//! page goes through:
//!
//! * [`connection::ConnectionProvider`] – a fresh connection per operation,
//!   closed on every exit path.
//! * [`context::SessionContextBinder`] – pins the acting principal's id into
//!   the database session before any statement, for audit triggers.
//! * [`executor::QueryExecutor`] – runs one parameterized statement and
//!   returns a [`executor::RowSet`] or a commit outcome; failures become
//!   user-visible [`notice::Notices`] and a "no result" sentinel.
//! * [`auth::Authenticator`] – credentials against stored digests, failed
//!   attempts recorded, session principal established.
//! * [`navigator::RolePolicy`] – which pages and tables a role may reach.
//! * [`crud::TableCrud`] – list/add/edit/delete on any table, driven by
//!   catalog introspection.
//!
//! Page components built on top: [`inquiry`], [`users`], [`reports`] and
//! the ad-hoc [`console`]. [`interface::Dashboard`] wires them together and
//! [`server`] exposes them over HTTP.
//!
//! ## Sessions
//! There is no ambient session state. A [`session::Session`] is created
//! logged out, filled in by a successful login, passed by reference into
//! every operation that needs an identity, and cleared at logout.
//!
//! ## Quick Start
//! ```
//! use grandpearl::interface::Dashboard;
//! use grandpearl::inquiry::InquiryForm;
//! use grandpearl::notice::Notices;
//! use grandpearl::session::Session;
//! use grandpearl::settings::Settings;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let mut settings = Settings::default();
//! settings.database.path = dir.path().join("grand_pearl.db");
//! settings.bootstrap.admin_password = Some("change-me".to_string());
//! let dashboard = Dashboard::new(settings);
//! dashboard.bootstrap().unwrap();
//!
//! let visitor = Session::new();
//! let mut notices = Notices::new();
//! let form = InquiryForm {
//!     guest_name: "Ali Khan".to_string(),
//!     phone: "03001234567".to_string(),
//!     room: "Deluxe Suite".to_string(),
//! };
//! dashboard.inquiries().submit(&visitor, &form, &mut notices).unwrap();
//! assert!(!notices.has_errors());
//! ```

pub mod auth;
pub mod connection;
pub mod console;
pub mod context;
pub mod crud;
pub mod datatype;
pub mod error;
pub mod executor;
pub mod inquiry;
pub mod interface;
pub mod navigator;
pub mod notice;
pub mod password;
pub mod reports;
pub mod schema;
pub mod server;
pub mod session;
pub mod settings;
pub mod users;

pub use error::{HmsError, Result};
