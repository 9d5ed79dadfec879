use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::datatype::Value;
use crate::error::{HmsError, Result};
use crate::inquiry::InquiryForm;
use crate::interface::Dashboard;
use crate::navigator::{PageId, RolePolicy};
use crate::notice::Notices;
use crate::reports::{Insight, InsightFilter};
use crate::session::{Principal, Session};
use crate::users::NewUser;

#[derive(Serialize)]
pub struct PageResponse {
    pub status: String,
    pub elapsed_ms: f64,
    pub notices: Notices,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

type Reply = (StatusCode, Json<PageResponse>);

#[derive(Serialize)]
struct PageView {
    id: PageId,
    label: &'static str,
}

fn page_views(policy: &RolePolicy, role: &str) -> Vec<PageView> {
    policy
        .visible_pages(role)
        .into_iter()
        .map(|id| PageView { id, label: id.label() })
        .collect()
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
}

/// Payload of a successful interaction.
pub fn page_data<T: Serialize>(data: T) -> Result<serde_json::Value> {
    serde_json::to_value(data).map_err(HmsError::from)
}

fn status_for(error: &HmsError) -> StatusCode {
    match error {
        HmsError::InvalidCredentials | HmsError::NotAuthenticated => StatusCode::UNAUTHORIZED,
        HmsError::Forbidden(_) => StatusCode::FORBIDDEN,
        HmsError::Validation(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Run one interaction off the async runtime and package its outcome.
async fn run_page<T, F>(dashboard: Arc<Dashboard>, token: Option<String>, page: F) -> Reply
where
    T: Serialize + Send + 'static,
    F: FnOnce(&Dashboard, &Session, &mut Notices) -> Result<T> + Send + 'static,
{
    let started = Instant::now();
    let joined = tokio::task::spawn_blocking(move || {
        let mut notices = Notices::new();
        let result = dashboard
            .sessions()
            .get(token.as_deref())
            .and_then(|session| page(&dashboard, &session, &mut notices))
            .and_then(page_data);
        (result, notices)
    })
    .await;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    match joined {
        Ok((Ok(data), notices)) => {
            info!(ms = elapsed_ms, notices = notices.len(), "interaction complete");
            let body = PageResponse { status: "ok".into(), elapsed_ms, notices, data: Some(data), error: None };
            (StatusCode::OK, Json(body))
        }
        Ok((Err(e), mut notices)) => {
            let status = status_for(&e);
            // validation and access messages are meant for the user as-is
            if matches!(e, HmsError::Validation(_) | HmsError::Forbidden(_)) {
                notices.error(e.to_string());
            }
            let msg = notices.last_error().map(String::from).unwrap_or_else(|| e.to_string());
            warn!(%msg, code = %status.as_u16(), "interaction failed");
            let body = PageResponse { status: "error".into(), elapsed_ms, notices, data: None, error: Some(msg) };
            (status, Json(body))
        }
        Err(e) => {
            warn!(error = %e, "Join error");
            let body = PageResponse {
                status: "error".into(),
                elapsed_ms,
                notices: Notices::new(),
                data: None,
                error: Some("Join error".into()),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body))
        }
    }
}

// ------------- Session -------------
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
struct LoginReply {
    token: String,
    principal: Principal,
    pages: Vec<PageView>,
}

#[derive(Serialize)]
struct SessionReply {
    logged_in: bool,
    principal: Option<Principal>,
    pages: Vec<PageView>,
}

async fn login(
    State(dashboard): State<Arc<Dashboard>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    Json(req): Json<LoginRequest>,
) -> Reply {
    let source = peer
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| dashboard.settings().server.fallback_source_address.clone());
    run_page(dashboard, None, move |d, _, notices| {
        let mut session = Session::new();
        let principal = d.authenticator().login(&mut session, &req.username, &req.password, &source, notices)?;
        let token = d.sessions().open(session)?;
        Ok(LoginReply { token, pages: page_views(d.policy(), &principal.role), principal })
    })
    .await
}

async fn logout(State(dashboard): State<Arc<Dashboard>>, headers: HeaderMap) -> Reply {
    let token = bearer(&headers);
    run_page(dashboard, token.clone(), move |d, session, _| {
        let mut session = session.clone();
        d.authenticator().logout(&mut session);
        match token {
            Some(token) => d.sessions().close(&token),
            None => Ok(false),
        }
    })
    .await
}

async fn current_session(State(dashboard): State<Arc<Dashboard>>, headers: HeaderMap) -> Reply {
    run_page(dashboard, bearer(&headers), |d, session, _| {
        Ok(SessionReply {
            logged_in: session.is_logged_in(),
            principal: session.principal().cloned(),
            pages: session.role().map(|role| page_views(d.policy(), role)).unwrap_or_default(),
        })
    })
    .await
}

// ------------- Table explorer -------------
#[derive(Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
}

#[derive(Deserialize)]
pub struct EditRequest {
    pub column: String,
    pub value: String,
}

async fn list_tables(
    State(dashboard): State<Arc<Dashboard>>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Reply {
    run_page(dashboard, bearer(&headers), move |d, session, notices| {
        d.tables().tables(session, params.search.as_deref(), notices)
    })
    .await
}

async fn show_table(
    State(dashboard): State<Arc<Dashboard>>,
    headers: HeaderMap,
    Path(table): Path<String>,
) -> Reply {
    run_page(dashboard, bearer(&headers), move |d, session, notices| {
        let crud = d.tables();
        let schema = crud.describe(session, &table, notices)?;
        let rows = crud.list(session, &table, notices)?;
        Ok(serde_json::json!({ "schema": schema, "rows": rows }))
    })
    .await
}

async fn add_row(
    State(dashboard): State<Arc<Dashboard>>,
    headers: HeaderMap,
    Path(table): Path<String>,
    Json(fields): Json<BTreeMap<String, String>>,
) -> Reply {
    run_page(dashboard, bearer(&headers), move |d, session, notices| {
        d.tables().add(session, &table, &fields, notices)
    })
    .await
}

async fn edit_row(
    State(dashboard): State<Arc<Dashboard>>,
    headers: HeaderMap,
    Path((table, key)): Path<(String, String)>,
    Json(edit): Json<EditRequest>,
) -> Reply {
    run_page(dashboard, bearer(&headers), move |d, session, notices| {
        d.tables().edit(session, &table, &Value::Text(key), &edit.column, &edit.value, notices)
    })
    .await
}

async fn delete_row(
    State(dashboard): State<Arc<Dashboard>>,
    headers: HeaderMap,
    Path((table, key)): Path<(String, String)>,
) -> Reply {
    run_page(dashboard, bearer(&headers), move |d, session, notices| {
        d.tables().delete(session, &table, &Value::Text(key), notices)
    })
    .await
}

// ------------- Inquiries & public page -------------
async fn list_inquiries(
    State(dashboard): State<Arc<Dashboard>>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Reply {
    run_page(dashboard, bearer(&headers), move |d, session, notices| {
        d.inquiries().list(session, params.search.as_deref(), notices)
    })
    .await
}

async fn public_rooms(State(dashboard): State<Arc<Dashboard>>) -> Reply {
    run_page(dashboard, None, |d, session, notices| d.inquiries().room_types(session, notices)).await
}

async fn public_amenities(State(dashboard): State<Arc<Dashboard>>) -> Reply {
    run_page(dashboard, None, |d, session, notices| d.inquiries().amenities(session, notices)).await
}

async fn submit_inquiry(State(dashboard): State<Arc<Dashboard>>, Json(form): Json<InquiryForm>) -> Reply {
    run_page(dashboard, None, move |d, session, notices| d.inquiries().submit(session, &form, notices)).await
}

// ------------- Console -------------
#[derive(Deserialize)]
pub struct ConsoleRequest {
    pub sql: String,
}

async fn console(
    State(dashboard): State<Arc<Dashboard>>,
    headers: HeaderMap,
    Json(req): Json<ConsoleRequest>,
) -> Reply {
    run_page(dashboard, bearer(&headers), move |d, session, notices| {
        d.console().run(session, &req.sql, notices)
    })
    .await
}

// ------------- Reports -------------
#[derive(Deserialize)]
pub struct InsightParams {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub department: Option<String>,
}

async fn failed_logins(State(dashboard): State<Arc<Dashboard>>, headers: HeaderMap) -> Reply {
    run_page(dashboard, bearer(&headers), |d, session, notices| {
        d.reports().failed_logins(session, notices)
    })
    .await
}

async fn audit_trail(State(dashboard): State<Arc<Dashboard>>, headers: HeaderMap) -> Reply {
    run_page(dashboard, bearer(&headers), |d, session, notices| {
        d.reports().audit_trail(session, notices)
    })
    .await
}

async fn executive_dashboard(State(dashboard): State<Arc<Dashboard>>, headers: HeaderMap) -> Reply {
    run_page(dashboard, bearer(&headers), |d, session, notices| {
        d.reports().dashboard(session, notices)
    })
    .await
}

async fn departments(State(dashboard): State<Arc<Dashboard>>, headers: HeaderMap) -> Reply {
    run_page(dashboard, bearer(&headers), |d, session, notices| {
        d.reports().departments(session, notices)
    })
    .await
}

async fn insight(
    State(dashboard): State<Arc<Dashboard>>,
    headers: HeaderMap,
    Path(insight): Path<Insight>,
    Query(params): Query<InsightParams>,
) -> Reply {
    let defaults = InsightFilter::default();
    let filter = InsightFilter {
        from: params.from.unwrap_or(defaults.from),
        to: params.to.unwrap_or(defaults.to),
        department: params.department,
    };
    run_page(dashboard, bearer(&headers), move |d, session, notices| {
        d.reports().insight(session, insight, &filter, notices)
    })
    .await
}

// ------------- User management -------------
#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub employee_id: Option<i64>,
    pub username: String,
    pub password: String,
    pub role_id: i64,
}

#[derive(Deserialize)]
pub struct PasswordRequest {
    pub password: String,
    pub confirm: String,
}

async fn list_users(State(dashboard): State<Arc<Dashboard>>, headers: HeaderMap) -> Reply {
    run_page(dashboard, bearer(&headers), |d, session, notices| d.users().list_users(session, notices)).await
}

async fn user_options(State(dashboard): State<Arc<Dashboard>>, headers: HeaderMap) -> Reply {
    run_page(dashboard, bearer(&headers), |d, session, notices| {
        let users = d.users();
        let roles = users.roles(session, notices)?;
        let employees = users.employees(session, notices)?;
        Ok(serde_json::json!({ "roles": roles, "employees": employees }))
    })
    .await
}

async fn create_user(
    State(dashboard): State<Arc<Dashboard>>,
    headers: HeaderMap,
    Json(req): Json<CreateUserRequest>,
) -> Reply {
    let user = NewUser {
        employee_id: req.employee_id,
        username: req.username,
        password: req.password,
        role_id: req.role_id,
    };
    run_page(dashboard, bearer(&headers), move |d, session, notices| {
        d.users().create_user(session, &user, notices)
    })
    .await
}

async fn change_password(
    State(dashboard): State<Arc<Dashboard>>,
    headers: HeaderMap,
    Path(username): Path<String>,
    Json(req): Json<PasswordRequest>,
) -> Reply {
    run_page(dashboard, bearer(&headers), move |d, session, notices| {
        d.users().change_password(session, &username, &req.password, &req.confirm, notices)
    })
    .await
}

async fn delete_user(
    State(dashboard): State<Arc<Dashboard>>,
    headers: HeaderMap,
    Path(username): Path<String>,
) -> Reply {
    run_page(dashboard, bearer(&headers), move |d, session, notices| {
        d.users().delete_user(session, &username, notices)
    })
    .await
}

pub fn router(dashboard: Arc<Dashboard>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);
    Router::new()
        .route("/v1/login", post(login))
        .route("/v1/logout", post(logout))
        .route("/v1/session", get(current_session))
        .route("/v1/tables", get(list_tables))
        .route("/v1/tables/:table", get(show_table))
        .route("/v1/tables/:table/rows", post(add_row))
        .route("/v1/tables/:table/rows/:key", put(edit_row).delete(delete_row))
        .route("/v1/inquiries", get(list_inquiries))
        .route("/v1/console", post(console))
        .route("/v1/security/failed-logins", get(failed_logins))
        .route("/v1/security/audit", get(audit_trail))
        .route("/v1/dashboard", get(executive_dashboard))
        .route("/v1/insights/departments", get(departments))
        .route("/v1/insights/:insight", get(insight))
        .route("/v1/users", get(list_users).post(create_user))
        .route("/v1/users/options", get(user_options))
        .route("/v1/users/:username/password", put(change_password))
        .route("/v1/users/:username", axum::routing::delete(delete_user))
        .route("/v1/public/rooms", get(public_rooms))
        .route("/v1/public/amenities", get(public_amenities))
        .route("/v1/public/inquiries", post(submit_inquiry))
        .layer(cors)
        .with_state(dashboard)
}
