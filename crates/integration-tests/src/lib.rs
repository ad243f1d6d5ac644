//! Integration tests for the portfolio client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p portfolio-integration-tests
//! ```
//!
//! Every test starts its own [`MockBackend`]: an axum server on an ephemeral
//! localhost port that speaks the site backend's wire format, seeded with a
//! small fixed data set. The backend records each request it receives and
//! can be told to fail, stall or drop specific routes, so tests can assert
//! both on client state and on exactly what went over the wire.
//!
//! # Test Categories
//!
//! - `auth_flow` - Login, registration and session persistence
//! - `moderation` - Admin endpoints and error classification
//! - `admin_panel` - Role gate, concurrent bootstrap and cache updates
//! - `public_forms` - Contact/testimonial forms and the public list

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Path as RoutePath, Request, State};
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use portfolio_client::{ClientConfig, PortfolioClient};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Bearer token the seeded admin account logs in with.
pub const ADMIN_TOKEN: &str = "admin-token";

/// Bearer token the seeded regular account logs in with.
pub const USER_TOKEN: &str = "user-token";

/// Seeded admin credentials.
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin123";

/// Seeded regular-user credentials.
pub const USER_EMAIL: &str = "test@example.com";
pub const USER_PASSWORD: &str = "password123";

/// A request as the backend saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    /// Raw `Authorization` header.
    pub authorization: Option<String>,
    /// Parsed JSON body, if the request had one.
    pub body: Option<Value>,
}

/// How a route misbehaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Answer with this status and an empty body.
    Status(u16),
    /// Wait before handling the request normally.
    Delay(Duration),
    /// Abort the connection without a complete response.
    DropConnection,
    /// Answer 200 with a body that is not JSON.
    MalformedBody,
    /// Handle the request normally, but answer a success with a bare
    /// `{"message": ...}` instead of the updated record.
    Acknowledge,
}

#[derive(Debug, Default)]
struct BackendState {
    requests: Vec<RecordedRequest>,
    faults: HashMap<(Method, String), Fault>,
    /// Bearer token -> user id.
    tokens: HashMap<String, i64>,
    users: Vec<Value>,
    testimonials: Vec<Value>,
    messages: Vec<Value>,
    inquiries: Vec<Value>,
    login_response: Option<Value>,
    public_testimonials: Option<Vec<Value>>,
    next_id: i64,
}

type Shared = Arc<Mutex<BackendState>>;

fn lock(state: &Shared) -> MutexGuard<'_, BackendState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process stand-in for the site backend.
///
/// The server task is aborted when the backend is dropped.
#[derive(Debug)]
pub struct MockBackend {
    addr: SocketAddr,
    state: Shared,
    server: JoinHandle<()>,
}

impl MockBackend {
    /// Start a seeded backend on an ephemeral port.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(seeded()));
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend address");
        let app = router(Arc::clone(&state));
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            state,
            server,
        }
    }

    /// Base URL the client should be pointed at.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client configuration for this backend, persisting the session at
    /// `session_path` and resetting forms quickly.
    ///
    /// # Panics
    ///
    /// Panics if the base URL is rejected, which cannot happen for a bound
    /// socket address.
    #[must_use]
    pub fn config(&self, session_path: &Path) -> ClientConfig {
        let mut config =
            ClientConfig::new(&self.base_url(), session_path).expect("mock backend URL");
        config.http_timeout = Some(Duration::from_secs(5));
        config.form_reset_delay = Duration::from_millis(50);
        config
    }

    /// A client for this backend with its session stored at `session_path`.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn client(&self, session_path: &Path) -> PortfolioClient {
        PortfolioClient::new(&self.config(session_path)).expect("portfolio client")
    }

    /// Every request received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state).requests.clone()
    }

    /// Requests received for `method` on exactly `path`.
    #[must_use]
    pub fn requests_to(&self, method: &Method, path: &str) -> Vec<RecordedRequest> {
        lock(&self.state)
            .requests
            .iter()
            .filter(|request| request.method == *method && request.path == path)
            .cloned()
            .collect()
    }

    /// Forget recorded requests.
    pub fn clear_requests(&self) {
        lock(&self.state).requests.clear();
    }

    /// Make `method` on exactly `path` misbehave until cleared.
    pub fn inject(&self, method: Method, path: &str, fault: Fault) {
        lock(&self.state).faults.insert((method, path.to_string()), fault);
    }

    /// Remove every injected fault.
    pub fn clear_faults(&self) {
        lock(&self.state).faults.clear();
    }

    /// Answer every successful login with `body` instead of the account's
    /// own token and user.
    pub fn respond_to_login(&self, body: Value) {
        lock(&self.state).login_response = Some(body);
    }

    /// Serve `rows` from the public testimonial endpoint instead of the
    /// approved subset of the stored testimonials.
    pub fn serve_public_testimonials(&self, rows: Vec<Value>) {
        lock(&self.state).public_testimonials = Some(rows);
    }

    /// Stored testimonial row with `id`.
    #[must_use]
    pub fn testimonial(&self, id: i64) -> Option<Value> {
        find(&lock(&self.state).testimonials, id).cloned()
    }

    /// Stored contact message row with `id`.
    #[must_use]
    pub fn message(&self, id: i64) -> Option<Value> {
        find(&lock(&self.state).messages, id).cloned()
    }

    /// Number of stored testimonials.
    #[must_use]
    pub fn testimonial_count(&self) -> usize {
        lock(&self.state).testimonials.len()
    }

    /// Number of stored contact messages.
    #[must_use]
    pub fn message_count(&self) -> usize {
        lock(&self.state).messages.len()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

// =============================================================================
// Fixtures
// =============================================================================

fn seeded() -> BackendState {
    BackendState {
        tokens: HashMap::from([(ADMIN_TOKEN.to_string(), 1), (USER_TOKEN.to_string(), 2)]),
        users: vec![
            json!({
                "id": 1, "username": "admin", "email": ADMIN_EMAIL,
                "password": ADMIN_PASSWORD, "role": "admin",
                "created_at": "2024-09-01 09:00:00"
            }),
            json!({
                "id": 2, "username": "testuser", "email": USER_EMAIL,
                "password": USER_PASSWORD, "role": "user",
                "created_at": "2024-09-02 10:30:00"
            }),
        ],
        testimonials: vec![
            json!({
                "id": 4, "name": "Michael Chen", "email": "michael@example.com",
                "company": "Northwind", "position": "CTO",
                "message": "Delivered the platform ahead of schedule.",
                "rating": 5, "status": "approved",
                "created_at": "2024-09-10 12:00:00"
            }),
            json!({
                "id": 5, "name": "Sarah Johnson", "email": "sarah@example.com",
                "company": "Contoso", "position": "Product Manager",
                "message": "Great communication throughout.",
                "rating": 4, "status": "pending",
                "created_at": "2024-09-12 08:15:00"
            }),
            json!({
                "id": 6, "name": "Emily Davis", "email": "emily@example.com",
                "company": "", "position": "Founder",
                "message": "Would hire again.",
                "rating": 5, "status": "pending",
                "created_at": "2024-09-14 16:45:00"
            }),
            json!({
                "id": 7, "name": "Spam Bot", "email": "bot@example.com",
                "company": "", "position": "",
                "message": "Buy now.",
                "rating": 1, "status": "rejected",
                "created_at": "2024-09-15 03:00:00"
            }),
        ],
        messages: vec![
            json!({
                "id": 11, "name": "Ada Lovelace", "email": "ada@example.com",
                "subject": "Project inquiry", "message": "Are you available in October?",
                "status": "unread", "replied": 0,
                "created_at": "2024-09-16 09:30:00"
            }),
            json!({
                "id": 12, "name": "Grace Hopper", "email": "grace@example.com",
                "subject": "General Inquiry", "message": "Loved the portfolio.",
                "status": "in-progress", "replied": 1,
                "created_at": "2024-09-13 11:00:00"
            }),
        ],
        inquiries: vec![json!({
            "id": 21, "name": "Alan Turing", "email": "alan@example.com",
            "phone": "+1 555 0100", "service_type": "Web Application",
            "project_description": "Inventory dashboard",
            "budget_range": "$5k-$10k", "timeline": "2 months",
            "status": "new", "created_at": "2024-09-11 14:20:00"
        })],
        next_id: 100,
        ..BackendState::default()
    }
}

fn find(rows: &[Value], id: i64) -> Option<&Value> {
    rows.iter().find(|row| id_of(row) == Some(id))
}

fn find_mut(rows: &mut [Value], id: i64) -> Option<&mut Value> {
    rows.iter_mut().find(|row| id_of(row) == Some(id))
}

fn id_of(row: &Value) -> Option<i64> {
    row.get("id").and_then(Value::as_i64)
}

fn set_field(row: &mut Value, field: &str, value: Value) {
    if let Some(object) = row.as_object_mut() {
        object.insert(field.to_string(), value);
    }
}

fn count_where(rows: &[Value], field: &str, value: &str) -> usize {
    rows.iter().filter(|row| str_field(row, field) == value).count()
}

fn str_field<'a>(row: &'a Value, field: &str) -> &'a str {
    row.get(field).and_then(Value::as_str).unwrap_or_default()
}

// =============================================================================
// Routing
// =============================================================================

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/testimonials", get(public_testimonials).post(submit_testimonial))
        .route("/api/contact", post(submit_contact))
        .route("/api/admin/stats", get(stats))
        .route("/api/admin/testimonials", get(admin_testimonials))
        .route(
            "/api/admin/testimonials/{id}",
            put(update_testimonial).delete(delete_testimonial),
        )
        .route("/api/admin/messages", get(admin_messages))
        .route("/api/admin/contact-messages/{id}", patch(update_message))
        .route("/api/admin/shop-inquiries", get(admin_inquiries))
        .route("/api/admin/users", get(admin_users))
        .layer(middleware::from_fn_with_state(Arc::clone(&state), record))
        .with_state(state)
}

/// Record the request, then apply any fault injected for its route.
async fn record(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let Ok(bytes) = axum::body::to_bytes(body, usize::MAX).await else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    let path = parts.uri.path().to_string();
    let fault = {
        let mut state = lock(&state);
        state.requests.push(RecordedRequest {
            method: parts.method.clone(),
            path: path.clone(),
            authorization: parts
                .headers
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string),
            body: serde_json::from_slice(&bytes).ok(),
        });
        state.faults.get(&(parts.method.clone(), path)).copied()
    };

    match fault {
        Some(Fault::Status(code)) => {
            StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR).into_response()
        }
        Some(Fault::DropConnection) => {
            let aborted = futures::stream::once(async {
                Err::<String, _>(std::io::Error::from(std::io::ErrorKind::ConnectionAborted))
            });
            Response::new(Body::from_stream(aborted))
        }
        Some(Fault::MalformedBody) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            "{\"unterminated\": ",
        )
            .into_response(),
        Some(Fault::Delay(delay)) => {
            tokio::time::sleep(delay).await;
            next.run(Request::from_parts(parts, Body::from(bytes))).await
        }
        Some(Fault::Acknowledge) => {
            let response = next.run(Request::from_parts(parts, Body::from(bytes))).await;
            if response.status().is_success() {
                Json(json!({ "message": "Updated successfully" })).into_response()
            } else {
                response
            }
        }
        None => next.run(Request::from_parts(parts, Body::from(bytes))).await,
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Resolve the bearer token to an admin user, or the response to send.
fn require_admin(state: &BackendState, headers: &HeaderMap) -> Result<(), Response> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Authorization token is required"))?;

    let user = state
        .tokens
        .get(token)
        .and_then(|id| find(&state.users, *id))
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Invalid or expired token"))?;

    if str_field(user, "role") == "admin" {
        Ok(())
    } else {
        Err(error(StatusCode::FORBIDDEN, "Admin access required"))
    }
}

fn public_user(user: &Value) -> Value {
    json!({
        "id": user.get("id"),
        "username": user.get("username"),
        "email": user.get("email"),
        "role": user.get("role"),
    })
}

// =============================================================================
// Auth
// =============================================================================

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let identifier = str_field(&body, "email");
    let password = str_field(&body, "password");
    if identifier.is_empty() || password.is_empty() {
        return error(StatusCode::BAD_REQUEST, "Email and password are required");
    }

    let state = lock(&state);
    let Some(user) = state.users.iter().find(|user| {
        (str_field(user, "email") == identifier || str_field(user, "username") == identifier)
            && str_field(user, "password") == password
    }) else {
        return error(StatusCode::UNAUTHORIZED, "Invalid credentials");
    };

    if let Some(response) = &state.login_response {
        return Json(response.clone()).into_response();
    }

    let token = state
        .tokens
        .iter()
        .find(|(_, id)| Some(**id) == id_of(user))
        .map(|(token, _)| token.clone())
        .unwrap_or_default();
    Json(json!({ "token": token, "user": public_user(user) })).into_response()
}

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let username = str_field(&body, "username").to_string();
    let email = str_field(&body, "email").to_string();
    let password = str_field(&body, "password").to_string();
    if username.is_empty() || email.is_empty() || password.is_empty() {
        return error(StatusCode::BAD_REQUEST, "All fields are required");
    }

    let mut state = lock(&state);
    if state
        .users
        .iter()
        .any(|user| str_field(user, "username") == username || str_field(user, "email") == email)
    {
        return error(StatusCode::BAD_REQUEST, "Username or email already exists");
    }

    state.next_id += 1;
    let id = state.next_id;
    let token = format!("token-{id}");
    let user = json!({
        "id": id, "username": username, "email": email,
        "password": password, "role": "user",
        "created_at": "2024-09-20 10:00:00"
    });
    let response = json!({
        "message": "User created successfully",
        "token": token,
        "user": public_user(&user),
    });
    state.tokens.insert(token, id);
    state.users.push(user);

    (StatusCode::CREATED, Json(response)).into_response()
}

// =============================================================================
// Public forms
// =============================================================================

async fn public_testimonials(State(state): State<Shared>) -> Response {
    let state = lock(&state);
    let rows = state.public_testimonials.clone().unwrap_or_else(|| {
        state
            .testimonials
            .iter()
            .filter(|row| str_field(row, "status") == "approved")
            .cloned()
            .collect()
    });
    Json(rows).into_response()
}

async fn submit_testimonial(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    if str_field(&body, "name").is_empty() || str_field(&body, "message").is_empty() {
        return error(StatusCode::BAD_REQUEST, "Name and message are required");
    }

    let mut state = lock(&state);
    state.next_id += 1;
    let id = state.next_id;
    state.testimonials.push(json!({
        "id": id,
        "name": body.get("name"),
        "email": body.get("email"),
        "company": body.get("company"),
        "position": body.get("position"),
        "message": body.get("message"),
        "rating": body.get("rating"),
        "status": "pending",
        "created_at": "2024-09-20 10:00:00"
    }));

    (
        StatusCode::CREATED,
        Json(json!({ "message": "Testimonial submitted for review", "id": id })),
    )
        .into_response()
}

async fn submit_contact(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    if ["name", "email", "message"]
        .iter()
        .any(|field| str_field(&body, field).is_empty())
    {
        return error(StatusCode::BAD_REQUEST, "Name, email and message are required");
    }

    let mut state = lock(&state);
    state.next_id += 1;
    let id = state.next_id;
    state.messages.push(json!({
        "id": id,
        "name": body.get("name"),
        "email": body.get("email"),
        "subject": body.get("subject"),
        "message": body.get("message"),
        "status": "unread",
        "replied": 0,
        "created_at": "2024-09-20 10:00:00"
    }));

    (
        StatusCode::CREATED,
        Json(json!({ "message": "Message sent successfully", "id": id })),
    )
        .into_response()
}

// =============================================================================
// Admin
// =============================================================================

async fn stats(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    if let Err(response) = require_admin(&state, &headers) {
        return response;
    }

    let replied = state
        .messages
        .iter()
        .filter(|row| row.get("replied").and_then(Value::as_i64) == Some(1))
        .count();

    let entry = |kind: &str, row: &Value| {
        json!({ "type": kind, "name": row.get("name"), "created_at": row.get("created_at") })
    };
    let mut activity: Vec<Value> = state
        .testimonials
        .iter()
        .map(|row| entry("testimonial", row))
        .chain(state.messages.iter().map(|row| entry("contact", row)))
        .collect();
    activity.sort_by(|a, b| str_field(b, "created_at").cmp(str_field(a, "created_at")));
    activity.truncate(5);

    Json(json!({
        "totalUsers": state.users.len(),
        "totalTestimonials": state.testimonials.len(),
        "pendingTestimonials": count_where(&state.testimonials, "status", "pending"),
        "totalMessages": state.messages.len(),
        "unreadMessages": count_where(&state.messages, "status", "unread"),
        "contactMessages": { "total": state.messages.len(), "replied": replied },
        "shopInquiries": {
            "total": state.inquiries.len(),
            "completed": count_where(&state.inquiries, "status", "completed"),
        },
        "recentActivity": activity,
    }))
    .into_response()
}

async fn admin_testimonials(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    match require_admin(&state, &headers) {
        Ok(()) => Json(state.testimonials.clone()).into_response(),
        Err(response) => response,
    }
}

async fn update_testimonial(
    State(state): State<Shared>,
    RoutePath(id): RoutePath<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = lock(&state);
    if let Err(response) = require_admin(&state, &headers) {
        return response;
    }

    let status = str_field(&body, "status").to_string();
    if !["pending", "approved", "rejected"].contains(&status.as_str()) {
        return error(StatusCode::BAD_REQUEST, "Invalid status");
    }

    match find_mut(&mut state.testimonials, id) {
        Some(row) => {
            set_field(row, "status", Value::String(status));
            Json(row.clone()).into_response()
        }
        None => error(StatusCode::NOT_FOUND, "Testimonial not found"),
    }
}

async fn delete_testimonial(
    State(state): State<Shared>,
    RoutePath(id): RoutePath<i64>,
    headers: HeaderMap,
) -> Response {
    let mut state = lock(&state);
    if let Err(response) = require_admin(&state, &headers) {
        return response;
    }

    let before = state.testimonials.len();
    state.testimonials.retain(|row| id_of(row) != Some(id));
    if state.testimonials.len() == before {
        return error(StatusCode::NOT_FOUND, "Testimonial not found");
    }
    Json(json!({ "message": "Testimonial deleted successfully" })).into_response()
}

async fn admin_messages(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    match require_admin(&state, &headers) {
        Ok(()) => Json(state.messages.clone()).into_response(),
        Err(response) => response,
    }
}

async fn update_message(
    State(state): State<Shared>,
    RoutePath(id): RoutePath<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = lock(&state);
    if let Err(response) = require_admin(&state, &headers) {
        return response;
    }

    let Some(replied) = body.get("replied").and_then(Value::as_bool) else {
        return error(StatusCode::BAD_REQUEST, "replied must be a boolean");
    };
    let status = str_field(&body, "status").to_string();

    match find_mut(&mut state.messages, id) {
        Some(row) => {
            set_field(row, "status", Value::String(status));
            set_field(row, "replied", json!(i64::from(replied)));
            Json(row.clone()).into_response()
        }
        None => error(StatusCode::NOT_FOUND, "Message not found"),
    }
}

async fn admin_inquiries(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    match require_admin(&state, &headers) {
        Ok(()) => Json(state.inquiries.clone()).into_response(),
        Err(response) => response,
    }
}

async fn admin_users(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    match require_admin(&state, &headers) {
        Ok(()) => Json(state.users.iter().map(public_user).collect::<Vec<_>>()).into_response(),
        Err(response) => response,
    }
}
