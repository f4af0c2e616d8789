//! In-memory stand-in for the Sensu Go API.
//!
//! Covers the auth flow (`GET /auth` with Basic credentials, `POST
//! /auth/token` with a refresh token) and generic storage for the
//! `/api/core/v2` resources the client knows. Every `/api` route requires a
//! live bearer token. Objects are stored as raw JSON keyed by name.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{Path, Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use base64::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "P@ssw0rd!";
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 900;

/// Credentials and token lifetime for a mock server instance.
#[derive(Clone, Debug)]
pub struct MockConfig {
    pub username: String,
    pub password: String,
    pub token_ttl_secs: i64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
        }
    }
}

impl MockConfig {
    /// Defaults overridden by `MOCK_SENSU_USER`, `MOCK_SENSU_PASSWORD` and
    /// `MOCK_SENSU_TOKEN_TTL`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            username: std::env::var("MOCK_SENSU_USER").unwrap_or(defaults.username),
            password: std::env::var("MOCK_SENSU_PASSWORD").unwrap_or(defaults.password),
            token_ttl_secs: std::env::var("MOCK_SENSU_TOKEN_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.token_ttl_secs),
        }
    }
}

/// Body returned by both auth endpoints.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenBody {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Default)]
struct Store {
    /// access token -> expires_at
    access_tokens: HashMap<String, i64>,
    refresh_tokens: HashMap<String, String>,
    /// username -> password for users created through the API
    passwords: HashMap<String, String>,
    /// collection path -> name -> object
    collections: HashMap<String, BTreeMap<String, Value>>,
}

#[derive(Clone)]
pub struct AppState {
    config: Arc<MockConfig>,
    store: Arc<RwLock<Store>>,
}

impl AppState {
    fn new(config: MockConfig) -> Self {
        let mut store = Store::default();
        store
            .collections
            .entry(NAMESPACES.to_string())
            .or_default()
            .insert("default".to_string(), serde_json::json!({ "name": "default" }));
        Self {
            config: Arc::new(config),
            store: Arc::new(RwLock::new(store)),
        }
    }
}

const NAMESPACES: &str = "namespaces";
const USERS: &str = "users";

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

pub fn app() -> Router {
    app_with(MockConfig::default())
}

pub fn app_with(config: MockConfig) -> Router {
    let state = AppState::new(config);

    let api = Router::new()
        .route(
            "/api/core/v2/namespaces",
            get(list_namespaces).post(create_namespace),
        )
        .route(
            "/api/core/v2/namespaces/{namespace}",
            get(get_namespace).put(put_namespace).delete(delete_namespace),
        )
        .route(
            "/api/core/v2/namespaces/{namespace}/{kind}",
            get(list_namespaced).post(create_namespaced),
        )
        .route(
            "/api/core/v2/namespaces/{namespace}/{kind}/{name}",
            get(get_namespaced).put(put_namespaced).delete(delete_namespaced),
        )
        .route("/api/core/v2/users", get(list_users).post(create_user))
        .route(
            "/api/core/v2/users/{name}",
            get(get_user).put(put_user).delete(disable_user),
        )
        .route("/api/core/v2/users/{name}/reinstate", put(reinstate_user))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .route("/auth", get(login))
        .route("/auth/token", post(refresh))
        .merge(api)
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(config)).await
}

// --- auth ---

fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = String::from_utf8(BASE64_STANDARD.decode(encoded).ok()?).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

fn issue_token(store: &mut Store, username: &str, ttl: i64) -> TokenBody {
    let token = TokenBody {
        access_token: Uuid::new_v4().to_string(),
        refresh_token: Uuid::new_v4().to_string(),
        expires_at: now() + ttl,
    };
    store
        .access_tokens
        .insert(token.access_token.clone(), token.expires_at);
    store
        .refresh_tokens
        .insert(token.refresh_token.clone(), username.to_string());
    token
}

async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenBody>, StatusCode> {
    let (user, pass) = basic_credentials(&headers).ok_or(StatusCode::UNAUTHORIZED)?;
    let mut store = state.store.write().await;

    let is_admin = user == state.config.username && pass == state.config.password;
    let is_api_user = store.passwords.get(&user) == Some(&pass)
        && !store
            .collections
            .get(USERS)
            .and_then(|users| users.get(&user))
            .is_some_and(|u| u["disabled"] == true);
    if !is_admin && !is_api_user {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(Json(issue_token(&mut store, &user, state.config.token_ttl_secs)))
}

/// Refresh tokens are single use.
async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> Result<Json<TokenBody>, StatusCode> {
    let mut store = state.store.write().await;
    let user = store
        .refresh_tokens
        .remove(&input.refresh_token)
        .ok_or(StatusCode::UNAUTHORIZED)?;
    Ok(Json(issue_token(&mut store, &user, state.config.token_ttl_secs)))
}

async fn require_bearer(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    let authorized = match token {
        Some(token) => state
            .store
            .read()
            .await
            .access_tokens
            .get(&token)
            .is_some_and(|expires_at| *expires_at >= now()),
        None => false,
    };

    if !authorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    next.run(request).await
}

// --- generic storage ---

/// Name of an object: `metadata.name`, then `name`, then `username`.
fn object_name(body: &Value) -> Option<String> {
    body.pointer("/metadata/name")
        .or_else(|| body.get("name"))
        .or_else(|| body.get("username"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn namespaced(namespace: &str, kind: &str) -> String {
    format!("{NAMESPACES}/{namespace}/{kind}")
}

async fn namespace_exists(state: &AppState, namespace: &str) -> bool {
    state
        .store
        .read()
        .await
        .collections
        .get(NAMESPACES)
        .is_some_and(|c| c.contains_key(namespace))
}

async fn list_in(state: &AppState, collection: &str) -> Json<Vec<Value>> {
    let store = state.store.read().await;
    Json(
        store
            .collections
            .get(collection)
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default(),
    )
}

async fn get_in(state: &AppState, collection: &str, name: &str) -> Result<Json<Value>, StatusCode> {
    let store = state.store.read().await;
    store
        .collections
        .get(collection)
        .and_then(|c| c.get(name))
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn create_in(state: &AppState, collection: &str, body: Value) -> StatusCode {
    insert_new(&mut *state.store.write().await, collection, body)
}

async fn put_in(state: &AppState, collection: &str, name: &str, body: Value) -> StatusCode {
    replace(&mut *state.store.write().await, collection, name, body)
}

fn insert_new(store: &mut Store, collection: &str, body: Value) -> StatusCode {
    let Some(name) = object_name(&body) else {
        return StatusCode::BAD_REQUEST;
    };
    let objects = store.collections.entry(collection.to_string()).or_default();
    if objects.contains_key(&name) {
        return StatusCode::CONFLICT;
    }
    objects.insert(name, body);
    StatusCode::CREATED
}

fn replace(store: &mut Store, collection: &str, name: &str, body: Value) -> StatusCode {
    if object_name(&body).as_deref() != Some(name) {
        return StatusCode::BAD_REQUEST;
    }
    store
        .collections
        .entry(collection.to_string())
        .or_default()
        .insert(name.to_string(), body);
    StatusCode::CREATED
}

async fn delete_in(state: &AppState, collection: &str, name: &str) -> StatusCode {
    let mut store = state.store.write().await;
    match store.collections.get_mut(collection).and_then(|c| c.remove(name)) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

// --- namespaces ---

async fn list_namespaces(State(state): State<AppState>) -> Json<Vec<Value>> {
    list_in(&state, NAMESPACES).await
}

async fn create_namespace(State(state): State<AppState>, Json(body): Json<Value>) -> StatusCode {
    create_in(&state, NAMESPACES, body).await
}

async fn get_namespace(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    get_in(&state, NAMESPACES, &name).await
}

async fn put_namespace(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<Value>,
) -> StatusCode {
    put_in(&state, NAMESPACES, &name, body).await
}

async fn delete_namespace(State(state): State<AppState>, Path(name): Path<String>) -> StatusCode {
    delete_in(&state, NAMESPACES, &name).await
}

// --- namespaced kinds ---

async fn list_namespaced(
    State(state): State<AppState>,
    Path((namespace, kind)): Path<(String, String)>,
) -> Result<Json<Vec<Value>>, StatusCode> {
    if !namespace_exists(&state, &namespace).await {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(list_in(&state, &namespaced(&namespace, &kind)).await)
}

async fn create_namespaced(
    State(state): State<AppState>,
    Path((namespace, kind)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> StatusCode {
    if !namespace_exists(&state, &namespace).await {
        return StatusCode::NOT_FOUND;
    }
    create_in(&state, &namespaced(&namespace, &kind), body).await
}

async fn get_namespaced(
    State(state): State<AppState>,
    Path((namespace, kind, name)): Path<(String, String, String)>,
) -> Result<Json<Value>, StatusCode> {
    get_in(&state, &namespaced(&namespace, &kind), &name).await
}

async fn put_namespaced(
    State(state): State<AppState>,
    Path((namespace, kind, name)): Path<(String, String, String)>,
    Json(body): Json<Value>,
) -> StatusCode {
    if !namespace_exists(&state, &namespace).await {
        return StatusCode::NOT_FOUND;
    }
    put_in(&state, &namespaced(&namespace, &kind), &name, body).await
}

async fn delete_namespaced(
    State(state): State<AppState>,
    Path((namespace, kind, name)): Path<(String, String, String)>,
) -> StatusCode {
    delete_in(&state, &namespaced(&namespace, &kind), &name).await
}

// --- users ---

/// Moves `password` out of a user body so it is never listed back.
fn take_password(body: &mut Value) -> Option<String> {
    body.as_object_mut()
        .and_then(|o| o.remove("password"))
        .and_then(|p| p.as_str().map(str::to_string))
}

/// Stores the user and its login password under one write guard, so a
/// rejected write never replaces the password of an existing user.
async fn write_user(
    state: &AppState,
    mut body: Value,
    write: impl FnOnce(&mut Store, Value) -> StatusCode,
) -> StatusCode {
    let password = take_password(&mut body);
    let name = object_name(&body);
    let mut store = state.store.write().await;
    let status = write(&mut *store, body);
    if status == StatusCode::CREATED {
        if let (Some(name), Some(password)) = (name, password) {
            store.passwords.insert(name, password);
        }
    }
    status
}

async fn list_users(State(state): State<AppState>) -> Json<Vec<Value>> {
    list_in(&state, USERS).await
}

async fn create_user(State(state): State<AppState>, Json(body): Json<Value>) -> StatusCode {
    write_user(&state, body, |store, body| insert_new(store, USERS, body)).await
}

async fn get_user(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    get_in(&state, USERS, &name).await
}

async fn put_user(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<Value>,
) -> StatusCode {
    write_user(&state, body, |store, body| replace(store, USERS, &name, body)).await
}

/// Users are never removed, only flagged as disabled.
async fn set_disabled(state: &AppState, name: &str, disabled: bool) -> Option<()> {
    let mut store = state.store.write().await;
    let user = store.collections.get_mut(USERS)?.get_mut(name)?;
    user.as_object_mut()?
        .insert("disabled".to_string(), Value::Bool(disabled));
    Some(())
}

async fn disable_user(State(state): State<AppState>, Path(name): Path<String>) -> StatusCode {
    match set_disabled(&state, &name, true).await {
        Some(()) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

async fn reinstate_user(State(state): State<AppState>, Path(name): Path<String>) -> StatusCode {
    match set_disabled(&state, &name, false).await {
        Some(()) => StatusCode::CREATED,
        None => StatusCode::NOT_FOUND,
    }
}
