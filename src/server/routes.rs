//! HTTP routes for user records

use axum::{
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::AdminPolicy;
use crate::core::address::WalletAddress;
use crate::core::paths::{api, SERVICE_NAME};
use crate::core::validation::{is_valid_url, validate_username};
use crate::store::{StoreError, UserStore};
use crate::user::{NewUser, User, UserPatch};

#[derive(Clone)]
pub struct ServerState {
    pub store: Arc<dyn UserStore>,
    pub admin: AdminPolicy,
    pub service: String,
}

impl ServerState {
    pub fn new(store: Arc<dyn UserStore>, admin: AdminPolicy) -> Self {
        Self { store, admin, service: SERVICE_NAME.into() }
    }
}

type ApiError = (StatusCode, Json<Value>);
type ApiResult<T> = Result<T, ApiError>;

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

fn validation_error(details: Vec<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": "Validation error", "details": details })))
}

fn store_error(e: StoreError) -> ApiError {
    match e {
        StoreError::NotFound => api_error(StatusCode::NOT_FOUND, "User not found"),
        StoreError::Conflict(msg) => api_error(StatusCode::CONFLICT, msg),
        StoreError::Validation(msg) => validation_error(vec![msg]),
        StoreError::Transport(msg) => {
            tracing::warn!(error = %msg, "store failure");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

fn parse_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| api_error(StatusCode::BAD_REQUEST, "Invalid user ID"))
}

#[derive(Serialize)]
struct UserResponse { user: User }

#[derive(Serialize)]
struct UsersResponse { users: Vec<User> }

/// Raw POST body; every field is checked so all problems are reported together.
#[derive(Deserialize)]
struct CreateUserRequest {
    username: Option<String>,
    wallet_address: Option<String>,
}

#[derive(Deserialize)]
struct UpdateUserRequest {
    username: Option<String>,
    wallet_address: Option<String>,
    avatar_url: Option<String>,
}

/// CORS for the configured origins; `*` allows any.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| HeaderValue::from_str(o).ok()).collect();
    layer.allow_origin(origins)
}

pub fn router(state: ServerState, cors: CorsLayer) -> Router {
    Router::new()
        .route(api::HEALTH, get(health))
        .route(api::USERS, get(list_users).post(create_user))
        .route(api::USER_BY_WALLET, get(get_user_by_wallet))
        .route(api::USER_BY_ID, get(get_user).put(update_user).delete(delete_user))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(s): State<ServerState>) -> impl IntoResponse {
    Json(json!({"status": "ok", "service": s.service}))
}

async fn list_users(State(s): State<ServerState>) -> ApiResult<Json<UsersResponse>> {
    let users = s.store.list().await.map_err(store_error)?;
    Ok(Json(UsersResponse { users }))
}

async fn create_user(State(s): State<ServerState>, Json(body): Json<CreateUserRequest>) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let mut details = Vec::new();
    let username = body.username.unwrap_or_default().trim().to_string();
    if let Err(msg) = validate_username(&username) {
        details.push(msg);
    }
    let wallet = match body.wallet_address.as_deref().map(str::trim) {
        None | Some("") => {
            details.push("Wallet address is required".into());
            None
        }
        Some(raw) => match WalletAddress::parse(raw) {
            Ok(wallet) => Some(wallet),
            Err(e) => {
                details.push(e.to_string());
                None
            }
        },
    };
    let wallet = match wallet {
        Some(wallet) if details.is_empty() => wallet,
        _ => return Err(validation_error(details)),
    };

    let user = s.store.create(NewUser::new(username, wallet)).await.map_err(store_error)?;
    tracing::info!(id = %user.id, wallet = %user.wallet_address.short(), "user created");
    Ok((StatusCode::CREATED, Json(UserResponse { user })))
}

async fn get_user(State(s): State<ServerState>, Path(id): Path<String>) -> ApiResult<Json<UserResponse>> {
    let id = parse_id(&id)?;
    match s.store.find_by_id(&id).await.map_err(store_error)? {
        Some(user) => Ok(Json(UserResponse { user })),
        None => Err(api_error(StatusCode::NOT_FOUND, "User not found")),
    }
}

async fn get_user_by_wallet(State(s): State<ServerState>, Path(raw): Path<String>) -> ApiResult<Json<UserResponse>> {
    let wallet = WalletAddress::parse(&raw).map_err(|_| api_error(StatusCode::BAD_REQUEST, "Invalid wallet address format"))?;
    match s.store.find_by_wallet(&wallet).await.map_err(store_error)? {
        Some(user) => Ok(Json(UserResponse { user })),
        None => Err(api_error(StatusCode::NOT_FOUND, "User not found")),
    }
}

async fn update_user(
    State(s): State<ServerState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    let id = parse_id(&id)?;
    let mut details = Vec::new();
    let mut patch = UserPatch::default();

    if let Some(username) = body.username {
        patch = patch.username(username);
        if let Some(Err(msg)) = patch.username.as_deref().map(validate_username) {
            details.push(msg);
        }
    }
    if let Some(raw) = body.wallet_address {
        match WalletAddress::parse(&raw) {
            Ok(wallet) => patch = patch.wallet_address(wallet),
            Err(e) => details.push(e.to_string()),
        }
    }
    if let Some(url) = body.avatar_url {
        if !is_valid_url(&url) {
            details.push(format!("Invalid avatar URL: {}", url));
        }
        patch = patch.avatar_url(url);
    }
    if !details.is_empty() {
        return Err(validation_error(details));
    }
    if patch.is_empty() {
        return Err(validation_error(vec!["No fields to update".into()]));
    }

    let user = s.store.update(&id, patch).await.map_err(store_error)?;
    Ok(Json(UserResponse { user }))
}

async fn delete_user(State(s): State<ServerState>, Path(id): Path<String>, headers: HeaderMap) -> ApiResult<StatusCode> {
    let caller = headers.get(api::WALLET_HEADER).and_then(|v| v.to_str().ok());
    s.admin.authorize(caller).map_err(|e| api_error(StatusCode::FORBIDDEN, e.to_string()))?;
    let id = parse_id(&id)?;
    s.store.delete(&id).await.map_err(store_error)?;
    tracing::info!(%id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
