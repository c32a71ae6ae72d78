use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{FromRef, Path, State},
    http::{self, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Key, PrivateCookieJar};
use chrono::{DateTime, Utc};
use entity::{category, collection, order, product};
use platform_authn::{
    AuthError, CredentialBundle, IdentityResolver, Principal, WalletHeaders,
};
use platform_authz::{
    Level, PolicyEngine, ResourceRef, RoleClassifier, admin::GrantAdminError,
};
use platform_db::{DbPool, GrantService, GrantServiceError, SeaOrmCatalog};
use sea_orm::{ConnectionTrait, DatabaseBackend, EntityTrait, QueryOrder, QuerySelect, Statement};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use uuid::Uuid;

use crate::config::AppConfig;

const SESSION_COOKIE: &str = "__Host-sf_session";
const WALLET_ADDRESS_HEADER: &str = "x-wallet-address";
const WALLET_TOKEN_HEADER: &str = "x-wallet-token";

const MAX_LISTING_PAGE: u64 = 100;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub engine: PolicyEngine,
    pub resolver: Arc<IdentityResolver>,
    pub classifier: Arc<RoleClassifier>,
    pub catalog: Arc<SeaOrmCatalog>,
    pub grants: Arc<GrantService>,
    pub config: Arc<AppConfig>,
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.config.cookie_key.clone()
    }
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    addr: SocketAddr,
}

impl ServeConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::from((host, port)),
        }
    }
}

pub async fn serve(config: ServeConfig, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(%config.addr, "storefront server listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    let allow_origin = if allowed.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed)
    };
    CorsLayer::new()
        .allow_credentials(true)
        .allow_headers([
            http::header::CONTENT_TYPE,
            HeaderName::from_static(WALLET_ADDRESS_HEADER),
            HeaderName::from_static(WALLET_TOKEN_HEADER),
        ])
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_origin(allow_origin)
}

pub fn build_router(state: AppState) -> Router {
    let request_id = MakeRequestUuid;
    let header_name = HeaderName::from_static("x-request-id");
    Router::new()
        .route("/health", get(health_handler))
        .route("/collections", get(list_collections_handler))
        .route("/collections/{id}", get(get_collection_handler))
        .route(
            "/collections/{id}/grants",
            post(create_grant_handler),
        )
        .route(
            "/collections/{id}/grants/{user_id}",
            axum::routing::delete(revoke_grant_handler),
        )
        .route("/categories/{id}", get(get_category_handler))
        .route("/products/{id}", get(get_product_handler))
        .route("/orders/{id}", get(get_order_handler))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), request_id))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_allowed_origins)),
        )
        .with_state(state)
}

/// Pull credential material off the request and resolve the caller.
///
/// Malformed credentials are logged by the resolver and demoted to the
/// anonymous principal; conflicting channels stay a hard rejection.
async fn resolve_principal(
    state: &AppState,
    jar: &PrivateCookieJar,
    headers: &HeaderMap,
) -> HttpResult<Principal> {
    let session_token = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .or_else(|| bearer_token(headers));
    let wallet = wallet_headers(headers);
    let bundle = CredentialBundle {
        session_token,
        wallet,
    };
    let mut principal = match state.resolver.resolve(&bundle) {
        Ok(principal) => principal,
        Err(AuthError::ConflictingIdentity) => {
            return Err(HttpError::new(
                StatusCode::FORBIDDEN,
                "credential channels disagree",
            ));
        }
        Err(_) => Principal::anonymous(),
    };
    principal.role = state
        .classifier
        .classify(&principal, state.catalog.as_ref())
        .await;
    Ok(principal)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

fn wallet_headers(headers: &HeaderMap) -> Option<WalletHeaders> {
    let address = headers
        .get(WALLET_ADDRESS_HEADER)
        .and_then(|value| value.to_str().ok())?;
    let token = headers
        .get(WALLET_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())?;
    Some(WalletHeaders {
        address: address.to_string(),
        token: token.to_string(),
    })
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = state
        .pool
        .execute(Statement::from_string(
            DatabaseBackend::Postgres,
            "SELECT 1".to_string(),
        ))
        .await
        .is_ok();
    Json(HealthResponse {
        ok: db_ok,
        db_ok,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    db_ok: bool,
    version: &'static str,
}

async fn list_collections_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    headers: HeaderMap,
) -> HttpResult<Json<Vec<CollectionPayload>>> {
    let principal = resolve_principal(&state, &jar, &headers).await?;
    let rows = collection::Entity::find()
        .order_by_asc(collection::Column::Title)
        .limit(MAX_LISTING_PAGE)
        .all(&state.pool)
        .await
        .map_err(HttpError::db)?;
    let candidates: Vec<ResourceRef> = rows
        .iter()
        .map(|row| ResourceRef::Collection(row.id))
        .collect();
    let permitted = state
        .engine
        .filter(&principal, candidates, Level::View)
        .await;
    let payload = rows
        .into_iter()
        .filter(|row| permitted.contains(&ResourceRef::Collection(row.id)))
        .map(CollectionPayload::from)
        .collect();
    Ok(Json(payload))
}

async fn get_collection_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> HttpResult<Json<CollectionPayload>> {
    let principal = resolve_principal(&state, &jar, &headers).await?;
    state
        .engine
        .enforce(&principal, &ResourceRef::Collection(id), Level::View)
        .await
        .map_err(HttpError::denied)?;
    let row = collection::Entity::find_by_id(id)
        .one(&state.pool)
        .await
        .map_err(HttpError::db)?
        .ok_or_else(HttpError::not_found)?;
    Ok(Json(row.into()))
}

async fn get_category_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> HttpResult<Json<CategoryPayload>> {
    let principal = resolve_principal(&state, &jar, &headers).await?;
    state
        .engine
        .enforce(&principal, &ResourceRef::Category(id), Level::View)
        .await
        .map_err(HttpError::denied)?;
    let row = category::Entity::find_by_id(id)
        .one(&state.pool)
        .await
        .map_err(HttpError::db)?
        .ok_or_else(HttpError::not_found)?;
    Ok(Json(row.into()))
}

async fn get_product_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> HttpResult<Json<ProductPayload>> {
    let principal = resolve_principal(&state, &jar, &headers).await?;
    state
        .engine
        .enforce(&principal, &ResourceRef::Product(id), Level::View)
        .await
        .map_err(HttpError::denied)?;
    let row = product::Entity::find_by_id(id)
        .one(&state.pool)
        .await
        .map_err(HttpError::db)?
        .ok_or_else(HttpError::not_found)?;
    Ok(Json(row.into()))
}

async fn get_order_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> HttpResult<Json<OrderPayload>> {
    let principal = resolve_principal(&state, &jar, &headers).await?;
    state
        .engine
        .enforce(&principal, &ResourceRef::Order(id), Level::View)
        .await
        .map_err(HttpError::denied)?;
    let row = order::Entity::find_by_id(id)
        .one(&state.pool)
        .await
        .map_err(HttpError::db)?
        .ok_or_else(HttpError::not_found)?;
    Ok(Json(row.into()))
}

#[derive(Deserialize)]
struct CreateGrantRequest {
    user_id: Uuid,
    level: String,
}

async fn create_grant_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(request): Json<CreateGrantRequest>,
) -> HttpResult<StatusCode> {
    let principal = resolve_principal(&state, &jar, &headers).await?;
    let level = Level::from_str(&request.level)
        .ok_or_else(|| HttpError::new(StatusCode::BAD_REQUEST, "level must be view or edit"))?;
    state
        .grants
        .create_grant(&principal, id, request.user_id, level)
        .await
        .map_err(HttpError::grant)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn revoke_grant_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    headers: HeaderMap,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> HttpResult<StatusCode> {
    let principal = resolve_principal(&state, &jar, &headers).await?;
    let removed = state
        .grants
        .revoke_grant(&principal, id, user_id)
        .await
        .map_err(HttpError::grant)?;
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(HttpError::not_found())
    }
}

#[derive(Serialize)]
struct CollectionPayload {
    id: Uuid,
    owner_user_id: Uuid,
    title: String,
    visible: bool,
    created_at: DateTime<Utc>,
}

impl From<collection::Model> for CollectionPayload {
    fn from(model: collection::Model) -> Self {
        Self {
            id: model.id,
            owner_user_id: model.owner_user_id,
            title: model.title,
            visible: model.visible,
            created_at: model.created_at.into(),
        }
    }
}

#[derive(Serialize)]
struct CategoryPayload {
    id: Uuid,
    collection_id: Uuid,
    title: String,
    position: i32,
}

impl From<category::Model> for CategoryPayload {
    fn from(model: category::Model) -> Self {
        Self {
            id: model.id,
            collection_id: model.collection_id,
            title: model.title,
            position: model.position,
        }
    }
}

#[derive(Serialize)]
struct ProductPayload {
    id: Uuid,
    category_id: Uuid,
    title: String,
    price_cents: i64,
}

impl From<product::Model> for ProductPayload {
    fn from(model: product::Model) -> Self {
        Self {
            id: model.id,
            category_id: model.category_id,
            title: model.title,
            price_cents: model.price_cents,
        }
    }
}

#[derive(Serialize)]
struct OrderPayload {
    id: Uuid,
    product_id: Uuid,
    wallet_address: String,
    status: String,
    amount_cents: i64,
    created_at: DateTime<Utc>,
}

impl From<order::Model> for OrderPayload {
    fn from(model: order::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            wallet_address: model.wallet_address,
            status: match model.status {
                order::Status::Pending => "PENDING",
                order::Status::Paid => "PAID",
                order::Status::Fulfilled => "FULFILLED",
                order::Status::Cancelled => "CANCELLED",
            }
            .to_string(),
            amount_cents: model.amount_cents,
            created_at: model.created_at.into(),
        }
    }
}

type HttpResult<T> = Result<T, HttpError>;

#[derive(Debug)]
struct HttpError {
    status: StatusCode,
    message: String,
}

impl HttpError {
    fn new(status: StatusCode, msg: &str) -> Self {
        Self {
            status,
            message: msg.to_string(),
        }
    }

    fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "not found")
    }

    fn denied(err: platform_authz::AuthzError) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: err.to_string(),
        }
    }

    fn db(err: sea_orm::DbErr) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }

    fn grant(err: GrantServiceError) -> Self {
        match err {
            GrantServiceError::Rejected(rejection) => {
                let status = match rejection {
                    GrantAdminError::ActorNotPermitted => StatusCode::FORBIDDEN,
                    GrantAdminError::GranteeOwnsCollection
                    | GrantAdminError::AdministratorImmutable => StatusCode::BAD_REQUEST,
                };
                Self {
                    status,
                    message: rejection.to_string(),
                }
            }
            GrantServiceError::UnknownCollection => Self::not_found(),
            GrantServiceError::Db(err) => Self::db(err),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        signal(SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    ctrl_c.await;

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    };
}
