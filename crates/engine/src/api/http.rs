//! HTTP routes.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bazaar_domain::{Identity, NewOrder, OrderId, OrderItem, OrderStatus, ProductId, ShopId, UserId};
use bazaar_shared::{CreateOrderRequest, OrderData, UpdateOrderStatusRequest};

use super::stream;
use crate::app::App;
use crate::infrastructure::auth::{SHOP_IDS_HEADER, USER_ID_HEADER, USER_ROLE_HEADER};
use crate::infrastructure::ports::{AuthError, Credentials};
use crate::use_cases::orders::OrderError;

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route(
            "/api/shops/{shop_id}/orders",
            get(list_orders).post(create_order),
        )
        .route(
            "/api/shops/{shop_id}/orders/stream",
            get(stream::stream_orders),
        )
        .route("/api/shops/{shop_id}/connections", get(connection_count))
        .route("/api/orders/{id}", get(get_order).delete(delete_order))
        .route("/api/orders/{id}/status", patch(update_order_status))
}

async fn health() -> &'static str {
    "OK"
}

/// Resolve the caller from gateway-set headers.
pub(crate) fn authenticate(app: &App, headers: &HeaderMap) -> Result<Identity, ApiError> {
    Ok(app.identity.resolve(&credentials_from_headers(headers))?)
}

pub(crate) fn credentials_from_headers(headers: &HeaderMap) -> Credentials {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    Credentials {
        user_id: header(USER_ID_HEADER),
        role: header(USER_ROLE_HEADER),
        shop_ids: header(SHOP_IDS_HEADER),
    }
}

#[derive(Debug, Deserialize)]
struct ListOrdersQuery {
    status: Option<String>,
}

async fn list_orders(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
    Path(shop_id): Path<Uuid>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<OrderData>>, ApiError> {
    let actor = authenticate(&app, &headers)?;
    let status = query
        .status
        .as_deref()
        .map(OrderStatus::from_str)
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let orders = app
        .use_cases
        .orders
        .list
        .execute(&actor, ShopId::from_uuid(shop_id), status)
        .await?;
    Ok(Json(orders.iter().map(OrderData::from).collect()))
}

async fn create_order(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
    Path(shop_id): Path<Uuid>,
    Json(body): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderData>), ApiError> {
    let actor = authenticate(&app, &headers)?;
    let input = NewOrder {
        customer_id: body
            .customer_id
            .map(UserId::from_uuid)
            .unwrap_or(actor.user_id),
        items: body
            .items
            .into_iter()
            .map(|item| {
                OrderItem::new(
                    ProductId::from_uuid(item.product_id),
                    item.product_name,
                    item.quantity,
                    item.unit_price_cents,
                )
            })
            .collect(),
        note: body.note,
    };

    let order = app
        .use_cases
        .orders
        .create
        .execute(&actor, ShopId::from_uuid(shop_id), input)
        .await?;
    Ok((StatusCode::CREATED, Json(OrderData::from(&order))))
}

async fn get_order(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderData>, ApiError> {
    let actor = authenticate(&app, &headers)?;
    let order = app
        .use_cases
        .orders
        .get
        .execute(&actor, OrderId::from_uuid(id))
        .await?;
    Ok(Json(OrderData::from(&order)))
}

async fn update_order_status(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateOrderStatusRequest>,
) -> Result<Json<OrderData>, ApiError> {
    let actor = authenticate(&app, &headers)?;
    let order = app
        .use_cases
        .orders
        .update_status
        .execute(&actor, OrderId::from_uuid(id), body.status)
        .await?;
    Ok(Json(OrderData::from(&order)))
}

async fn delete_order(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderData>, ApiError> {
    let actor = authenticate(&app, &headers)?;
    let order = app
        .use_cases
        .orders
        .delete
        .execute(&actor, OrderId::from_uuid(id))
        .await?;
    Ok(Json(OrderData::from(&order)))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectionCount {
    pub shop_id: Uuid,
    pub clients: usize,
}

async fn connection_count(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
    Path(shop_id): Path<Uuid>,
) -> Result<Json<ConnectionCount>, ApiError> {
    let actor = authenticate(&app, &headers)?;
    let shop = ShopId::from_uuid(shop_id);
    if !actor.can_access(shop) {
        return Err(ApiError::Forbidden);
    }
    Ok(Json(ConnectionCount {
        shop_id,
        clients: app.hub.client_count(shop),
    }))
}

#[derive(Debug)]
pub enum ApiError {
    NotFound,
    BadRequest(String),
    Unauthorized,
    Forbidden,
    Conflict(String),
    Internal(String),
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not found").into_response(),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized").into_response(),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden").into_response(),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg).into_response(),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
            }
        }
    }
}

impl From<crate::infrastructure::ports::RepoError> for ApiError {
    fn from(e: crate::infrastructure::ports::RepoError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<OrderError> for ApiError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::NotFound(_) => ApiError::NotFound,
            OrderError::Forbidden => ApiError::Forbidden,
            e @ OrderError::Conflict(_) => ApiError::Conflict(e.to_string()),
            OrderError::Domain(e) => ApiError::BadRequest(e.to_string()),
            OrderError::Repo(e) => e.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        tracing::debug!(error = %e, "Authentication failed");
        ApiError::Unauthorized
    }
}
