use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{post, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        orders::UpdateOrderStatusRequest,
        pizzas::{CreatePizzaRequest, UpdatePizzaRequest},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Order, Pizza},
    response::ApiResponse,
    services::{order_service, pizza_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pizzas", post(create_pizza))
        .route("/pizzas/{id}", put(update_pizza).delete(delete_pizza))
        .route("/orders/{id}/status", put(update_order_status))
}

#[utoipa::path(
    post,
    path = "/admin/pizzas",
    request_body = CreatePizzaRequest,
    responses(
        (status = 200, description = "Create pizza", body = ApiResponse<Pizza>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal Server Error"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_pizza(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreatePizzaRequest>,
) -> AppResult<Json<ApiResponse<Pizza>>> {
    let resp = pizza_service::create_pizza(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/admin/pizzas/{id}",
    params(
        ("id" = Uuid, Path, description = "Pizza ID")
    ),
    request_body = UpdatePizzaRequest,
    responses(
        (status = 200, description = "Updated pizza", body = ApiResponse<Pizza>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Pizza not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_pizza(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePizzaRequest>,
) -> AppResult<Json<ApiResponse<Pizza>>> {
    let resp = pizza_service::update_pizza(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/admin/pizzas/{id}",
    params(
        ("id" = Uuid, Path, description = "Pizza ID")
    ),
    responses(
        (status = 200, description = "Deleted pizza", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Pizza not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_pizza(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = pizza_service::delete_pizza(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/admin/orders/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order with its new status", body = ApiResponse<Order>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Transition not allowed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::update_order_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
