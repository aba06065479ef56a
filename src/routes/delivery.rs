use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{post, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        delivery::{AddCommentRequest, StatusChange},
        orders::UpdateOrderStatusRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::DeliveryComment,
    response::ApiResponse,
    services::{delivery_service, order_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/deliveries/{id}/status", put(update_delivery_status))
        .route("/deliveries/{id}/comments", post(add_comment))
}

#[utoipa::path(
    put,
    path = "/delivery/deliveries/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status change summary", body = ApiResponse<StatusChange>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Transition not allowed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Delivery"
)]
pub async fn update_delivery_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<StatusChange>>> {
    let resp = order_service::update_delivery_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/delivery/deliveries/{id}/comments",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = AddCommentRequest,
    responses(
        (status = 200, description = "Stored comment", body = ApiResponse<DeliveryComment>),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Delivery"
)]
pub async fn add_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddCommentRequest>,
) -> AppResult<Json<ApiResponse<DeliveryComment>>> {
    let resp = delivery_service::add_comment(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
