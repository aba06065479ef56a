use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        cart::{AddToCartRequest, CartView, UpdateCartItemRequest},
        orders::{OrderList, PlaceOrderRequest},
        pizzas::PizzaList,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{CartItem, Order},
    response::ApiResponse,
    services::{cart_service, order_service, pizza_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pizzas", get(list_pizzas))
        .route("/cart", get(view_cart).post(add_to_cart))
        .route("/cart/{id}", put(update_cart_item).delete(remove_cart_item))
        .route("/orders", get(list_orders).post(place_order))
}

#[utoipa::path(
    get,
    path = "/customer/pizzas",
    responses(
        (status = 200, description = "Available pizzas", body = ApiResponse<PizzaList>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Customer"
)]
pub async fn list_pizzas(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<PizzaList>>> {
    let resp = pizza_service::list_available(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/customer/cart",
    responses(
        (status = 200, description = "Cart lines and total", body = ApiResponse<CartView>),
        (status = 404, description = "Cart not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Customer"
)]
pub async fn view_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::view_cart(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/customer/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Add pizza or increase its quantity", body = ApiResponse<CartItem>),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Pizza not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Customer"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartItem>>> {
    let resp = cart_service::add_to_cart(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/customer/cart/{id}",
    params(
        ("id" = Uuid, Path, description = "Cart item ID")
    ),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Updated cart item", body = ApiResponse<CartItem>),
        (status = 404, description = "Item not found in cart"),
    ),
    security(("bearer_auth" = [])),
    tag = "Customer"
)]
pub async fn update_cart_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCartItemRequest>,
) -> AppResult<Json<ApiResponse<CartItem>>> {
    let resp = cart_service::update_cart_item(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/customer/cart/{id}",
    params(
        ("id" = Uuid, Path, description = "Cart item ID")
    ),
    responses(
        (status = 200, description = "OK", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Item not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Customer"
)]
pub async fn remove_cart_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = cart_service::remove_from_cart(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/customer/orders",
    request_body = PlaceOrderRequest,
    responses(
        (status = 200, description = "Placed order", body = ApiResponse<Order>),
        (status = 404, description = "A requested pizza does not exist"),
    ),
    security(("bearer_auth" = [])),
    tag = "Customer"
)]
pub async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<PlaceOrderRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::place_order(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/customer/orders",
    responses(
        (status = 200, description = "Caller's orders, newest first", body = ApiResponse<OrderList>),
        (status = 404, description = "No orders found for this user"),
    ),
    security(("bearer_auth" = [])),
    tag = "Customer"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders(&state, &user).await?;
    Ok(Json(resp))
}
