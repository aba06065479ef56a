use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Alias, Expr, LockType, OnConflict},
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, CartLine, CartView, UpdateCartItemRequest},
    entity::{
        Pizzas,
        cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems},
    },
    error::{AppError, AppResult},
    middleware::{
        auth::AuthUser,
        policy::{Operation, authorize},
    },
    models::{CartItem, MAX_LINE_QUANTITY, Pizza, line_total, validate_line_quantity},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn view_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    authorize(user, Operation::ManageCart)?;
    let rows = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_asc(CartCol::CreatedAt)
        .find_also_related(Pizzas)
        .all(state.db())
        .await?;

    let items: Vec<CartLine> = rows
        .into_iter()
        .filter_map(|(item, pizza)| {
            pizza.map(|p| CartLine {
                id: item.id,
                pizza: Pizza::from(p),
                quantity: item.quantity,
            })
        })
        .collect();

    if items.is_empty() {
        return Err(AppError::not_found("Cart not found"));
    }

    let total = line_total(items.iter().map(|l| (l.quantity, l.pizza.price)));
    let meta = Meta::all(items.len());
    Ok(ApiResponse::success("OK", CartView { items, total }, Some(meta)))
}

/// Adds `quantity` to the caller's line for the pizza, creating it if absent.
///
/// A single upsert against the `(user_id, pizza_id)` unique index, so concurrent
/// adds for the same pizza accumulate into one row. The accumulated quantity may
/// not exceed [`MAX_LINE_QUANTITY`].
pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    authorize(user, Operation::ManageCart)?;
    validate_line_quantity(payload.quantity)?;

    Pizzas::find_by_id(payload.pizza_id)
        .one(state.db())
        .await?
        .ok_or_else(|| AppError::not_found("Pizza not found"))?;

    let current = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .filter(CartCol::PizzaId.eq(payload.pizza_id))
        .one(state.db())
        .await?;
    if let Some(line) = current {
        line.quantity
            .checked_add(payload.quantity)
            .filter(|combined| *combined <= MAX_LINE_QUANTITY)
            .ok_or_else(|| {
                AppError::BadRequest(format!(
                    "cart line already holds {}; at most {MAX_LINE_QUANTITY} per pizza",
                    line.quantity
                ))
            })?;
    }

    let row = CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        pizza_id: Set(payload.pizza_id),
        quantity: Set(payload.quantity),
        created_at: NotSet,
    };

    let cart_item = CartItems::insert(row)
        .on_conflict(
            OnConflict::columns([CartCol::UserId, CartCol::PizzaId])
                .value(
                    CartCol::Quantity,
                    Expr::col((CartItems, CartCol::Quantity))
                        .add(Expr::col((Alias::new("excluded"), CartCol::Quantity))),
                )
                .to_owned(),
        )
        .exec_with_returning(state.db())
        .await?;

    tracing::debug!(
        user_id = %user.user_id,
        pizza_id = %payload.pizza_id,
        quantity = cart_item.quantity,
        "cart line upserted"
    );

    Ok(ApiResponse::success("OK", CartItem::from(cart_item), None))
}

pub async fn update_cart_item(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartItem>> {
    authorize(user, Operation::ManageCart)?;
    validate_line_quantity(payload.quantity)?;

    let txn = state.db().begin().await?;
    let existing = CartItems::find()
        .filter(owned_item(user, item_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Item not found in cart"))?;

    let mut active: CartActive = existing.into();
    active.quantity = Set(payload.quantity);
    let item = active.update(&txn).await?;
    txn.commit().await?;

    Ok(ApiResponse::success("Updated", CartItem::from(item), None))
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    authorize(user, Operation::ManageCart)?;
    let result = CartItems::delete_many()
        .filter(owned_item(user, item_id))
        .exec(state.db())
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::not_found("Item not found"));
    }

    Ok(ApiResponse::success(
        "Item got deleted",
        serde_json::json!({ "id": item_id }),
        Some(Meta::empty()),
    ))
}

// Existence and ownership in one predicate: another user's item reads as missing.
fn owned_item(user: &AuthUser, item_id: Uuid) -> Condition {
    Condition::all()
        .add(CartCol::Id.eq(item_id))
        .add(CartCol::UserId.eq(user.user_id))
}
