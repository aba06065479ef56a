use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait, sea_query::LockType,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        delivery::StatusChange,
        orders::{OrderList, PlaceOrderRequest, UpdateOrderStatusRequest},
    },
    entity::{
        Pizzas,
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        sea_orm_active_enums::OrderStatus,
    },
    error::{AppError, AppResult},
    lifecycle::{self, Transition},
    middleware::{
        auth::AuthUser,
        policy::{Operation, authorize},
    },
    models::{Order, line_total, order_total_ceiling, validate_line_quantity},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Places an order from explicit lines, pricing each at the current catalog price.
///
/// Runs in one transaction: an unknown pizza on any line aborts the whole order.
/// The caller's cart is neither read nor cleared.
pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    authorize(user, Operation::PlaceOrder)?;
    if payload.items.is_empty() {
        return Err(AppError::BadRequest("order must contain at least one item".into()));
    }
    for line in &payload.items {
        validate_line_quantity(line.quantity)?;
    }

    let txn = state.db().begin().await?;

    let mut priced = Vec::with_capacity(payload.items.len());
    for line in &payload.items {
        let pizza = Pizzas::find_by_id(line.pizza_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Pizza with id {} not found", line.pizza_id)))?;
        priced.push((line, pizza.price));
    }

    let total_amount = line_total(priced.iter().map(|(line, price)| (line.quantity, *price)));
    if total_amount >= order_total_ceiling() {
        return Err(AppError::BadRequest(format!(
            "order total must be less than {}",
            order_total_ceiling()
        )));
    }

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        total_amount: Set(total_amount),
        status: Set(OrderStatus::INITIAL),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(priced.len());
    for (position, (line, unit_price)) in priced.into_iter().enumerate() {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            pizza_id: Set(line.pizza_id),
            position: Set(position as i32),
            quantity: Set(line.quantity),
            unit_price: Set(unit_price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        items.push(item);
    }

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        user_id = %user.user_id,
        total = %order.total_amount,
        lines = items.len(),
        "order placed"
    );
    audit::record(
        state.db(),
        Some(user.user_id),
        "order_place",
        "orders",
        serde_json::json!({ "order_id": order.id, "total_amount": order.total_amount.to_string() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order placed",
        Order::from_parts(order, items),
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderList>> {
    authorize(user, Operation::ListOwnOrders)?;
    let orders = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .order_by_desc(OrderCol::CreatedAt)
        .all(state.db())
        .await?;

    if orders.is_empty() {
        return Err(AppError::not_found("No orders found for this user"));
    }

    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut items_by_order: HashMap<Uuid, Vec<OrderItemModel>> = HashMap::new();
    for item in OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(ids))
        .order_by_asc(OrderItemCol::Position)
        .all(state.db())
        .await?
    {
        items_by_order.entry(item.order_id).or_default().push(item);
    }

    let items: Vec<Order> = orders
        .into_iter()
        .map(|order| {
            let lines = items_by_order.remove(&order.id).unwrap_or_default();
            Order::from_parts(order, lines)
        })
        .collect();

    let meta = Meta::all(items.len());
    Ok(ApiResponse::success("Ok", OrderList { items }, Some(meta)))
}

/// Outcome of a status request against the transition table.
#[derive(Debug, Clone)]
pub struct StatusOutcome {
    pub order: OrderModel,
    pub previous: OrderStatus,
    pub changed: bool,
}

/// Shared by the admin and delivery entry points; they differ only in `operation`.
///
/// Re-applying the current status writes nothing, so `updated_at` is untouched.
pub async fn transition_status(
    state: &AppState,
    actor: &AuthUser,
    operation: Operation,
    order_id: Uuid,
    requested: OrderStatus,
) -> AppResult<StatusOutcome> {
    authorize(actor, operation)?;

    let txn = state.db().begin().await?;
    let order = Orders::find_by_id(order_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;

    let previous = order.status;
    match lifecycle::plan(previous, requested)? {
        Transition::Unchanged => {
            txn.commit().await?;
            tracing::debug!(order_id = %order_id, status = %previous, "status unchanged");
            Ok(StatusOutcome {
                order,
                previous,
                changed: false,
            })
        }
        Transition::Advance { from, to } => {
            let mut active: OrderActive = order.into();
            active.status = Set(to);
            active.updated_at = Set(Utc::now().into());
            let order = active.update(&txn).await?;
            txn.commit().await?;

            tracing::info!(order_id = %order_id, %from, %to, actor = %actor.user_id, "order status changed");
            audit::record(
                state.db(),
                Some(actor.user_id),
                "order_status_update",
                "orders",
                serde_json::json!({ "order_id": order_id, "from": from.as_str(), "to": to.as_str() }),
            )
            .await;

            Ok(StatusOutcome {
                order,
                previous,
                changed: true,
            })
        }
    }
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    let outcome =
        transition_status(state, user, Operation::UpdateOrderStatus, id, payload.status).await?;
    let message = if outcome.changed {
        "Order updated".to_string()
    } else {
        format!("The current status is {}", outcome.previous)
    };

    let items = load_items(state.db(), outcome.order.id).await?;
    Ok(ApiResponse::success(
        message,
        Order::from_parts(outcome.order, items),
        Some(Meta::empty()),
    ))
}

pub async fn update_delivery_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<StatusChange>> {
    let outcome =
        transition_status(state, user, Operation::UpdateDeliveryStatus, id, payload.status)
            .await?;
    let current = outcome.order.status;
    let message = if outcome.changed {
        format!(
            "Order status for order {id} updated from {} to {current}",
            outcome.previous
        )
    } else {
        format!("The current status is {current}")
    };

    Ok(ApiResponse::success(
        message,
        StatusChange {
            order_id: id,
            previous: outcome.previous,
            current,
            changed: outcome.changed,
        },
        Some(Meta::empty()),
    ))
}

async fn load_items<C: ConnectionTrait>(conn: &C, order_id: Uuid) -> AppResult<Vec<OrderItemModel>> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .order_by_asc(OrderItemCol::Position)
        .all(conn)
        .await?;
    Ok(items)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use sea_orm::{DatabaseBackend, MockDatabase};

    use super::*;
    use crate::{
        dto::orders::OrderLineRequest,
        entity::{order_items, orders, pizzas, sea_orm_active_enums::Role},
        security::token::TokenCodec,
    };

    fn state_with(db: MockDatabase) -> AppState {
        AppState {
            orm: Arc::new(db.into_connection()),
            tokens: Arc::new(TokenCodec::new("test-secret", 1)),
        }
    }

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            username: "someone".into(),
            role,
        }
    }

    fn pizza(price: Decimal) -> pizzas::Model {
        let now = Utc::now().fixed_offset();
        pizzas::Model {
            id: Uuid::new_v4(),
            name: "Diavola".into(),
            description: "Spicy salami".into(),
            price,
            is_available: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn order(status: OrderStatus) -> orders::Model {
        let now = Utc::now().fixed_offset();
        orders::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            total_amount: Decimal::new(1900, 2),
            status,
            created_at: now,
            updated_at: now,
        }
    }

    fn frozen_line(
        order_id: Uuid,
        pizza_id: Uuid,
        position: i32,
        quantity: i32,
        unit_price: Decimal,
    ) -> order_items::Model {
        order_items::Model {
            id: Uuid::new_v4(),
            order_id,
            pizza_id,
            position,
            quantity,
            unit_price,
            created_at: Utc::now().fixed_offset(),
        }
    }

    #[tokio::test]
    async fn unknown_pizza_aborts_without_inserting() {
        let known = pizza(Decimal::new(950, 2));
        let missing = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![known.clone()]])
            .append_query_results([Vec::<pizzas::Model>::new()])
            .into_connection();
        let state = AppState {
            orm: Arc::new(db),
            tokens: Arc::new(TokenCodec::new("test-secret", 1)),
        };

        let err = place_order(
            &state,
            &user(Role::Customer),
            PlaceOrderRequest {
                items: vec![
                    OrderLineRequest {
                        pizza_id: known.id,
                        quantity: 1,
                    },
                    OrderLineRequest {
                        pizza_id: missing,
                        quantity: 2,
                    },
                ],
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(&err, AppError::NotFound(msg) if msg.contains(&missing.to_string())));

        let conn = Arc::try_unwrap(state.orm)
            .ok()
            .expect("connection is not shared");
        let log = format!("{:?}", conn.into_transaction_log());
        assert!(!log.contains("INSERT"), "no rows may be written: {log}");
    }

    #[tokio::test]
    async fn order_total_is_sum_of_frozen_lines() {
        let margherita = pizza(Decimal::new(950, 2));
        let diavola = pizza(Decimal::new(1200, 2));
        let placed = orders::Model {
            total_amount: Decimal::new(3100, 2),
            ..order(OrderStatus::Placed)
        };
        let state = state_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![margherita.clone()]])
                .append_query_results([vec![diavola.clone()]])
                .append_query_results([vec![placed.clone()]])
                .append_query_results([vec![frozen_line(placed.id, margherita.id, 0, 2, margherita.price)]])
                .append_query_results([vec![frozen_line(placed.id, diavola.id, 1, 1, diavola.price)]]),
        );

        let resp = place_order(
            &state,
            &user(Role::Customer),
            PlaceOrderRequest {
                items: vec![
                    OrderLineRequest {
                        pizza_id: margherita.id,
                        quantity: 2,
                    },
                    OrderLineRequest {
                        pizza_id: diavola.id,
                        quantity: 1,
                    },
                ],
            },
        )
        .await
        .unwrap();

        let order = resp.data.unwrap();
        assert_eq!(order.status, OrderStatus::Placed);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.total_amount, order.items_total());
        assert_eq!(order.items[0].unit_price, Decimal::new(950, 2));
    }

    #[tokio::test]
    async fn oversized_line_quantity_is_rejected() {
        let state = state_with(MockDatabase::new(DatabaseBackend::Postgres));
        let err = place_order(
            &state,
            &user(Role::Customer),
            PlaceOrderRequest {
                items: vec![OrderLineRequest {
                    pizza_id: Uuid::new_v4(),
                    quantity: i32::MAX,
                }],
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn total_beyond_amount_column_aborts_without_inserting() {
        let pricey = pizza(Decimal::new(9_999_999_999, 2));
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![pricey.clone()]])
            .append_query_results([vec![pricey.clone()]])
            .into_connection();
        let state = AppState {
            orm: Arc::new(db),
            tokens: Arc::new(TokenCodec::new("test-secret", 1)),
        };

        let line = OrderLineRequest {
            pizza_id: pricey.id,
            quantity: 99,
        };
        let err = place_order(
            &state,
            &user(Role::Customer),
            PlaceOrderRequest {
                items: vec![line.clone(), line],
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(&err, AppError::BadRequest(msg) if msg.contains("order total")));

        let conn = Arc::try_unwrap(state.orm)
            .ok()
            .expect("connection is not shared");
        let log = format!("{:?}", conn.into_transaction_log());
        assert!(!log.contains("INSERT"), "no rows may be written: {log}");
    }

    #[tokio::test]
    async fn empty_order_is_rejected() {
        let state = state_with(MockDatabase::new(DatabaseBackend::Postgres));
        let err = place_order(&state, &user(Role::Customer), PlaceOrderRequest { items: vec![] })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn no_orders_is_not_found() {
        let state = state_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<orders::Model>::new()]),
        );
        let err = list_orders(&state, &user(Role::Customer)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "No orders found for this user"));
    }

    #[tokio::test]
    async fn same_status_is_a_no_op() {
        let delivered = order(OrderStatus::Delivered);
        let state = state_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![delivered.clone()]]),
        );

        let outcome = transition_status(
            &state,
            &user(Role::Admin),
            Operation::UpdateOrderStatus,
            delivered.id,
            OrderStatus::Delivered,
        )
        .await
        .unwrap();

        assert!(!outcome.changed);
        assert_eq!(outcome.order.updated_at, delivered.updated_at);
        assert_eq!(outcome.order.total_amount, delivered.total_amount);
    }

    #[tokio::test]
    async fn backward_transition_is_rejected() {
        let delivered = order(OrderStatus::Delivered);
        let state = state_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![delivered.clone()]]),
        );

        let err = transition_status(
            &state,
            &user(Role::DeliveryPartner),
            Operation::UpdateDeliveryStatus,
            delivered.id,
            OrderStatus::Preparing,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn missing_order_is_not_found() {
        let state = state_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<orders::Model>::new()]),
        );
        let err = transition_status(
            &state,
            &user(Role::Admin),
            Operation::UpdateOrderStatus,
            Uuid::new_v4(),
            OrderStatus::Preparing,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "Order not found"));
    }

    #[tokio::test]
    async fn customers_cannot_move_orders() {
        let state = state_with(MockDatabase::new(DatabaseBackend::Postgres));
        for operation in [Operation::UpdateOrderStatus, Operation::UpdateDeliveryStatus] {
            let err = transition_status(
                &state,
                &user(Role::Customer),
                operation,
                Uuid::new_v4(),
                OrderStatus::Delivered,
            )
            .await
            .unwrap_err();
            assert!(matches!(err, AppError::Forbidden));
        }
    }

    #[tokio::test]
    async fn delivery_update_reports_previous_and_current() {
        let placed = order(OrderStatus::Placed);
        let moved = orders::Model {
            status: OrderStatus::OutForDelivery,
            ..placed.clone()
        };
        let state = state_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![placed.clone()]])
                .append_query_results([vec![moved]]),
        );

        let resp = update_delivery_status(
            &state,
            &user(Role::DeliveryPartner),
            placed.id,
            UpdateOrderStatusRequest {
                status: OrderStatus::OutForDelivery,
            },
        )
        .await
        .unwrap();

        assert_eq!(
            resp.message,
            format!(
                "Order status for order {} updated from PLACED to OUT_FOR_DELIVERY",
                placed.id
            )
        );
        let change = resp.data.unwrap();
        assert!(change.changed);
        assert_eq!(change.previous, OrderStatus::Placed);
    }
}
