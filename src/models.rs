use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::{
        cart_items, delivery_comments, order_items, orders, pizzas,
        sea_orm_active_enums::{OrderStatus, Role},
        users,
    },
    error::{AppError, AppResult},
};

/// Public view of a user; the password digest never leaves the service.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Pizza {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub pizza_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    #[schema(value_type = f64)]
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub pizza_id: Uuid,
    pub quantity: i32,
    /// Catalog price at the moment the order was placed.
    #[schema(value_type = f64)]
    pub unit_price: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeliveryComment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub author_id: Uuid,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            role: model.role,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<pizzas::Model> for Pizza {
    fn from(model: pizzas::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            is_available: model.is_available,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<cart_items::Model> for CartItem {
    fn from(model: cart_items::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            pizza_id: model.pizza_id,
            quantity: model.quantity,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        Self {
            id: model.id,
            pizza_id: model.pizza_id,
            quantity: model.quantity,
            unit_price: model.unit_price,
        }
    }
}

impl From<delivery_comments::Model> for DeliveryComment {
    fn from(model: delivery_comments::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            author_id: model.author_id,
            comment: model.comment,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl Order {
    pub fn from_parts(model: orders::Model, items: Vec<order_items::Model>) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            total_amount: model.total_amount,
            status: model.status,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
            items: items.into_iter().map(OrderItem::from).collect(),
        }
    }

    /// Sum of `quantity * unit_price` over the frozen lines.
    pub fn items_total(&self) -> Decimal {
        line_total(self.items.iter().map(|i| (i.quantity, i.unit_price)))
    }
}

/// Largest quantity one cart or order line may hold.
pub const MAX_LINE_QUANTITY: i32 = 99;

/// Exclusive bound of `pizzas.price`, a `numeric(10,2)` column.
pub fn price_ceiling() -> Decimal {
    Decimal::from(100_000_000i64)
}

/// Exclusive bound of `orders.total_amount`, a `numeric(12,2)` column.
pub fn order_total_ceiling() -> Decimal {
    Decimal::from(10_000_000_000i64)
}

pub fn validate_line_quantity(quantity: i32) -> AppResult<()> {
    if !(1..=MAX_LINE_QUANTITY).contains(&quantity) {
        return Err(AppError::BadRequest(format!(
            "quantity must be between 1 and {MAX_LINE_QUANTITY}"
        )));
    }
    Ok(())
}

/// Prices are positive, carry at most two decimals and fit the price column.
pub fn validate_price(price: Decimal) -> AppResult<()> {
    if price <= Decimal::ZERO {
        return Err(AppError::BadRequest("price must be greater than 0".into()));
    }
    if price.normalize().scale() > 2 {
        return Err(AppError::BadRequest(
            "price must have at most 2 decimal places".into(),
        ));
    }
    if price >= price_ceiling() {
        return Err(AppError::BadRequest(format!(
            "price must be less than {}",
            price_ceiling()
        )));
    }
    Ok(())
}

pub fn line_total(lines: impl IntoIterator<Item = (i32, Decimal)>) -> Decimal {
    lines
        .into_iter()
        .map(|(quantity, price)| price * Decimal::from(quantity))
        .sum()
}
