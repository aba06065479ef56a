use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::sea_orm_active_enums::OrderStatus;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCommentRequest {
    pub comment: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusChange {
    pub order_id: Uuid,
    pub previous: OrderStatus,
    pub current: OrderStatus,
    pub changed: bool,
}
