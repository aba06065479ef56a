use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Pizza;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePizzaRequest {
    pub name: String,
    pub description: String,
    #[schema(value_type = f64)]
    pub price: Decimal,
    #[serde(default = "available_by_default")]
    pub is_available: bool,
}

fn available_by_default() -> bool {
    true
}

/// Sparse patch: absent fields keep their stored value.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdatePizzaRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    pub is_available: Option<bool>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct PizzaList {
    #[schema(value_type = Vec<Pizza>)]
    pub items: Vec<Pizza>,
}
