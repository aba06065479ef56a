use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait, sea_query::LockType,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::pizzas::{CreatePizzaRequest, PizzaList, UpdatePizzaRequest},
    entity::pizzas::{ActiveModel, Column, Entity as Pizzas},
    error::{AppError, AppResult},
    middleware::{
        auth::AuthUser,
        policy::{Operation, authorize},
    },
    models::{Pizza, validate_price},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_available(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<PizzaList>> {
    authorize(user, Operation::ListPizzas)?;
    let items: Vec<Pizza> = Pizzas::find()
        .filter(Column::IsAvailable.eq(true))
        .order_by_asc(Column::Name)
        .all(state.db())
        .await?
        .into_iter()
        .map(Pizza::from)
        .collect();

    let meta = Meta::all(items.len());
    Ok(ApiResponse::success("Pizzas", PizzaList { items }, Some(meta)))
}

pub async fn create_pizza(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePizzaRequest,
) -> AppResult<ApiResponse<Pizza>> {
    authorize(user, Operation::CreatePizza)?;
    let name = payload.name.trim().to_string();
    validate_name(&name)?;
    validate_price(payload.price)?;

    let pizza = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(payload.description),
        price: Set(payload.price),
        is_available: Set(payload.is_available),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(state.db())
    .await?;

    tracing::info!(pizza_id = %pizza.id, price = %pizza.price, "pizza created");
    audit::record(
        state.db(),
        Some(user.user_id),
        "pizza_create",
        "pizzas",
        serde_json::json!({ "pizza_id": pizza.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Pizza created",
        Pizza::from(pizza),
        Some(Meta::empty()),
    ))
}

pub async fn update_pizza(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdatePizzaRequest,
) -> AppResult<ApiResponse<Pizza>> {
    authorize(user, Operation::UpdatePizza)?;
    if let Some(name) = payload.name.as_deref() {
        validate_name(name.trim())?;
    }
    if let Some(price) = payload.price {
        validate_price(price)?;
    }

    let txn = state.db().begin().await?;
    let existing = Pizzas::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Pizza not found"))?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(is_available) = payload.is_available {
        active.is_available = Set(is_available);
    }
    active.updated_at = Set(Utc::now().into());

    let pizza = active.update(&txn).await?;
    txn.commit().await?;

    audit::record(
        state.db(),
        Some(user.user_id),
        "pizza_update",
        "pizzas",
        serde_json::json!({ "pizza_id": pizza.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        Pizza::from(pizza),
        Some(Meta::empty()),
    ))
}

pub async fn delete_pizza(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    authorize(user, Operation::DeletePizza)?;
    let result = Pizzas::delete_by_id(id).exec(state.db()).await?;

    if result.rows_affected == 0 {
        return Err(AppError::not_found("Pizza not found"));
    }

    tracing::info!(pizza_id = %id, "pizza deleted");
    audit::record(
        state.db(),
        Some(user.user_id),
        "pizza_delete",
        "pizzas",
        serde_json::json!({ "pizza_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Pizza deleted successfully.",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn validate_name(name: &str) -> AppResult<()> {
    if name.is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    use super::*;
    use crate::{
        entity::{pizzas, sea_orm_active_enums::Role},
        security::token::TokenCodec,
    };

    fn state_with(db: MockDatabase) -> AppState {
        AppState {
            orm: Arc::new(db.into_connection()),
            tokens: Arc::new(TokenCodec::new("test-secret", 1)),
        }
    }

    fn caller(role: Role) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            username: "caller".into(),
            role,
        }
    }

    fn margherita() -> pizzas::Model {
        let now = Utc::now().fixed_offset();
        pizzas::Model {
            id: Uuid::new_v4(),
            name: "Margherita".into(),
            description: "Tomato, mozzarella, basil".into(),
            price: Decimal::new(950, 2),
            is_available: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn non_admin_cannot_create_even_with_valid_body() {
        let state = state_with(MockDatabase::new(DatabaseBackend::Postgres));
        for role in [Role::Customer, Role::DeliveryPartner] {
            let err = create_pizza(
                &state,
                &caller(role),
                CreatePizzaRequest {
                    name: "Margherita".into(),
                    description: "Classic".into(),
                    price: Decimal::new(950, 2),
                    is_available: true,
                },
            )
            .await
            .unwrap_err();
            assert!(matches!(err, AppError::Forbidden));
        }
    }

    #[tokio::test]
    async fn create_rejects_non_positive_price() {
        let state = state_with(MockDatabase::new(DatabaseBackend::Postgres));
        let err = create_pizza(
            &state,
            &caller(Role::Admin),
            CreatePizzaRequest {
                name: "Free Pizza".into(),
                description: "Too good".into(),
                price: Decimal::ZERO,
                is_available: true,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn create_rejects_prices_the_column_cannot_hold() {
        let state = state_with(MockDatabase::new(DatabaseBackend::Postgres));
        for price in [
            Decimal::new(1, 3),
            Decimal::new(9999, 3),
            Decimal::from(100_000_000i64),
        ] {
            let err = create_pizza(
                &state,
                &caller(Role::Admin),
                CreatePizzaRequest {
                    name: "Odd Pizza".into(),
                    description: "Priced oddly".into(),
                    price,
                    is_available: true,
                },
            )
            .await
            .unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)), "{price}");
        }
    }

    #[tokio::test]
    async fn update_rejects_sub_cent_price_before_locking() {
        let state = state_with(MockDatabase::new(DatabaseBackend::Postgres));
        let err = update_pizza(
            &state,
            &caller(Role::Admin),
            Uuid::new_v4(),
            UpdatePizzaRequest {
                price: Some(Decimal::new(1, 3)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn update_applies_only_present_fields() {
        let stored = margherita();
        let mut patched = stored.clone();
        patched.price = Decimal::new(1100, 2);
        let state = state_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![stored.clone()]])
                .append_query_results([vec![patched]]),
        );

        let resp = update_pizza(
            &state,
            &caller(Role::Admin),
            stored.id,
            UpdatePizzaRequest {
                price: Some(Decimal::new(1100, 2)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let pizza = resp.data.unwrap();
        assert_eq!(pizza.price, Decimal::new(1100, 2));
        assert_eq!(pizza.name, stored.name);
        assert_eq!(pizza.description, stored.description);
    }

    #[tokio::test]
    async fn update_missing_pizza_is_not_found() {
        let state = state_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<pizzas::Model>::new()]),
        );
        let err = update_pizza(
            &state,
            &caller(Role::Admin),
            Uuid::new_v4(),
            UpdatePizzaRequest::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_missing_pizza_is_not_found() {
        let state = state_with(MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            },
        ]));
        let err = delete_pizza(&state, &caller(Role::Admin), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
