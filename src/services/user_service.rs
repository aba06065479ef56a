use sea_orm::{ActiveModelTrait, EntityTrait, Set};

use crate::{
    audit,
    dto::auth::UpdateProfileRequest,
    entity::users::{ActiveModel as UserActive, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    middleware::{
        auth::AuthUser,
        policy::{Operation, authorize},
    },
    models::User,
    response::{ApiResponse, Meta},
    services::auth_service::{ensure_identity_free, validate_identity},
    state::AppState,
};

pub async fn me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    authorize(user, Operation::ViewProfile)?;
    let model = load(state, user).await?;
    Ok(ApiResponse::success("OK", User::from(model), Some(Meta::empty())))
}

/// Username and email are editable; the role is fixed at signup.
pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    authorize(user, Operation::UpdateProfile)?;
    let current = load(state, user).await?;

    let username = payload
        .username
        .map(|u| u.trim().to_string())
        .unwrap_or_else(|| current.username.clone());
    let email = payload
        .email
        .map(|e| e.trim().to_lowercase())
        .unwrap_or_else(|| current.email.clone());
    validate_identity(&username, &email)?;
    ensure_identity_free(state, &username, &email, Some(current.id)).await?;

    let mut active: UserActive = current.into();
    active.username = Set(username);
    active.email = Set(email);
    let updated = active.update(state.db()).await?;

    Ok(ApiResponse::success(
        "Profile updated",
        User::from(updated),
        Some(Meta::empty()),
    ))
}

/// Soft delete: the account stays for order history but can no longer sign in.
pub async fn deactivate(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    authorize(user, Operation::DeactivateAccount)?;
    let current = load(state, user).await?;

    let mut active: UserActive = current.into();
    active.is_active = Set(false);
    active.update(state.db()).await?;

    tracing::info!(user_id = %user.user_id, "account deactivated");
    audit::record(
        state.db(),
        Some(user.user_id),
        "user_deactivate",
        "users",
        serde_json::json!({ "user_id": user.user_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "User account deactivated successfully",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

async fn load(state: &AppState, user: &AuthUser) -> AppResult<UserModel> {
    Users::find_by_id(user.user_id)
        .one(state.db())
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sea_orm::{DatabaseBackend, MockDatabase};
    use uuid::Uuid;

    use super::*;
    use crate::{
        entity::{sea_orm_active_enums::Role, users},
        security::token::TokenCodec,
    };

    fn state_with(db: MockDatabase) -> AppState {
        AppState {
            orm: Arc::new(db.into_connection()),
            tokens: Arc::new(TokenCodec::new("test-secret", 1)),
        }
    }

    fn stored(username: &str) -> users::Model {
        users::Model {
            id: Uuid::new_v4(),
            username: username.into(),
            email: format!("{username}@example.com"),
            password_hash: "$argon2id$stub".into(),
            role: Role::Customer,
            is_active: true,
            created_at: chrono::Utc::now().fixed_offset(),
        }
    }

    fn caller(model: &users::Model) -> AuthUser {
        AuthUser {
            user_id: model.id,
            username: model.username.clone(),
            role: model.role,
        }
    }

    #[tokio::test]
    async fn me_hides_password_digest() {
        let model = stored("daisy");
        let user = caller(&model);
        let state = state_with(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![model]]),
        );

        let resp = me(&state, &user).await.unwrap();
        let body = serde_json::to_value(resp.data.unwrap()).unwrap();
        assert_eq!(body["username"], "daisy");
        assert!(body.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn update_profile_rejects_email_of_another_account() {
        let model = stored("daisy");
        let user = caller(&model);
        let other = stored("wario");
        let state = state_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![model]])
                .append_query_results([vec![other]]),
        );

        let err = update_profile(
            &state,
            &user,
            UpdateProfileRequest {
                email: Some("wario@example.com".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg.contains("Email")));
    }

    #[tokio::test]
    async fn update_profile_keeps_unspecified_fields() {
        let model = stored("daisy");
        let user = caller(&model);
        let mut renamed = model.clone();
        renamed.username = "princess".into();
        let state = state_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![model.clone()]])
                .append_query_results([Vec::<users::Model>::new()])
                .append_query_results([vec![renamed]]),
        );

        let resp = update_profile(
            &state,
            &user,
            UpdateProfileRequest {
                username: Some("  princess ".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let updated = resp.data.unwrap();
        assert_eq!(updated.username, "princess");
        assert_eq!(updated.email, model.email);
    }

    #[tokio::test]
    async fn deactivate_missing_account_is_not_found() {
        let model = stored("ghost");
        let user = caller(&model);
        let state = state_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<users::Model>::new()]),
        );

        let err = deactivate(&state, &user).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn deactivate_reports_success() {
        let model = stored("daisy");
        let user = caller(&model);
        let mut inactive = model.clone();
        inactive.is_active = false;
        let state = state_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![model]])
                .append_query_results([vec![inactive]]),
        );

        let resp = deactivate(&state, &user).await.unwrap();
        assert_eq!(resp.message, "User account deactivated successfully");
    }
}
