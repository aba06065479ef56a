use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::auth::{LoginRequest, LoginResponse, RegisterRequest},
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    error::{AppError, AppResult},
    models::User,
    response::{ApiResponse, Meta},
    security::password::{hash_password, verify_password},
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 6;

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let RegisterRequest {
        username,
        email,
        password,
        role,
    } = payload;
    let username = username.trim().to_string();
    let email = email.trim().to_lowercase();
    validate_identity(&username, &email)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    ensure_identity_free(state, &username, &email, None).await?;

    let password_hash = hash_password(&password)?;
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(username),
        email: Set(email),
        password_hash: Set(password_hash),
        role: Set(role),
        is_active: Set(true),
        created_at: NotSet,
    }
    .insert(state.db())
    .await?;

    tracing::info!(user_id = %user.id, role = %user.role, "user registered");
    audit::record(
        state.db(),
        Some(user.id),
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id, "role": user.role.as_str() }),
    )
    .await;

    Ok(ApiResponse::success("User created", User::from(user), None))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { username, password } = payload;
    let invalid = || AppError::Unauthorized("Invalid credentials".into());

    let user = Users::find()
        .filter(UserCol::Username.eq(username.trim()))
        .one(state.db())
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(invalid)?;

    if !verify_password(&password, &user.password_hash)? {
        return Err(invalid());
    }

    let issued = state.tokens.issue(user.id, user.role)?;

    audit::record(
        state.db(),
        Some(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    let resp = LoginResponse {
        access_token: issued.token,
        token_type: "bearer".into(),
        expires_at: issued.expires_at,
    };
    Ok(ApiResponse::success("Logged in", resp, Some(Meta::empty())))
}

pub(crate) fn validate_identity(username: &str, email: &str) -> AppResult<()> {
    if username.is_empty() {
        return Err(AppError::BadRequest("username must not be empty".into()));
    }
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::BadRequest("email is not valid".into()));
    }
    Ok(())
}

/// Conflict when another account (other than `except`) already uses the username or email.
pub(crate) async fn ensure_identity_free(
    state: &AppState,
    username: &str,
    email: &str,
    except: Option<Uuid>,
) -> AppResult<()> {
    let mut condition = Condition::all().add(
        Condition::any()
            .add(UserCol::Username.eq(username))
            .add(UserCol::Email.eq(email)),
    );
    if let Some(id) = except {
        condition = condition.add(UserCol::Id.ne(id));
    }

    let existing = Users::find().filter(condition).one(state.db()).await?;
    match existing {
        Some(u) if u.username == username => {
            Err(AppError::Conflict("Username already registered".into()))
        }
        Some(_) => Err(AppError::Conflict("Email already registered".into())),
        None => Ok(()),
    }
}
