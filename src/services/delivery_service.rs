use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, EntityTrait, Set, TransactionTrait};
use uuid::Uuid;

use crate::{
    audit,
    dto::delivery::AddCommentRequest,
    entity::{Orders, delivery_comments::ActiveModel as CommentActive},
    error::{AppError, AppResult},
    middleware::{
        auth::AuthUser,
        policy::{Operation, authorize},
    },
    models::DeliveryComment,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Append a comment to an order's delivery log. Comments are never edited or removed.
pub async fn add_comment(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    payload: AddCommentRequest,
) -> AppResult<ApiResponse<DeliveryComment>> {
    authorize(user, Operation::CommentOnDelivery)?;
    let text = payload.comment.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest("comment must not be empty".into()));
    }

    let txn = state.db().begin().await?;
    let order = Orders::find_by_id(order_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;

    let comment = CommentActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        author_id: Set(user.user_id),
        comment: Set(text.to_string()),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    audit::record(
        state.db(),
        Some(user.user_id),
        "delivery_comment",
        "delivery_comments",
        serde_json::json!({ "order_id": order.id, "comment_id": comment.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Comment added",
        DeliveryComment::from(comment),
        Some(Meta::empty()),
    ))
}
