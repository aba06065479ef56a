//! Role requirements, declared once per operation.
//!
//! Every service entry point calls [`authorize`] with its [`Operation`] before
//! touching storage, so the role a route needs is a property of the operation
//! rather than of the handler that happens to expose it.

use crate::{entity::sea_orm_active_enums::Role, error::AppError, middleware::auth::AuthUser};

const ANY_ROLE: &[Role] = &[Role::Customer, Role::DeliveryPartner, Role::Admin];
const ADMIN_ONLY: &[Role] = &[Role::Admin];
const DELIVERY_STAFF: &[Role] = &[Role::DeliveryPartner, Role::Admin];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreatePizza,
    UpdatePizza,
    DeletePizza,
    ListPizzas,
    ManageCart,
    PlaceOrder,
    ListOwnOrders,
    UpdateOrderStatus,
    UpdateDeliveryStatus,
    CommentOnDelivery,
    ViewProfile,
    UpdateProfile,
    DeactivateAccount,
}

impl Operation {
    pub fn allowed_roles(self) -> &'static [Role] {
        match self {
            Operation::CreatePizza | Operation::UpdatePizza | Operation::DeletePizza => ADMIN_ONLY,
            Operation::UpdateOrderStatus => ADMIN_ONLY,
            Operation::UpdateDeliveryStatus => DELIVERY_STAFF,
            // TODO: narrow to the assigned courier and the order owner once
            // orders record a delivery assignment.
            Operation::CommentOnDelivery => ANY_ROLE,
            Operation::ListPizzas
            | Operation::ManageCart
            | Operation::PlaceOrder
            | Operation::ListOwnOrders
            | Operation::ViewProfile
            | Operation::UpdateProfile
            | Operation::DeactivateAccount => ANY_ROLE,
        }
    }
}

pub fn require_role(user: &AuthUser, allowed: &[Role]) -> Result<(), AppError> {
    if !allowed.contains(&user.role) {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn authorize(user: &AuthUser, operation: Operation) -> Result<(), AppError> {
    require_role(user, operation.allowed_roles()).inspect_err(|_| {
        tracing::debug!(
            user_id = %user.user_id,
            role = %user.role,
            ?operation,
            "operation not permitted"
        );
    })
}
