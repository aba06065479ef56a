//! Order status transition table.
//!
//! Orders only move forward: `PLACED -> PREPARING -> OUT_FOR_DELIVERY -> DELIVERED`.
//! Skipping ahead is allowed (a pickup can go straight to `DELIVERED`), going back
//! is not, and re-applying the current status is a no-op.

use sea_orm::Iterable;

use crate::{entity::sea_orm_active_enums::OrderStatus, error::AppError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    Advance { from: OrderStatus, to: OrderStatus },
}

pub fn allowed_next(from: OrderStatus) -> Vec<OrderStatus> {
    OrderStatus::iter()
        .filter(|next| next.rank() > from.rank())
        .collect()
}

pub fn plan(from: OrderStatus, to: OrderStatus) -> Result<Transition, AppError> {
    if from == to {
        return Ok(Transition::Unchanged);
    }
    if allowed_next(from).contains(&to) {
        Ok(Transition::Advance { from, to })
    } else {
        Err(AppError::InvalidTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use OrderStatus::*;

    #[test]
    fn same_status_is_unchanged() {
        for status in OrderStatus::iter() {
            assert_eq!(plan(status, status).unwrap(), Transition::Unchanged);
        }
    }

    #[test]
    fn forward_steps_advance() {
        assert_eq!(
            plan(Placed, Preparing).unwrap(),
            Transition::Advance {
                from: Placed,
                to: Preparing
            }
        );
        assert!(plan(Preparing, OutForDelivery).is_ok());
        assert!(plan(OutForDelivery, Delivered).is_ok());
        assert!(plan(Placed, Delivered).is_ok());
    }

    #[test]
    fn backward_moves_are_rejected() {
        let err = plan(Delivered, Preparing).unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidTransition {
                from: Delivered,
                to: Preparing
            }
        ));
        assert!(plan(OutForDelivery, Placed).is_err());
    }

    #[test]
    fn delivered_is_terminal() {
        assert!(Delivered.is_terminal());
        assert!(allowed_next(Delivered).is_empty());
        assert_eq!(allowed_next(Placed), vec![Preparing, OutForDelivery, Delivered]);
    }
}
