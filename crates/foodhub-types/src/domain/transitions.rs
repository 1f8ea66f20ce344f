//! Order status state machine and the role policy layered on top of it.
//!
//! ```text
//! PENDING -> ACCEPTED -> PREPARING -> OUT_FOR_DELIVERY -> DELIVERED
//!    |           |
//!    +-----------+-----> CANCELED
//! ```
//!
//! `DELIVERED` and `CANCELED` are terminal. Admins may apply any edge of the
//! graph, providers only on orders that contain one of their meals, and
//! customers may only cancel their own orders while still pending.

use thiserror::Error;

use crate::domain::identity::{Identity, Role};
use crate::domain::order::{Order, OrderStatus};

pub const CUSTOMER_CANCEL_ONLY: &str = "Customers can only cancel pending orders";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("{0}")]
    Forbidden(String),

    #[error("Invalid status transition from {from} to {to}")]
    Invalid { from: OrderStatus, to: OrderStatus },
}

impl OrderStatus {
    /// The transition table: statuses reachable in one step.
    pub fn allowed_next(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Accepted, OrderStatus::Canceled],
            OrderStatus::Accepted => &[OrderStatus::Preparing, OrderStatus::Canceled],
            OrderStatus::Preparing => &[OrderStatus::OutForDelivery],
            OrderStatus::OutForDelivery => &[OrderStatus::Delivered],
            OrderStatus::Delivered | OrderStatus::Canceled => &[],
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_next().is_empty()
    }
}

/// Whether `caller` may see `order` at all.
pub fn can_view(caller: &Identity, order: &Order) -> bool {
    match caller.role {
        Role::Admin => true,
        Role::Customer => order.customer_id == caller.user_id,
        Role::Provider => order.involves_provider(&caller.user_id),
    }
}

/// Checks a requested status change against the caller's role and the
/// order's current status. The role policy runs first; for customers it
/// replaces the transition table entirely.
pub fn authorize_transition(
    caller: &Identity,
    order: &Order,
    target: OrderStatus,
) -> Result<(), TransitionError> {
    match caller.role {
        Role::Admin => {}
        Role::Provider => {
            if !order.involves_provider(&caller.user_id) {
                return Err(TransitionError::Forbidden("Forbidden".into()));
            }
        }
        Role::Customer => {
            if order.customer_id != caller.user_id {
                return Err(TransitionError::Forbidden("Forbidden".into()));
            }
            if order.status != OrderStatus::Pending || target != OrderStatus::Canceled {
                return Err(TransitionError::Forbidden(CUSTOMER_CANCEL_ONLY.into()));
            }
            return Ok(());
        }
    }

    if !order.status.can_transition_to(target) {
        return Err(TransitionError::Invalid {
            from: order.status,
            to: target,
        });
    }
    Ok(())
}
