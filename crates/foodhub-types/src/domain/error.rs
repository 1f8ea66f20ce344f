use thiserror::Error;

/// Rejections raised while turning a cart into an order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("You can order from one provider at a time. Please split your cart.")]
    MultiProviderCart,

    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    #[error("{0}")]
    InvalidInput(String),
}
