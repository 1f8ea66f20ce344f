use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use foodhub_types::domain::error::OrderError;
use foodhub_types::domain::order::OrderStatus;
use foodhub_types::domain::transitions::TransitionError;
use foodhub_types::ports::identity_provider::IdentityError;
use foodhub_types::ports::order_repository::RepoError;
use foodhub_types::ports::payment_processor::PaymentError;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("Order not found: {0}")]
    OrderNotFound(Uuid),

    #[error("Checkout session not found: {0}")]
    SessionNotFound(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    #[error("Cart is empty")]
    EmptyCart,

    #[error("You can order from one provider at a time. Please split your cart.")]
    MultiProviderCart,

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Payment is not completed yet")]
    PaymentNotCompleted,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable kind, paired one-to-one with the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::OrderNotFound(_) => "ORDER_NOT_FOUND",
            AppError::SessionNotFound(_) => "SESSION_NOT_FOUND",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::BadRequest(_) => "INVALID_INPUT",
            AppError::InvalidQuantity => "INVALID_QUANTITY",
            AppError::EmptyCart => "EMPTY_CART",
            AppError::MultiProviderCart => "MULTI_PROVIDER_CART",
            AppError::InvalidTransition { .. } => "INVALID_TRANSITION",
            AppError::PaymentNotCompleted => "PAYMENT_NOT_COMPLETED",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Upstream(_) => "UPSTREAM_FAILURE",
            AppError::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::OrderNotFound(_) | AppError::SessionNotFound(_) | AppError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::BadRequest(_)
            | AppError::InvalidQuantity
            | AppError::EmptyCart
            | AppError::InvalidTransition { .. }
            | AppError::PaymentNotCompleted => StatusCode::BAD_REQUEST,
            AppError::MultiProviderCart | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<OrderError> for AppError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::EmptyCart => AppError::EmptyCart,
            OrderError::MultiProviderCart => AppError::MultiProviderCart,
            OrderError::InvalidQuantity => AppError::InvalidQuantity,
            OrderError::InvalidInput(m) => AppError::BadRequest(m),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Rejected(rejected) => rejected.into(),
            RepoError::DbError(m) => AppError::Internal(anyhow::anyhow!(m)),
        }
    }
}

impl From<TransitionError> for AppError {
    fn from(e: TransitionError) -> Self {
        match e {
            TransitionError::Forbidden(m) => AppError::Forbidden(m),
            TransitionError::Invalid { from, to } => AppError::InvalidTransition { from, to },
        }
    }
}

impl From<PaymentError> for AppError {
    fn from(e: PaymentError) -> Self {
        tracing::warn!(error = %e, "payment processor call failed");
        AppError::Upstream(e.to_string())
    }
}

impl From<IdentityError> for AppError {
    fn from(e: IdentityError) -> Self {
        tracing::warn!(error = %e, "identity lookup failed");
        AppError::Upstream(e.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let msg = match &self {
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                "internal error".to_string()
            }
            AppError::BadRequest(m) | AppError::Forbidden(m) | AppError::NotFound(m) => m.clone(),
            other => other.to_string(),
        };

        let body = serde_json::to_string(&ErrorBody {
            error: msg,
            kind: self.kind(),
        })
        .unwrap_or_else(|_| "{\"error\":\"internal serialization\",\"kind\":\"INTERNAL\"}".into());
        (self.status(), [("content-type", "application/json")], body).into_response()
    }
}
