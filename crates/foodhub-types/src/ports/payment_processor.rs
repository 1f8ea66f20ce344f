use async_trait::async_trait;

use crate::domain::payment::{CheckoutRequest, CheckoutSession, ProcessorSession};

#[derive(thiserror::Error, Debug)]
pub enum PaymentError {
    #[error("payment processor is not configured: {0}")]
    Misconfigured(String),

    #[error("payment processor error: {0}")]
    Upstream(String),
}

/// Hosted checkout provider. Holds order intent as session metadata until
/// the payment is confirmed.
#[async_trait]
pub trait PaymentProcessor: Send + Sync + 'static {
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError>;

    /// `None` when the processor has no session with this id.
    async fn retrieve_session(
        &self,
        session_id: &str,
    ) -> Result<Option<ProcessorSession>, PaymentError>;
}
