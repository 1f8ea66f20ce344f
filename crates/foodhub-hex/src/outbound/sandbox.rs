use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use foodhub_types::domain::payment::{
    CheckoutRequest, CheckoutSession, ProcessorPaymentStatus, ProcessorSession,
};
use foodhub_types::ports::payment_processor::{PaymentError, PaymentProcessor};

/// In-process stand-in for a hosted checkout provider. Sessions start
/// unpaid unless built with [`SandboxPaymentProcessor::auto_paid`]; tests
/// flip them with [`SandboxPaymentProcessor::mark_paid`].
#[derive(Clone, Default)]
pub struct SandboxPaymentProcessor {
    sessions: Arc<DashMap<String, (ProcessorSession, CheckoutRequest)>>,
    auto_paid: bool,
}

impl SandboxPaymentProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auto_paid() -> Self {
        Self {
            auto_paid: true,
            ..Self::default()
        }
    }

    pub fn mark_paid(&self, session_id: &str) -> bool {
        match self.sessions.get_mut(session_id) {
            Some(mut entry) => {
                entry.0.payment_status = ProcessorPaymentStatus::Paid;
                true
            }
            None => false,
        }
    }

    /// The request a session was opened with.
    pub fn request_for(&self, session_id: &str) -> Option<CheckoutRequest> {
        self.sessions.get(session_id).map(|e| e.1.clone())
    }
}

#[async_trait]
impl PaymentProcessor for SandboxPaymentProcessor {
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        if request.line_items.is_empty() {
            return Err(PaymentError::Upstream("no line items".into()));
        }
        let id = format!("cs_sandbox_{}", Uuid::new_v4().simple());
        let status = if self.auto_paid {
            ProcessorPaymentStatus::Paid
        } else {
            ProcessorPaymentStatus::Unpaid
        };
        let session = ProcessorSession {
            id: id.clone(),
            payment_status: status,
            metadata: request.metadata.clone(),
        };
        let checkout_url = format!("{}?sandbox_session={id}", request.success_url);
        self.sessions.insert(id.clone(), (session, request));
        tracing::debug!(session_id = %id, "sandbox checkout session created");
        Ok(CheckoutSession {
            session_id: id,
            checkout_url: Some(checkout_url),
        })
    }

    async fn retrieve_session(
        &self,
        session_id: &str,
    ) -> Result<Option<ProcessorSession>, PaymentError> {
        Ok(self.sessions.get(session_id).map(|e| e.0.clone()))
    }
}
