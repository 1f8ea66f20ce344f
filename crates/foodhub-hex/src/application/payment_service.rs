use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::cart_service::require_cart;
use crate::config::CheckoutUrls;
use crate::errors::AppError;
use foodhub_types::domain::cart::single_provider;
use foodhub_types::domain::order::{Order, OrderIntent, ScheduleType};
use foodhub_types::domain::payment::{
    CheckoutLineItem, CheckoutRequest, CheckoutSession, ProcessorPaymentStatus, SessionMetadata,
};
use foodhub_types::domain::pricing::to_minor_units;
use foodhub_types::ports::payment_processor::PaymentProcessor;
use foodhub_types::ports::Store;

/// What the customer submits when starting a paid checkout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutInput {
    pub delivery_address: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub schedule_type: Option<ScheduleType>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub success_url: Option<String>,
    #[serde(default)]
    pub cancel_url: Option<String>,
}

/// Outcome of confirming a paid session. `created` is false when the order
/// already existed from an earlier confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedCheckout {
    pub session_id: String,
    pub payment_status: ProcessorPaymentStatus,
    pub created: bool,
    pub order: Order,
}

pub struct PaymentService<R: Store> {
    repo: R,
    processor: Arc<dyn PaymentProcessor>,
    urls: CheckoutUrls,
    currency: String,
}

impl<R: Store> PaymentService<R> {
    pub fn new(
        repo: R,
        processor: Arc<dyn PaymentProcessor>,
        urls: CheckoutUrls,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            processor,
            urls,
            currency: currency.into(),
        }
    }

    /// Opens a hosted checkout for the customer's current cart. Nothing is
    /// written locally; the order intent rides along as session metadata.
    pub async fn create_checkout_session(
        &self,
        customer_id: &str,
        input: CheckoutInput,
    ) -> Result<CheckoutSession, AppError> {
        let schedule_type = input.schedule_type.unwrap_or_default();
        if schedule_type == ScheduleType::Later && input.scheduled_at.is_none() {
            return Err(AppError::BadRequest(
                "scheduledAt is required when scheduleType is LATER".into(),
            ));
        }
        let intent = OrderIntent::scheduled(
            input.delivery_address,
            input.note,
            schedule_type,
            input.scheduled_at,
        )?;

        let entries = require_cart(&self.repo, customer_id).await?;
        single_provider(&entries)?;

        let line_items = entries
            .iter()
            .map(|e| -> Result<CheckoutLineItem, AppError> {
                Ok(CheckoutLineItem {
                    name: e.meal.title.clone(),
                    description: e.meal.description.clone(),
                    quantity: e.line.quantity,
                    unit_amount: to_minor_units(e.meal.price)?,
                    currency: self.currency.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let metadata = SessionMetadata {
            customer_id: customer_id.to_string(),
            intent,
        }
        .to_map();

        let request = CheckoutRequest {
            line_items,
            metadata,
            success_url: self.urls.success(input.success_url.as_deref()),
            cancel_url: self.urls.cancel(input.cancel_url.as_deref()),
        };
        let session = self.processor.create_checkout_session(request).await?;
        tracing::info!(
            session_id = %session.session_id,
            customer_id,
            lines = entries.len(),
            "checkout session opened"
        );
        Ok(session)
    }

    /// Turns a paid session into an order exactly once.
    ///
    /// Repeat confirmations find the cart already emptied and hand back the
    /// customer's most recent paid order instead of creating another.
    pub async fn confirm_checkout_session(
        &self,
        customer_id: &str,
        session_id: &str,
    ) -> Result<ConfirmedCheckout, AppError> {
        let session_id = session_id.trim();
        if session_id.is_empty() {
            return Err(AppError::BadRequest("sessionId is required".into()));
        }

        let session = self
            .processor
            .retrieve_session(session_id)
            .await?
            .ok_or_else(|| AppError::SessionNotFound(session_id.to_string()))?;
        if session.payment_status != ProcessorPaymentStatus::Paid {
            return Err(AppError::PaymentNotCompleted);
        }
        if SessionMetadata::customer_of(&session.metadata) != Some(customer_id) {
            tracing::warn!(session_id, customer_id, "session belongs to another customer");
            return Err(AppError::Forbidden("Forbidden".into()));
        }
        let metadata = SessionMetadata::from_map(&session.metadata)?;

        if let Some(order) = self.repo.materialize(customer_id, &metadata.intent).await? {
            tracing::info!(
                order_id = %order.id,
                session_id,
                total = %order.total_amount,
                "paid order created"
            );
            return Ok(ConfirmedCheckout {
                session_id: session.id,
                payment_status: session.payment_status,
                created: true,
                order,
            });
        }

        let order = self.repo.latest_paid(customer_id).await?.ok_or_else(|| {
            AppError::Conflict(
                "Cart is empty and no paid order exists for this session".into(),
            )
        })?;
        tracing::debug!(order_id = %order.id, session_id, "session already confirmed");
        Ok(ConfirmedCheckout {
            session_id: session.id,
            payment_status: session.payment_status,
            created: false,
            order,
        })
    }
}
