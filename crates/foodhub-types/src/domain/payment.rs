use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::OrderError;
use crate::domain::order::{OrderIntent, ScheduleType};

/// One priced line on a hosted checkout page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckoutLineItem {
    pub name: String,
    pub description: Option<String>,
    pub quantity: u32,
    pub unit_amount: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub line_items: Vec<CheckoutLineItem>,
    pub metadata: BTreeMap<String, String>,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub session_id: String,
    pub checkout_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProcessorPaymentStatus {
    Paid,
    Unpaid,
    NoPaymentRequired,
}

impl ProcessorPaymentStatus {
    pub fn from_processor(s: &str) -> Self {
        match s {
            "paid" => ProcessorPaymentStatus::Paid,
            "no_payment_required" => ProcessorPaymentStatus::NoPaymentRequired,
            _ => ProcessorPaymentStatus::Unpaid,
        }
    }
}

/// A checkout session as reported back by the payment processor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessorSession {
    pub id: String,
    pub payment_status: ProcessorPaymentStatus,
    pub metadata: BTreeMap<String, String>,
}

const CUSTOMER_ID: &str = "customerId";
const DELIVERY_ADDRESS: &str = "deliveryAddress";
const NOTE: &str = "note";
const SCHEDULE_TYPE: &str = "scheduleType";
const SCHEDULED_AT: &str = "scheduledAt";

/// Order intent carried on the processor's session until the payment is
/// confirmed. The processor is the only place this lives in the meantime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMetadata {
    pub customer_id: String,
    pub intent: OrderIntent,
}

impl SessionMetadata {
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert(CUSTOMER_ID.to_string(), self.customer_id.clone());
        map.insert(
            DELIVERY_ADDRESS.to_string(),
            self.intent.delivery_address.clone(),
        );
        map.insert(
            SCHEDULE_TYPE.to_string(),
            self.intent.schedule_type.as_str().to_string(),
        );
        if let Some(at) = self.intent.scheduled_at {
            map.insert(SCHEDULED_AT.to_string(), at.to_rfc3339());
        }
        if let Some(note) = &self.intent.note {
            map.insert(NOTE.to_string(), note.clone());
        }
        map
    }

    /// Customer the session was opened for, if recorded.
    pub fn customer_of(map: &BTreeMap<String, String>) -> Option<&str> {
        map.get(CUSTOMER_ID).map(String::as_str)
    }

    /// Rebuilds a paid order intent from session metadata. Caller-supplied
    /// values never take part; only what was stored on the session counts.
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, OrderError> {
        let customer_id = map
            .get(CUSTOMER_ID)
            .cloned()
            .ok_or_else(|| OrderError::InvalidInput("Missing customerId in checkout session".into()))?;
        let delivery_address = map
            .get(DELIVERY_ADDRESS)
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .ok_or_else(|| {
                OrderError::InvalidInput("Missing deliveryAddress in checkout session".into())
            })?;
        let schedule_type = map
            .get(SCHEDULE_TYPE)
            .map(|s| ScheduleType::parse_lenient(s))
            .unwrap_or_default();
        let scheduled_at = match map.get(SCHEDULED_AT).map(|s| s.trim()) {
            Some(raw) if !raw.is_empty() => Some(
                DateTime::parse_from_rfc3339(raw)
                    .map_err(|e| OrderError::InvalidInput(format!("invalid scheduledAt: {e}")))?
                    .with_timezone(&Utc),
            ),
            _ => None,
        };
        let intent = OrderIntent::scheduled(
            delivery_address,
            map.get(NOTE).cloned(),
            schedule_type,
            scheduled_at,
        )?
        .paid();
        Ok(Self {
            customer_id,
            intent,
        })
    }
}
