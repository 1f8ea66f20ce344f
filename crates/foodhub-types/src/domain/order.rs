use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::cart::{self, CartEntry};
use crate::domain::error::OrderError;
use crate::domain::pricing;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Preparing,
    OutForDelivery,
    Delivered,
    Canceled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Accepted,
        OrderStatus::Preparing,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Canceled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Accepted => "ACCEPTED",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Canceled => "CANCELED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|st| st.as_str() == s)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "UNPAID",
            PaymentStatus::Paid => "PAID",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "UNPAID" => Some(PaymentStatus::Unpaid),
            "PAID" => Some(PaymentStatus::Paid),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleType {
    #[default]
    Now,
    Later,
}

impl ScheduleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleType::Now => "NOW",
            ScheduleType::Later => "LATER",
        }
    }

    /// Lenient parse used for stored values and session metadata: anything
    /// other than `LATER` means deliver now.
    pub fn parse_lenient(s: &str) -> Self {
        if s == "LATER" {
            ScheduleType::Later
        } else {
            ScheduleType::Now
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub order_id: Uuid,
    pub meal_id: Uuid,
    pub provider_id: String,
    pub meal_title: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub sub_total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: String,
    pub delivery_address: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub schedule_type: ScheduleType,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub total_amount: Decimal,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything about an order that is decided before the cart is read:
/// where it goes, when, and whether it has already been paid for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderIntent {
    pub delivery_address: String,
    pub note: Option<String>,
    pub schedule_type: ScheduleType,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub payment_status: PaymentStatus,
}

impl OrderIntent {
    /// Intent for a direct (unpaid, deliver-now) checkout.
    pub fn direct(delivery_address: String, note: Option<String>) -> Result<Self, OrderError> {
        Self::scheduled(delivery_address, note, ScheduleType::Now, None)
    }

    pub fn scheduled(
        delivery_address: String,
        note: Option<String>,
        schedule_type: ScheduleType,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> Result<Self, OrderError> {
        let delivery_address = delivery_address.trim().to_string();
        if delivery_address.is_empty() {
            return Err(OrderError::InvalidInput("deliveryAddress is required".into()));
        }
        let note = note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        let scheduled_at = match schedule_type {
            ScheduleType::Now => None,
            ScheduleType::Later => scheduled_at,
        };
        Ok(Self {
            delivery_address,
            note,
            schedule_type,
            scheduled_at,
            payment_status: PaymentStatus::Unpaid,
        })
    }

    pub fn paid(mut self) -> Self {
        self.payment_status = PaymentStatus::Paid;
        self
    }
}

impl Order {
    /// Builds a pending order from a cart snapshot, pricing every line at
    /// the meal's current price.
    pub fn from_cart(
        customer_id: &str,
        intent: &OrderIntent,
        entries: &[CartEntry],
    ) -> Result<Self, OrderError> {
        cart::single_provider(entries)?;
        let priced = pricing::price_lines(entries.iter().map(|e| (&e.meal, e.line.quantity)))?;

        let id = Uuid::new_v4();
        let items = entries
            .iter()
            .zip(priced.lines)
            .map(|(entry, line)| OrderItem {
                order_id: id,
                meal_id: line.meal_id,
                provider_id: entry.meal.provider_id.clone(),
                meal_title: entry.meal.title.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
                sub_total: line.sub_total,
            })
            .collect();

        let now = super::timestamp();
        Ok(Self {
            id,
            customer_id: customer_id.to_string(),
            delivery_address: intent.delivery_address.clone(),
            status: OrderStatus::Pending,
            payment_status: intent.payment_status,
            schedule_type: intent.schedule_type,
            scheduled_at: intent.scheduled_at,
            note: intent.note.clone(),
            total_amount: priced.total_amount,
            items,
            created_at: now,
            updated_at: now,
        })
    }

    /// True when at least one line was sold by `provider_id`.
    pub fn involves_provider(&self, provider_id: &str) -> bool {
        self.items.iter().any(|it| it.provider_id == provider_id)
    }

    pub fn update_status(&mut self, status: OrderStatus) {
        self.status = status;
        self.updated_at = super::timestamp();
    }
}
