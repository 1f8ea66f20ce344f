use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::OrderError;
use crate::domain::meal::Meal;
use crate::domain::pricing;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartLine {
    pub id: Uuid,
    pub customer_id: String,
    pub meal_id: Uuid,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
}

impl CartLine {
    pub fn new(customer_id: impl Into<String>, meal_id: Uuid, quantity: u32) -> Result<Self, OrderError> {
        if quantity == 0 {
            return Err(OrderError::InvalidQuantity);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            customer_id: customer_id.into(),
            meal_id,
            quantity,
            created_at: super::timestamp(),
        })
    }
}

/// A cart line joined with the live meal it points at.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartEntry {
    pub line: CartLine,
    pub meal: Meal,
}

/// Customer-facing view of a cart with its running total.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cart {
    pub items: Vec<CartEntry>,
    pub total_amount: Decimal,
}

impl Cart {
    pub fn from_entries(items: Vec<CartEntry>) -> Result<Self, OrderError> {
        let priced = pricing::price_lines(items.iter().map(|e| (&e.meal, e.line.quantity)))?;
        Ok(Self {
            items,
            total_amount: priced.total_amount,
        })
    }
}

/// Returns the single provider every entry belongs to.
///
/// Fails with `EmptyCart` when there is nothing to order and with
/// `MultiProviderCart` when meals from different providers are mixed.
pub fn single_provider(entries: &[CartEntry]) -> Result<&str, OrderError> {
    let first = entries.first().ok_or(OrderError::EmptyCart)?;
    let provider = first.meal.provider_id.as_str();
    if entries.iter().any(|e| e.meal.provider_id != provider) {
        return Err(OrderError::MultiProviderCart);
    }
    Ok(provider)
}
