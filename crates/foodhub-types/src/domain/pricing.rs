//! Exact decimal pricing for carts and orders.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::domain::error::OrderError;
use crate::domain::meal::Meal;

#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub meal_id: Uuid,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub sub_total: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricedOrder {
    pub lines: Vec<PricedLine>,
    pub total_amount: Decimal,
}

/// Prices every `(meal, quantity)` pair at the meal's current price.
/// `total_amount` is the sum of the line subtotals from the same pass.
pub fn price_lines<'a, I>(lines: I) -> Result<PricedOrder, OrderError>
where
    I: IntoIterator<Item = (&'a Meal, u32)>,
{
    let mut priced = Vec::new();
    let mut total = Decimal::ZERO;
    for (meal, quantity) in lines {
        if quantity == 0 {
            return Err(OrderError::InvalidQuantity);
        }
        let sub_total = meal.price * Decimal::from(quantity);
        total += sub_total;
        priced.push(PricedLine {
            meal_id: meal.id,
            quantity,
            unit_price: meal.price,
            sub_total,
        });
    }
    Ok(PricedOrder {
        lines: priced,
        total_amount: total,
    })
}

/// Converts a decimal amount into processor minor units (cents), rounding
/// half away from zero.
pub fn to_minor_units(amount: Decimal) -> Result<i64, OrderError> {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| OrderError::InvalidInput(format!("amount {amount} out of range")))
}
