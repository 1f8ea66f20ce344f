use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A provider's menu entry. Read-only to the ordering core; orders copy the
/// price and title they need at creation time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Meal {
    pub id: Uuid,
    pub provider_id: String,
    pub title: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub is_available: bool,
}

impl Meal {
    pub fn new(provider_id: impl Into<String>, title: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider_id: provider_id.into(),
            title: title.into(),
            description: None,
            price,
            is_available: true,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.is_available = false;
        self
    }
}
