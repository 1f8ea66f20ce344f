use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::cart::{CartEntry, CartLine};
use crate::ports::order_repository::RepoError;

#[async_trait]
pub trait CartRepository: Send + Sync + 'static {
    /// The customer's cart lines joined with live meal data, oldest first.
    async fn cart_snapshot(&self, customer_id: &str) -> Result<Vec<CartEntry>, RepoError>;

    /// Adds `quantity` of a meal, merging with an existing line for it.
    async fn add_line(
        &self,
        customer_id: &str,
        meal_id: Uuid,
        quantity: u32,
    ) -> Result<CartLine, RepoError>;

    async fn set_quantity(
        &self,
        customer_id: &str,
        line_id: Uuid,
        quantity: u32,
    ) -> Result<Option<CartLine>, RepoError>;

    async fn remove_line(&self, customer_id: &str, line_id: Uuid) -> Result<bool, RepoError>;

    async fn clear(&self, customer_id: &str) -> Result<u64, RepoError>;
}
