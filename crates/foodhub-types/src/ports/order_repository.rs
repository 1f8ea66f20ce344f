use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::error::OrderError;
use crate::domain::order::{Order, OrderIntent, OrderStatus};

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("db error: {0}")]
    DbError(String),

    #[error(transparent)]
    Rejected(#[from] OrderError),
}

#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    /// Turns the customer's current cart into an order and empties the cart
    /// in one atomic step. Returns `None` when the cart was already empty at
    /// the time of writing; nothing is changed in that case.
    async fn materialize(
        &self,
        customer_id: &str,
        intent: &OrderIntent,
    ) -> Result<Option<Order>, RepoError>;

    async fn get(&self, id: Uuid) -> Result<Option<Order>, RepoError>;

    /// All orders, newest first.
    async fn list(&self) -> Result<Vec<Order>, RepoError>;

    async fn list_by_customer(&self, customer_id: &str) -> Result<Vec<Order>, RepoError>;

    /// Orders containing at least one of the provider's meals, newest first.
    async fn list_by_provider(&self, provider_id: &str) -> Result<Vec<Order>, RepoError>;

    async fn latest_paid(&self, customer_id: &str) -> Result<Option<Order>, RepoError>;

    /// Compare-and-set on the order status. Returns `None` when no order
    /// with `id` is currently in `expected`.
    async fn update_status(
        &self,
        id: Uuid,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Option<Order>, RepoError>;
}
