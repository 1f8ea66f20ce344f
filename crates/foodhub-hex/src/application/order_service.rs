use crate::errors::AppError;
use foodhub_types::domain::identity::Identity;
use foodhub_types::domain::order::{Order, OrderIntent, OrderStatus};
use foodhub_types::domain::transitions::{authorize_transition, can_view};
use foodhub_types::ports::Store;
use uuid::Uuid;

pub struct OrderService<R: Store> {
    repo: R,
}

impl<R: Store> OrderService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Direct checkout: turns the customer's cart into an unpaid order.
    pub async fn create_order(
        &self,
        customer_id: &str,
        delivery_address: String,
        note: Option<String>,
    ) -> Result<Order, AppError> {
        let intent = OrderIntent::direct(delivery_address, note)?;
        let order = self
            .repo
            .materialize(customer_id, &intent)
            .await?
            .ok_or(AppError::EmptyCart)?;
        tracing::info!(
            order_id = %order.id,
            customer_id,
            total = %order.total_amount,
            "order created"
        );
        Ok(order)
    }

    pub async fn get_my_orders(&self, customer_id: &str) -> Result<Vec<Order>, AppError> {
        Ok(self.repo.list_by_customer(customer_id).await?)
    }

    pub async fn get_incoming_orders(&self, provider_id: &str) -> Result<Vec<Order>, AppError> {
        Ok(self.repo.list_by_provider(provider_id).await?)
    }

    pub async fn get_all_orders(&self) -> Result<Vec<Order>, AppError> {
        Ok(self.repo.list().await?)
    }

    pub async fn get_order_by_id(&self, caller: &Identity, id: Uuid) -> Result<Order, AppError> {
        let order = self
            .repo
            .get(id)
            .await?
            .ok_or(AppError::OrderNotFound(id))?;
        if !can_view(caller, &order) {
            return Err(AppError::Forbidden("Forbidden".into()));
        }
        Ok(order)
    }

    /// Moves an order along the status graph on behalf of `caller`.
    ///
    /// The write only lands if the order is still in the status the check
    /// was made against; a concurrent change surfaces as `Conflict`.
    pub async fn update_order_status(
        &self,
        caller: &Identity,
        id: Uuid,
        target: OrderStatus,
    ) -> Result<Order, AppError> {
        let order = self
            .repo
            .get(id)
            .await?
            .ok_or(AppError::OrderNotFound(id))?;
        authorize_transition(caller, &order, target)?;

        let updated = self
            .repo
            .update_status(id, order.status, target)
            .await?
            .ok_or_else(|| {
                AppError::Conflict(format!(
                    "order {id} is no longer {}; reload and retry",
                    order.status
                ))
            })?;
        tracing::info!(
            order_id = %id,
            from = %order.status,
            to = %target,
            by = %caller.user_id,
            "order status changed"
        );
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foodhub_repo::memory::InMemoryRepo;
    use foodhub_types::domain::meal::Meal;
    use foodhub_types::ports::cart_repository::CartRepository;
    use foodhub_types::ports::meal_repository::MealRepository;
    use rust_decimal::Decimal;

    async fn with_cart(customer: &str) -> (OrderService<InMemoryRepo>, InMemoryRepo) {
        let repo = InMemoryRepo::new();
        let meal = repo
            .save_meal(Meal::new("prov-1", "Biryani", Decimal::new(25000, 2)))
            .await
            .unwrap();
        repo.add_line(customer, meal.id, 2).await.unwrap();
        (OrderService::new(repo.clone()), repo)
    }

    #[tokio::test]
    async fn create_and_get_order_in_memory() {
        let (svc, _) = with_cart("alice").await;
        let order = svc
            .create_order("alice", "  12 Lake Rd ".into(), Some("ring twice".into()))
            .await
            .unwrap();
        assert_eq!(order.delivery_address, "12 Lake Rd");
        assert_eq!(order.total_amount, Decimal::new(50000, 2));
        assert_eq!(order.status, OrderStatus::Pending);

        let got = svc
            .get_order_by_id(&Identity::customer("alice"), order.id)
            .await
            .unwrap();
        assert_eq!(got, order);
        assert_eq!(svc.get_my_orders("alice").await.unwrap().len(), 1);
        assert_eq!(svc.get_incoming_orders("prov-1").await.unwrap().len(), 1);
        assert_eq!(svc.get_all_orders().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn validation_errors_propagate() {
        let (svc, _) = with_cart("alice").await;
        let res = svc.create_order("alice", "   ".into(), None).await;
        assert!(matches!(res, Err(AppError::BadRequest(_))));

        let res = svc.create_order("nobody", "1 Road".into(), None).await;
        assert!(matches!(res, Err(AppError::EmptyCart)));
    }

    #[tokio::test]
    async fn visibility_follows_role() {
        let (svc, _) = with_cart("alice").await;
        let order = svc.create_order("alice", "1 Road".into(), None).await.unwrap();

        let other = svc
            .get_order_by_id(&Identity::customer("bob"), order.id)
            .await;
        assert!(matches!(other, Err(AppError::Forbidden(_))));
        let stranger = svc
            .get_order_by_id(&Identity::provider("prov-2"), order.id)
            .await;
        assert!(matches!(stranger, Err(AppError::Forbidden(_))));
        assert!(svc
            .get_order_by_id(&Identity::provider("prov-1"), order.id)
            .await
            .is_ok());
        assert!(svc
            .get_order_by_id(&Identity::admin("root"), order.id)
            .await
            .is_ok());
    }

    async fn status_of(svc: &OrderService<InMemoryRepo>, id: Uuid) -> OrderStatus {
        svc.get_order_by_id(&Identity::admin("root"), id)
            .await
            .unwrap()
            .status
    }

    #[tokio::test]
    async fn status_updates_follow_policy() {
        let (svc, _) = with_cart("alice").await;
        let order = svc.create_order("alice", "1 Road".into(), None).await.unwrap();
        let provider = Identity::provider("prov-1");

        let skipped = svc
            .update_order_status(&provider, order.id, OrderStatus::Delivered)
            .await;
        assert!(matches!(skipped, Err(AppError::InvalidTransition { .. })));
        assert_eq!(status_of(&svc, order.id).await, OrderStatus::Pending);

        let accepted = svc
            .update_order_status(&provider, order.id, OrderStatus::Accepted)
            .await
            .unwrap();
        assert_eq!(accepted.status, OrderStatus::Accepted);

        let late_cancel = svc
            .update_order_status(&Identity::customer("alice"), order.id, OrderStatus::Canceled)
            .await;
        assert!(matches!(late_cancel, Err(AppError::Forbidden(m)) if m == "Customers can only cancel pending orders"));
        assert_eq!(status_of(&svc, order.id).await, OrderStatus::Accepted);

        let stranger = svc
            .update_order_status(&Identity::provider("prov-2"), order.id, OrderStatus::Preparing)
            .await;
        assert!(matches!(stranger, Err(AppError::Forbidden(_))));
        assert_eq!(status_of(&svc, order.id).await, OrderStatus::Accepted);

        let canceled = svc
            .update_order_status(&Identity::admin("root"), order.id, OrderStatus::Canceled)
            .await
            .unwrap();
        assert_eq!(canceled.status, OrderStatus::Canceled);

        let terminal = svc
            .update_order_status(&Identity::admin("root"), order.id, OrderStatus::Accepted)
            .await;
        assert!(matches!(terminal, Err(AppError::InvalidTransition { .. })));
        assert_eq!(status_of(&svc, order.id).await, OrderStatus::Canceled);
    }

    #[tokio::test]
    async fn not_found_paths() {
        let (svc, _) = with_cart("alice").await;
        let missing = svc
            .get_order_by_id(&Identity::admin("root"), Uuid::new_v4())
            .await;
        assert!(matches!(missing, Err(AppError::OrderNotFound(_))));

        let updated = svc
            .update_order_status(&Identity::admin("root"), Uuid::new_v4(), OrderStatus::Accepted)
            .await;
        assert!(matches!(updated, Err(AppError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn racing_status_updates_leave_one_winner() {
        let (svc, _) = with_cart("alice").await;
        let order = svc.create_order("alice", "1 Road".into(), None).await.unwrap();
        let svc = std::sync::Arc::new(svc);

        let cancel = {
            let svc = svc.clone();
            tokio::spawn(async move {
                svc.update_order_status(&Identity::customer("alice"), order.id, OrderStatus::Canceled)
                    .await
            })
        };
        let accept = {
            let svc = svc.clone();
            tokio::spawn(async move {
                svc.update_order_status(&Identity::provider("prov-1"), order.id, OrderStatus::Accepted)
                    .await
            })
        };
        let results = [cancel.await.unwrap(), accept.await.unwrap()];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);

        let final_status = svc
            .get_order_by_id(&Identity::admin("root"), order.id)
            .await
            .unwrap()
            .status;
        assert!(matches!(
            final_status,
            OrderStatus::Canceled | OrderStatus::Accepted
        ));
    }
}
