use crate::errors::AppError;
use foodhub_types::domain::cart::{Cart, CartEntry, CartLine};
use foodhub_types::ports::cart_repository::CartRepository;
use foodhub_types::ports::Store;
use uuid::Uuid;

/// Loads the customer's cart snapshot, failing when there is nothing in it.
pub async fn require_cart<R: CartRepository>(
    repo: &R,
    customer_id: &str,
) -> Result<Vec<CartEntry>, AppError> {
    let entries = repo.cart_snapshot(customer_id).await?;
    if entries.is_empty() {
        return Err(AppError::EmptyCart);
    }
    Ok(entries)
}

pub struct CartService<R: Store> {
    repo: R,
}

impl<R: Store> CartService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn get_cart(&self, customer_id: &str) -> Result<Cart, AppError> {
        let entries = self.repo.cart_snapshot(customer_id).await?;
        Ok(Cart::from_entries(entries)?)
    }

    pub async fn add_item(
        &self,
        customer_id: &str,
        meal_id: Uuid,
        quantity: Option<u32>,
    ) -> Result<CartLine, AppError> {
        let quantity = quantity.unwrap_or(1);
        if quantity == 0 {
            return Err(AppError::InvalidQuantity);
        }
        match self.repo.get_meal(meal_id).await? {
            Some(meal) if meal.is_available => {}
            _ => return Err(AppError::NotFound("Meal not available".into())),
        }
        Ok(self.repo.add_line(customer_id, meal_id, quantity).await?)
    }

    pub async fn update_item(
        &self,
        customer_id: &str,
        line_id: Uuid,
        quantity: u32,
    ) -> Result<CartLine, AppError> {
        if quantity == 0 {
            return Err(AppError::InvalidQuantity);
        }
        self.repo
            .set_quantity(customer_id, line_id, quantity)
            .await?
            .ok_or_else(|| AppError::NotFound("Cart item not found".into()))
    }

    pub async fn remove_item(&self, customer_id: &str, line_id: Uuid) -> Result<(), AppError> {
        if self.repo.remove_line(customer_id, line_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("Cart item not found".into()))
        }
    }

    pub async fn clear(&self, customer_id: &str) -> Result<u64, AppError> {
        Ok(self.repo.clear(customer_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foodhub_repo::memory::InMemoryRepo;
    use foodhub_types::domain::meal::Meal;
    use foodhub_types::ports::meal_repository::MealRepository;
    use rust_decimal::Decimal;

    async fn setup() -> (CartService<InMemoryRepo>, Meal) {
        let repo = InMemoryRepo::new();
        let meal = repo
            .save_meal(Meal::new("prov-1", "Khichuri", Decimal::new(15050, 2)))
            .await
            .unwrap();
        (CartService::new(repo), meal)
    }

    #[tokio::test]
    async fn add_update_remove_and_total() {
        let (svc, meal) = setup().await;
        let line = svc.add_item("alice", meal.id, None).await.unwrap();
        assert_eq!(line.quantity, 1);
        let merged = svc.add_item("alice", meal.id, Some(2)).await.unwrap();
        assert_eq!(merged.id, line.id);
        assert_eq!(merged.quantity, 3);

        let cart = svc.get_cart("alice").await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.total_amount, Decimal::new(45150, 2));

        let updated = svc.update_item("alice", line.id, 1).await.unwrap();
        assert_eq!(updated.quantity, 1);

        svc.remove_item("alice", line.id).await.unwrap();
        assert!(svc.get_cart("alice").await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn rejects_bad_quantities_and_missing_rows() {
        let (svc, meal) = setup().await;
        assert!(matches!(
            svc.add_item("alice", meal.id, Some(0)).await,
            Err(AppError::InvalidQuantity)
        ));
        assert!(matches!(
            svc.add_item("alice", Uuid::new_v4(), None).await,
            Err(AppError::NotFound(_))
        ));
        let line = svc.add_item("alice", meal.id, None).await.unwrap();
        assert!(matches!(
            svc.update_item("alice", line.id, 0).await,
            Err(AppError::InvalidQuantity)
        ));
        assert!(matches!(
            svc.update_item("bob", line.id, 2).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            svc.remove_item("bob", line.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn unavailable_meal_cannot_be_added() {
        let repo = InMemoryRepo::new();
        let meal = repo
            .save_meal(Meal::new("prov-1", "Sold out", Decimal::ONE).unavailable())
            .await
            .unwrap();
        let svc = CartService::new(repo);
        let res = svc.add_item("alice", meal.id, None).await;
        assert!(matches!(res, Err(AppError::NotFound(m)) if m == "Meal not available"));
    }

    #[tokio::test]
    async fn require_cart_on_empty_cart() {
        let repo = InMemoryRepo::new();
        assert!(matches!(
            require_cart(&repo, "nobody").await,
            Err(AppError::EmptyCart)
        ));
    }
}
