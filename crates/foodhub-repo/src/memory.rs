use async_trait::async_trait;
use dashmap::DashMap;
use foodhub_types::domain::cart::{CartEntry, CartLine};
use foodhub_types::domain::error::OrderError;
use foodhub_types::domain::meal::Meal;
use foodhub_types::domain::order::{Order, OrderIntent, OrderStatus, PaymentStatus};
use foodhub_types::ports::cart_repository::CartRepository;
use foodhub_types::ports::meal_repository::MealRepository;
use foodhub_types::ports::order_repository::{OrderRepository, RepoError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Process-local store. A customer's cart entry stays locked for the whole
/// materialization, which serializes concurrent checkouts of the same cart.
#[derive(Clone)]
pub struct InMemoryRepo {
    pub meals: Arc<DashMap<Uuid, Meal>>,
    pub carts: Arc<DashMap<String, Vec<CartLine>>>,
    /// Orders keyed by id, each tagged with its insertion sequence number.
    pub orders: Arc<DashMap<Uuid, (u64, Order)>>,
    next_seq: Arc<AtomicU64>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self {
            meals: Arc::new(DashMap::new()),
            carts: Arc::new(DashMap::new()),
            orders: Arc::new(DashMap::new()),
            next_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    fn join(&self, lines: &[CartLine]) -> Result<Vec<CartEntry>, RepoError> {
        lines
            .iter()
            .map(|line| {
                let meal = self
                    .meals
                    .get(&line.meal_id)
                    .map(|m| m.clone())
                    .ok_or_else(|| RepoError::DbError(format!("meal {} missing", line.meal_id)))?;
                Ok(CartEntry {
                    line: line.clone(),
                    meal,
                })
            })
            .collect()
    }

    fn collect_orders(&self, keep: impl Fn(&Order) -> bool) -> Vec<Order> {
        let mut orders: Vec<(u64, Order)> = self
            .orders
            .iter()
            .filter(|kv| keep(&kv.value().1))
            .map(|kv| kv.value().clone())
            .collect();
        // Newest first; the insertion sequence breaks timestamp ties.
        orders.sort_by(|(sa, a), (sb, b)| b.created_at.cmp(&a.created_at).then(sb.cmp(sa)));
        orders.into_iter().map(|(_, o)| o).collect()
    }
}

impl Default for InMemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MealRepository for InMemoryRepo {
    async fn get_meal(&self, id: Uuid) -> Result<Option<Meal>, RepoError> {
        Ok(self.meals.get(&id).map(|m| m.clone()))
    }

    async fn list_meals(&self, provider_id: Option<&str>) -> Result<Vec<Meal>, RepoError> {
        let mut meals: Vec<Meal> = self
            .meals
            .iter()
            .filter(|m| provider_id.map_or(true, |p| m.provider_id == p))
            .map(|m| m.clone())
            .collect();
        meals.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(meals)
    }

    async fn save_meal(&self, meal: Meal) -> Result<Meal, RepoError> {
        self.meals.insert(meal.id, meal.clone());
        Ok(meal)
    }
}

#[async_trait]
impl CartRepository for InMemoryRepo {
    async fn cart_snapshot(&self, customer_id: &str) -> Result<Vec<CartEntry>, RepoError> {
        let lines = self
            .carts
            .get(customer_id)
            .map(|c| c.clone())
            .unwrap_or_default();
        self.join(&lines)
    }

    async fn add_line(
        &self,
        customer_id: &str,
        meal_id: Uuid,
        quantity: u32,
    ) -> Result<CartLine, RepoError> {
        let mut cart = self.carts.entry(customer_id.to_string()).or_default();
        if let Some(line) = cart.iter_mut().find(|l| l.meal_id == meal_id) {
            line.quantity = line
                .quantity
                .checked_add(quantity)
                .ok_or(OrderError::InvalidQuantity)?;
            return Ok(line.clone());
        }
        let line = CartLine::new(customer_id, meal_id, quantity)?;
        cart.push(line.clone());
        Ok(line)
    }

    async fn set_quantity(
        &self,
        customer_id: &str,
        line_id: Uuid,
        quantity: u32,
    ) -> Result<Option<CartLine>, RepoError> {
        if let Some(mut cart) = self.carts.get_mut(customer_id) {
            if let Some(line) = cart.iter_mut().find(|l| l.id == line_id) {
                line.quantity = quantity;
                return Ok(Some(line.clone()));
            }
        }
        Ok(None)
    }

    async fn remove_line(&self, customer_id: &str, line_id: Uuid) -> Result<bool, RepoError> {
        if let Some(mut cart) = self.carts.get_mut(customer_id) {
            let before = cart.len();
            cart.retain(|l| l.id != line_id);
            return Ok(cart.len() < before);
        }
        Ok(false)
    }

    async fn clear(&self, customer_id: &str) -> Result<u64, RepoError> {
        Ok(self
            .carts
            .remove(customer_id)
            .map(|(_, lines)| lines.len() as u64)
            .unwrap_or(0))
    }
}

#[async_trait]
impl OrderRepository for InMemoryRepo {
    async fn materialize(
        &self,
        customer_id: &str,
        intent: &OrderIntent,
    ) -> Result<Option<Order>, RepoError> {
        let Some(mut cart) = self.carts.get_mut(customer_id) else {
            return Ok(None);
        };
        if cart.is_empty() {
            return Ok(None);
        }
        let entries = self.join(&cart)?;
        let order = Order::from_cart(customer_id, intent, &entries)?;
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.orders.insert(order.id, (seq, order.clone()));
        cart.clear();
        Ok(Some(order))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        Ok(self.orders.get(&id).map(|r| r.1.clone()))
    }

    async fn list(&self) -> Result<Vec<Order>, RepoError> {
        Ok(self.collect_orders(|_| true))
    }

    async fn list_by_customer(&self, customer_id: &str) -> Result<Vec<Order>, RepoError> {
        Ok(self.collect_orders(|o| o.customer_id == customer_id))
    }

    async fn list_by_provider(&self, provider_id: &str) -> Result<Vec<Order>, RepoError> {
        Ok(self.collect_orders(|o| o.involves_provider(provider_id)))
    }

    async fn latest_paid(&self, customer_id: &str) -> Result<Option<Order>, RepoError> {
        Ok(self
            .collect_orders(|o| {
                o.customer_id == customer_id && o.payment_status == PaymentStatus::Paid
            })
            .into_iter()
            .next())
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Option<Order>, RepoError> {
        if let Some(mut v) = self.orders.get_mut(&id) {
            let order = &mut v.1;
            if order.status != expected {
                return Ok(None);
            }
            order.update_status(next);
            return Ok(Some(order.clone()));
        }
        Ok(None)
    }
}
