#[cfg(not(any(feature = "memory", feature = "sqlite")))]
compile_error!("Enable a repo feature: `memory` or `sqlite`.");

use foodhub_types::domain::cart::{CartEntry, CartLine};
use foodhub_types::domain::meal::Meal;
use foodhub_types::domain::order::{Order, OrderIntent, OrderStatus};
use foodhub_types::ports::cart_repository::CartRepository;
use foodhub_types::ports::meal_repository::MealRepository;
use foodhub_types::ports::order_repository::{OrderRepository, RepoError};
use uuid::Uuid;

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

/// The store selected at startup.
#[derive(Clone)]
pub enum Repo {
    #[cfg(feature = "memory")]
    Memory(memory::InMemoryRepo),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite::SqliteRepo),
}

pub async fn build_repo(url: Option<&str>) -> anyhow::Result<Repo> {
    Repo::build_repo(url).await
}

impl Repo {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    pub async fn build_repo(_: Option<&str>) -> anyhow::Result<Self> {
        Ok(Repo::Memory(memory::InMemoryRepo::new()))
    }

    #[cfg(all(feature = "sqlite", not(feature = "memory")))]
    pub async fn build_repo(database_url: Option<&str>) -> anyhow::Result<Self> {
        let url = database_url.unwrap_or("sqlite://foodhub.db");
        Ok(Repo::Sqlite(sqlite::SqliteRepo::new(url).await?))
    }

    // With both adapters compiled in, a database url selects SQLite.
    #[cfg(all(feature = "sqlite", feature = "memory"))]
    pub async fn build_repo(database_url: Option<&str>) -> anyhow::Result<Self> {
        match database_url {
            Some(url) => Ok(Repo::Sqlite(sqlite::SqliteRepo::new(url).await?)),
            None => Ok(Repo::Memory(memory::InMemoryRepo::new())),
        }
    }
}

macro_rules! delegate {
    ($self:ident, $inner:ident => $call:expr) => {
        match $self {
            #[cfg(feature = "memory")]
            Repo::Memory($inner) => $call.await,
            #[cfg(feature = "sqlite")]
            Repo::Sqlite($inner) => $call.await,
        }
    };
}

#[async_trait::async_trait]
impl MealRepository for Repo {
    async fn get_meal(&self, id: Uuid) -> Result<Option<Meal>, RepoError> {
        delegate!(self, r => r.get_meal(id))
    }

    async fn list_meals(&self, provider_id: Option<&str>) -> Result<Vec<Meal>, RepoError> {
        delegate!(self, r => r.list_meals(provider_id))
    }

    async fn save_meal(&self, meal: Meal) -> Result<Meal, RepoError> {
        delegate!(self, r => r.save_meal(meal))
    }
}

#[async_trait::async_trait]
impl CartRepository for Repo {
    async fn cart_snapshot(&self, customer_id: &str) -> Result<Vec<CartEntry>, RepoError> {
        delegate!(self, r => r.cart_snapshot(customer_id))
    }

    async fn add_line(
        &self,
        customer_id: &str,
        meal_id: Uuid,
        quantity: u32,
    ) -> Result<CartLine, RepoError> {
        delegate!(self, r => r.add_line(customer_id, meal_id, quantity))
    }

    async fn set_quantity(
        &self,
        customer_id: &str,
        line_id: Uuid,
        quantity: u32,
    ) -> Result<Option<CartLine>, RepoError> {
        delegate!(self, r => r.set_quantity(customer_id, line_id, quantity))
    }

    async fn remove_line(&self, customer_id: &str, line_id: Uuid) -> Result<bool, RepoError> {
        delegate!(self, r => r.remove_line(customer_id, line_id))
    }

    async fn clear(&self, customer_id: &str) -> Result<u64, RepoError> {
        delegate!(self, r => r.clear(customer_id))
    }
}

#[async_trait::async_trait]
impl OrderRepository for Repo {
    async fn materialize(
        &self,
        customer_id: &str,
        intent: &OrderIntent,
    ) -> Result<Option<Order>, RepoError> {
        delegate!(self, r => r.materialize(customer_id, intent))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        delegate!(self, r => r.get(id))
    }

    async fn list(&self) -> Result<Vec<Order>, RepoError> {
        delegate!(self, r => r.list())
    }

    async fn list_by_customer(&self, customer_id: &str) -> Result<Vec<Order>, RepoError> {
        delegate!(self, r => r.list_by_customer(customer_id))
    }

    async fn list_by_provider(&self, provider_id: &str) -> Result<Vec<Order>, RepoError> {
        delegate!(self, r => r.list_by_provider(provider_id))
    }

    async fn latest_paid(&self, customer_id: &str) -> Result<Option<Order>, RepoError> {
        delegate!(self, r => r.latest_paid(customer_id))
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Option<Order>, RepoError> {
        delegate!(self, r => r.update_status(id, expected, next))
    }
}
