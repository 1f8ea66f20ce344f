use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::meal::Meal;
use crate::ports::order_repository::RepoError;

#[async_trait]
pub trait MealRepository: Send + Sync + 'static {
    async fn get_meal(&self, id: Uuid) -> Result<Option<Meal>, RepoError>;

    /// Every meal, optionally narrowed to one provider, ordered by title.
    async fn list_meals(&self, provider_id: Option<&str>) -> Result<Vec<Meal>, RepoError>;

    /// Inserts or replaces a meal.
    async fn save_meal(&self, meal: Meal) -> Result<Meal, RepoError>;
}
