use crate::errors::AppError;
use foodhub_types::domain::identity::{Identity, Role};
use foodhub_types::domain::meal::Meal;
use foodhub_types::ports::Store;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewMeal {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub is_available: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct MealPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub is_available: Option<bool>,
}

impl MealPatch {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.is_available.is_none()
    }
}

fn clean_title(raw: &str) -> Result<String, AppError> {
    let title = raw.trim();
    if title.chars().count() < 2 {
        return Err(AppError::BadRequest(
            "title must be at least 2 characters".into(),
        ));
    }
    Ok(title.to_string())
}

fn check_price(price: Decimal) -> Result<Decimal, AppError> {
    if price <= Decimal::ZERO {
        return Err(AppError::BadRequest("price must be positive".into()));
    }
    Ok(price)
}

fn clean_description(raw: Option<String>) -> Option<String> {
    raw.map(|d| d.trim().to_string()).filter(|d| !d.is_empty())
}

/// Provider-managed menu. Orders never read through this service; they
/// snapshot price and title when the cart is materialized.
pub struct MealService<R: Store> {
    repo: R,
}

impl<R: Store> MealService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Adds a meal owned by the caller.
    pub async fn create_meal(&self, caller: &Identity, input: NewMeal) -> Result<Meal, AppError> {
        let mut meal = Meal::new(
            caller.user_id.clone(),
            clean_title(&input.title)?,
            check_price(input.price)?,
        );
        meal.description = clean_description(input.description);
        meal.is_available = input.is_available.unwrap_or(true);

        let meal = self.repo.save_meal(meal).await?;
        tracing::info!(meal_id = %meal.id, provider_id = %meal.provider_id, "meal created");
        Ok(meal)
    }

    /// Public listing: available meals only.
    pub async fn list_meals(&self, provider_id: Option<&str>) -> Result<Vec<Meal>, AppError> {
        let meals = self.repo.list_meals(provider_id).await?;
        Ok(meals.into_iter().filter(|m| m.is_available).collect())
    }

    pub async fn get_meal(&self, id: Uuid) -> Result<Meal, AppError> {
        self.repo
            .get_meal(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Meal not found".into()))
    }

    /// Applies `patch` to a meal the caller owns; admins may edit any meal.
    pub async fn update_meal(
        &self,
        caller: &Identity,
        id: Uuid,
        patch: MealPatch,
    ) -> Result<Meal, AppError> {
        if patch.is_empty() {
            return Err(AppError::BadRequest("At least one field is required".into()));
        }
        let mut meal = self.get_meal(id).await?;
        if caller.role != Role::Admin && meal.provider_id != caller.user_id {
            return Err(AppError::Forbidden("Forbidden".into()));
        }

        if let Some(title) = patch.title {
            meal.title = clean_title(&title)?;
        }
        if let Some(price) = patch.price {
            meal.price = check_price(price)?;
        }
        if patch.description.is_some() {
            meal.description = clean_description(patch.description);
        }
        if let Some(available) = patch.is_available {
            meal.is_available = available;
        }

        let meal = self.repo.save_meal(meal).await?;
        tracing::info!(meal_id = %meal.id, by = %caller.user_id, "meal updated");
        Ok(meal)
    }
}
