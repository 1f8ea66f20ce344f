pub mod cart_repository;
pub mod identity_provider;
pub mod meal_repository;
pub mod order_repository;
pub mod payment_processor;

use cart_repository::CartRepository;
use meal_repository::MealRepository;
use order_repository::OrderRepository;

/// Everything the ordering core needs from persistent storage.
pub trait Store: MealRepository + CartRepository + OrderRepository + Clone {}

impl<T> Store for T where T: MealRepository + CartRepository + OrderRepository + Clone {}
