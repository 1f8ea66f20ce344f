use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::auth::{authenticate, ADMIN, ANY_ROLE, CUSTOMER, MENU_EDITORS, PROVIDER};
use super::extract::AppJson;
use super::server::AppState;
use crate::application::meal_service::{MealPatch, NewMeal};
use crate::application::payment_service::{CheckoutInput, ConfirmedCheckout};
use crate::errors::AppError;
use foodhub_types::domain::cart::{Cart, CartLine};
use foodhub_types::domain::meal::Meal;
use foodhub_types::domain::order::{Order, OrderStatus};
use foodhub_types::domain::payment::CheckoutSession;
use foodhub_types::ports::Store;

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub delivery_address: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemRequest {
    pub meal_id: Uuid,
    #[serde(default)]
    pub quantity: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UpdateCartItemRequest {
    pub quantity: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct MealQuery {
    #[serde(default)]
    pub provider_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmSessionRequest {
    #[serde(default)]
    pub session_id: String,
}

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}

pub(super) async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

// meals

pub(super) async fn list_meals<R: Store>(
    State(state): State<AppState<R>>,
    Query(query): Query<MealQuery>,
) -> Result<Json<Vec<Meal>>, AppError> {
    Ok(Json(
        state.meals.list_meals(query.provider_id.as_deref()).await?,
    ))
}

pub(super) async fn get_meal<R: Store>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<Json<Meal>, AppError> {
    Ok(Json(state.meals.get_meal(parse_id(&id)?).await?))
}

pub(super) async fn create_meal<R: Store>(
    State(state): State<AppState<R>>,
    headers: HeaderMap,
    AppJson(payload): AppJson<NewMeal>,
) -> Result<(StatusCode, Json<Meal>), AppError> {
    let caller = authenticate(&state, &headers, MENU_EDITORS).await?;
    let meal = state.meals.create_meal(&caller, payload).await?;
    Ok((StatusCode::CREATED, Json(meal)))
}

pub(super) async fn update_meal<R: Store>(
    State(state): State<AppState<R>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    AppJson(payload): AppJson<MealPatch>,
) -> Result<Json<Meal>, AppError> {
    let caller = authenticate(&state, &headers, MENU_EDITORS).await?;
    Ok(Json(
        state
            .meals
            .update_meal(&caller, parse_id(&id)?, payload)
            .await?,
    ))
}

// cart

pub(super) async fn get_cart<R: Store>(
    State(state): State<AppState<R>>,
    headers: HeaderMap,
) -> Result<Json<Cart>, AppError> {
    let caller = authenticate(&state, &headers, CUSTOMER).await?;
    Ok(Json(state.carts.get_cart(&caller.user_id).await?))
}

pub(super) async fn add_cart_item<R: Store>(
    State(state): State<AppState<R>>,
    headers: HeaderMap,
    AppJson(payload): AppJson<AddCartItemRequest>,
) -> Result<(StatusCode, Json<CartLine>), AppError> {
    let caller = authenticate(&state, &headers, CUSTOMER).await?;
    let line = state
        .carts
        .add_item(&caller.user_id, payload.meal_id, payload.quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(line)))
}

pub(super) async fn update_cart_item<R: Store>(
    State(state): State<AppState<R>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateCartItemRequest>,
) -> Result<Json<CartLine>, AppError> {
    let caller = authenticate(&state, &headers, CUSTOMER).await?;
    let line = state
        .carts
        .update_item(&caller.user_id, parse_id(&id)?, payload.quantity)
        .await?;
    Ok(Json(line))
}

pub(super) async fn remove_cart_item<R: Store>(
    State(state): State<AppState<R>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let caller = authenticate(&state, &headers, CUSTOMER).await?;
    state.carts.remove_item(&caller.user_id, parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn clear_cart<R: Store>(
    State(state): State<AppState<R>>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let caller = authenticate(&state, &headers, CUSTOMER).await?;
    state.carts.clear(&caller.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// orders

pub(super) async fn create_order<R: Store>(
    State(state): State<AppState<R>>,
    headers: HeaderMap,
    AppJson(payload): AppJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let caller = authenticate(&state, &headers, CUSTOMER).await?;
    let order = state
        .orders
        .create_order(&caller.user_id, payload.delivery_address, payload.note)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub(super) async fn my_orders<R: Store>(
    State(state): State<AppState<R>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Order>>, AppError> {
    let caller = authenticate(&state, &headers, CUSTOMER).await?;
    Ok(Json(state.orders.get_my_orders(&caller.user_id).await?))
}

pub(super) async fn incoming_orders<R: Store>(
    State(state): State<AppState<R>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Order>>, AppError> {
    let caller = authenticate(&state, &headers, PROVIDER).await?;
    Ok(Json(state.orders.get_incoming_orders(&caller.user_id).await?))
}

pub(super) async fn all_orders<R: Store>(
    State(state): State<AppState<R>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Order>>, AppError> {
    authenticate(&state, &headers, ADMIN).await?;
    Ok(Json(state.orders.get_all_orders().await?))
}

pub(super) async fn get_order<R: Store>(
    State(state): State<AppState<R>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Order>, AppError> {
    let caller = authenticate(&state, &headers, ANY_ROLE).await?;
    let order = state.orders.get_order_by_id(&caller, parse_id(&id)?).await?;
    Ok(Json(order))
}

pub(super) async fn update_status<R: Store>(
    State(state): State<AppState<R>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateStatusRequest>,
) -> Result<Json<Order>, AppError> {
    let caller = authenticate(&state, &headers, ANY_ROLE).await?;
    let updated = state
        .orders
        .update_order_status(&caller, parse_id(&id)?, payload.status)
        .await?;
    Ok(Json(updated))
}

// payments

pub(super) async fn create_checkout_session<R: Store>(
    State(state): State<AppState<R>>,
    headers: HeaderMap,
    AppJson(payload): AppJson<CheckoutInput>,
) -> Result<Json<CheckoutSession>, AppError> {
    let caller = authenticate(&state, &headers, CUSTOMER).await?;
    let session = state
        .payments
        .create_checkout_session(&caller.user_id, payload)
        .await?;
    Ok(Json(session))
}

pub(super) async fn confirm_checkout_session<R: Store>(
    State(state): State<AppState<R>>,
    headers: HeaderMap,
    AppJson(payload): AppJson<ConfirmSessionRequest>,
) -> Result<(StatusCode, Json<ConfirmedCheckout>), AppError> {
    let caller = authenticate(&state, &headers, CUSTOMER).await?;
    let confirmed = state
        .payments
        .confirm_checkout_session(&caller.user_id, &payload.session_id)
        .await?;
    let status = if confirmed.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(confirmed)))
}
