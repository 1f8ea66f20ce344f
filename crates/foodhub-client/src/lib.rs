use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use foodhub_types::domain::cart::{Cart, CartLine};
use foodhub_types::domain::meal::Meal;
use foodhub_types::domain::order::{Order, OrderStatus, ScheduleType};
use foodhub_types::domain::payment::{CheckoutSession, ProcessorPaymentStatus};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::Url;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone)]
pub struct FoodhubClientBuilder {
    base: Url,
    headers: HeaderMap,
    timeout: Option<Duration>,
    client: Option<reqwest::Client>,
}

#[derive(Clone)]
pub struct FoodhubClient {
    base: Url,
    client: reqwest::Client,
}

/// A non-2xx answer from the API, carrying its `{error, kind}` body.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{status} {kind}: {message}")]
pub struct ApiError {
    pub status: u16,
    pub kind: String,
    pub message: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    kind: String,
}

async fn decode<T: DeserializeOwned>(res: reqwest::Response) -> anyhow::Result<T> {
    let res = check(res).await?;
    Ok(res.json().await?)
}

async fn check(res: reqwest::Response) -> anyhow::Result<reqwest::Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.json::<ErrorBody>().await.ok();
    let (kind, message) = body
        .map(|b| (b.kind, b.error))
        .unwrap_or_else(|| ("UNKNOWN".into(), status.to_string()));
    tracing::debug!(%status, %kind, "api call rejected");
    Err(ApiError {
        status: status.as_u16(),
        kind,
        message,
    }
    .into())
}

impl FoodhubClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::builder(base_url)?.build()
    }

    pub fn builder(base_url: &str) -> anyhow::Result<FoodhubClientBuilder> {
        let base = Url::parse(base_url).context("invalid base url")?;
        Ok(FoodhubClientBuilder {
            base,
            headers: HeaderMap::new(),
            timeout: None,
            client: None,
        })
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base.join(path).context("failed to join url")
    }

    /// Available meals, optionally for one provider.
    pub async fn list_meals(&self, provider_id: Option<&str>) -> anyhow::Result<Vec<Meal>> {
        let mut url = self.url("meals")?;
        if let Some(provider) = provider_id {
            url.query_pairs_mut().append_pair("providerId", provider);
        }
        decode(self.client.get(url).send().await?).await
    }

    pub async fn get_meal(&self, id: Uuid) -> anyhow::Result<Meal> {
        decode(self.client.get(self.url(&format!("meals/{id}"))?).send().await?).await
    }

    pub async fn create_meal(&self, req: NewMealRequest) -> anyhow::Result<Meal> {
        let res = self.client.post(self.url("meals")?).json(&req).send().await?;
        decode(res).await
    }

    pub async fn get_cart(&self) -> anyhow::Result<Cart> {
        decode(self.client.get(self.url("cart")?).send().await?).await
    }

    pub async fn add_to_cart(&self, meal_id: Uuid, quantity: Option<u32>) -> anyhow::Result<CartLine> {
        let res = self
            .client
            .post(self.url("cart/items")?)
            .json(&AddCartItemRequest { meal_id, quantity })
            .send()
            .await?;
        decode(res).await
    }

    pub async fn update_cart_item(&self, line_id: Uuid, quantity: u32) -> anyhow::Result<CartLine> {
        let res = self
            .client
            .patch(self.url(&format!("cart/items/{line_id}"))?)
            .json(&UpdateCartItemRequest { quantity })
            .send()
            .await?;
        decode(res).await
    }

    pub async fn remove_cart_item(&self, line_id: Uuid) -> anyhow::Result<()> {
        let res = self
            .client
            .delete(self.url(&format!("cart/items/{line_id}"))?)
            .send()
            .await?;
        check(res).await?;
        Ok(())
    }

    pub async fn clear_cart(&self) -> anyhow::Result<()> {
        check(self.client.delete(self.url("cart")?).send().await?).await?;
        Ok(())
    }

    pub async fn create_order(&self, req: CreateOrderRequest) -> anyhow::Result<Order> {
        let res = self.client.post(self.url("orders")?).json(&req).send().await?;
        decode(res).await
    }

    pub async fn my_orders(&self) -> anyhow::Result<Vec<Order>> {
        decode(self.client.get(self.url("orders/my")?).send().await?).await
    }

    pub async fn incoming_orders(&self) -> anyhow::Result<Vec<Order>> {
        decode(self.client.get(self.url("orders/incoming")?).send().await?).await
    }

    pub async fn all_orders(&self) -> anyhow::Result<Vec<Order>> {
        decode(self.client.get(self.url("orders")?).send().await?).await
    }

    pub async fn get_order(&self, id: Uuid) -> anyhow::Result<Order> {
        decode(self.client.get(self.url(&format!("orders/{id}"))?).send().await?).await
    }

    pub async fn update_status(&self, id: Uuid, status: OrderStatus) -> anyhow::Result<Order> {
        let res = self
            .client
            .patch(self.url(&format!("orders/{id}/status"))?)
            .json(&UpdateStatusRequest { status })
            .send()
            .await?;
        decode(res).await
    }

    pub async fn create_checkout_session(
        &self,
        req: CheckoutSessionRequest,
    ) -> anyhow::Result<CheckoutSession> {
        let res = self
            .client
            .post(self.url("payments/stripe/checkout-session")?)
            .json(&req)
            .send()
            .await?;
        decode(res).await
    }

    pub async fn confirm_checkout_session(
        &self,
        session_id: &str,
    ) -> anyhow::Result<CheckoutConfirmation> {
        let res = self
            .client
            .post(self.url("payments/stripe/confirm")?)
            .json(&ConfirmSessionRequest {
                session_id: session_id.to_string(),
            })
            .send()
            .await?;
        decode(res).await
    }
}

impl FoodhubClientBuilder {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(
        mut self,
        key: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> anyhow::Result<Self> {
        let header_name =
            HeaderName::from_bytes(key.as_ref().as_bytes()).context("invalid header name")?;
        let header_value = HeaderValue::from_str(value.as_ref()).context("invalid header value")?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    /// Sends `Authorization: Bearer <token>` on every request.
    pub fn with_bearer(mut self, token: impl AsRef<str>) -> anyhow::Result<Self> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.as_ref()))
            .context("invalid bearer token")?;
        value.set_sensitive(true);
        self.headers.insert(AUTHORIZATION, value);
        Ok(self)
    }

    pub fn with_reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> anyhow::Result<FoodhubClient> {
        if let Some(client) = self.client {
            return Ok(FoodhubClient {
                base: self.base,
                client,
            });
        }

        let mut builder = reqwest::Client::builder();
        if !self.headers.is_empty() {
            builder = builder.default_headers(self.headers);
        }
        if let Some(t) = self.timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build()?;
        Ok(FoodhubClient {
            base: self.base,
            client,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub delivery_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewMealRequest {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionRequest {
    pub delivery_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_type: Option<ScheduleType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_url: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutConfirmation {
    pub session_id: String,
    pub payment_status: ProcessorPaymentStatus,
    pub created: bool,
    pub order: Order,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
struct AddCartItemRequest {
    meal_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    quantity: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct UpdateCartItemRequest {
    quantity: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct UpdateStatusRequest {
    status: OrderStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
struct ConfirmSessionRequest {
    session_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use foodhub_types::domain::cart::CartEntry;
    use foodhub_types::domain::meal::Meal;
    use foodhub_types::domain::order::OrderIntent;
    use httpmock::prelude::*;
    use rust_decimal::Decimal;
    use serde_json::json;

    fn sample_order() -> Order {
        let meal = Meal::new("prov-1", "Kacchi", Decimal::new(29000, 2));
        let entries = vec![CartEntry {
            line: CartLine::new("alice", meal.id, 2).unwrap(),
            meal,
        }];
        let intent = OrderIntent::direct("House 7".into(), None).unwrap();
        Order::from_cart("alice", &intent, &entries).unwrap()
    }

    #[tokio::test]
    async fn create_and_get_order_with_bearer() {
        let server = MockServer::start_async().await;
        let order = sample_order();

        let create_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/orders")
                    .header("authorization", "Bearer tok-1")
                    .json_body(json!({ "deliveryAddress": "House 7" }));
                then.status(201).json_body_obj(&order);
            })
            .await;
        let get_mock = server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/orders/{}", order.id));
                then.status(200).json_body_obj(&order);
            })
            .await;

        let client = FoodhubClient::builder(&server.base_url())
            .unwrap()
            .with_bearer("tok-1")
            .unwrap()
            .build()
            .unwrap();
        let created = client
            .create_order(CreateOrderRequest {
                delivery_address: "House 7".into(),
                note: None,
            })
            .await
            .unwrap();
        assert_eq!(created.id, order.id);
        assert_eq!(created.total_amount, Decimal::new(58000, 2));

        let fetched = client.get_order(order.id).await.unwrap();
        assert_eq!(fetched, order);

        create_mock.assert_async().await;
        get_mock.assert_async().await;
    }

    #[tokio::test]
    async fn status_update_and_api_errors() {
        let server = MockServer::start_async().await;
        let order = sample_order();

        let update_mock = server
            .mock_async(|when, then| {
                when.method(httpmock::Method::PATCH)
                    .path(format!("/orders/{}/status", order.id))
                    .json_body(json!({ "status": "ACCEPTED" }));
                let mut updated = order.clone();
                updated.status = OrderStatus::Accepted;
                then.status(200).json_body_obj(&updated);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/orders/my");
                then.status(403).json_body(json!({
                    "error": "Your account is suspended",
                    "kind": "FORBIDDEN"
                }));
            })
            .await;

        let client = FoodhubClient::new(&server.base_url()).unwrap();
        let updated = client
            .update_status(order.id, OrderStatus::Accepted)
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Accepted);

        let err = client.my_orders().await.unwrap_err();
        let api = err.downcast_ref::<ApiError>().unwrap();
        assert_eq!(api.status, 403);
        assert_eq!(api.kind, "FORBIDDEN");
        assert_eq!(api.message, "Your account is suspended");

        update_mock.assert_async().await;
    }

    #[tokio::test]
    async fn checkout_session_round_trip() {
        let server = MockServer::start_async().await;
        let mut order = sample_order();
        order.payment_status = foodhub_types::domain::order::PaymentStatus::Paid;

        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/payments/stripe/checkout-session")
                    .json_body(json!({ "deliveryAddress": "Lane 4", "scheduleType": "NOW" }));
                then.status(200).json_body(json!({
                    "sessionId": "cs_test_1",
                    "checkoutUrl": "https://pay.example/cs_test_1"
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/payments/stripe/confirm")
                    .json_body(json!({ "sessionId": "cs_test_1" }));
                then.status(201).json_body(json!({
                    "sessionId": "cs_test_1",
                    "paymentStatus": "paid",
                    "created": true,
                    "order": order
                }));
            })
            .await;

        let client = FoodhubClient::new(&server.base_url()).unwrap();
        let session = client
            .create_checkout_session(CheckoutSessionRequest {
                delivery_address: "Lane 4".into(),
                schedule_type: Some(ScheduleType::Now),
                ..CheckoutSessionRequest::default()
            })
            .await
            .unwrap();
        assert_eq!(session.session_id, "cs_test_1");

        let confirmed = client
            .confirm_checkout_session(&session.session_id)
            .await
            .unwrap();
        assert!(confirmed.created);
        assert_eq!(confirmed.payment_status, ProcessorPaymentStatus::Paid);
        assert_eq!(confirmed.order.id, order.id);
    }

    #[tokio::test]
    async fn cart_calls_hit_expected_paths() {
        let server = MockServer::start_async().await;
        let line = CartLine::new("alice", Uuid::new_v4(), 2).unwrap();

        let add = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/cart/items")
                    .json_body(json!({ "mealId": line.meal_id, "quantity": 2 }));
                then.status(201).json_body_obj(&line);
            })
            .await;
        let remove = server
            .mock_async(|when, then| {
                when.method(DELETE).path(format!("/cart/items/{}", line.id));
                then.status(204);
            })
            .await;
        let clear = server
            .mock_async(|when, then| {
                when.method(DELETE).path("/cart");
                then.status(204);
            })
            .await;

        let client = FoodhubClient::new(&server.base_url()).unwrap();
        let added = client.add_to_cart(line.meal_id, Some(2)).await.unwrap();
        assert_eq!(added, line);
        client.remove_cart_item(line.id).await.unwrap();
        client.clear_cart().await.unwrap();

        add.assert_async().await;
        remove.assert_async().await;
        clear.assert_async().await;
    }

    #[tokio::test]
    async fn meal_catalog_calls() {
        let server = MockServer::start_async().await;
        let meal = Meal::new("prov-1", "Tehari", Decimal::new(18000, 2));

        let create_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/meals")
                    .header("authorization", "Bearer prov-tok")
                    .json_body(json!({ "title": "Tehari", "price": "180.00" }));
                then.status(201).json_body_obj(&meal);
            })
            .await;
        let list_mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/meals")
                    .query_param("providerId", "prov-1");
                then.status(200).json_body_obj(&vec![meal.clone()]);
            })
            .await;

        let client = FoodhubClient::builder(&server.base_url())
            .unwrap()
            .with_bearer("prov-tok")
            .unwrap()
            .build()
            .unwrap();
        let created = client
            .create_meal(NewMealRequest {
                title: "Tehari".into(),
                description: None,
                price: Decimal::new(18000, 2),
                is_available: None,
            })
            .await
            .unwrap();
        assert_eq!(created, meal);

        let listed = client.list_meals(Some("prov-1")).await.unwrap();
        assert_eq!(listed, vec![meal]);

        create_mock.assert_async().await;
        list_mock.assert_async().await;
    }
}
