//! Stripe Checkout over the REST API (no SDK dependency).

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use crate::config::StripeConfig;
use foodhub_types::domain::payment::{
    CheckoutRequest, CheckoutSession, ProcessorPaymentStatus, ProcessorSession,
};
use foodhub_types::ports::payment_processor::{PaymentError, PaymentProcessor};

#[derive(Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    api_base: Url,
    secret_key: Option<String>,
}

#[derive(Deserialize)]
struct StripeSession {
    id: String,
    url: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorBody,
}

#[derive(Deserialize)]
struct StripeErrorBody {
    message: Option<String>,
    code: Option<String>,
}

impl StripeGateway {
    pub fn new(config: &StripeConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            client,
            api_base: Url::parse(&config.api_base)?,
            secret_key: config.secret_key.clone(),
        })
    }

    fn secret_key(&self) -> Result<&str, PaymentError> {
        self.secret_key
            .as_deref()
            .ok_or_else(|| PaymentError::Misconfigured("STRIPE_SECRET_KEY is missing".into()))
    }

    fn sessions_url(&self, session_id: Option<&str>) -> Result<Url, PaymentError> {
        let mut url = self.api_base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| PaymentError::Misconfigured("STRIPE_API_BASE is not a base url".into()))?;
            segments.pop_if_empty().extend(["v1", "checkout", "sessions"]);
            if let Some(id) = session_id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    async fn error_from(resp: reqwest::Response) -> PaymentError {
        let status = resp.status();
        let message = resp
            .json::<StripeErrorEnvelope>()
            .await
            .ok()
            .and_then(|e| e.error.message)
            .unwrap_or_else(|| format!("unexpected status {status}"));
        PaymentError::Upstream(message)
    }
}

/// Flattens a checkout request into Stripe's bracketed form encoding.
fn checkout_form(request: &CheckoutRequest) -> Vec<(String, String)> {
    let mut form = vec![
        ("mode".to_string(), "payment".to_string()),
        ("payment_method_types[0]".to_string(), "card".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
    ];
    for (i, item) in request.line_items.iter().enumerate() {
        let key = |field: &str| format!("line_items[{i}][{field}]");
        form.push((key("quantity"), item.quantity.to_string()));
        form.push((key("price_data][currency"), item.currency.clone()));
        form.push((key("price_data][unit_amount"), item.unit_amount.to_string()));
        form.push((key("price_data][product_data][name"), item.name.clone()));
        if let Some(description) = item.description.as_deref().filter(|d| !d.is_empty()) {
            form.push((
                key("price_data][product_data][description"),
                description.to_string(),
            ));
        }
    }
    for (k, v) in &request.metadata {
        form.push((format!("metadata[{k}]"), v.clone()));
    }
    form
}

#[async_trait]
impl PaymentProcessor for StripeGateway {
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let key = self.secret_key()?;
        let resp = self
            .client
            .post(self.sessions_url(None)?)
            .basic_auth(key, None::<&str>)
            .form(&checkout_form(&request))
            .send()
            .await
            .map_err(|e| PaymentError::Upstream(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Self::error_from(resp).await);
        }
        let session: StripeSession = resp
            .json()
            .await
            .map_err(|e| PaymentError::Upstream(e.to_string()))?;
        Ok(CheckoutSession {
            session_id: session.id,
            checkout_url: session.url,
        })
    }

    async fn retrieve_session(
        &self,
        session_id: &str,
    ) -> Result<Option<ProcessorSession>, PaymentError> {
        let key = self.secret_key()?;
        let resp = self
            .client
            .get(self.sessions_url(Some(session_id))?)
            .basic_auth(key, None::<&str>)
            .send()
            .await
            .map_err(|e| PaymentError::Upstream(e.to_string()))?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = resp.json::<StripeErrorEnvelope>().await.ok();
            return match body {
                Some(e) if e.error.code.as_deref() == Some("resource_missing") => Ok(None),
                Some(e) => Err(PaymentError::Upstream(
                    e.error
                        .message
                        .unwrap_or_else(|| format!("unexpected status {status}")),
                )),
                None => Err(PaymentError::Upstream(format!("unexpected status {status}"))),
            };
        }
        let session: StripeSession = resp
            .json()
            .await
            .map_err(|e| PaymentError::Upstream(e.to_string()))?;
        Ok(Some(ProcessorSession {
            id: session.id,
            payment_status: session
                .payment_status
                .as_deref()
                .map(ProcessorPaymentStatus::from_processor)
                .unwrap_or(ProcessorPaymentStatus::Unpaid),
            metadata: session.metadata,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foodhub_types::domain::payment::CheckoutLineItem;
    use httpmock::prelude::*;
    use serde_json::json;

    fn gateway(base: &str, key: Option<&str>) -> StripeGateway {
        StripeGateway::new(&StripeConfig {
            secret_key: key.map(str::to_string),
            api_base: base.to_string(),
            ..StripeConfig::default()
        })
        .unwrap()
    }

    fn request() -> CheckoutRequest {
        let mut metadata = BTreeMap::new();
        metadata.insert("customerId".to_string(), "cust-1".to_string());
        CheckoutRequest {
            line_items: vec![CheckoutLineItem {
                name: "Kacchi".into(),
                description: Some("Mutton".into()),
                quantity: 2,
                unit_amount: 29000,
                currency: "usd".into(),
            }],
            metadata,
            success_url: "https://food.example/ok".into(),
            cancel_url: "https://food.example/cart".into(),
        }
    }

    #[test]
    fn form_uses_bracketed_keys() {
        let form = checkout_form(&request());
        let has = |k: &str, v: &str| form.iter().any(|(fk, fv)| fk == k && fv == v);
        assert!(has("mode", "payment"));
        assert!(has("line_items[0][quantity]", "2"));
        assert!(has("line_items[0][price_data][unit_amount]", "29000"));
        assert!(has("line_items[0][price_data][product_data][name]", "Kacchi"));
        assert!(has("metadata[customerId]", "cust-1"));
    }

    #[tokio::test]
    async fn creates_session_with_basic_auth() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/checkout/sessions")
                    .header_exists("authorization")
                    .body_contains("mode=payment");
                then.status(200).json_body(json!({
                    "id": "cs_test_123",
                    "url": "https://checkout.stripe.com/c/pay/cs_test_123"
                }));
            })
            .await;

        let session = gateway(&server.base_url(), Some("sk_test_x"))
            .create_checkout_session(request())
            .await
            .unwrap();
        assert_eq!(session.session_id, "cs_test_123");
        assert!(session.checkout_url.unwrap().contains("cs_test_123"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn retrieves_paid_session_metadata() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/checkout/sessions/cs_test_9");
                then.status(200).json_body(json!({
                    "id": "cs_test_9",
                    "url": null,
                    "payment_status": "paid",
                    "metadata": { "customerId": "cust-1", "deliveryAddress": "1 Road" }
                }));
            })
            .await;

        let session = gateway(&server.base_url(), Some("sk_test_x"))
            .retrieve_session("cs_test_9")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.payment_status, ProcessorPaymentStatus::Paid);
        assert_eq!(session.metadata["deliveryAddress"], "1 Road");
    }

    #[tokio::test]
    async fn missing_session_is_none_and_errors_surface() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/checkout/sessions/cs_gone");
                then.status(404).json_body(json!({
                    "error": { "code": "resource_missing", "message": "No such checkout.session" }
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/checkout/sessions");
                then.status(400).json_body(json!({
                    "error": { "message": "Invalid currency" }
                }));
            })
            .await;

        let gw = gateway(&server.base_url(), Some("sk_test_x"));
        assert!(gw.retrieve_session("cs_gone").await.unwrap().is_none());
        let err = gw.create_checkout_session(request()).await.unwrap_err();
        assert!(matches!(err, PaymentError::Upstream(m) if m == "Invalid currency"));
    }

    #[tokio::test]
    async fn missing_key_is_misconfigured() {
        let gw = gateway("http://127.0.0.1:9", None);
        let err = gw.retrieve_session("cs_x").await.unwrap_err();
        assert!(matches!(err, PaymentError::Misconfigured(_)));
    }
}
