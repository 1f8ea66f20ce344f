use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentBackend {
    Stripe,
    Sandbox,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: String,
    pub database_url: Option<String>,
    pub auth_service_url: String,
    pub payment_backend: PaymentBackend,
    pub stripe: StripeConfig,
    pub checkout_urls: CheckoutUrls,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StripeConfig {
    pub secret_key: Option<String>,
    pub api_base: String,
    pub currency: String,
    pub timeout_secs: u64,
}

impl StripeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            api_base: "https://api.stripe.com".into(),
            currency: "usd".into(),
            timeout_secs: 10,
        }
    }
}

/// Where the hosted checkout page sends the customer afterwards.
#[derive(Debug, Deserialize, Clone)]
pub struct CheckoutUrls {
    pub app_url: String,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
}

impl CheckoutUrls {
    /// Caller-supplied url, then configured url, then the app default.
    pub fn success(&self, requested: Option<&str>) -> String {
        pick(requested, self.success_url.as_deref()).unwrap_or_else(|| {
            format!(
                "{}/payment-success?session_id={{CHECKOUT_SESSION_ID}}",
                self.app_url
            )
        })
    }

    pub fn cancel(&self, requested: Option<&str>) -> String {
        pick(requested, self.cancel_url.as_deref()).unwrap_or_else(|| format!("{}/cart", self.app_url))
    }
}

impl Default for CheckoutUrls {
    fn default() -> Self {
        Self {
            app_url: "http://localhost:3000".into(),
            success_url: None,
            cancel_url: None,
        }
    }
}

fn pick(requested: Option<&str>, configured: Option<&str>) -> Option<String> {
    requested
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .or(configured)
        .map(str::to_string)
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let server_port = env::var("SERVER_PORT").unwrap_or_else(|_| "3000".into());
        let database_url = env::var("DATABASE_URL").ok();
        let auth_service_url =
            env::var("AUTH_SERVICE_URL").unwrap_or_else(|_| "http://127.0.0.1:4000".into());
        let payment_backend = match env::var("PAYMENT_BACKEND").as_deref() {
            Ok("sandbox") => PaymentBackend::Sandbox,
            Ok("stripe") | Err(_) => PaymentBackend::Stripe,
            Ok(other) => anyhow::bail!("unknown PAYMENT_BACKEND {other}"),
        };

        let defaults = StripeConfig::default();
        let timeout_secs = match env::var("PAYMENT_TIMEOUT_SECS") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.timeout_secs,
        };
        let stripe = StripeConfig {
            secret_key: non_empty("STRIPE_SECRET_KEY"),
            api_base: non_empty("STRIPE_API_BASE").unwrap_or(defaults.api_base),
            currency: non_empty("STRIPE_CURRENCY").unwrap_or(defaults.currency),
            timeout_secs,
        };

        let checkout_urls = CheckoutUrls {
            app_url: non_empty("APP_URL").unwrap_or_else(|| CheckoutUrls::default().app_url),
            success_url: non_empty("STRIPE_SUCCESS_URL"),
            cancel_url: non_empty("STRIPE_CANCEL_URL"),
        };

        Ok(Self {
            server_port,
            database_url,
            auth_service_url,
            payment_backend,
            stripe,
            checkout_urls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_urls_fall_back_in_order() {
        let urls = CheckoutUrls {
            app_url: "https://food.example".into(),
            success_url: None,
            cancel_url: Some("https://food.example/basket".into()),
        };
        assert_eq!(
            urls.success(None),
            "https://food.example/payment-success?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(urls.success(Some("  ")), urls.success(None));
        assert_eq!(urls.success(Some("https://x/ok")), "https://x/ok");
        assert_eq!(urls.cancel(None), "https://food.example/basket");

        let bare = CheckoutUrls::default();
        assert_eq!(bare.cancel(None), "http://localhost:3000/cart");
    }
}
