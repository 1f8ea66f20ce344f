use std::sync::Arc;

use foodhub_hex::application::payment_service::PaymentService;
use foodhub_hex::config::{Config, PaymentBackend};
use foodhub_hex::inbound::http::{AppState, HttpServer, HttpServerConfig};
use foodhub_hex::outbound::{AuthServiceIdentity, SandboxPaymentProcessor, StripeGateway};
use foodhub_hex::ports::payment_processor::PaymentProcessor;
use foodhub_repo::{build_repo, Repo};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for DATABASE_URL / SERVER_PORT / STRIPE_* when present.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string()))
        .init();

    let config = Config::from_env()?;
    let repo: Repo = build_repo(config.database_url.as_deref()).await?;

    let processor: Arc<dyn PaymentProcessor> = match config.payment_backend {
        PaymentBackend::Stripe => {
            if config.stripe.secret_key.is_none() {
                tracing::warn!("STRIPE_SECRET_KEY is not set; paid checkout will fail");
            }
            Arc::new(StripeGateway::new(&config.stripe)?)
        }
        PaymentBackend::Sandbox => {
            tracing::warn!("using sandbox payments; sessions are paid immediately");
            Arc::new(SandboxPaymentProcessor::auto_paid())
        }
    };
    let payments = PaymentService::new(
        repo.clone(),
        processor,
        config.checkout_urls.clone(),
        config.stripe.currency.clone(),
    );

    let http_client = reqwest::Client::builder()
        .timeout(config.stripe.timeout())
        .build()?;
    let identity = AuthServiceIdentity::new(&config.auth_service_url, http_client)?;

    let state = AppState::new(repo, payments, Arc::new(identity));
    let server_cfg = HttpServerConfig {
        port: config.server_port.clone(),
        allowed_origin: config.checkout_urls.app_url.clone(),
    };

    HttpServer::new(state, server_cfg).run().await
}
