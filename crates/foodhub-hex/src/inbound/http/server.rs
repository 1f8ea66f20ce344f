use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::{
    routing::{get, patch, post},
    serve, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use super::handlers::*;
use crate::application::cart_service::CartService;
use crate::application::meal_service::MealService;
use crate::application::order_service::OrderService;
use crate::application::payment_service::PaymentService;
use foodhub_types::ports::identity_provider::IdentityProvider;
use foodhub_types::ports::Store;

#[derive(Clone)]
pub struct HttpServerConfig {
    pub port: String,
    /// Browser origin allowed to call the API with credentials.
    pub allowed_origin: String,
}

/// Shared handler state: the application services plus the identity port.
#[derive(Clone)]
pub struct AppState<R: Store> {
    pub meals: Arc<MealService<R>>,
    pub carts: Arc<CartService<R>>,
    pub orders: Arc<OrderService<R>>,
    pub payments: Arc<PaymentService<R>>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl<R: Store> AppState<R> {
    pub fn new(
        repo: R,
        payments: PaymentService<R>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            meals: Arc::new(MealService::new(repo.clone())),
            carts: Arc::new(CartService::new(repo.clone())),
            orders: Arc::new(OrderService::new(repo)),
            payments: Arc::new(payments),
            identity,
        }
    }
}

pub struct HttpServer<R: Store> {
    pub state: AppState<R>,
    pub config: HttpServerConfig,
}

impl<R: Store> HttpServer<R> {
    pub fn new(state: AppState<R>, config: HttpServerConfig) -> Self {
        Self { state, config }
    }

    pub fn router(&self) -> anyhow::Result<Router> {
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http_request",
                    %request_id,
                    method = %request.method(),
                    uri
                )
            })
            .on_request(
                |request: &axum::extract::Request<_>, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        method = %request.method(),
                        uri = %request.uri(),
                        "request"
                    );
                },
            )
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        status = %response.status(),
                        latency_ms = %latency.as_millis(),
                        "response"
                    );
                },
            );

        let cors = CorsLayer::new()
            .allow_origin(HeaderValue::from_str(&self.config.allowed_origin)?)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
            .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

        Ok(Router::new()
            .route("/health", get(health))
            .route("/meals", get(list_meals::<R>).post(create_meal::<R>))
            .route("/meals/{id}", get(get_meal::<R>).patch(update_meal::<R>))
            .route("/cart", get(get_cart::<R>).delete(clear_cart::<R>))
            .route("/cart/items", post(add_cart_item::<R>))
            .route(
                "/cart/items/{id}",
                patch(update_cart_item::<R>).delete(remove_cart_item::<R>),
            )
            .route("/orders", post(create_order::<R>).get(all_orders::<R>))
            .route("/orders/my", get(my_orders::<R>))
            .route("/orders/incoming", get(incoming_orders::<R>))
            .route("/orders/{id}", get(get_order::<R>))
            .route("/orders/{id}/status", patch(update_status::<R>))
            .route(
                "/payments/stripe/checkout-session",
                post(create_checkout_session::<R>),
            )
            .route(
                "/payments/stripe/confirm",
                post(confirm_checkout_session::<R>),
            )
            .layer(cors)
            .layer(trace_layer)
            .with_state(self.state.clone()))
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let app = self.router()?;
        let addr: SocketAddr = format!("0.0.0.0:{}", self.config.port).parse()?;
        tracing::info!("starting server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        serve(listener, app.into_make_service()).await?;
        Ok(())
    }
}
