///  To run :
///  cargo r --example client_example
use std::sync::Arc;

use foodhub_client::{CheckoutSessionRequest, CreateOrderRequest, FoodhubClient, NewMealRequest};
use foodhub_hex::application::payment_service::PaymentService;
use foodhub_hex::config::CheckoutUrls;
use foodhub_hex::inbound::http::{AppState, HttpServer, HttpServerConfig};
use foodhub_hex::outbound::{SandboxPaymentProcessor, StaticIdentity};
use foodhub_repo::build_repo;
use foodhub_types::domain::identity::Identity;
use foodhub_types::domain::order::OrderStatus;
use rust_decimal::Decimal;
use tempfile::tempdir;

fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let port = find_free_port();
    let addr = format!("http://127.0.0.1:{port}/");

    // Use a temp file-backed SQLite DB so multiple connections see the same data.
    let tmp = tempdir()?;
    let db_path = tmp.path().join("foodhub.db");
    let db_url = format!("sqlite://{}", db_path.display());

    let repo = build_repo(Some(&db_url)).await?;

    let identity = StaticIdentity::new()
        .with_token("customer-token", Identity::customer("alice"))
        .with_token("provider-token", Identity::provider("prov-1"));
    let payments = PaymentService::new(
        repo.clone(),
        Arc::new(SandboxPaymentProcessor::auto_paid()),
        CheckoutUrls::default(),
        "usd",
    );
    let server = HttpServer::new(
        AppState::new(repo, payments, Arc::new(identity)),
        HttpServerConfig {
            port: port.to_string(),
            allowed_origin: "http://localhost:3000".into(),
        },
    );

    let handle = tokio::spawn(async move {
        server.run().await.expect("server run");
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let customer = FoodhubClient::builder(&addr)?
        .with_bearer("customer-token")?
        .build()?;
    let provider = FoodhubClient::builder(&addr)?
        .with_bearer("provider-token")?
        .build()?;

    // The provider publishes a menu.
    let mut menu = Vec::new();
    for (title, price) in [("Kacchi", 29000), ("Borhani", 24000)] {
        let meal = provider
            .create_meal(NewMealRequest {
                title: title.into(),
                description: None,
                price: Decimal::new(price, 2),
                is_available: None,
            })
            .await?;
        menu.push(meal);
    }
    let (kacchi, borhani) = (&menu[0], &menu[1]);
    println!("Menu: {} meals", customer.list_meals(Some("prov-1")).await?.len());

    // Direct checkout.
    customer.add_to_cart(kacchi.id, Some(2)).await?;
    customer.add_to_cart(borhani.id, None).await?;
    println!("Cart total={}", customer.get_cart().await?.total_amount);
    let order = customer
        .create_order(CreateOrderRequest {
            delivery_address: "House 7, Road 3".into(),
            note: None,
        })
        .await?;
    println!("Created order id={} total={}", order.id, order.total_amount);

    let accepted = provider.update_status(order.id, OrderStatus::Accepted).await?;
    println!("Provider moved order to {}", accepted.status);

    // Paid checkout through the sandbox processor.
    customer.add_to_cart(kacchi.id, None).await?;
    let session = customer
        .create_checkout_session(CheckoutSessionRequest {
            delivery_address: "House 7, Road 3".into(),
            ..CheckoutSessionRequest::default()
        })
        .await?;
    println!("Checkout session {}", session.session_id);
    let confirmed = customer.confirm_checkout_session(&session.session_id).await?;
    println!(
        "Confirmed: created={} order={} payment={:?}",
        confirmed.created, confirmed.order.id, confirmed.order.payment_status
    );
    let again = customer.confirm_checkout_session(&session.session_id).await?;
    assert!(!again.created);
    assert_eq!(again.order.id, confirmed.order.id);

    println!("My orders: {}", customer.my_orders().await?.len());

    handle.abort();
    Ok(())
}
