use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use foodhub_hex::application::order_service::OrderService;
use foodhub_hex::application::payment_service::{CheckoutInput, PaymentService};
use foodhub_hex::config::CheckoutUrls;
use foodhub_hex::errors::AppError;
use foodhub_hex::outbound::SandboxPaymentProcessor;
use foodhub_repo::memory::InMemoryRepo;
use foodhub_types::domain::identity::Identity;
use foodhub_types::domain::meal::Meal;
use foodhub_types::domain::order::{OrderStatus, PaymentStatus, ScheduleType};
use foodhub_types::ports::cart_repository::CartRepository;
use foodhub_types::ports::meal_repository::MealRepository;
use foodhub_types::ports::order_repository::OrderRepository;
use rust_decimal::Decimal;

fn price(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

struct Fixture {
    repo: InMemoryRepo,
    sandbox: SandboxPaymentProcessor,
    orders: OrderService<InMemoryRepo>,
    payments: PaymentService<InMemoryRepo>,
    kacchi: Meal,
    borhani: Meal,
    pizza: Meal,
}

async fn fixture() -> Fixture {
    let repo = InMemoryRepo::new();
    let kacchi = repo
        .save_meal(Meal::new("prov-1", "Kacchi", price("290.00")).with_description("Mutton"))
        .await
        .unwrap();
    let borhani = repo
        .save_meal(Meal::new("prov-1", "Borhani", price("240.00")))
        .await
        .unwrap();
    let pizza = repo
        .save_meal(Meal::new("prov-2", "Pizza", price("500.00")))
        .await
        .unwrap();
    let sandbox = SandboxPaymentProcessor::new();
    let payments = PaymentService::new(
        repo.clone(),
        Arc::new(sandbox.clone()),
        CheckoutUrls::default(),
        "usd",
    );
    Fixture {
        orders: OrderService::new(repo.clone()),
        repo,
        sandbox,
        payments,
        kacchi,
        borhani,
        pizza,
    }
}

fn checkout_input(address: &str) -> CheckoutInput {
    CheckoutInput {
        delivery_address: address.into(),
        ..CheckoutInput::default()
    }
}

// Direct checkout against the in-memory adapter.
#[tokio::test]
async fn direct_checkout_then_lifecycle() {
    let fx = fixture().await;
    fx.repo.add_line("alice", fx.kacchi.id, 2).await.unwrap();
    fx.repo.add_line("alice", fx.borhani.id, 1).await.unwrap();

    let order = fx
        .orders
        .create_order("alice", "House 7, Road 3".into(), None)
        .await
        .unwrap();
    assert_eq!(order.total_amount, price("820.00"));
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_status, PaymentStatus::Unpaid);
    assert!(fx.repo.cart_snapshot("alice").await.unwrap().is_empty());

    let provider = Identity::provider("prov-1");
    for next in [
        OrderStatus::Accepted,
        OrderStatus::Preparing,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ] {
        let updated = fx
            .orders
            .update_order_status(&provider, order.id, next)
            .await
            .unwrap();
        assert_eq!(updated.status, next);
    }
    let after = fx
        .orders
        .update_order_status(&Identity::admin("root"), order.id, OrderStatus::Canceled)
        .await;
    assert!(matches!(after, Err(AppError::InvalidTransition { .. })));
}

#[tokio::test]
async fn mixed_provider_cart_is_rejected_everywhere() {
    let fx = fixture().await;
    fx.repo.add_line("bob", fx.kacchi.id, 1).await.unwrap();
    fx.repo.add_line("bob", fx.pizza.id, 1).await.unwrap();

    let direct = fx.orders.create_order("bob", "Flat 2".into(), None).await;
    assert!(matches!(direct, Err(AppError::MultiProviderCart)));

    let session = fx
        .payments
        .create_checkout_session("bob", checkout_input("Flat 2"))
        .await;
    assert!(matches!(session, Err(AppError::MultiProviderCart)));

    assert_eq!(fx.repo.cart_snapshot("bob").await.unwrap().len(), 2);
    assert!(fx.repo.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn paid_session_materializes_exactly_once() {
    let fx = fixture().await;
    fx.repo.add_line("carol", fx.kacchi.id, 2).await.unwrap();
    fx.repo.add_line("carol", fx.borhani.id, 1).await.unwrap();

    let at = DateTime::parse_from_rfc3339("2026-06-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc);
    let session = fx
        .payments
        .create_checkout_session(
            "carol",
            CheckoutInput {
                delivery_address: " Lane 4 ".into(),
                note: Some("  ".into()),
                schedule_type: Some(ScheduleType::Later),
                scheduled_at: Some(at),
                ..CheckoutInput::default()
            },
        )
        .await
        .unwrap();

    let sent = fx.sandbox.request_for(&session.session_id).unwrap();
    assert_eq!(sent.line_items.len(), 2);
    assert_eq!(sent.line_items[0].unit_amount, 29000);
    assert_eq!(sent.line_items[0].description.as_deref(), Some("Mutton"));
    assert_eq!(sent.metadata["deliveryAddress"], "Lane 4");
    assert!(!sent.metadata.contains_key("note"));
    assert_eq!(sent.cancel_url, "http://localhost:3000/cart");
    // Opening a session writes nothing locally.
    assert_eq!(fx.repo.cart_snapshot("carol").await.unwrap().len(), 2);

    let early = fx
        .payments
        .confirm_checkout_session("carol", &session.session_id)
        .await;
    assert!(matches!(early, Err(AppError::PaymentNotCompleted)));

    fx.sandbox.mark_paid(&session.session_id);
    let first = fx
        .payments
        .confirm_checkout_session("carol", &session.session_id)
        .await
        .unwrap();
    assert!(first.created);
    assert_eq!(first.order.payment_status, PaymentStatus::Paid);
    assert_eq!(first.order.schedule_type, ScheduleType::Later);
    assert_eq!(first.order.scheduled_at, Some(at));
    assert_eq!(first.order.total_amount, price("820.00"));

    let again = fx
        .payments
        .confirm_checkout_session("carol", &session.session_id)
        .await
        .unwrap();
    assert!(!again.created);
    assert_eq!(again.order.id, first.order.id);
    assert_eq!(fx.repo.list_by_customer("carol").await.unwrap().len(), 1);
}

#[tokio::test]
async fn foreign_session_is_forbidden() {
    let fx = fixture().await;
    fx.repo.add_line("dave", fx.kacchi.id, 1).await.unwrap();
    fx.repo.add_line("mallory", fx.borhani.id, 1).await.unwrap();

    let session = fx
        .payments
        .create_checkout_session("dave", checkout_input("Block C"))
        .await
        .unwrap();
    fx.sandbox.mark_paid(&session.session_id);

    let stolen = fx
        .payments
        .confirm_checkout_session("mallory", &session.session_id)
        .await;
    assert!(matches!(stolen, Err(AppError::Forbidden(_))));
    assert!(fx.repo.list().await.unwrap().is_empty());
    assert_eq!(fx.repo.cart_snapshot("mallory").await.unwrap().len(), 1);
}

#[tokio::test]
async fn checkout_input_and_session_errors() {
    let fx = fixture().await;
    let empty = fx
        .payments
        .create_checkout_session("erin", checkout_input("Ward 9"))
        .await;
    assert!(matches!(empty, Err(AppError::EmptyCart)));

    fx.repo.add_line("erin", fx.kacchi.id, 1).await.unwrap();
    let blank = fx
        .payments
        .create_checkout_session("erin", checkout_input("   "))
        .await;
    assert!(matches!(blank, Err(AppError::BadRequest(_))));

    let unscheduled = fx
        .payments
        .create_checkout_session(
            "erin",
            CheckoutInput {
                schedule_type: Some(ScheduleType::Later),
                ..checkout_input("Ward 9")
            },
        )
        .await;
    assert!(matches!(unscheduled, Err(AppError::BadRequest(_))));

    let no_id = fx.payments.confirm_checkout_session("erin", "  ").await;
    assert!(matches!(no_id, Err(AppError::BadRequest(m)) if m == "sessionId is required"));

    let unknown = fx
        .payments
        .confirm_checkout_session("erin", "cs_missing")
        .await;
    assert!(matches!(unknown, Err(AppError::SessionNotFound(_))));
}

#[tokio::test]
async fn paid_session_with_emptied_cart_and_no_order_conflicts() {
    let fx = fixture().await;
    fx.repo.add_line("frank", fx.kacchi.id, 1).await.unwrap();
    let session = fx
        .payments
        .create_checkout_session("frank", checkout_input("Road 1"))
        .await
        .unwrap();
    fx.sandbox.mark_paid(&session.session_id);
    fx.repo.clear("frank").await.unwrap();

    let res = fx
        .payments
        .confirm_checkout_session("frank", &session.session_id)
        .await;
    assert!(matches!(res, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn concurrent_confirmations_create_one_order() {
    let fx = fixture().await;
    fx.repo.add_line("gina", fx.kacchi.id, 3).await.unwrap();
    let session = fx
        .payments
        .create_checkout_session("gina", checkout_input("Ward 9"))
        .await
        .unwrap();
    fx.sandbox.mark_paid(&session.session_id);

    let payments = Arc::new(fx.payments);
    let mut handles = Vec::new();
    for _ in 0..6 {
        let payments = payments.clone();
        let id = session.session_id.clone();
        handles.push(tokio::spawn(async move {
            payments.confirm_checkout_session("gina", &id).await.unwrap()
        }));
    }
    let mut created = 0;
    let mut order_ids = Vec::new();
    for h in handles {
        let confirmed = h.await.unwrap();
        if confirmed.created {
            created += 1;
        }
        order_ids.push(confirmed.order.id);
    }
    assert_eq!(created, 1);
    order_ids.dedup();
    assert_eq!(order_ids.len(), 1);
}
