pub mod auth_service;
pub mod sandbox;
pub mod static_identity;
pub mod stripe;

pub use auth_service::AuthServiceIdentity;
pub use sandbox::SandboxPaymentProcessor;
pub use static_identity::StaticIdentity;
pub use stripe::StripeGateway;
