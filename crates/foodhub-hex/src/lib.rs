//! foodhub-hex: ordering core (application services) with its inbound HTTP
//! adapter and outbound payment/identity adapters.

pub mod config;
pub mod errors;

pub mod application;

pub use foodhub_types::{domain, ports};

pub mod inbound; // HTTP adapter (server + handlers)
pub mod outbound; // payment processor and identity adapters
