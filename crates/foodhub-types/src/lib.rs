//! foodhub-types: domain model and ports shared by the store adapters,
//! the application core and the HTTP client.

pub mod domain;
pub mod ports;
