mod auth;
mod extract;
mod handlers;
mod server;

pub use handlers::{
    AddCartItemRequest, ConfirmSessionRequest, CreateOrderRequest, MealQuery,
    UpdateCartItemRequest, UpdateStatusRequest,
};
pub use server::{AppState, HttpServer, HttpServerConfig};
