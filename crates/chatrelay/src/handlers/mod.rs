//! HTTP request handlers.

mod chat;
mod clear;
mod health;
mod listen;
mod models;

pub use chat::chat;
pub use clear::clear_session;
pub use health::health;
pub use listen::listen;
pub use models::list_models;
