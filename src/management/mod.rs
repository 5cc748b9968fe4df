mod auth;
mod store;

pub use auth::EXPIRY_MARGIN_SECS;
pub use auth::TokenManager;
pub use store::TokenStore;
