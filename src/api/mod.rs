//! # API Module
//!
//! HTTP handlers served by the short-lived redirect listener (see
//! [`crate::server`]) while an authorization is in progress.
//!
//! ## Endpoints
//!
//! - [`callback`] - Receives the browser redirect from the Spotify
//!   authorization server. It reads `code`, `error` and `state` from the
//!   query string, hands the result to the waiting flow exactly once and
//!   renders a short page telling the user they may close the window. The
//!   route is mounted on the path of the configured redirect URI.
//! - [`health`] - Reports that the listener is up, with the crate version.
//!   Handy when checking that the redirect port is reachable.
//!
//! The token exchange itself does not happen here: the handler only
//! classifies the redirect, and the flow performs the exchange after the
//! listener has been shut down.

mod callback;
mod health;

pub use callback::CallbackSlot;
pub use callback::callback;
pub use health::health;
