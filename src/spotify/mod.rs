//! # Spotify Integration Module
//!
//! Calls against the two Spotify services the shuffler talks to: the
//! accounts service (OAuth token endpoint) and the Web API (playlist
//! endpoints). Both are treated as a fixed external contract; their base URLs
//! come from [`crate::config::Settings`] so tests can point them at local
//! mocks.
//!
//! ```text
//! cli (orchestration)
//!    ↓
//! spotify::playlist   ← TokenManager (refresh on expiry / 401)
//! spotify::auth       ← server (redirect capture), TokenStore
//!    ↓
//! reqwest → accounts.spotify.com, api.spotify.com
//! ```
//!
//! ## Authorization
//!
//! [`auth`] implements the authorization code flow with PKCE: verifier and
//! S256 challenge generation, the single redirect captured by the local
//! listener, the code exchange and the refresh grant. No client secret is
//! involved.
//!
//! ## Playlists
//!
//! [`playlist`] reads a playlist page by page and replaces its contents in
//! batches of 100, preserving the given order. Rate limiting (429 with
//! `Retry-After`), transient gateway errors on reads and expired tokens
//! (401) are retried a bounded number of times.
//!
//! ## Errors
//!
//! Rejections by the token endpoint surface as
//! [`ShuffleError::Auth`](crate::ShuffleError::Auth), non-2xx playlist
//! responses as [`ShuffleError::Api`](crate::ShuffleError::Api) with status
//! and body.

pub mod auth;
pub mod playlist;

pub use playlist::SpotifyClient;
