//! Spotify Playlist Shuffler Library
//!
//! This library authorizes against Spotify with the OAuth 2.0 PKCE flow,
//! fetches the track list of a playlist, reorders it and writes the new
//! order back through the Web API.
//!
//! # Modules
//!
//! - `api` - HTTP handlers served by the local redirect listener
//! - `cli` - Command implementations wired up by the binary
//! - `config` - Environment loading and runtime settings
//! - `errors` - The crate error type
//! - `management` - Token persistence and token lifecycle
//! - `server` - Short-lived local listener capturing the OAuth redirect
//! - `shuffle` - Permutation algorithms
//! - `spotify` - Spotify accounts and Web API calls
//! - `types` - Data structures and wire types
//! - `utils` - PKCE and URL helpers
//!
//! # Example
//!
//! ```
//! use shufflecli::{config, cli, shuffle::ShuffleOptions};
//!
//! #[tokio::main]
//! async fn main() -> shufflecli::Res<()> {
//!     config::load_env().await?;
//!     cli::shuffle(None, ShuffleOptions::default(), false).await
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod management;
pub mod server;
pub mod shuffle;
pub mod spotify;
pub mod types;
pub mod utils;

pub use errors::ShuffleError;

/// Result alias used throughout the crate.
pub type Res<T> = std::result::Result<T, ShuffleError>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Fetching tracks of playlist {}", playlist_id);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Playlist reshuffled ({} tracks)", count);
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program
/// with status 1.
///
/// Only the binary's top level uses this; library code returns
/// [`ShuffleError`] instead.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for recoverable issues the user should notice, e.g. a browser that
/// could not be opened or a refresh token that was rejected.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
