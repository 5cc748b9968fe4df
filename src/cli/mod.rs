//! # CLI Module
//!
//! Command implementations invoked by the binary. Each command builds its
//! [`Settings`](crate::config::Settings) from the environment, wires the
//! lower layers together and reports progress through the crate's output
//! macros. Errors are returned to the binary, which prints them and exits
//! non-zero.
//!
//! ## Commands
//!
//! - [`shuffle`] - The default command. Ensures a valid token (loading,
//!   refreshing or running the authorization flow as needed), fetches the
//!   playlist, reorders it and writes the new order back. `--dry-run` stops
//!   after printing a preview.
//! - [`auth`] - Runs the PKCE authorization flow and stores the token.
//! - [`logout`] - Deletes the stored token.
//!
//! ## Flow of the default command
//!
//! ```text
//! load-or-authorize → fetch tracks → shuffle → replace tracks → report
//! ```
//!
//! There is no rollback: if a multi-batch write fails halfway, the playlist
//! keeps what the completed calls wrote and the error says how much that was.
//!
//! ## Usage
//!
//! ```bash
//! shufflecli auth                              # authorize once
//! shufflecli --playlist 37i9dQZF1DXcBWIGoYBM5M # reshuffle a playlist
//! shufflecli --seed 42 --dry-run               # reproducible preview
//! shufflecli --min-artist-gap 3 --weighted     # spread artists, favour hits
//! ```

mod auth;
mod logout;
mod shuffle;

pub use auth::auth;
pub use logout::logout;
pub use shuffle::ShuffleReport;
pub use shuffle::resolve_playlist;
pub use shuffle::shuffle;
pub use shuffle::shuffle_playlist;
