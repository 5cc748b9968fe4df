//! Configuration management for the playlist shuffler.
//!
//! Values come from environment variables, optionally seeded from a `.env`
//! file in the platform local data directory. Variables already present in
//! the process environment take precedence over the file.
//!
//! | variable | required |
//! |---|---|
//! | `SPOTIFY_API_AUTH_CLIENT_ID` | yes |
//! | `SPOTIFY_API_REDIRECT_URI` | yes |
//! | `SPOTIFY_API_AUTH_SCOPE` | no |
//! | `SPOTIFY_API_AUTH_URL` | no |
//! | `SPOTIFY_API_TOKEN_URL` | no |
//! | `SPOTIFY_API_URL` | no |
//! | `SHUFFLE_PLAYLIST_ID` | no |
//! | `SHUFFLE_TOKEN_FILE` | no |

use std::{env, path::PathBuf};

use crate::{Res, ShuffleError};

pub const DEFAULT_SCOPE: &str =
    "playlist-read-private playlist-modify-private playlist-modify-public";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";

/// Loads environment variables from `shufflecli/.env` in the local data
/// directory.
///
/// The directory is created when missing so users know where to put the
/// file. A missing `.env` is not an error; an unreadable one is.
///
/// The file lives in:
/// - Linux: `~/.local/share/shufflecli/.env`
/// - macOS: `~/Library/Application Support/shufflecli/.env`
/// - Windows: `%LOCALAPPDATA%/shufflecli/.env`
pub async fn load_env() -> Res<()> {
    let mut path = data_dir();
    async_fs::create_dir_all(&path).await?;
    path.push(".env");

    if !path.is_file() {
        return Ok(());
    }

    dotenv::from_path(&path)
        .map_err(|e| ShuffleError::Config(format!("cannot read {}: {}", path.display(), e)))
}

/// Runtime settings for one invocation.
///
/// Built once in the command layer and handed to every component that needs
/// it; nothing reads the environment after that.
#[derive(Debug, Clone)]
pub struct Settings {
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
    pub playlist_id: Option<String>,
    pub token_path: PathBuf,
}

impl Settings {
    /// Collects settings from the environment, applying defaults for the
    /// Spotify endpoints, the scope and the token file location.
    ///
    /// # Errors
    ///
    /// Returns [`ShuffleError::Config`] when the client id or the redirect
    /// URI is missing.
    pub fn from_env() -> Res<Self> {
        Ok(Self {
            client_id: required("SPOTIFY_API_AUTH_CLIENT_ID")?,
            redirect_uri: required("SPOTIFY_API_REDIRECT_URI")?,
            scope: optional("SPOTIFY_API_AUTH_SCOPE").unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
            auth_url: optional("SPOTIFY_API_AUTH_URL")
                .unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
            token_url: optional("SPOTIFY_API_TOKEN_URL")
                .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            api_url: optional("SPOTIFY_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            playlist_id: optional("SHUFFLE_PLAYLIST_ID"),
            token_path: token_path(),
        })
    }

    /// Settings for the given client and redirect URI with every other value
    /// at its default. Mostly useful for tests pointing at local endpoints.
    pub fn new(client_id: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            scope: DEFAULT_SCOPE.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            playlist_id: None,
            token_path: default_token_path(),
        }
    }
}

/// Token file location: `SHUFFLE_TOKEN_FILE` when set, the default
/// location otherwise.
pub fn token_path() -> PathBuf {
    optional("SHUFFLE_TOKEN_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(default_token_path)
}

/// Default location of the token file, `shufflecli/token.json` under the
/// local data directory.
pub fn default_token_path() -> PathBuf {
    let mut path = data_dir();
    path.push("token.json");
    path
}

fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("shufflecli");
    path
}

fn required(key: &str) -> Res<String> {
    optional(key).ok_or_else(|| ShuffleError::Config(format!("{} must be set", key)))
}

fn optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
