use chrono::Utc;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// The persisted credential record, stored as the only object in the token
/// file and overwritten wholesale on every refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp (seconds) at which the access token stops being valid.
    pub expires_at: i64,
}

impl Token {
    /// Builds a record from a token endpoint response received now.
    pub fn issued_now(access_token: String, refresh_token: String, expires_in: u64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: Utc::now()
                .timestamp()
                .saturating_add(i64::try_from(expires_in).unwrap_or(i64::MAX)),
        }
    }

    /// True when the token is expired or expires within `margin_secs`.
    pub fn expires_within(&self, margin_secs: i64) -> bool {
        Utc::now().timestamp() >= self.expires_at.saturating_sub(margin_secs)
    }
}

/// Body of a successful response from the token endpoint, for both the
/// `authorization_code` and the `refresh_token` grant.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: u64,
}

/// What the redirect listener observed on its single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Code(String),
    Denied(String),
    StateMismatch,
    MissingCode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistTracksPage {
    pub items: Vec<PlaylistItem>,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistItem {
    pub track: Option<Track>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub id: Option<String>,
    pub uri: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub artists: Vec<TrackArtist>,
    #[serde(default)]
    pub popularity: Option<u32>,
    #[serde(default)]
    pub is_local: bool,
}

impl Track {
    /// Key identifying the main artist: the first artist's id, falling back
    /// to its name. `None` for tracks without artists (e.g. episodes).
    pub fn main_artist_key(&self) -> Option<&str> {
        let artist = self.artists.first()?;
        artist
            .id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or_else(|| Some(artist.name.as_str()).filter(|name| !name.is_empty()))
    }

    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackArtist {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaceTracksRequest {
    pub uris: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub snapshot_id: String,
}

#[derive(Tabled)]
pub struct TrackTableRow {
    #[tabled(rename = "#")]
    pub position: usize,
    pub name: String,
    pub artists: String,
}
