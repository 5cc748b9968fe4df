use thiserror::Error;

/// Every failure the shuffler can surface to the user.
///
/// The taxonomy follows what the user can do about it: `Auth` means the
/// authorization has to be (re)done, `Api` carries the upstream status and
/// body for diagnosis, `Io` points at the token file or the local listener.
#[derive(Debug, Error)]
pub enum ShuffleError {
    #[error("authorization failed: {0}")]
    Auth(String),

    #[error("Spotify API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error(
        "playlist left partially written ({written} of {total} tracks committed): {source}"
    )]
    PartialWrite {
        written: usize,
        total: usize,
        #[source]
        source: Box<ShuffleError>,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ShuffleError {
    pub fn is_auth(&self) -> bool {
        matches!(self, ShuffleError::Auth(_))
    }
}
