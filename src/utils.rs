use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use reqwest::Url;
use sha2::{Digest, Sha256};

use crate::{Res, ShuffleError, config::Settings};

/// Random bytes behind a code verifier; 64 bytes encode to 86 characters,
/// inside the 43..=128 range PKCE allows.
const VERIFIER_BYTES: usize = 64;
const STATE_BYTES: usize = 16;

/// Generates a PKCE code verifier: base64url (no padding) of bytes drawn from
/// the thread-local CSPRNG.
pub fn generate_code_verifier() -> String {
    random_urlsafe(VERIFIER_BYTES)
}

/// Derives the S256 challenge for `verifier`: base64url(SHA-256(verifier)).
pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Opaque anti-CSRF value echoed back by the authorization server.
pub fn generate_state() -> String {
    random_urlsafe(STATE_BYTES)
}

fn random_urlsafe(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Builds the URL the user opens to grant access.
pub fn build_authorize_url(settings: &Settings, code_challenge: &str, state: &str) -> Res<Url> {
    Url::parse_with_params(
        &settings.auth_url,
        &[
            ("client_id", settings.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", settings.redirect_uri.as_str()),
            ("code_challenge_method", "S256"),
            ("code_challenge", code_challenge),
            ("scope", settings.scope.as_str()),
            ("state", state),
        ],
    )
    .map_err(|e| ShuffleError::Config(format!("invalid authorization URL: {}", e)))
}

/// Where the local redirect listener has to bind and which path it serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl RedirectTarget {
    pub fn bind_addr(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}

/// Splits a redirect URI into bind host, port and path.
///
/// Only plain `http` URIs can be served by the local listener; anything else
/// is a configuration error.
pub fn parse_redirect_target(redirect_uri: &str) -> Res<RedirectTarget> {
    let url = Url::parse(redirect_uri)
        .map_err(|e| ShuffleError::Config(format!("invalid redirect URI {}: {}", redirect_uri, e)))?;

    if url.scheme() != "http" {
        return Err(ShuffleError::Config(format!(
            "redirect URI must use http to be served locally, got {}",
            redirect_uri
        )));
    }

    let host = match url.host_str() {
        Some(h) => h.trim_start_matches('[').trim_end_matches(']').to_string(),
        None => {
            return Err(ShuffleError::Config(format!(
                "redirect URI {} has no host",
                redirect_uri
            )));
        }
    };

    Ok(RedirectTarget {
        host,
        port: url.port_or_known_default().unwrap_or(80),
        path: url.path().to_string(),
    })
}
