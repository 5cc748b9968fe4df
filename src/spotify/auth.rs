use std::time::Duration;

use reqwest::{Client, Response};

use crate::{
    Res, ShuffleError,
    config::Settings,
    info,
    management::TokenStore,
    server::CallbackServer,
    types::{Token, TokenResponse},
    utils, warning,
};

/// How long the flow waits for the user to finish in the browser.
pub const CALLBACK_TIMEOUT: Duration = Duration::from_secs(120);

/// Runs the complete OAuth 2.0 PKCE authorization and persists the token.
///
/// Opens the authorization URL in the default browser; if that fails the URL
/// is printed so the user can open it by hand.
///
/// # Flow
///
/// 1. Generate verifier, S256 challenge and `state`
/// 2. Bind the local listener on the redirect URI's host and port
/// 3. Open the authorization URL
/// 4. Wait for the one redirect, then stop the listener
/// 5. Exchange code + verifier for tokens and save them
///
/// # Errors
///
/// [`ShuffleError::Auth`] for denied consent, state mismatch, timeout or a
/// rejected exchange; [`ShuffleError::Io`] when the listener cannot bind or
/// the token cannot be saved.
pub async fn authorize(http: &Client, settings: &Settings, store: &TokenStore) -> Res<Token> {
    authorize_with(http, settings, store, CALLBACK_TIMEOUT, open_in_browser).await
}

/// Opens `url` in the default browser, printing it when that fails.
pub fn open_in_browser(url: &str) {
    info!("Opening the Spotify authorization page in your browser.");
    if webbrowser::open(url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            url
        )
    }
}

/// [`authorize`] with the browser step and timeout supplied by the caller.
///
/// `open` receives the authorization URL once the listener is accepting
/// connections.
pub async fn authorize_with<F>(
    http: &Client,
    settings: &Settings,
    store: &TokenStore,
    timeout: Duration,
    open: F,
) -> Res<Token>
where
    F: FnOnce(&str),
{
    let code_verifier = utils::generate_code_verifier();
    let code_challenge = utils::generate_code_challenge(&code_verifier);
    let state = utils::generate_state();

    let target = utils::parse_redirect_target(&settings.redirect_uri)?;
    let auth_url = utils::build_authorize_url(settings, &code_challenge, &state)?;

    let server = CallbackServer::start(&target, state).await?;
    open(auth_url.as_str());

    let code = server.wait_for_code(timeout).await?;
    complete_authorization(http, settings, store, &code, &code_verifier).await
}

/// Exchanges the authorization code and saves the resulting token.
///
/// Nothing is written when the exchange fails.
pub async fn complete_authorization(
    http: &Client,
    settings: &Settings,
    store: &TokenStore,
    code: &str,
    verifier: &str,
) -> Res<Token> {
    let token = exchange_code_pkce(http, settings, code, verifier).await?;
    store.save(&token).await?;
    Ok(token)
}

/// Exchanges an authorization code for tokens using the PKCE verifier.
///
/// Codes are single use, so a rejected exchange is never retried; the
/// response body is kept in the error since it usually names the offending
/// parameter (`redirect_uri`, `client_id`, `code_verifier`).
pub async fn exchange_code_pkce(
    http: &Client,
    settings: &Settings,
    code: &str,
    verifier: &str,
) -> Res<Token> {
    let res = http
        .post(&settings.token_url)
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", settings.redirect_uri.as_str()),
            ("client_id", settings.client_id.as_str()),
            ("code_verifier", verifier),
        ])
        .send()
        .await?;

    let body = token_response(res, "token exchange").await?;
    let refresh_token = body.refresh_token.ok_or_else(|| {
        ShuffleError::Auth("token exchange response carried no refresh_token".to_string())
    })?;

    Ok(Token::issued_now(
        body.access_token,
        refresh_token,
        body.expires_in,
    ))
}

/// Trades `refresh_token` for a fresh access token.
///
/// Spotify may omit `refresh_token` in the response, in which case the one
/// passed in stays valid and is carried over.
///
/// # Errors
///
/// [`ShuffleError::Auth`] when the token endpoint rejects the refresh token
/// (typically revoked access); a full authorization is required then.
pub async fn refresh_token(http: &Client, settings: &Settings, refresh_token: &str) -> Res<Token> {
    let res = http
        .post(&settings.token_url)
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", settings.client_id.as_str()),
        ])
        .send()
        .await?;

    let body = token_response(res, "token refresh").await?;

    Ok(Token::issued_now(
        body.access_token,
        body.refresh_token
            .unwrap_or_else(|| refresh_token.to_string()),
        body.expires_in,
    ))
}

async fn token_response(res: Response, what: &str) -> Res<TokenResponse> {
    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(ShuffleError::Auth(format!(
            "{} rejected with {}: {}",
            what, status, body
        )));
    }

    let text = res.text().await?;
    serde_json::from_str(&text)
        .map_err(|e| ShuffleError::Auth(format!("{} returned an unexpected body: {}", what, e)))
}
