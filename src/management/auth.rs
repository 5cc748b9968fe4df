use std::time::Duration;

use reqwest::Client;

use crate::{
    Res, config::Settings, info, management::TokenStore, spotify, types::Token, warning,
};

/// Tokens are refreshed this many seconds before they actually expire.
pub const EXPIRY_MARGIN_SECS: i64 = 60;

/// Owns the current token and keeps it valid, persisting every change
/// through the [`TokenStore`].
pub struct TokenManager {
    http: Client,
    settings: Settings,
    store: TokenStore,
    token: Token,
}

impl TokenManager {
    pub fn new(http: Client, settings: Settings, store: TokenStore, token: Token) -> Self {
        TokenManager {
            http,
            settings,
            store,
            token,
        }
    }

    /// Loads the stored token, if any.
    pub async fn load(http: Client, settings: Settings, store: TokenStore) -> Res<Option<Self>> {
        let token = store.load().await?;
        Ok(token.map(|t| Self::new(http, settings, store, t)))
    }

    /// Returns a manager holding a usable token, running whatever it takes to
    /// get one.
    ///
    /// - no stored token: the interactive PKCE flow runs
    /// - stored but expired: the token is refreshed
    /// - refresh rejected (e.g. revoked): the interactive flow runs again
    pub async fn ensure(http: Client, settings: Settings, store: TokenStore) -> Res<Self> {
        Self::ensure_with(
            http,
            settings,
            store,
            spotify::auth::CALLBACK_TIMEOUT,
            spotify::auth::open_in_browser,
        )
        .await
    }

    /// [`ensure`](Self::ensure) with the browser step and redirect timeout of
    /// the interactive flow supplied by the caller.
    pub async fn ensure_with<F>(
        http: Client,
        settings: Settings,
        store: TokenStore,
        timeout: Duration,
        open: F,
    ) -> Res<Self>
    where
        F: FnOnce(&str),
    {
        let Some(mut manager) = Self::load(http.clone(), settings.clone(), store.clone()).await?
        else {
            info!("No stored token found, starting authorization.");
            let token =
                spotify::auth::authorize_with(&http, &settings, &store, timeout, open).await?;
            return Ok(Self::new(http, settings, store, token));
        };

        if !manager.is_expired() {
            return Ok(manager);
        }

        match manager.refresh().await {
            Ok(()) => Ok(manager),
            Err(e) if e.is_auth() => {
                warning!("Stored token could not be refreshed ({}). Authorizing again.", e);
                let token =
                    spotify::auth::authorize_with(&http, &settings, &store, timeout, open).await?;
                Ok(Self::new(http, settings, store, token))
            }
            Err(e) => Err(e),
        }
    }

    /// Access token for the next request, refreshed first if it is about to
    /// expire.
    pub async fn get_valid_token(&mut self) -> Res<String> {
        if self.is_expired() {
            self.refresh().await?;
        }

        Ok(self.token.access_token.clone())
    }

    /// Exchanges the refresh token for a new access token and persists the
    /// result.
    pub async fn refresh(&mut self) -> Res<()> {
        let token =
            spotify::auth::refresh_token(&self.http, &self.settings, &self.token.refresh_token)
                .await?;
        self.store.save(&token).await?;
        self.token = token;
        Ok(())
    }

    pub fn is_expired(&self) -> bool {
        self.token.expires_within(EXPIRY_MARGIN_SECS)
    }

    pub fn current_token(&self) -> &Token {
        &self.token
    }
}
