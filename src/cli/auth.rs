use reqwest::Client;

use crate::{Res, config::Settings, management::TokenStore, spotify, success};

/// Runs the authorization flow unconditionally, replacing any stored token.
pub async fn auth() -> Res<()> {
    let settings = Settings::from_env()?;
    let store = TokenStore::new(settings.token_path.clone());

    spotify::auth::authorize(&Client::new(), &settings, &store).await?;
    success!("Authentication successful! Token saved to {}", store.path().display());
    Ok(())
}
