use crate::{Res, config, info, management::TokenStore, success};

/// Deletes the stored token. Only the token file location is needed, so this
/// works without a client id configured.
pub async fn logout() -> Res<()> {
    let store = TokenStore::new(config::token_path());

    if store.clear().await? {
        success!("Removed stored token {}", store.path().display());
    } else {
        info!("No stored token at {}", store.path().display());
    }
    Ok(())
}
