use std::{io::ErrorKind, path::PathBuf};

use crate::{Res, types::Token};

/// File-backed storage for the single [`Token`] record.
///
/// The store is a plain value handed to whoever needs credentials; it holds
/// no token itself, only the location of the file.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Reads the stored record. A missing file yields `Ok(None)`; an
    /// unreadable or malformed one is an error.
    pub async fn load(&self) -> Res<Option<Token>> {
        let content = match async_fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let token: Token = serde_json::from_str(&content)?;
        Ok(Some(token))
    }

    /// Overwrites the stored record.
    ///
    /// The JSON is written to a sibling temp file first and renamed over the
    /// target, so a crash never leaves a half-written token file behind.
    pub async fn save(&self, token: &Token) -> Res<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                async_fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_string_pretty(token)?;
        let tmp = self.tmp_path();
        async_fs::write(&tmp, json).await?;
        async_fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Removes the token file. Returns whether a file was removed.
    pub async fn clear(&self) -> Res<bool> {
        match async_fs::remove_file(&self.path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "token.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
