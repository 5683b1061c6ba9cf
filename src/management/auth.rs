use std::path::PathBuf;

use chrono::Utc;

use crate::{
    config,
    error::{Error, Result},
    types::Token,
};

/// Tokens are treated as expired this many seconds early so a long batch does
/// not run into an expiry halfway through.
const EXPIRY_MARGIN_SECS: u64 = 240;

/// Holds the Spotify access token used by the commands.
pub struct TokenManager {
    token: Token,
}

impl TokenManager {
    pub fn new(token: Token) -> Self {
        TokenManager { token }
    }

    /// Uses `SPOTIFY_ACCESS_TOKEN` when set, otherwise the cached token file.
    ///
    /// A token from the environment is assumed to be fresh and valid for one
    /// hour.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] if there is no environment token and the token
    /// file is missing or cannot be parsed.
    ///
    /// # Example
    ///
    /// ```
    /// let token_mgr = TokenManager::load().await?;
    /// let token = token_mgr.get_valid_token()?;
    /// ```
    pub async fn load() -> Result<Self> {
        if let Some(access_token) = config::spotify_access_token() {
            return Ok(Self::new(Token {
                access_token,
                expires_in: 3600,
                obtained_at: Utc::now().timestamp() as u64,
            }));
        }

        let path = Self::token_path();
        let content = async_fs::read_to_string(&path)
            .await
            .map_err(|e| Error::Auth(format!("{}: {}", path.display(), e)))?;
        let token: Token = serde_json::from_str(&content).map_err(|e| Error::Auth(e.to_string()))?;
        Ok(Self { token })
    }

    /// Returns the access token unless it expires within the next four minutes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] for an expired token.
    pub fn get_valid_token(&self) -> Result<&str> {
        if self.is_expired() {
            return Err(Error::Auth(
                "access token expired, please authenticate again".to_string(),
            ));
        }

        Ok(&self.token.access_token)
    }

    fn is_expired(&self) -> bool {
        let now = Utc::now().timestamp() as u64;
        let expires_at = self.token.obtained_at + self.token.expires_in;
        now >= expires_at.saturating_sub(EXPIRY_MARGIN_SECS)
    }

    fn token_path() -> PathBuf {
        let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("playgen/cache/token.json");
        path
    }
}
