use std::path::PathBuf;

use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};

const CREDENTIALS_FILE: &str = ".config/taskdeck/credentials.toml";

/// The signed-in identity, as far as the client cares: an opaque user
/// reference. Tokens are fetched separately and never stored here.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: String,
}

/// Capability interface over the external identity provider. The gateway
/// only needs `get_token`; the dashboard gates on `current_session`.
pub trait SessionProvider {
    fn current_session(&self) -> Option<Session>;

    fn get_token(&self) -> Result<String>;
}

/// Resolves credentials from env vars first, then the credentials file
/// written by the sign-in tooling (`~/.config/taskdeck/credentials.toml`
/// with `token` and `user_id` keys).
pub struct EnvSessionProvider {
    token_env: String,
    user_env: String,
    credentials_path: Option<PathBuf>,
}

impl EnvSessionProvider {
    pub fn new(config: &Config) -> Self {
        let credentials_path = std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(CREDENTIALS_FILE));
        Self {
            token_env: config.token_env.clone(),
            user_env: config.user_env.clone(),
            credentials_path,
        }
    }

    pub fn with_credentials_path(
        token_env: &str,
        user_env: &str,
        credentials_path: Option<PathBuf>,
    ) -> Self {
        Self {
            token_env: token_env.to_string(),
            user_env: user_env.to_string(),
            credentials_path,
        }
    }

    fn credentials_value(&self, key: &str) -> Option<String> {
        let path = self.credentials_path.as_ref()?;
        let contents = std::fs::read_to_string(path).ok()?;
        let table = contents.parse::<toml::Table>().ok()?;
        let value = table.get(key)?.as_str()?.to_string();
        debug!(key, path = %path.display(), "using credential from file");
        Some(value)
    }

    fn resolve_user_id(&self) -> Option<String> {
        std::env::var(&self.user_env)
            .ok()
            .or_else(|| self.credentials_value("user_id"))
    }
}

impl SessionProvider for EnvSessionProvider {
    /// A session is present only when both a token and a user id are
    /// resolvable. Authorization itself is left to the server.
    fn current_session(&self) -> Option<Session> {
        if self.get_token().is_err() {
            return None;
        }
        self.resolve_user_id().map(|user_id| Session { user_id })
    }

    fn get_token(&self) -> Result<String> {
        if let Ok(token) = std::env::var(&self.token_env) {
            return Ok(token);
        }

        if let Some(token) = self.credentials_value("token") {
            return Ok(token);
        }

        Err(Error::Session(format!(
            "bearer token not found in ${} or ~/{}",
            self.token_env, CREDENTIALS_FILE
        )))
    }
}
