//! Client configuration: the secret token and the API base URL.
//!
//! A missing token is reported here, at construction time, so no call is
//! ever issued without one.

use std::fmt;

use crate::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "https://dynalist.io/api/v1";

pub const TOKEN_VAR: &str = "DYNALIST_TOKEN";
pub const BASE_URL_VAR: &str = "DYNALIST_BASE_URL";

/// The account's secret API token. `Debug` never prints it.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(secret: impl Into<String>) -> Result<Self, ApiError> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(ApiError::MissingToken);
        }
        Ok(Self(secret))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub token: Token,
    pub base_url: String,
}

impl ClientConfig {
    pub fn new(token: Token) -> Self {
        Self {
            token,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Read `$DYNALIST_TOKEN` and, if set, `$DYNALIST_BASE_URL`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like `from_env`, with the variable lookup supplied by the caller.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup(TOKEN_VAR).ok_or(ApiError::MissingToken)?;
        let config = Self::new(Token::new(token)?);
        Ok(match lookup(BASE_URL_VAR) {
            Some(base_url) if !base_url.is_empty() => config.with_base_url(&base_url),
            _ => config,
        })
    }
}
