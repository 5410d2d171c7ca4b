// src/config.rs
use std::{env, net::SocketAddr};
use thiserror::Error;

use crate::web::mw_auth::{SESSION_COOKIE, SIGNIN_PATH};

pub const DEFAULT_LOG_FILTER: &str = "session_gate=debug,tower_http=info,sqlx=warn";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuração em falta: {0}")]
    Missing(&'static str),

    #[error("configuração inválida: {0}")]
    Invalid(&'static str),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub session_cookie: String,
    pub signin_path: String,
}

impl Config {
    /// Lê a configuração do ambiente (e do `.env`, se existir).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("BIND_ADDR"))?;

        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let session_cookie = env::var("SESSION_COOKIE").unwrap_or_else(|_| SESSION_COOKIE.to_string());
        let signin_path = env::var("SIGNIN_PATH").unwrap_or_else(|_| SIGNIN_PATH.to_string());

        let config = Self {
            bind_addr,
            database_url,
            session_cookie,
            signin_path,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_cookie.is_empty()
            || !self
                .session_cookie
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        {
            return Err(ConfigError::Invalid("SESSION_COOKIE"));
        }

        // Vai parar ao header Location tal como está.
        if !self.signin_path.starts_with('/')
            || !self.signin_path.bytes().all(|b| b.is_ascii_graphic())
        {
            return Err(ConfigError::Invalid("SIGNIN_PATH"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            bind_addr: "127.0.0.1:3000".parse().unwrap(),
            database_url: "sqlite::memory:".into(),
            session_cookie: SESSION_COOKIE.into(),
            signin_path: SIGNIN_PATH.into(),
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn rejects_relative_or_spaced_signin_path() {
        for path in ["signin", "/sign in", ""] {
            let cfg = Config {
                signin_path: path.into(),
                ..config()
            };
            assert!(matches!(cfg.validate(), Err(ConfigError::Invalid("SIGNIN_PATH"))), "{path}");
        }
    }

    #[test]
    fn rejects_bad_cookie_name() {
        let cfg = Config {
            session_cookie: "ses;sion".into(),
            ..config()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid("SESSION_COOKIE"))));
    }
}
