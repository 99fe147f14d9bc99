use std::env;
use std::fmt;

use thiserror::Error;

use crate::infrastructure::CodecKind;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("environment variable {0} must not be empty")]
    Empty(&'static str),

    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_host: String,
    pub server_port: u16,
    pub environment: Environment,
    pub token_codec: CodecKind,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 从任意键值来源读取配置，缺少签名密钥时直接报错
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::Empty("JWT_SECRET"));
        }

        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let server_port = match lookup("SERVER_PORT") {
            Some(port) => port.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "SERVER_PORT",
                value: port,
            })?,
            None => 3000,
        };

        let environment = match lookup("APP_ENV").as_deref().map(str::trim) {
            None | Some("") | Some("development") | Some("test") => Environment::Development,
            Some("production") => Environment::Production,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "APP_ENV",
                    value: other.to_string(),
                });
            }
        };

        let token_codec = match lookup("TOKEN_CODEC") {
            Some(value) => CodecKind::parse(&value).ok_or(ConfigError::Invalid {
                key: "TOKEN_CODEC",
                value,
            })?,
            None => CodecKind::for_target(),
        };

        Ok(Config {
            database_url,
            jwt_secret,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            server_port,
            environment,
            token_codec,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// 生产环境下 cookie 只通过 HTTPS 发送
    pub fn secure_cookies(&self) -> bool {
        self.is_production()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"<redacted>")
            .field("jwt_secret", &"<redacted>")
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("environment", &self.environment)
            .field("token_codec", &self.token_codec)
            .finish()
    }
}
