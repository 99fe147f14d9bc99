use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 会话令牌有效期: 1 天
pub const SESSION_TTL_SECS: i64 = 24 * 60 * 60;

pub type SharedCodec = Arc<dyn TokenCodec>;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("session signing secret must not be empty")]
    EmptySecret,

    #[error("failed to sign session token: {0}")]
    Signing(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Staff,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
            Role::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "staff" => Ok(Role::Staff),
            "viewer" => Ok(Role::Viewer),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// 会话令牌中携带的身份信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub user_id: String,
    pub username: String,
    pub role: Role,
}

/// 令牌载荷: 身份信息 + 签发/过期时间（Unix 秒）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TokenPayload {
    #[serde(flatten)]
    pub claims: SessionClaims,
    pub iat: i64,
    pub exp: i64,
}

impl TokenPayload {
    pub(crate) fn new(claims: &SessionClaims, issued_at: DateTime<Utc>) -> Self {
        Self {
            claims: claims.clone(),
            iat: issued_at.timestamp(),
            exp: issued_at.timestamp() + SESSION_TTL_SECS,
        }
    }
}

/// 会话令牌的签发与校验，各实现共用同一格式，校验失败统一返回 None
pub trait TokenCodec: Send + Sync {
    fn name(&self) -> &'static str;

    fn issue_at(
        &self,
        claims: &SessionClaims,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError>;

    fn verify(&self, token: &str) -> Option<SessionClaims>;

    fn issue(&self, claims: &SessionClaims) -> Result<String, TokenError> {
        self.issue_at(claims, Utc::now())
    }
}

/// 基于 jsonwebtoken 的实现
#[derive(Clone)]
pub struct JwtCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtCodec {
    pub fn new(secret: &str) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }
}

impl TokenCodec for JwtCodec {
    fn name(&self) -> &'static str {
        "jsonwebtoken"
    }

    fn issue_at(
        &self,
        claims: &SessionClaims,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let payload = TokenPayload::new(claims, issued_at);

        encode(&Header::new(Algorithm::HS256), &payload, &self.encoding).map_err(|e| {
            tracing::error!("Failed to encode session token: {}", e);
            TokenError::Signing(e.to_string())
        })
    }

    fn verify(&self, token: &str) -> Option<SessionClaims> {
        decode::<TokenPayload>(token, &self.decoding, &self.validation)
            .map(|data| data.claims.claims)
            .map_err(|e| tracing::debug!("Session token rejected: {}", e))
            .ok()
    }
}
