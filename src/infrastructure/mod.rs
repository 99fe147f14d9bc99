// 会话令牌的签发与校验

pub mod auth;
pub mod portable;

use std::sync::Arc;

pub use auth::{JwtCodec, Role, SessionClaims, SharedCodec, TokenCodec, TokenError};
pub use portable::PortableCodec;

/// 令牌编解码实现的选择
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecKind {
    Jsonwebtoken,
    Portable,
}

impl CodecKind {
    /// 按编译目标选择默认实现
    pub fn for_target() -> Self {
        if cfg!(target_arch = "wasm32") {
            CodecKind::Portable
        } else {
            CodecKind::Jsonwebtoken
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "jsonwebtoken" | "native" => Some(CodecKind::Jsonwebtoken),
            "portable" | "edge" => Some(CodecKind::Portable),
            _ => None,
        }
    }
}

pub fn build_codec(kind: CodecKind, secret: &str) -> Result<SharedCodec, TokenError> {
    let codec: SharedCodec = match kind {
        CodecKind::Jsonwebtoken => Arc::new(JwtCodec::new(secret)?),
        CodecKind::Portable => Arc::new(PortableCodec::new(secret)?),
    };
    Ok(codec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_codec_by_kind() {
        let native = build_codec(CodecKind::Jsonwebtoken, "secret").unwrap();
        let portable = build_codec(CodecKind::Portable, "secret").unwrap();

        assert_eq!(native.name(), "jsonwebtoken");
        assert_eq!(portable.name(), "portable");
        assert!(build_codec(CodecKind::Portable, "").is_err());
    }

    #[test]
    fn test_parse_codec_kind() {
        assert_eq!(CodecKind::parse("Portable"), Some(CodecKind::Portable));
        assert_eq!(CodecKind::parse("jsonwebtoken"), Some(CodecKind::Jsonwebtoken));
        assert_eq!(CodecKind::parse("rsa"), None);
    }
}
