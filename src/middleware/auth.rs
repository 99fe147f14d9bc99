use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{Request, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    AppState,
    error::AppError,
    infrastructure::{SessionClaims, SharedCodec, TokenCodec},
    utils::{AUTH_COOKIE, removal_cookie},
};

/// 登录页路径
pub const LOGIN_PATH: &str = "/login";

/// 无需登录即可访问的路径
const PUBLIC_PATHS: &[&str] = &[
    LOGIN_PATH,
    "/api/auth/login",
    "/api/auth/register",
    "/api/auth/check-setup",
    "/favicon.ico",
];

/// 静态资源前缀
const STATIC_PREFIXES: &[&str] = &["/_next/static/", "/_next/image", "/static/"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    PublicPath,
    NoToken,
    InvalidToken,
    Authenticated,
}

pub fn is_public_path(path: &str) -> bool {
    if PUBLIC_PATHS.contains(&path) {
        return true;
    }

    if STATIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        return true;
    }

    // 带扩展名的路径视为静态文件
    path.rsplit('/').next().is_some_and(|segment| segment.contains('.'))
}

pub fn classify(path: &str, jar: &CookieJar, codec: &dyn TokenCodec) -> SessionState {
    if is_public_path(path) {
        return SessionState::PublicPath;
    }

    match jar.get(AUTH_COOKIE) {
        None => SessionState::NoToken,
        Some(cookie) => match codec.verify(cookie.value()) {
            Some(_) => SessionState::Authenticated,
            None => SessionState::InvalidToken,
        },
    }
}

/// 原路径作为查询参数编码，避免拼接出额外参数
pub fn login_redirect(path: &str) -> Redirect {
    let target: String = url::form_urlencoded::byte_serialize(path.as_bytes()).collect();
    Redirect::temporary(&format!("{}?redirect={}", LOGIN_PATH, target))
}

/// 全局会话校验: 未登录或令牌无效时重定向到登录页
pub async fn auth_middleware(
    State(codec): State<SharedCodec>,
    jar: CookieJar,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    match classify(&path, &jar, codec.as_ref()) {
        SessionState::PublicPath | SessionState::Authenticated => next.run(request).await,
        SessionState::NoToken => {
            tracing::debug!(path = %path, "No session cookie, redirecting to login");
            login_redirect(&path).into_response()
        }
        SessionState::InvalidToken => {
            tracing::info!(path = %path, "Invalid session token, clearing cookie");
            (jar.remove(removal_cookie()), login_redirect(&path)).into_response()
        }
    }
}

/// 当前登录用户，由处理函数从 cookie 中重新解析
#[derive(Debug, Clone)]
pub struct CurrentUser(pub SessionClaims);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(AUTH_COOKIE).ok_or(AppError::Unauthorized)?;

        state
            .codec
            .verify(token.value())
            .map(CurrentUser)
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{JwtCodec, Role};
    use axum::http::{HeaderMap, HeaderValue, header};
    use chrono::{TimeDelta, Utc};

    fn codec() -> JwtCodec {
        JwtCodec::new("middleware-test-secret").unwrap()
    }

    fn jar_with(token: &str) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {}={}", AUTH_COOKIE, token)).unwrap(),
        );
        CookieJar::from_headers(&headers)
    }

    fn claims() -> SessionClaims {
        SessionClaims {
            user_id: "u-1".to_string(),
            username: "clerk".to_string(),
            role: Role::Staff,
        }
    }

    #[test]
    fn test_public_paths() {
        for path in [
            "/login",
            "/api/auth/login",
            "/api/auth/register",
            "/api/auth/check-setup",
            "/_next/static/chunks/main.js",
            "/static/logo.png",
            "/favicon.ico",
            "/robots.txt",
        ] {
            assert!(is_public_path(path), "{} should be public", path);
        }

        for path in ["/", "/fleet", "/api/auth/logout", "/api/students", "/login/extra"] {
            assert!(!is_public_path(path), "{} should be protected", path);
        }
    }

    #[test]
    fn test_classify_states() {
        let codec = codec();
        let empty = CookieJar::new();

        assert_eq!(classify("/login", &empty, &codec), SessionState::PublicPath);
        assert_eq!(classify("/fleet", &empty, &codec), SessionState::NoToken);
        assert_eq!(
            classify("/fleet", &jar_with("garbage"), &codec),
            SessionState::InvalidToken
        );

        let token = codec.issue(&claims()).unwrap();
        assert_eq!(
            classify("/fleet", &jar_with(&token), &codec),
            SessionState::Authenticated
        );

        let expired = codec
            .issue_at(&claims(), Utc::now() - TimeDelta::days(3))
            .unwrap();
        assert_eq!(
            classify("/fleet", &jar_with(&expired), &codec),
            SessionState::InvalidToken
        );
    }

    #[test]
    fn test_login_redirect_location() {
        let response = login_redirect("/drivers").into_response();

        assert_eq!(response.status(), axum::http::StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "/login?redirect=%2Fdrivers");

        let response = login_redirect("/fleet&redirect=//evil.example").into_response();
        assert_eq!(
            response.headers()[header::LOCATION],
            "/login?redirect=%2Ffleet%26redirect%3D%2F%2Fevil.example"
        );
    }
}
