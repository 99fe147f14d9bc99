use axum_extra::extract::cookie::{Cookie, SameSite};
use bcrypt::{hash, verify};

/// 会话 cookie 名称
pub const AUTH_COOKIE: &str = "auth_token";

const PASSWORD_HASH_COST: u32 = 10;

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password.as_bytes(), PASSWORD_HASH_COST)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password.as_bytes(), hash)
}

/// 登录使用的 cookie，有效期与令牌一致（1 天）
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::days(1))
        .build()
}

/// 浏览器会话级 cookie，关闭浏览器即失效
pub fn browser_session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

/// 用于删除会话 cookie
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(AUTH_COOKIE).path("/").build()
}

/// 校验字符串长度（按字符计），不通过时返回给定提示
pub fn check_length(
    value: &str,
    min: usize,
    max: usize,
    too_short: &str,
    too_long: &str,
    errors: &mut Vec<String>,
) {
    let len = value.chars().count();
    if len < min {
        errors.push(too_short.to_string());
    } else if len > max {
        errors.push(too_long.to_string());
    }
}

pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain.contains('.')
        && !email.chars().any(char::is_whitespace)
        && !domain.contains('@')
}
