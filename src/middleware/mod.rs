mod auth;
mod error_handler;
mod rate_limit;

pub use auth::{
    CurrentUser, LOGIN_PATH, SessionState, auth_middleware, classify, is_public_path,
    login_redirect,
};
pub use error_handler::log_errors;
pub use rate_limit::{RateLimiter, UNKNOWN_CLIENT, client_identifier, rate_limit};
