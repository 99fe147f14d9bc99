use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{
    AppState,
    cache::{API_RATE_LIMIT, AUTH_RATE_LIMIT, REGISTER_RATE_LIMIT, RateLimitPolicy},
    middleware::{RateLimiter, auth_middleware, log_errors, rate_limit},
};

pub mod auth;

/// 组装全部路由和中间件
pub fn router(state: AppState) -> Router {
    let store = state.rate_limits.clone();
    let limiter = move |policy: RateLimitPolicy| RateLimiter::new(store.clone(), policy);

    Router::new()
        // 认证路由
        .route(
            "/api/auth/login",
            post(auth::login)
                .route_layer(from_fn_with_state(limiter(AUTH_RATE_LIMIT), rate_limit)),
        )
        .route(
            "/api/auth/register",
            post(auth::register)
                .route_layer(from_fn_with_state(limiter(REGISTER_RATE_LIMIT), rate_limit)),
        )
        .route("/api/auth/check-setup", get(auth::check_setup))
        .route(
            "/api/auth/logout",
            post(auth::logout)
                .route_layer(from_fn_with_state(limiter(API_RATE_LIMIT), rate_limit)),
        )
        .route(
            "/api/auth/me",
            get(auth::me)
                .route_layer(from_fn_with_state(limiter(API_RATE_LIMIT), rate_limit)),
        )
        // 全局会话校验，未匹配的路径同样经过
        .layer(from_fn_with_state(state.codec.clone(), auth_middleware))
        .layer(from_fn(log_errors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
