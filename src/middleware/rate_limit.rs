use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use crate::{
    cache::{RateLimitPolicy, RateLimitStore},
    error::AppError,
};

/// 无法识别来源时的统一标识，所有未经代理的客户端共用一个计数桶
pub const UNKNOWN_CLIENT: &str = "unknown";

/// 某个路由使用的限流器和策略
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<RateLimitStore>,
    policy: RateLimitPolicy,
}

impl RateLimiter {
    pub fn new(store: Arc<RateLimitStore>, policy: RateLimitPolicy) -> Self {
        Self { store, policy }
    }

    pub async fn check_rate_limit(&self, req: Request<Body>, next: Next) -> Response {
        let client_id = client_identifier(req.headers());
        let route = req.uri().path().to_string();
        let decision = self.store.check(&client_id, &route, &self.policy);

        if !decision.allowed {
            tracing::warn!(
                client = %client_id,
                route = %route,
                policy = self.policy.name,
                "Rate limit exceeded"
            );
            return AppError::rate_limited(&decision, Utc::now()).into_response();
        }

        tracing::debug!(
            client = %client_id,
            route = %route,
            remaining = decision.remaining,
            "Rate limit check passed"
        );

        let mut response = next.run(req).await;
        let headers = response.headers_mut();
        headers.insert("x-ratelimit-remaining", HeaderValue::from(decision.remaining));
        headers.insert(
            "x-ratelimit-reset",
            HeaderValue::from(decision.reset_epoch_secs()),
        );
        response
    }
}

/// 客户端标识: 优先 X-Forwarded-For 的第一个地址，其次 X-Real-IP
pub fn client_identifier(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(str::trim)
                .filter(|ip| !ip.is_empty())
        })
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    limiter.check_rate_limit(req, next).await
}
