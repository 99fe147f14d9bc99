use std::sync::Arc;

use cache::RateLimitStore;
use config::Config;
use infrastructure::{SharedCodec, TokenError};
use sqlx::PgPool;

pub mod cache;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod middleware;
pub mod utils;

pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub codec: SharedCodec,
    pub rate_limits: Arc<RateLimitStore>,
}

impl AppState {
    /// 按配置选择令牌实现，并创建独立的限流存储
    pub fn new(pool: PgPool, config: Config) -> Result<Self, TokenError> {
        let codec = infrastructure::build_codec(config.token_codec, &config.jwt_secret)?;

        Ok(Self {
            pool,
            config,
            codec,
            rate_limits: Arc::new(RateLimitStore::new()),
        })
    }
}
