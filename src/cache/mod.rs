// 缓存模块
// 进程内的限流计数存储

pub mod rate_limit;

// 重新导出常用类型，方便其他模块使用
pub use rate_limit::{
    API_RATE_LIMIT, AUTH_RATE_LIMIT, REGISTER_RATE_LIMIT, RateLimitDecision, RateLimitEntry,
    RateLimitPolicy, RateLimitStore,
};
