use std::sync::{Mutex, TryLockError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;

/// 过期条目的清理间隔
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// 固定窗口限流策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub name: &'static str,
    pub window: Duration,
    pub max_requests: u32,
}

/// 登录: 15 分钟内最多 5 次
pub const AUTH_RATE_LIMIT: RateLimitPolicy = RateLimitPolicy {
    name: "auth",
    window: Duration::from_secs(15 * 60),
    max_requests: 5,
};

/// 注册: 1 小时内最多 3 次
pub const REGISTER_RATE_LIMIT: RateLimitPolicy = RateLimitPolicy {
    name: "register",
    window: Duration::from_secs(60 * 60),
    max_requests: 3,
};

/// 通用 API: 1 分钟内最多 100 次
pub const API_RATE_LIMIT: RateLimitPolicy = RateLimitPolicy {
    name: "api",
    window: Duration::from_secs(60),
    max_requests: 100,
};

impl RateLimitPolicy {
    pub fn window_delta(&self) -> TimeDelta {
        TimeDelta::milliseconds(self.window.as_millis() as i64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    pub reset_time: DateTime<Utc>,
}

impl RateLimitEntry {
    fn fresh(reset_time: DateTime<Utc>) -> Self {
        Self {
            count: 0,
            reset_time,
        }
    }
}

/// 一次限流检查的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_time: DateTime<Utc>,
}

impl RateLimitDecision {
    /// 距离窗口重置的秒数（向上取整）
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> i64 {
        let millis = (self.reset_time - now).num_milliseconds().max(0);
        (millis + 999) / 1000
    }

    /// 窗口重置时刻的 Unix 秒（向上取整）
    pub fn reset_epoch_secs(&self) -> i64 {
        let millis = self.reset_time.timestamp_millis();
        millis.div_euclid(1000) + i64::from(millis.rem_euclid(1000) != 0)
    }
}

/// 内存中的固定窗口计数器，按 `客户端:路由` 分桶。
///
/// 不做持久化，进程重启后计数清零。同一个 key 上的并发递增由 `DashMap`
/// 的分片锁串行化。
#[derive(Debug)]
pub struct RateLimitStore {
    entries: DashMap<String, RateLimitEntry>,
    last_sweep: Mutex<DateTime<Utc>>,
}

impl Default for RateLimitStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimitStore {
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            entries: DashMap::new(),
            last_sweep: Mutex::new(now),
        }
    }

    pub fn check(
        &self,
        client_id: &str,
        route_path: &str,
        policy: &RateLimitPolicy,
    ) -> RateLimitDecision {
        self.check_at(client_id, route_path, policy, Utc::now())
    }

    pub fn check_at(
        &self,
        client_id: &str,
        route_path: &str,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> RateLimitDecision {
        self.sweep_expired(now);

        let key = format!("{}:{}", client_id, route_path);
        let reset_time = now + policy.window_delta();

        let (count, reset_time) = {
            let mut entry = self
                .entries
                .entry(key)
                .or_insert_with(|| RateLimitEntry::fresh(reset_time));

            // 窗口已过期，整体丢弃旧计数
            if entry.reset_time < now {
                *entry = RateLimitEntry::fresh(reset_time);
            }

            entry.count = entry.count.saturating_add(1);
            (entry.count, entry.reset_time)
        };

        RateLimitDecision {
            allowed: count <= policy.max_requests,
            remaining: policy.max_requests.saturating_sub(count),
            reset_time,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn sweep_expired(&self, now: DateTime<Utc>) {
        // 其他请求正在清理时直接跳过，锁中毒时照常清理
        let mut last_sweep = match self.last_sweep.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return,
        };

        if (now - *last_sweep).num_milliseconds() < CLEANUP_INTERVAL.as_millis() as i64 {
            return;
        }

        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.reset_time >= now);
        *last_sweep = now;

        tracing::debug!(
            purged = before.saturating_sub(self.entries.len()),
            remaining = self.entries.len(),
            "Swept expired rate limit entries"
        );
    }
}
