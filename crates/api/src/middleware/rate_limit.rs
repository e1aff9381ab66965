//! Per-client request limiting.
//!
//! Each client IP gets a fixed window of `max_requests` requests. Loopback
//! clients are never limited. Responses carry `RateLimit-Limit`,
//! `RateLimit-Remaining` and `RateLimit-Reset` headers; a refused request
//! gets the JSON error envelope with status 429 and `Retry-After`.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::state::AppState;

pub const DEFAULT_MAX_REQUESTS: u32 = 100;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Expired windows are swept once this many clients are tracked.
const PRUNE_THRESHOLD: usize = 1024;

static RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
static RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
static RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

/// Limiter settings, from `RATE_LIMIT_MAX_REQUESTS` and
/// `RATE_LIMIT_WINDOW_SECS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Requests admitted per client per window; `0` turns limiting off.
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window: DEFAULT_WINDOW,
        }
    }
}

impl RateLimitConfig {
    pub fn is_enabled(&self) -> bool {
        self.max_requests > 0 && !self.window.is_zero()
    }
}

/// Outcome of counting one request against a client's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32, reset_after: Duration },
    Limited { reset_after: Duration },
}

#[derive(Debug)]
struct Window {
    count: u32,
    started: Instant,
}

/// Fixed-window request counter keyed by client IP.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<IpAddr, Window>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Loopback clients (including IPv4-mapped `::ffff:127.0.0.1`) skip the
    /// limiter.
    pub fn is_exempt(ip: IpAddr) -> bool {
        ip.to_canonical().is_loopback()
    }

    /// Count one request from `ip` at `now`.
    pub async fn check(&self, ip: IpAddr, now: Instant) -> Decision {
        let window = self.config.window;
        let mut windows = self.windows.lock().await;

        if windows.len() >= PRUNE_THRESHOLD {
            windows.retain(|_, w| now.saturating_duration_since(w.started) < window);
        }

        let entry = windows.entry(ip).or_insert(Window {
            count: 0,
            started: now,
        });
        if now.saturating_duration_since(entry.started) >= window {
            entry.count = 0;
            entry.started = now;
        }

        let reset_after = window.saturating_sub(now.saturating_duration_since(entry.started));
        if entry.count < self.config.max_requests {
            entry.count += 1;
            Decision::Allowed {
                remaining: self.config.max_requests - entry.count,
                reset_after,
            }
        } else {
            Decision::Limited { reset_after }
        }
    }
}

/// Axum middleware applying the shared [`RateLimiter`].
///
/// The client address comes from [`ConnectInfo`]; requests without one
/// (in-process callers) pass through.
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let limiter = &state.rate_limiter;
    let config = limiter.config();
    if !config.is_enabled() {
        return next.run(request).await;
    }

    let Some(ip) = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
    else {
        return next.run(request).await;
    };
    if RateLimiter::is_exempt(ip) {
        return next.run(request).await;
    }

    match limiter.check(ip, Instant::now()).await {
        Decision::Allowed {
            remaining,
            reset_after,
        } => {
            let mut response = next.run(request).await;
            set_headers(response.headers_mut(), config.max_requests, remaining, reset_after);
            response
        }
        Decision::Limited { reset_after } => {
            tracing::warn!(client_ip = %ip, "Rate limit exceeded");
            let mut response = AppError::RateLimited {
                retry_after_secs: whole_secs(reset_after),
            }
            .into_response();
            set_headers(response.headers_mut(), config.max_requests, 0, reset_after);
            response
        }
    }
}

fn set_headers(headers: &mut HeaderMap, limit: u32, remaining: u32, reset_after: Duration) {
    headers.insert(RATELIMIT_LIMIT.clone(), HeaderValue::from(limit));
    headers.insert(RATELIMIT_REMAINING.clone(), HeaderValue::from(remaining));
    headers.insert(RATELIMIT_RESET.clone(), HeaderValue::from(whole_secs(reset_after)));
}

/// Seconds rounded up, so a client waiting that long finds a fresh window.
fn whole_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, Ipv6Addr};

    use assert_matches::assert_matches;

    use super::*;

    fn limiter(max_requests: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            max_requests,
            window: Duration::from_secs(window_secs),
        })
    }

    fn client(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(203, 0, 113, last))
    }

    #[tokio::test]
    async fn window_admits_max_then_limits() {
        let limiter = limiter(2, 60);
        let now = Instant::now();

        assert_matches!(
            limiter.check(client(1), now).await,
            Decision::Allowed { remaining: 1, .. }
        );
        assert_matches!(
            limiter.check(client(1), now).await,
            Decision::Allowed { remaining: 0, .. }
        );
        assert_matches!(limiter.check(client(1), now).await, Decision::Limited { .. });

        // Other clients have their own window.
        assert_matches!(
            limiter.check(client(2), now).await,
            Decision::Allowed { remaining: 1, .. }
        );
    }

    #[tokio::test]
    async fn window_resets_after_it_elapses() {
        let limiter = limiter(1, 60);
        let start = Instant::now();

        limiter.check(client(1), start).await;
        let Decision::Limited { reset_after } =
            limiter.check(client(1), start + Duration::from_secs(20)).await
        else {
            panic!("expected the second request to be limited");
        };
        assert_eq!(reset_after, Duration::from_secs(40));

        assert_matches!(
            limiter.check(client(1), start + Duration::from_secs(60)).await,
            Decision::Allowed { remaining: 0, .. }
        );
    }

    #[tokio::test]
    async fn expired_windows_are_swept() {
        let limiter = limiter(1, 1);
        let start = Instant::now();
        for i in 0..PRUNE_THRESHOLD {
            let ip = IpAddr::V4(Ipv4Addr::from(0x0A00_0000 + i as u32));
            limiter.check(ip, start).await;
        }

        limiter.check(client(9), start + Duration::from_secs(5)).await;

        assert_eq!(limiter.windows.lock().await.len(), 1);
    }

    #[test]
    fn loopback_is_exempt() {
        assert!(RateLimiter::is_exempt(IpAddr::V4(Ipv4Addr::LOCALHOST)));
        assert!(RateLimiter::is_exempt(IpAddr::V6(Ipv6Addr::LOCALHOST)));
        assert!(RateLimiter::is_exempt(IpAddr::V6(
            Ipv4Addr::LOCALHOST.to_ipv6_mapped()
        )));
        assert!(!RateLimiter::is_exempt(client(1)));
    }

    #[test]
    fn zero_max_disables_limiting() {
        let config = RateLimitConfig {
            max_requests: 0,
            ..RateLimitConfig::default()
        };
        assert!(!config.is_enabled());
        assert!(RateLimitConfig::default().is_enabled());
    }

    #[test]
    fn reset_seconds_round_up() {
        assert_eq!(whole_secs(Duration::from_millis(1500)), 2);
        assert_eq!(whole_secs(Duration::from_secs(3)), 3);
        assert_eq!(whole_secs(Duration::ZERO), 0);
    }
}
