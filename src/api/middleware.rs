//! Bearer-token authentication and per-client rate limiting.
//!
//! Both are off unless configured. Rejections use the same JSON error body
//! as every other failure.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::{
    collections::HashMap,
    net::{IpAddr, Ipv4Addr},
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};
use tower_http::cors::{Any, CorsLayer};

use super::error::ApiError;

const DEFAULT_RATE_LIMIT: u32 = 100;
const RATE_WINDOW: Duration = Duration::from_secs(60);

/// Security settings, normally read from `WORLDNOTES_*` variables.
#[derive(Clone, Debug, Default)]
pub struct SecurityConfig {
    /// Token expected in `Authorization: Bearer <key>`.
    pub api_key: Option<String>,
    /// Allowed browser origins; any origin when unset.
    pub cors_origins: Option<Vec<String>>,
    pub rate_limiter: Option<RateLimiter>,
}

impl SecurityConfig {
    /// Read `WORLDNOTES_API_KEY`, `WORLDNOTES_CORS_ORIGINS` and
    /// `WORLDNOTES_RATE_LIMIT`. Rate limiting is only switched on together
    /// with an API key.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        let api_key = var("WORLDNOTES_API_KEY");
        let cors_origins = var("WORLDNOTES_CORS_ORIGINS").map(|raw| parse_origins(&raw));
        let limit = var("WORLDNOTES_RATE_LIMIT")
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(DEFAULT_RATE_LIMIT);

        Self {
            rate_limiter: api_key.as_ref().map(|_| RateLimiter::per_minute(limit)),
            api_key,
            cors_origins,
        }
    }

    /// No authentication, no rate limiting, permissive CORS.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_api_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
            ..Self::default()
        }
    }

    pub fn with_rate_limit(per_minute: u32) -> Self {
        Self {
            rate_limiter: Some(RateLimiter::per_minute(per_minute)),
            ..Self::default()
        }
    }

    pub fn cors_layer(&self) -> CorsLayer {
        let Some(origins) = &self.cors_origins else {
            return CorsLayer::permissive();
        };
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(allowed)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect()
}

/// Fixed-window request counter keyed by client address.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    clients: Arc<Mutex<HashMap<IpAddr, Window>>>,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn per_minute(limit: u32) -> Self {
        Self::new(limit, RATE_WINDOW)
    }

    /// Count a request from `ip`. Returns false once the client has used up
    /// its allowance for the current window.
    pub fn check(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let mut clients = self.clients.lock().expect("rate limiter lock poisoned");

        clients.retain(|_, w| now.duration_since(w.started) < self.window);

        let window = clients.entry(ip).or_insert(Window {
            started: now,
            count: 0,
        });
        if window.count >= self.limit {
            return false;
        }
        window.count += 1;
        true
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

pub async fn auth_middleware(
    State(config): State<SecurityConfig>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = config.api_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    match bearer_token(request.headers()) {
        Some(token) if token == expected => Ok(next.run(request).await),
        Some(_) => {
            tracing::warn!("Rejected request with an invalid API key");
            Err(ApiError::new(StatusCode::UNAUTHORIZED, "Invalid API key"))
        }
        None => {
            tracing::warn!("Rejected request without a bearer token");
            Err(ApiError::new(StatusCode::UNAUTHORIZED, "Missing bearer token"))
        }
    }
}

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ip = client_ip(request.headers());
    if !limiter.check(ip) {
        tracing::warn!("Rate limit exceeded for {}", ip);
        return Err(ApiError::new(StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded"));
    }
    Ok(next.run(request).await)
}

/// First `X-Forwarded-For` hop, then `X-Real-IP`, then localhost.
fn client_ip(headers: &HeaderMap) -> IpAddr {
    let header_ip = |name: &str, first_hop: bool| {
        let value = headers.get(name)?.to_str().ok()?;
        let candidate = if first_hop {
            value.split(',').next()?
        } else {
            value
        };
        candidate.trim().parse::<IpAddr>().ok()
    };

    header_ip("x-forwarded-for", true)
        .or_else(|| header_ip("x-real-ip", false))
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn limiter_allows_up_to_the_limit() {
        let limiter = RateLimiter::per_minute(3);
        let client = ip("192.168.1.1");

        assert!(limiter.check(client));
        assert!(limiter.check(client));
        assert!(limiter.check(client));
        assert!(!limiter.check(client));
    }

    #[test]
    fn limiter_counts_clients_separately() {
        let limiter = RateLimiter::per_minute(1);

        assert!(limiter.check(ip("10.0.0.1")));
        assert!(!limiter.check(ip("10.0.0.1")));
        assert!(limiter.check(ip("10.0.0.2")));
    }

    #[test]
    fn limiter_resets_after_the_window() {
        let limiter = RateLimiter::new(1, Duration::from_millis(20));
        let client = ip("10.0.0.3");

        assert!(limiter.check(client));
        assert!(!limiter.check(client));
        std::thread::sleep(Duration::from_millis(40));
        assert!(limiter.check(client));
    }

    #[test]
    fn forwarded_for_takes_the_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1, 10.0.0.2"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));

        assert_eq!(client_ip(&headers), ip("10.0.0.1"));
    }

    #[test]
    fn client_ip_defaults_to_localhost() {
        assert_eq!(client_ip(&HeaderMap::new()), IpAddr::V4(Ipv4Addr::LOCALHOST));
    }

    #[test]
    fn bearer_token_requires_the_bearer_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));
    }

    #[test]
    fn origins_are_trimmed_and_blank_entries_dropped() {
        assert_eq!(
            parse_origins(" http://a.test, ,http://b.test "),
            vec!["http://a.test", "http://b.test"]
        );
    }

    #[test]
    fn disabled_config_has_no_checks() {
        let config = SecurityConfig::disabled();
        assert!(config.api_key.is_none());
        assert!(config.cors_origins.is_none());
        assert!(config.rate_limiter.is_none());
    }
}
