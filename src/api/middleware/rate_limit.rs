//! Fixed-window rate limiting backed by Redis counters.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;

use crate::api::AppState;
use crate::config::{
    RATE_LIMIT_AUTH_REQUESTS, RATE_LIMIT_AUTH_WINDOW_SECONDS, RATE_LIMIT_REQUESTS,
    RATE_LIMIT_WINDOW_SECONDS,
};

const X_RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const X_RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// Request budget for one class of routes.
#[derive(Debug, Clone, Copy)]
struct Policy {
    scope: &'static str,
    max_requests: u64,
    window_seconds: u64,
}

const GENERAL: Policy = Policy {
    scope: "general",
    max_requests: RATE_LIMIT_REQUESTS,
    window_seconds: RATE_LIMIT_WINDOW_SECONDS,
};

const AUTH: Policy = Policy {
    scope: "auth",
    max_requests: RATE_LIMIT_AUTH_REQUESTS,
    window_seconds: RATE_LIMIT_AUTH_WINDOW_SECONDS,
};

#[derive(Debug)]
pub struct RateLimitError {
    pub retry_after: u64,
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::RETRY_AFTER, HeaderValue::from(self.retry_after));
        headers.insert(X_RATE_LIMIT_REMAINING, HeaderValue::from(0u64));

        (
            StatusCode::TOO_MANY_REQUESTS,
            headers,
            "Too many requests. Please try again later.",
        )
            .into_response()
    }
}

fn header<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request
        .headers()
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Client address. Proxy headers count only when `trust_proxy` is set.
fn client_identifier(request: &Request, trust_proxy: bool) -> String {
    if trust_proxy {
        if let Some(ip) = header(request, "x-forwarded-for").and_then(|v| v.split(',').next()) {
            return ip.trim().to_string();
        }
        if let Some(ip) = header(request, "x-real-ip") {
            return ip.to_string();
        }
    }
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}

async fn enforce(
    state: &AppState,
    policy: Policy,
    request: Request,
    next: Next,
) -> Result<Response, RateLimitError> {
    let client = client_identifier(&request, state.trust_proxy_headers);
    let key = format!("{}:{}", policy.scope, client);
    let rejected = || RateLimitError {
        retry_after: policy.window_seconds,
    };

    // Fail closed when the counter store is unreachable
    let (count, allowed) = state
        .cache
        .check_rate_limit(&key, policy.max_requests, policy.window_seconds)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, scope = policy.scope, "Rate limit check failed");
            rejected()
        })?;

    if !allowed {
        tracing::warn!(%client, count, scope = policy.scope, "Rate limit exceeded");
        return Err(rejected());
    }

    let mut response = next.run(request).await;

    if state.cache.is_enabled() {
        let headers = response.headers_mut();
        headers.insert(X_RATE_LIMIT_LIMIT, HeaderValue::from(policy.max_requests));
        headers.insert(
            X_RATE_LIMIT_REMAINING,
            HeaderValue::from(policy.max_requests.saturating_sub(count)),
        );
    }

    Ok(response)
}

/// General limit for API routes.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, RateLimitError> {
    enforce(&state, GENERAL, request, next).await
}

/// Stricter limit for signup and signin.
pub async fn rate_limit_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, RateLimitError> {
    enforce(&state, AUTH, request, next).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_rate_limit_error_response() {
        let response = RateLimitError { retry_after: 60 }.into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["retry-after"], "60");
    }

    fn forwarded_request() -> Request {
        let mut request = Request::builder()
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .header("x-real-ip", "10.0.0.2")
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 7], 41000))));
        request
    }

    #[test]
    fn test_forwarded_for_wins_behind_trusted_proxy() {
        assert_eq!(client_identifier(&forwarded_request(), true), "203.0.113.9");
    }

    #[test]
    fn test_forwarded_headers_ignored_by_default() {
        // A client rotating X-Forwarded-For still lands in its peer's bucket
        assert_eq!(client_identifier(&forwarded_request(), false), "192.0.2.7");
    }

    #[test]
    fn test_real_ip_used_without_forwarded_for() {
        let request = Request::builder()
            .header("x-real-ip", "10.0.0.2")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_identifier(&request, true), "10.0.0.2");
    }

    #[test]
    fn test_unknown_client() {
        let request = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_identifier(&request, true), "unknown");
        assert_eq!(client_identifier(&request, false), "unknown");
    }
}
