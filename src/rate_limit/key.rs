use crate::auth::middleware::Principal;
use axum::{
    extract::{ConnectInfo, OriginalUri, Request},
    http::{request::Parts, Extensions, HeaderMap, Method},
};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};

/// How anonymous callers are partitioned into counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyScope {
    /// One counter per caller per request path
    #[default]
    PerRoute,
    /// One counter per caller shared across every path
    Global,
}

/// The parts of an inbound request a limiter may key on
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    /// First entry of `X-Forwarded-For`, if any
    pub forwarded_for: Option<String>,
    /// Peer address of the connection
    pub client_addr: Option<IpAddr>,
    /// User id resolved by the auth layer
    pub identity: Option<String>,
}

impl RequestContext {
    pub fn from_parts(parts: &Parts) -> Self {
        Self::build(&parts.method, parts.uri.path(), &parts.headers, &parts.extensions)
    }

    pub fn from_request(request: &Request) -> Self {
        Self::build(
            request.method(),
            request.uri().path(),
            request.headers(),
            request.extensions(),
        )
    }

    fn build(method: &Method, path: &str, headers: &HeaderMap, extensions: &Extensions) -> Self {
        let forwarded_for = headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(str::to_string);

        let client_addr = extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        let identity = extensions
            .get::<Principal>()
            .map(|principal| principal.user_id.to_string());

        // Nested routers see a stripped path
        let path = extensions
            .get::<OriginalUri>()
            .map(|OriginalUri(uri)| uri.path())
            .unwrap_or(path);

        Self {
            method: method.clone(),
            path: path.to_string(),
            forwarded_for,
            client_addr,
            identity,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Forwarded address, else the peer address, else `"unknown"`
    pub fn client_address(&self) -> String {
        if let Some(forwarded) = &self.forwarded_for {
            return forwarded.clone();
        }

        self.client_addr
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Default throttling key for a request.
///
/// Authenticated callers are keyed by user id alone. Anonymous callers are
/// keyed by address, and additionally by path under [`KeyScope::PerRoute`].
pub fn default_key(ctx: &RequestContext, scope: KeyScope) -> String {
    if let Some(identity) = &ctx.identity {
        return format!("user:{}", identity);
    }

    let addr = ctx.client_address();
    match scope {
        KeyScope::PerRoute => format!("ip:{}:path:{}", addr, ctx.path),
        KeyScope::Global => format!("ip:{}", addr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use uuid::Uuid;

    fn request(path: &str) -> axum::http::request::Builder {
        HttpRequest::builder().method(Method::GET).uri(path)
    }

    #[test]
    fn test_forwarded_for_first_entry() {
        let req = request("/api/expenses")
            .header("x-forwarded-for", "192.168.1.1, 10.0.0.1")
            .body(Body::empty())
            .unwrap();

        let ctx = RequestContext::from_request(&req);
        assert_eq!(ctx.client_address(), "192.168.1.1");
        assert_eq!(
            default_key(&ctx, KeyScope::PerRoute),
            "ip:192.168.1.1:path:/api/expenses"
        );
        assert_eq!(default_key(&ctx, KeyScope::Global), "ip:192.168.1.1");
    }

    #[test]
    fn test_connect_info_fallback() {
        let mut req = request("/x").body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([203, 0, 113, 42], 50000))));

        let ctx = RequestContext::from_request(&req);
        assert_eq!(default_key(&ctx, KeyScope::PerRoute), "ip:203.0.113.42:path:/x");
    }

    #[test]
    fn test_missing_address_is_unknown() {
        let req = request("/x")
            .header("x-forwarded-for", "  ")
            .body(Body::empty())
            .unwrap();

        let ctx = RequestContext::from_request(&req);
        assert_eq!(ctx.forwarded_for, None);
        assert_eq!(default_key(&ctx, KeyScope::Global), "ip:unknown");
    }

    #[test]
    fn test_identity_takes_precedence() {
        let user_id = Uuid::new_v4();
        let mut req = request("/api/expenses")
            .header("x-forwarded-for", "1.2.3.4")
            .body(Body::empty())
            .unwrap();
        req.extensions_mut().insert(Principal { user_id });

        let ctx = RequestContext::from_request(&req);
        assert!(ctx.is_authenticated());
        assert_eq!(default_key(&ctx, KeyScope::PerRoute), format!("user:{}", user_id));
    }

    #[test]
    fn test_original_uri_wins_over_stripped_path() {
        let mut req = request("/7").body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(OriginalUri("/api/expenses/7".parse().unwrap()));

        let ctx = RequestContext::from_request(&req);
        assert_eq!(ctx.path, "/api/expenses/7");
    }

    #[test]
    fn test_from_parts_matches_from_request() {
        let req = request("/api/auth/jwt/login")
            .header("x-forwarded-for", "1.2.3.4")
            .body(Body::empty())
            .unwrap();
        let from_request = RequestContext::from_request(&req);
        let (parts, _) = req.into_parts();
        let from_parts = RequestContext::from_parts(&parts);

        assert_eq!(from_request.path, from_parts.path);
        assert_eq!(from_request.forwarded_for, from_parts.forwarded_for);
    }
}
