//! Request routing dispatch module
//!
//! Entry point for HTTP request processing, responsible for method validation,
//! route matching, dispatching to the flag lookup and access logging.

use crate::config::AppState;
use crate::flags::CodeParam;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body as _, Bytes};
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub is_head: bool,
}

/// Main entry point for HTTP request handling
///
/// Generic over the request body: nothing here reads it.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: Option<SocketAddr>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let method = req.method();
    let uri = req.uri();

    let ctx = RequestContext {
        path: uri.path(),
        query: uri.query(),
        is_head: *method == Method::HEAD,
    };

    let response = match check_http_method(method, state.config.flags.max_age) {
        Some(resp) => resp,
        None => route_request(&ctx, &state).await,
    };
    let response = http::with_server_header(response, &state.config.http.server_name);

    if state.access_log_enabled() {
        let mut entry = AccessLogEntry::new(
            remote_addr.map_or_else(|| "-".to_string(), |a| a.ip().to_string()),
            method.to_string(),
            ctx.path.to_string(),
        );
        entry.query = ctx.query.map(ToString::to_string);
        entry.http_version = version_label(req.version()).to_string();
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        entry.referer = header_string(&req, "referer");
        entry.user_agent = header_string(&req, "user-agent");
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method, max_age: u32) -> Option<Response<Full<Bytes>>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::build_options_response(max_age)),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Route request based on path and configuration
async fn route_request(ctx: &RequestContext<'_>, state: &Arc<AppState>) -> Response<Full<Bytes>> {
    let health = &state.config.health;

    // 0. Health check endpoints (highest priority, always fast)
    if health.enabled {
        if ctx.path == health.liveness_path {
            return http::build_health_response(200, "ok");
        }
        if ctx.path == health.readiness_path {
            return if state.lookup.store().is_ready().await {
                http::build_health_response(200, "ok")
            } else {
                http::build_health_response(503, "flags directory unavailable")
            };
        }
    }

    // 1. Flag lookup
    if let Some(segment) = match_lookup_route(ctx.path, &state.config.flags.route_prefix) {
        let param = CodeParam::from_request(segment, ctx.query);
        let outcome = state.lookup.resolve(param).await;
        if let Err(ref cause) = outcome {
            logger::log_lookup_miss(ctx.path, cause);
        }
        return state.lookup.respond(outcome, ctx.is_head);
    }

    // 2. Anything else gets the same 404 as a failed lookup
    logger::log_debug(&format!("No route for {}", ctx.path));
    state.lookup.not_found(ctx.is_head)
}

/// Match `path` against the lookup route.
///
/// Returns `Some(None)` for the bare prefix (code only in the query),
/// `Some(Some(segment))` for `{prefix}/{segment}`, `None` otherwise.
fn match_lookup_route<'a>(path: &'a str, route_prefix: &str) -> Option<Option<&'a str>> {
    let prefix = route_prefix.trim_end_matches('/');
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        return Some(None);
    }
    let segment = rest.strip_prefix('/')?;
    if segment.contains('/') {
        None
    } else {
        Some(Some(segment))
    }
}

fn header_string<B>(req: &Request<B>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
