//! HTTP response building module
//!
//! Provides builders for the responses the service emits, decoupled from the lookup itself.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, SERVER};
use hyper::Response;

/// Body of every failed lookup
pub const NOT_FOUND_BODY: &str = "❔";

/// Methods advertised in `Allow` and CORS headers
pub const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

const FLAG_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Build 200 response carrying flag text, with CORS and cache headers
pub fn build_flag_response(
    flag: String,
    cache_control: &str,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = flag.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(flag)
    };

    Response::builder()
        .status(200)
        .header("Content-Type", FLAG_CONTENT_TYPE)
        .header("Content-Length", content_length)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", ALLOWED_METHODS)
        .header("Access-Control-Allow-Headers", "*")
        .header("Cache-Control", cache_control)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 404 response with the question mark glyph.
///
/// Only the host default content type is set; no CORS or cache headers.
pub fn build_not_found_response(
    default_content_type: &str,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from_static(NOT_FOUND_BODY.as_bytes())
    };

    Response::builder()
        .status(404)
        .header("Content-Type", default_content_type)
        .header("Content-Length", NOT_FOUND_BODY.len())
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("404", &e);
            let mut resp =
                Response::new(Full::new(Bytes::from_static(NOT_FOUND_BODY.as_bytes())));
            *resp.status_mut() = hyper::StatusCode::NOT_FOUND;
            resp
        })
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(405)
        .header("Content-Type", "text/plain")
        .header("Allow", ALLOWED_METHODS)
        .body(Full::new(Bytes::from("405 Method Not Allowed")))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(Full::new(Bytes::from("405 Method Not Allowed")))
        })
}

/// Build OPTIONS response (preflight request)
pub fn build_options_response(max_age: u32) -> Response<Full<Bytes>> {
    Response::builder()
        .status(204)
        .header("Allow", ALLOWED_METHODS)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", ALLOWED_METHODS)
        .header("Access-Control-Allow-Headers", "*")
        .header("Access-Control-Max-Age", max_age)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build health check response
pub fn build_health_response(status: u16, body: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain")
        .header("Cache-Control", "no-cache")
        .body(Full::new(Bytes::from_static(body.as_bytes())))
        .unwrap_or_else(|e| {
            log_build_error("health", &e);
            Response::new(Full::new(Bytes::from_static(body.as_bytes())))
        })
}

/// Stamp the `Server` header; names that are not valid header values are skipped
pub fn with_server_header(
    mut resp: Response<Full<Bytes>>,
    server_name: &str,
) -> Response<Full<Bytes>> {
    if let Ok(value) = HeaderValue::from_str(server_name) {
        resp.headers_mut().insert(SERVER, value);
    }
    resp
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
