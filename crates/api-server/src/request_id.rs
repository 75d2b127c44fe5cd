use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Span;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller-supplied id we propagate; anything else gets a fresh one.
const MAX_INCOMING_LEN: usize = 128;

/// Request id carried in request extensions.
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

fn incoming_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty() && s.len() <= MAX_INCOMING_LEN)
        .filter(|s| s.chars().all(|c| c.is_ascii_graphic()))
        .map(str::to_string)
}

/// Reuses a sane incoming `X-Request-Id` or generates a UUID v4, stores it
/// in the request extensions and echoes it on the response.
///
/// Must sit outside the trace layer so `make_span` can see the id.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let id = incoming_id(request.headers()).unwrap_or_else(|| Uuid::new_v4().to_string());

    request.extensions_mut().insert(RequestId(id.clone()));

    let mut response = next.run(request).await;
    if let Ok(val) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, val);
    }

    response
}

/// Span for `TraceLayer`, tagged with the request id.
pub fn make_span<B>(request: &axum::http::Request<B>) -> Span {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.as_str())
        .unwrap_or("-");

    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incoming_id_is_sanitized() {
        let mut headers = HeaderMap::new();
        assert!(incoming_id(&headers).is_none());

        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("abc-123"));
        assert_eq!(incoming_id(&headers).as_deref(), Some("abc-123"));

        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("has space"));
        assert!(incoming_id(&headers).is_none());

        let long = "x".repeat(MAX_INCOMING_LEN + 1);
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(&long).unwrap());
        assert!(incoming_id(&headers).is_none());
    }
}
