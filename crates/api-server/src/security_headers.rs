use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};

/// Paths serving the Swagger UI, which needs scripts and styles.
const DOCS_PREFIXES: &[&str] = &["/swagger-ui", "/api-docs"];

#[derive(Debug, Clone, Copy, Default)]
pub struct SecurityHeaders {
    /// Only behind TLS termination.
    pub hsts: bool,
}

/// Adds security headers to every response.
pub async fn security_headers_middleware(
    State(config): State<SecurityHeaders>,
    request: Request,
    next: Next,
) -> Response {
    let is_docs = DOCS_PREFIXES
        .iter()
        .any(|p| request.uri().path().starts_with(p));

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "referrer-policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    if !is_docs {
        headers.insert(
            "content-security-policy",
            HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
        );
        // Quotes go stale within seconds
        headers.insert("cache-control", HeaderValue::from_static("no-store"));
    }

    if config.hsts {
        headers.insert(
            "strict-transport-security",
            HeaderValue::from_static("max-age=63072000; includeSubDomains"),
        );
    }

    response
}
