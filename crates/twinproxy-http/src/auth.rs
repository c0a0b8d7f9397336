//! Credential header selection and the 407 challenge.

use http::header::{AUTHORIZATION, HOST, PROXY_AUTHENTICATE, PROXY_AUTHORIZATION};
use http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use twinproxy_core::DEFAULT_PROXY_REALM;

use crate::body::{ProxyBody, full};

/// Credential header value of a request.
///
/// `Proxy-Authorization` wins; `Authorization` is the fallback. Values that
/// are not visible ASCII are passed on lossily and fail parsing later.
pub fn credential_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(PROXY_AUTHORIZATION)
        .or_else(|| headers.get(AUTHORIZATION))
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}

/// Whether [`credential_header`] falls back to `Authorization`.
pub fn uses_fallback_header(headers: &HeaderMap) -> bool {
    !headers.contains_key(PROXY_AUTHORIZATION) && headers.contains_key(AUTHORIZATION)
}

/// Host a request is aimed at, for the audit line.
///
/// CONNECT authority first, then the `Host` header, then the URI authority.
pub fn request_host<B>(req: &Request<B>) -> String {
    if req.method() == Method::CONNECT
        && let Some(authority) = req.uri().authority()
    {
        return authority.to_string();
    }
    if let Some(host) = req.headers().get(HOST).and_then(|v| v.to_str().ok()) {
        return host.to_string();
    }
    req.uri()
        .authority()
        .map(|a| a.to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// `407 Proxy Authentication Required` with a Basic challenge.
pub fn proxy_auth_required() -> Response<ProxyBody> {
    let challenge = format!("Basic realm=\"{DEFAULT_PROXY_REALM}\"");
    let mut response = Response::new(full("Proxy authentication required"));
    *response.status_mut() = StatusCode::PROXY_AUTHENTICATION_REQUIRED;
    response.headers_mut().insert(
        PROXY_AUTHENTICATE,
        HeaderValue::from_str(&challenge).unwrap_or_else(|_| HeaderValue::from_static("Basic")),
    );
    response
}
