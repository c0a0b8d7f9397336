//! HTTP forward proxy frontend.
//!
//! Serves absolute-form HTTP requests and CONNECT tunnels over hyper's
//! HTTP/1 server. With authentication configured, every request must carry
//! Basic credentials in `Proxy-Authorization` (or `Authorization` as a
//! fallback); anything else is answered with `407` and never reaches the
//! outbound connector.

mod auth;
mod body;
mod error;
mod server;
mod service;

pub use auth::{credential_header, proxy_auth_required, request_host, uses_fallback_header};
pub use body::ProxyBody;
pub use error::HttpError;
pub use server::{HttpFrontend, HttpServer};
