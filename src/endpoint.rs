//! Channel URL derivation.
//!
//! The client is launched against an origin (the address a browser would have
//! loaded the quiz page from). The socket lives at a fixed path on that host;
//! the transport is encrypted iff the origin is.

use tokio_tungstenite::tungstenite::http::Uri;

use crate::error::SessionError;

/// Path of the quiz socket on every server.
pub const WS_PATH: &str = "/ws";

/// Build the socket URL for `origin`.
///
/// `http` maps to `ws`, `https` to `wss`; origins already written with a
/// socket scheme are kept. Any path, query or fragment on the origin is
/// dropped in favor of [`WS_PATH`].
pub fn socket_url(origin: &str) -> Result<String, SessionError> {
    let invalid = |reason: &str| SessionError::Endpoint {
        origin: origin.to_string(),
        reason: reason.to_string(),
    };

    let uri: Uri = origin.trim().parse().map_err(|_| invalid("not a URL"))?;

    let scheme = match uri.scheme_str().map(|s| s.to_ascii_lowercase()) {
        Some(s) if s == "https" || s == "wss" => "wss",
        Some(s) if s == "http" || s == "ws" => "ws",
        Some(_) => return Err(invalid("unsupported scheme")),
        None => return Err(invalid("missing scheme")),
    };

    let authority = uri
        .authority()
        .map(|a| a.as_str())
        .filter(|a| !a.is_empty())
        .ok_or_else(|| invalid("missing host"))?;

    Ok(format!("{scheme}://{authority}{WS_PATH}"))
}

/// True when the derived channel would be encrypted.
pub fn is_secure(url: &str) -> bool {
    url.starts_with("wss://")
}
