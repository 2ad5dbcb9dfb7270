//! Client identity derivation.
//!
//! The rate limit key is a composite of the best-available client network
//! address and the caller-supplied session token. The HTTP shell is external
//! to this crate, so the address is resolved through a header-lookup closure
//! rather than a concrete request type.

/// Client address headers, checked in precedence order.
const ADDRESS_HEADERS: [&str; 3] = ["cf-connecting-ip", "x-forwarded-for", "x-real-ip"];

/// Fallback when no address header is present.
const UNKNOWN_ADDRESS: &str = "unknown";

/// Fallback when the caller supplied no session token.
const DEFAULT_SESSION: &str = "anonymous";

/// Derive a stable rate limit identity from request headers and an optional
/// session token.
///
/// Headers are consulted in a fixed precedence order; `x-forwarded-for` is
/// reduced to its first hop. The same inputs always yield the same key.
pub fn client_key<'a, F>(lookup: F, session: Option<&str>) -> String
where
    F: Fn(&str) -> Option<&'a str>,
{
    let address = ADDRESS_HEADERS
        .iter()
        .find_map(|header| {
            let value = lookup(header)?.trim();
            if value.is_empty() {
                return None;
            }
            // x-forwarded-for may carry a proxy chain; the client is the first hop
            let first = value.split(',').next().unwrap_or(value).trim();
            (!first.is_empty()).then_some(first)
        })
        .unwrap_or(UNKNOWN_ADDRESS);

    let session = match session.map(str::trim) {
        Some(token) if !token.is_empty() => token,
        _ => DEFAULT_SESSION,
    };

    format!("{address}:{session}")
}
