//! `token` session cookie: Set-Cookie rendering and Cookie header lookup

use chrono::{DateTime, Duration, Utc};

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "token";

const ATTRIBUTES: &str = "Path=/; HttpOnly; Secure; SameSite=Lax";

fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Set-Cookie value installing `token` until `expires_at` (unix seconds).
///
/// `lifetime` is the token's own TTL, so Max-Age never drifts below it
/// because of sub-second clock reads.
pub fn session_cookie(token: &str, expires_at: u64, lifetime: std::time::Duration) -> String {
    let expires = DateTime::<Utc>::from_timestamp(expires_at as i64, 0).unwrap_or_default();
    let max_age = lifetime.as_secs();
    format!(
        "{}={}; Expires={}; Max-Age={}; {}",
        SESSION_COOKIE,
        token,
        http_date(expires),
        max_age,
        ATTRIBUTES
    )
}

/// Set-Cookie value overwriting the session with an empty, already expired cookie
pub fn cleared_session_cookie(now: DateTime<Utc>) -> String {
    format!(
        "{}=; Expires={}; Max-Age=0; {}",
        SESSION_COOKIE,
        http_date(now - Duration::hours(1)),
        ATTRIBUTES
    )
}

/// Find cookie `name` in a `Cookie:` request header value
pub fn read_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn session_cookie_attributes() {
        let cookie = session_cookie("abc.def.ghi", 1_700_007_200, std::time::Duration::from_secs(7200));

        assert!(cookie.starts_with("token=abc.def.ghi; "));
        assert!(cookie.contains("Max-Age=7200"));
        assert!(cookie.contains("Expires=Wed, 15 Nov 2023 00:13:20 GMT"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
    }

    #[test]
    fn max_age_is_the_full_lifetime() {
        // issued just before a second boundary, exp already truncated to whole seconds
        let cookie = session_cookie("t", 1_700_007_200, std::time::Duration::from_secs(7200));
        assert!(cookie.contains("Max-Age=7200;"), "{}", cookie);
        assert!(!cookie.contains("Max-Age=7199"));
    }

    #[test]
    fn cleared_cookie_is_empty_and_expired() {
        let now = at(1_700_000_000);
        let cookie = cleared_session_cookie(now);
        assert!(cookie.starts_with("token=; "));
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.contains("Expires=Tue, 14 Nov 2023 21:13:20 GMT"));
    }

    #[test]
    fn reads_named_cookie() {
        let header = "theme=dark; token=eyJ.abc.def; other=1";
        assert_eq!(read_cookie(header, "token"), Some("eyJ.abc.def"));
        assert_eq!(read_cookie(header, "missing"), None);
        assert_eq!(read_cookie("token=", "token"), Some(""));
        assert_eq!(read_cookie("xtoken=1", "token"), None);
    }
}
