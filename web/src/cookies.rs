//! Anonymous session cookie.

use axum::http::{HeaderMap, header::COOKIE};
use comicvault_billing::AnonymousSessionId;
use comicvault_billing::constants::{ANON_SESSION_COOKIE, ANON_SESSION_MAX_AGE_SECS};

/// `Set-Cookie` value carrying the anonymous session id.
///
/// # Examples
///
/// ```
/// use comicvault_billing::AnonymousSessionId;
/// use comicvault_web::cookies::anonymous_session_cookie;
///
/// let cookie = anonymous_session_cookie(AnonymousSessionId::new(), true);
/// assert!(cookie.starts_with("comic_anon_session="));
/// assert!(cookie.contains("Max-Age=10800"));
/// assert!(cookie.ends_with("; Secure"));
/// ```
#[must_use]
pub fn anonymous_session_cookie(session_id: AnonymousSessionId, secure: bool) -> String {
    let mut cookie = format!(
        "{ANON_SESSION_COOKIE}={session_id}; Max-Age={ANON_SESSION_MAX_AGE_SECS}; Path=/; HttpOnly; SameSite=Lax"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Value of the first cookie called `name` across all `Cookie` headers.
#[must_use]
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_cookie_attributes() {
        let cookie = anonymous_session_cookie(AnonymousSessionId::new(), false);
        assert!(cookie.contains("; Path=/; HttpOnly; SameSite=Lax"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn test_read_cookie_across_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark; lang=en"));
        headers.append(COOKIE, HeaderValue::from_static("comic_anon_session=abc; other=1"));

        assert_eq!(read_cookie(&headers, "comic_anon_session"), Some("abc"));
        assert_eq!(read_cookie(&headers, "lang"), Some("en"));
        assert_eq!(read_cookie(&headers, "missing"), None);
    }
}
