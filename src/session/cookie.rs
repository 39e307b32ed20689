//! Session cookie transport
//!
//! The session id travels in a single cookie. The value is the opaque id
//! itself, so no encryption is needed: possession of the id is the
//! credential, and the cookie attributes keep it away from scripts, plain
//! HTTP, and cross-site requests.

use crate::session::config::CookieConfig;
use cookie::{Cookie, SameSite};
use std::time::Duration;

/// Builds and reads the session cookie.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use tidemark::session::{CookieConfig, SessionCookie};
///
/// let cookies = SessionCookie::new(&CookieConfig::default(), Duration::from_secs(3600));
/// let header = cookies.build("abc123").to_string();
/// assert!(header.starts_with("hss_science_session=abc123"));
///
/// let id = cookies.session_id_from_header("theme=dark; hss_science_session=abc123");
/// assert_eq!(id.as_deref(), Some("abc123"));
/// ```
#[derive(Debug, Clone)]
pub struct SessionCookie {
    config: CookieConfig,
    max_age: cookie::time::Duration,
}

impl SessionCookie {
    /// Cookie lifetime follows the session TTL.
    pub fn new(config: &CookieConfig, ttl: Duration) -> Self {
        let seconds = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        Self {
            config: config.clone(),
            max_age: cookie::time::Duration::seconds(seconds),
        }
    }

    /// Cookie name
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// The `Set-Cookie` value carrying `session_id`.
    ///
    /// `HttpOnly`, `SameSite=Lax`, `Path=/`, `Max-Age` equal to the session
    /// TTL, `Secure` unless disabled for local development, and `Domain` when
    /// configured.
    pub fn build(&self, session_id: &str) -> Cookie<'static> {
        let mut cookie = Cookie::build((self.config.name.clone(), session_id.to_string()))
            .http_only(true)
            .secure(self.config.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(self.max_age)
            .build();

        if let Some(ref domain) = self.config.domain {
            cookie.set_domain(domain.clone());
        }

        cookie
    }

    /// A cookie that clears the session cookie in the browser.
    pub fn removal(&self) -> Cookie<'static> {
        let mut cookie = self.build("");
        cookie.make_removal();
        cookie
    }

    /// Extract the session id from a `Cookie` request header.
    ///
    /// Returns `None` if the cookie is missing or empty. Unparseable cookie
    /// pairs are skipped.
    pub fn session_id_from_header(&self, header: &str) -> Option<String> {
        Cookie::split_parse(header)
            .filter_map(|parsed| parsed.ok())
            .find(|cookie| cookie.name() == self.config.name)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty())
    }
}
