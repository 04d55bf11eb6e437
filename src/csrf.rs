//! CSRF token injection for state-changing requests.
//!
//! The server issues a token in a cookie; every request the dispatcher
//! sends copies that token into a header so the server can compare the two.

use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, InvalidHeaderName, COOKIE, SET_COOKIE};
use std::sync::Arc;

use crate::config::CsrfConfig;

/// Minimal cookie jar fed from `Set-Cookie` headers.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    cookies: Vec<(String, String)>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one `Set-Cookie` value. Attributes after the first `;` are ignored,
    /// and an empty value removes the cookie.
    pub fn store(&mut self, set_cookie: &str) {
        let first = set_cookie.split(';').next().unwrap_or_default();
        let Some((name, value)) = first.split_once('=') else {
            return;
        };
        let name = name.trim();
        let value = value.trim();
        if name.is_empty() {
            return;
        }

        if value.is_empty() {
            self.cookies.retain(|(n, _)| n != name);
            return;
        }
        match self.cookies.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.cookies.push((name.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Render as a `Cookie` request header value.
    pub fn header_value(&self) -> String {
        self.cookies
            .iter()
            .map(|(n, v)| format!("{}={}", n, v))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Copies the CSRF cookie into the configured request header.
///
/// Clones share the jar.
#[derive(Clone)]
pub struct CsrfInjector {
    cookie_name: String,
    header_name: HeaderName,
    jar: Arc<RwLock<CookieJar>>,
}

impl CsrfInjector {
    pub fn new(config: &CsrfConfig) -> Result<Self, InvalidHeaderName> {
        Ok(Self {
            cookie_name: config.cookie_name.clone(),
            header_name: HeaderName::from_bytes(config.header_name.as_bytes())?,
            jar: Arc::new(RwLock::new(CookieJar::new())),
        })
    }

    /// Current token, if the server has issued one.
    pub fn token(&self) -> Option<String> {
        self.jar.read().get(&self.cookie_name).map(str::to_string)
    }

    /// Feed every `Set-Cookie` header of a response into the jar.
    pub fn observe(&self, headers: &HeaderMap) {
        let mut jar = self.jar.write();
        for value in headers.get_all(SET_COOKIE) {
            if let Ok(value) = value.to_str() {
                jar.store(value);
            }
        }
    }

    /// Attach only the jar's cookies, as a plain same-origin fetch would.
    pub fn attach_cookies(&self, headers: &mut HeaderMap) {
        let jar = self.jar.read();
        if jar.is_empty() {
            return;
        }
        if let Ok(cookie) = HeaderValue::from_str(&jar.header_value()) {
            headers.insert(COOKIE, cookie);
        }
    }

    /// Attach the jar's cookies and the CSRF header to an outgoing request.
    pub fn configure(&self, headers: &mut HeaderMap) {
        self.attach_cookies(headers);

        let jar = self.jar.read();
        if let Some(token) = jar.get(&self.cookie_name) {
            match HeaderValue::from_str(token) {
                Ok(value) => {
                    headers.insert(self.header_name.clone(), value);
                }
                Err(_) => tracing::warn!(cookie = %self.cookie_name, "CSRF token is not a valid header value"),
            }
        }
    }
}
