//! Session cookie attributes and `Set-Cookie` rendering

use chrono::{DateTime, Duration, Utc};

use crate::error::SessionError;

/// Default session cookie name
pub const DEFAULT_COOKIE_NAME: &str = "salvo-session-id";

/// Default session cookie path
pub const DEFAULT_COOKIE_PATH: &str = "/";

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";
const EPOCH_HTTP_DATE: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// SameSite cookie attribute
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SameSite {
    /// Strict - cookie only sent for same-site requests
    Strict,
    /// Lax - cookie sent for same-site requests and top-level navigations
    Lax,
    /// None - cookie sent for all requests (requires Secure)
    None,
}

impl SameSite {
    fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Caller-supplied cookie settings. Unset fields fall back to the defaults.
#[derive(Clone, Debug, Default)]
pub struct CookieOverrides {
    pub name: Option<String>,
    pub path: Option<String>,
    pub domain: Option<String>,
    /// Seconds. Negative values are rejected when resolving.
    pub max_age: Option<i64>,
    pub secure: Option<bool>,
    pub http_only: Option<bool>,
    pub same_site: Option<SameSite>,
}

/// Resolved, validated description of how the session cookie is emitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CookieAttributes {
    name: String,
    path: String,
    domain: Option<String>,
    max_age: Option<u64>,
    secure: bool,
    http_only: bool,
    same_site: Option<SameSite>,
}

impl Default for CookieAttributes {
    fn default() -> Self {
        Self {
            name: DEFAULT_COOKIE_NAME.to_string(),
            path: DEFAULT_COOKIE_PATH.to_string(),
            domain: None,
            max_age: None,
            secure: false,
            http_only: true,
            same_site: None,
        }
    }
}

impl CookieAttributes {
    /// Merge overrides onto the defaults and validate the result.
    pub fn resolve(overrides: &CookieOverrides) -> Result<Self, SessionError> {
        let defaults = Self::default();

        let name = overrides.name.clone().unwrap_or(defaults.name);
        if name.is_empty() || !name.bytes().all(is_token_byte) {
            return Err(SessionError::Configuration(format!(
                "invalid cookie name {:?}",
                name
            )));
        }

        let path = overrides.path.clone().unwrap_or(defaults.path);
        check_attribute_value("path", &path)?;
        if let Some(domain) = &overrides.domain {
            check_attribute_value("domain", domain)?;
        }

        let max_age = match overrides.max_age {
            Some(secs) if secs < 0 => {
                return Err(SessionError::Configuration(format!(
                    "cookie max-age must not be negative, got {}",
                    secs
                )))
            }
            Some(secs) => Some(secs as u64),
            None => None,
        };

        Ok(Self {
            name,
            path,
            domain: overrides.domain.clone(),
            max_age,
            secure: overrides.secure.unwrap_or(defaults.secure),
            http_only: overrides.http_only.unwrap_or(defaults.http_only),
            same_site: overrides.same_site.or(defaults.same_site),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Max age in seconds. `None` means a browser-session cookie.
    pub fn max_age(&self) -> Option<u64> {
        self.max_age
    }

    /// Max age as a store TTL
    pub fn ttl(&self) -> Option<std::time::Duration> {
        self.max_age.map(std::time::Duration::from_secs)
    }

    pub fn secure(&self) -> bool {
        self.secure
    }

    pub fn http_only(&self) -> bool {
        self.http_only
    }

    pub fn same_site(&self) -> Option<SameSite> {
        self.same_site
    }

    /// Render a `Set-Cookie` header value carrying `value`, expiring relative to now.
    pub fn render(&self, value: &str) -> String {
        self.render_at(value, Utc::now())
    }

    /// Render a `Set-Cookie` header value as if issued at `now`.
    ///
    /// Attribute order: Path, Domain, Max-Age, Expires, Secure, HttpOnly, SameSite.
    pub fn render_at(&self, value: &str, now: DateTime<Utc>) -> String {
        let expiry = self.max_age.map(|secs| {
            let expires = i64::try_from(secs)
                .ok()
                .and_then(Duration::try_seconds)
                .and_then(|d| now.checked_add_signed(d))
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            (secs.to_string(), expires.format(HTTP_DATE_FORMAT).to_string())
        });
        self.render_with(value, expiry)
    }

    /// Render a `Set-Cookie` header value that makes the client drop the cookie.
    pub fn render_removal(&self) -> String {
        self.render_with("", Some(("0".to_string(), EPOCH_HTTP_DATE.to_string())))
    }

    fn render_with(&self, value: &str, expiry: Option<(String, String)>) -> String {
        let mut out = format!("{}={}; Path={}", self.name, value, self.path);
        if let Some(domain) = &self.domain {
            out.push_str("; Domain=");
            out.push_str(domain);
        }
        if let Some((max_age, expires)) = expiry {
            out.push_str("; Max-Age=");
            out.push_str(&max_age);
            out.push_str("; Expires=");
            out.push_str(&expires);
        }
        if self.secure {
            out.push_str("; Secure");
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if let Some(same_site) = self.same_site {
            out.push_str("; SameSite=");
            out.push_str(same_site.as_str());
        }
        out
    }
}

// RFC 6265 cookie-name is an RFC 2616 token
fn is_token_byte(b: u8) -> bool {
    b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b)
}

fn check_attribute_value(attribute: &str, value: &str) -> Result<(), SessionError> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_graphic() && b != b';') {
        return Err(SessionError::Configuration(format!(
            "invalid cookie {} {:?}",
            attribute, value
        )));
    }
    Ok(())
}
