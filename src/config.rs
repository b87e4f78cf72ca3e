//! Session configuration

use std::time::Duration;

use crate::cookie::{CookieOverrides, SameSite};

/// What to do when the session store fails while serving a request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StoreFailurePolicy {
    /// Log the failure and continue with an empty session that is never saved.
    #[default]
    Degrade,
    /// Answer the request with 500 Internal Server Error.
    ///
    /// Use this on routes that cannot work without their session.
    Fail,
}

/// Configuration for the session middleware
///
/// Nothing is validated here; [`SessionHandler::new`](crate::SessionHandler::new)
/// checks the secrets and cookie attributes once at construction.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Secret key(s) for signing cookies.
    /// The first secret is used for signing new cookies.
    /// All secrets are tried when verifying signatures (for secret rotation).
    pub secrets: Vec<String>,

    /// Cookie settings; unset fields use the defaults
    /// (name "salvo-session-id", path "/", HttpOnly, browser-session lifetime).
    pub cookie: CookieOverrides,

    /// Behaviour when a store call fails (default: Degrade)
    pub failure_policy: StoreFailurePolicy,

    /// Upper bound on each store call (default: None = wait for the store)
    pub store_timeout: Option<Duration>,
}

impl SessionConfig {
    /// Create a new session configuration with the given secret
    pub fn new<S: Into<String>>(secret: S) -> Self {
        Self::with_secrets([secret])
    }

    /// Create a new session configuration with multiple secrets for rotation
    pub fn with_secrets<I, S>(secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            secrets: secrets.into_iter().map(|s| s.into()).collect(),
            cookie: CookieOverrides::default(),
            failure_policy: StoreFailurePolicy::default(),
            store_timeout: None,
        }
    }

    /// Set the cookie name (default: "salvo-session-id")
    pub fn with_cookie_name<S: Into<String>>(mut self, name: S) -> Self {
        self.cookie.name = Some(name.into());
        self
    }

    /// Set the cookie path (default: "/")
    pub fn with_cookie_path<S: Into<String>>(mut self, path: S) -> Self {
        self.cookie.path = Some(path.into());
        self
    }

    /// Set the cookie domain
    pub fn with_cookie_domain<S: Into<String>>(mut self, domain: S) -> Self {
        self.cookie.domain = Some(domain.into());
        self
    }

    /// Set the HttpOnly flag (default: true)
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.cookie.http_only = Some(http_only);
        self
    }

    /// Set the Secure flag (default: false)
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.cookie.secure = Some(secure);
        self
    }

    /// Set the SameSite attribute (default: not sent)
    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.cookie.same_site = Some(same_site);
        self
    }

    /// Set max age in seconds
    /// Without a max age the cookie expires when the browser closes.
    /// This is used for both cookie expiry and session TTL in store
    pub fn with_max_age(mut self, secs: i64) -> Self {
        self.cookie.max_age = Some(secs);
        self
    }

    /// Set max age from Duration
    pub fn with_max_age_duration(mut self, duration: Duration) -> Self {
        self.cookie.max_age = Some(i64::try_from(duration.as_secs()).unwrap_or(i64::MAX));
        self
    }

    /// Set the store failure policy (default: Degrade)
    pub fn with_failure_policy(mut self, policy: StoreFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Bound every store call; a call that takes longer counts as a store failure
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = Some(timeout);
        self
    }
}
