//! Session middleware handler for Salvo

use async_trait::async_trait;
use salvo_core::http::header::{HeaderValue, SET_COOKIE};
use salvo_core::prelude::*;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::codec::IdentifierCodec;
use crate::config::{SessionConfig, StoreFailurePolicy};
use crate::cookie::CookieAttributes;
use crate::error::SessionError;
use crate::session::{Session, SessionData};
use crate::store::SessionStore;

pub(crate) const SESSION_KEY: &str = "salvo.signed.session";

/// Session middleware for Salvo
///
/// Mount it with [`Router::hoop`] ahead of every handler that uses the
/// session. For each request it:
///
/// 1. verifies the session cookie and loads the session from the store,
///    starting a new empty session when the cookie is missing, forged, or
///    points at a session the store no longer has;
/// 2. puts the [`Session`] in the [`Depot`] and runs the rest of the chain;
/// 3. writes the session back once if it was modified (or refreshes its TTL),
///    and sends the cookie again so its expiry slides forward.
///
/// Concurrent requests for the same session are not serialized: each works on
/// its own copy and the last one to finish wins.
pub struct SessionHandler<S: SessionStore> {
    store: Arc<S>,
    codec: IdentifierCodec,
    cookie: CookieAttributes,
    failure_policy: StoreFailurePolicy,
    store_timeout: Option<Duration>,
}

impl<S: SessionStore> SessionHandler<S> {
    /// Create a new session handler
    ///
    /// Fails with [`SessionError::Configuration`] when there is no usable
    /// secret or the cookie attributes are invalid.
    pub fn new(store: S, config: SessionConfig) -> Result<Self, SessionError> {
        Self::with_shared_store(Arc::new(store), config)
    }

    /// Create a handler over a store that is shared with other handlers,
    /// e.g. a second handler with a different failure policy.
    pub fn with_shared_store(store: Arc<S>, config: SessionConfig) -> Result<Self, SessionError> {
        let codec = IdentifierCodec::new(config.secrets)?;
        let cookie = CookieAttributes::resolve(&config.cookie)?;
        Ok(Self {
            store,
            codec,
            cookie,
            failure_policy: config.failure_policy,
            store_timeout: config.store_timeout,
        })
    }

    /// The resolved cookie attributes
    pub fn cookie(&self) -> &CookieAttributes {
        &self.cookie
    }

    /// Run a store call under the configured timeout
    async fn guarded<T, F>(&self, op: F) -> Result<T, SessionError>
    where
        F: Future<Output = Result<T, SessionError>>,
    {
        match self.store_timeout {
            Some(limit) => tokio::time::timeout(limit, op).await?,
            None => op.await,
        }
    }

    fn fresh_session(&self) -> Result<Session, SessionError> {
        Ok(Session::new(self.codec.generate()?, SessionData::new(), true))
    }

    /// Resolve the session for the value of the request's session cookie
    async fn load_session(&self, cookie_value: Option<&str>) -> Result<Session, SessionError> {
        let Some(cookie_value) = cookie_value else {
            return self.fresh_session();
        };
        // Forged, stale and expired cookies all end up here without telling
        // the client which one it was.
        let Some(sid) = self.codec.verify(cookie_value) else {
            tracing::debug!("No usable session in cookie, starting a new one");
            return self.fresh_session();
        };

        match self.guarded(self.store.read(&sid)).await {
            Ok(Some(data)) => Ok(Session::new(sid, data, false)),
            Ok(None) => {
                tracing::debug!("No usable session in cookie, starting a new one");
                self.fresh_session()
            }
            Err(e) => match self.failure_policy {
                StoreFailurePolicy::Degrade => {
                    tracing::warn!(
                        "Failed to load session, continuing with an unsaved session: {}",
                        e
                    );
                    Ok(Session::ephemeral(sid))
                }
                StoreFailurePolicy::Fail => Err(e),
            },
        }
    }

    /// Persist the session after the handler chain and set the cookie
    async fn save_session(&self, session: Session, res: &mut Response) -> Result<(), SessionError> {
        if session.is_ephemeral() {
            if session.should_destroy() {
                self.set_cookie(res, &self.cookie.render_removal())?;
                if let Err(e) = self.guarded(self.store.destroy(session.id())).await {
                    tracing::warn!("Failed to destroy session, cookie removed anyway: {}", e);
                }
            }
            // Otherwise the client keeps its cookie and retries next time.
            return Ok(());
        }

        if session.should_destroy() {
            self.set_cookie(res, &self.cookie.render_removal())?;
            if !session.is_new() {
                self.guarded(self.store.destroy(session.id())).await?;
            }
            return Ok(());
        }

        let ttl = self.cookie.ttl();
        let sid = if session.should_regenerate() {
            self.codec.generate()?
        } else {
            session.id().to_string()
        };

        if session.is_dirty() {
            self.guarded(self.store.write(&sid, session.data(), ttl)).await?;
        } else if let (false, Some(ttl)) = (session.is_new(), ttl) {
            if !self.guarded(self.store.touch(&sid, ttl)).await? {
                tracing::debug!("Session expired during the request, not refreshed");
            }
        }

        if session.should_regenerate() && !session.is_new() {
            self.guarded(self.store.destroy(session.id())).await?;
        }

        self.set_cookie(res, &self.cookie.render(&self.codec.sign(&sid)))
    }

    fn set_cookie(&self, res: &mut Response, value: &str) -> Result<(), SessionError> {
        let value = HeaderValue::from_str(value)
            .map_err(|e| SessionError::Configuration(format!("unencodable cookie: {}", e)))?;
        res.headers_mut().append(SET_COOKIE, value);
        Ok(())
    }
}

impl<S: SessionStore> Clone for SessionHandler<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            codec: self.codec.clone(),
            cookie: self.cookie.clone(),
            failure_policy: self.failure_policy,
            store_timeout: self.store_timeout,
        }
    }
}

#[async_trait]
impl<S: SessionStore> Handler for SessionHandler<S> {
    async fn handle(
        &self,
        req: &mut Request,
        depot: &mut Depot,
        res: &mut Response,
        ctrl: &mut FlowCtrl,
    ) {
        let cookie_value = req
            .cookie(self.cookie.name())
            .map(|c| c.value().to_string());
        let session = match self.load_session(cookie_value.as_deref()).await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!("Failed to load session: {}", e);
                res.render(StatusError::internal_server_error());
                ctrl.skip_rest();
                return;
            }
        };

        depot.insert(SESSION_KEY, session);

        ctrl.call_next(req, depot, res).await;

        let Ok(session) = depot.remove::<Session>(SESSION_KEY) else {
            tracing::warn!("Session was taken out of the depot, nothing to save");
            return;
        };

        if let Err(e) = self.save_session(session, res).await {
            tracing::error!("Failed to save session: {}", e);
            let fatal = matches!(e, SessionError::EntropyExhausted(_))
                || self.failure_policy == StoreFailurePolicy::Fail;
            if fatal {
                res.render(StatusError::internal_server_error());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_invalid_configuration_is_rejected() {
        let result = SessionHandler::new(MemoryStore::new(), SessionConfig::new(""));
        assert!(matches!(result, Err(SessionError::Configuration(_))));

        let result = SessionHandler::new(
            MemoryStore::new(),
            SessionConfig::new("secret").with_max_age(-5),
        );
        assert!(matches!(result, Err(SessionError::Configuration(_))));

        let result = SessionHandler::new(
            MemoryStore::new(),
            SessionConfig::with_secrets(Vec::<String>::new()),
        );
        assert!(matches!(result, Err(SessionError::Configuration(_))));
    }

    #[test]
    fn test_cookie_attributes_resolved_once() {
        let handler = SessionHandler::new(
            MemoryStore::new(),
            SessionConfig::new("secret")
                .with_cookie_name("cookie1Name")
                .with_cookie_path("/1")
                .with_max_age(2),
        )
        .unwrap();
        assert_eq!(handler.cookie().name(), "cookie1Name");
        assert_eq!(handler.cookie().path(), "/1");
        assert_eq!(handler.cookie().max_age(), Some(2));
    }

    fn exhausted() -> Result<String, SessionError> {
        Err(SessionError::EntropyExhausted(
            "entropy source unavailable".to_string(),
        ))
    }

    #[handler]
    async fn rotate(depot: &mut Depot) -> StatusCode {
        if let Ok(session) = depot.get_mut::<Session>(SESSION_KEY) {
            session.regenerate();
        }
        StatusCode::NO_CONTENT
    }

    #[tokio::test]
    async fn test_entropy_failure_on_regenerate_is_500_under_degrade() {
        use salvo::test::TestClient;

        let store = MemoryStore::new();
        let mut data = SessionData::new();
        data.set("user", "alice").unwrap();
        store.write("existing", &data, None).await.unwrap();

        let mut handler = SessionHandler::new(store.clone(), SessionConfig::new("secret")).unwrap();
        let cookie = format!("{}={}", handler.cookie().name(), handler.codec.sign("existing"));
        handler.codec = handler.codec.clone().with_generator(exhausted);

        let service = Service::new(Router::new().hoop(handler).get(rotate));
        let res = TestClient::get("http://127.0.0.1:5801/")
            .add_header("cookie", cookie, true)
            .send(&service)
            .await;

        assert_eq!(res.status_code, Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(res.headers().get_all(SET_COOKIE).iter().next().is_none());
        // the old entry is left alone
        assert!(store.read("existing").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_store_timeout_becomes_error() {
        let handler = SessionHandler::new(
            MemoryStore::new(),
            SessionConfig::new("secret").with_store_timeout(Duration::from_millis(10)),
        )
        .unwrap();

        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, SessionError>(())
        };
        assert!(matches!(
            handler.guarded(slow).await,
            Err(SessionError::Timeout)
        ));

        let fast = async { Ok::<_, SessionError>(7) };
        assert_eq!(handler.guarded(fast).await.unwrap(), 7);
    }
}
