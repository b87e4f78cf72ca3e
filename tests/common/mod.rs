#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use salvo::http::header::SET_COOKIE;
use salvo::prelude::*;
use salvo::test::TestClient;
use std::time::Duration;

use salvo_signed_session::{
    MemoryStore, SessionData, SessionDepotExt, SessionError, SessionStore,
};

pub const SESSION_TEST_KEY: &str = "sessionKey";
pub const SESSION_TEST_VALUE: &str = "sessionValue";
pub const COOKIE1_NAME: &str = "cookie1Name";
pub const COOKIE_DEFAULT_NAME: &str = "salvo-session-id";
pub const SECRET: &str = "Very very secret.....";

pub const BASE: &str = "http://127.0.0.1:5801";

#[handler]
pub async fn set_value(depot: &mut Depot, res: &mut Response) {
    let session = depot.session_mut().expect("session handler runs first");
    session
        .set(SESSION_TEST_KEY, SESSION_TEST_VALUE)
        .expect("string serializes");
    res.status_code(StatusCode::NO_CONTENT);
}

#[handler]
pub async fn get_value(depot: &mut Depot, res: &mut Response) {
    let value = depot
        .session()
        .and_then(|session| session.get::<String>(SESSION_TEST_KEY));
    match value {
        Some(value) => {
            res.status_code(StatusCode::OK);
            res.render(Text::Plain(value));
        }
        None => {
            res.status_code(StatusCode::NO_CONTENT);
        }
    }
}

#[handler]
pub async fn destroy(depot: &mut Depot, res: &mut Response) {
    depot.session_mut().expect("session handler runs first").destroy();
    res.status_code(StatusCode::NO_CONTENT);
}

#[handler]
pub async fn regenerate(depot: &mut Depot, res: &mut Response) {
    depot
        .session_mut()
        .expect("session handler runs first")
        .regenerate();
    res.status_code(StatusCode::NO_CONTENT);
}

/// All `Set-Cookie` headers of a response
pub fn set_cookies(res: &Response) -> Vec<String> {
    res.headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().expect("set-cookie is ascii").to_string())
        .collect()
}

/// The `Set-Cookie` header for `name`, if any
pub fn set_cookie_named(res: &Response, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    set_cookies(res).into_iter().find(|c| c.starts_with(&prefix))
}

/// The value part of a `Set-Cookie` header
pub fn cookie_value(set_cookie: &str) -> String {
    let pair = set_cookie.split(';').next().expect("name=value comes first");
    let (_, value) = pair.split_once('=').expect("cookie has a value");
    value.to_string()
}

/// Value of an attribute such as `Path`, `Max-Age` or `Expires`
pub fn attribute(set_cookie: &str, name: &str) -> Option<String> {
    set_cookie.split(';').skip(1).map(str::trim).find_map(|attr| {
        match attr.split_once('=') {
            Some((key, value)) if key.eq_ignore_ascii_case(name) => Some(value.to_string()),
            None if attr.eq_ignore_ascii_case(name) => Some(String::new()),
            _ => None,
        }
    })
}

pub fn expires(set_cookie: &str) -> Option<DateTime<Utc>> {
    attribute(set_cookie, "Expires").map(|value| {
        DateTime::parse_from_rfc2822(&value)
            .expect("Expires is an HTTP date")
            .with_timezone(&Utc)
    })
}

/// Send a request, optionally presenting a raw `Cookie` header
pub async fn send(service: &Service, method: &str, path: &str, cookie: Option<&str>) -> Response {
    let url = format!("{}{}", BASE, path);
    let builder = match method {
        "post" => TestClient::post(url),
        _ => TestClient::get(url),
    };
    let builder = match cookie {
        Some(cookie) => builder.add_header("cookie", cookie.to_string(), true),
        None => builder,
    };
    builder.send(service).await
}

/// A store whose backend is always unreachable
pub struct BrokenStore;

#[async_trait]
impl SessionStore for BrokenStore {
    async fn read(&self, _sid: &str) -> Result<Option<SessionData>, SessionError> {
        Err(SessionError::Store("backend down".to_string()))
    }

    async fn write(
        &self,
        _sid: &str,
        _session: &SessionData,
        _ttl: Option<Duration>,
    ) -> Result<(), SessionError> {
        Err(SessionError::Store("backend down".to_string()))
    }

    async fn touch(&self, _sid: &str, _ttl: Duration) -> Result<bool, SessionError> {
        Err(SessionError::Store("backend down".to_string()))
    }

    async fn destroy(&self, _sid: &str) -> Result<(), SessionError> {
        Err(SessionError::Store("backend down".to_string()))
    }
}

/// A store that never answers
pub struct HangingStore;

#[async_trait]
impl SessionStore for HangingStore {
    async fn read(&self, _sid: &str) -> Result<Option<SessionData>, SessionError> {
        std::future::pending().await
    }

    async fn write(
        &self,
        _sid: &str,
        _session: &SessionData,
        _ttl: Option<Duration>,
    ) -> Result<(), SessionError> {
        std::future::pending().await
    }

    async fn touch(&self, _sid: &str, _ttl: Duration) -> Result<bool, SessionError> {
        std::future::pending().await
    }

    async fn destroy(&self, _sid: &str) -> Result<(), SessionError> {
        std::future::pending().await
    }
}

/// A store whose reads fail while everything else goes to a memory store
pub struct UnreadableStore(pub MemoryStore);

#[async_trait]
impl SessionStore for UnreadableStore {
    async fn read(&self, _sid: &str) -> Result<Option<SessionData>, SessionError> {
        Err(SessionError::Store("replica unreachable".to_string()))
    }

    async fn write(
        &self,
        sid: &str,
        session: &SessionData,
        ttl: Option<Duration>,
    ) -> Result<(), SessionError> {
        self.0.write(sid, session, ttl).await
    }

    async fn touch(&self, sid: &str, ttl: Duration) -> Result<bool, SessionError> {
        self.0.touch(sid, ttl).await
    }

    async fn destroy(&self, sid: &str) -> Result<(), SessionError> {
        self.0.destroy(sid).await
    }
}
