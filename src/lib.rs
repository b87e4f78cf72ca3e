//! # salvo-signed-session
//!
//! Session middleware for the Salvo web framework.
//!
//! Each client gets an unguessable session ID, carried in an HMAC-signed
//! cookie. The session's key-value data lives server-side in a pluggable
//! [`SessionStore`] and is handed to handlers through the request's `Depot`.
//!
//! ## Features
//!
//! - **Signed cookies**: `s:` prefix and HMAC-SHA256 tag; tampered cookies are
//!   silently replaced by a new session
//! - **Pluggable storage backends**: Memory, Redis, or custom stores
//! - **Write coalescing**: a request's changes are saved once, after the handler
//! - **Full session lifecycle**: create, read, update, destroy, touch, and regenerate
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use salvo::prelude::*;
//! use salvo_signed_session::{MemoryStore, SessionConfig, SessionDepotExt, SessionHandler};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = MemoryStore::new();
//!     let session_config = SessionConfig::new("your-secret-key")
//!         .with_cookie_name("my-app-session-id")
//!         .with_max_age(86400);
//!
//!     let session_handler = SessionHandler::new(store, session_config).unwrap();
//!
//!     let router = Router::new()
//!         .hoop(session_handler)
//!         .get(index);
//!
//!     let acceptor = TcpListener::new("127.0.0.1:5800").bind().await;
//!     Server::new(acceptor).serve(router).await;
//! }
//!
//! #[handler]
//! async fn index(depot: &mut Depot) -> &'static str {
//!     let session = depot.session_mut().unwrap();
//!     let views: i32 = session.get("views").unwrap_or(0);
//!     session.set("views", views + 1).unwrap();
//!     "Hello, World!"
//! }
//! ```

pub mod codec;
pub mod config;
pub mod cookie;
pub mod error;
pub mod handler;
pub mod session;
pub mod store;

pub use codec::IdentifierCodec;
pub use config::{SessionConfig, StoreFailurePolicy};
pub use cookie::{CookieAttributes, CookieOverrides, SameSite};
pub use error::SessionError;
pub use handler::SessionHandler;
pub use session::{Session, SessionData};
pub use store::{MemoryStore, SessionStore};

#[cfg(feature = "redis-store")]
pub use store::RedisStore;

/// Extension trait for Depot to easily access session
pub mod depot_ext;
pub use depot_ext::SessionDepotExt;
