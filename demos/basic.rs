//! Basic example using the in-memory session store

use salvo::prelude::*;
use salvo_signed_session::{
    MemoryStore, SessionConfig, SessionDepotExt, SessionHandler, StoreFailurePolicy,
};
use std::sync::Arc;
use std::time::Duration;

#[handler]
async fn index(depot: &mut Depot) -> String {
    let session = depot.session_mut().expect("Session not found");

    let views: i32 = session.get("views").unwrap_or(0);
    if let Err(e) = session.set("views", views + 1) {
        return format!("Could not update session: {}", e);
    }

    format!(
        "Hello! You have viewed this page {} time(s).\nSession ID: {}",
        views + 1,
        session.id()
    )
}

#[handler]
async fn get_user(depot: &mut Depot) -> String {
    let session = depot.session().expect("Session not found");

    match session.get::<String>("user") {
        Some(user) => format!("Logged in as: {}", user),
        None => "Not logged in".to_string(),
    }
}

#[handler]
async fn set_user(req: &mut Request, depot: &mut Depot) -> String {
    let session = depot.session_mut().expect("Session not found");

    let username = req
        .query::<String>("name")
        .unwrap_or_else(|| "anonymous".to_string());

    // New ID on privilege change
    session.regenerate();
    match session.set("user", &username) {
        Ok(()) => format!("User set to: {}", username),
        Err(e) => format!("Could not update session: {}", e),
    }
}

#[handler]
async fn logout(depot: &mut Depot) -> &'static str {
    let session = depot.session_mut().expect("Session not found");
    session.clear();
    "Logged out successfully"
}

#[handler]
async fn destroy_session(depot: &mut Depot) -> &'static str {
    let session = depot.session_mut().expect("Session not found");
    session.destroy();
    "Session destroyed"
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let store = Arc::new(MemoryStore::new());
    let _sweeper = store.spawn_sweeper(Duration::from_secs(60));

    let config = SessionConfig::new("your-super-secret-key-change-in-production")
        .with_cookie_name("demo-session-id")
        .with_max_age(3600); // 1 hour, refreshed on every request

    let session_handler = SessionHandler::with_shared_store(store.clone(), config.clone())
        .expect("Invalid session configuration");
    // /user cannot work without its session, so a store outage is a 500 there
    let strict_session_handler = SessionHandler::with_shared_store(
        store,
        config.with_failure_policy(StoreFailurePolicy::Fail),
    )
    .expect("Invalid session configuration");

    let router = Router::new()
        .push(
            Router::new()
                .hoop(session_handler)
                .get(index)
                .push(Router::with_path("login").get(set_user))
                .push(Router::with_path("logout").get(logout))
                .push(Router::with_path("destroy").get(destroy_session)),
        )
        .push(
            Router::with_path("user")
                .hoop(strict_session_handler)
                .get(get_user),
        );

    let acceptor = TcpListener::new("127.0.0.1:5800").bind().await;
    println!("Server running at http://127.0.0.1:5800");
    println!("Try these endpoints:");
    println!("  GET /           - View counter");
    println!("  GET /user       - Get current user");
    println!("  GET /login?name=alice - Set user");
    println!("  GET /logout     - Clear session");
    println!("  GET /destroy    - Destroy session");

    Server::new(acceptor).serve(router).await;
}
