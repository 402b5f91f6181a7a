//! Integration tests for the Shopfront workspace.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopfront-integration-tests
//! ```
//!
//! The scenarios here wire the session manager and cart store together
//! the way a real consumer does, but over the in-memory store and with
//! minted tokens, so no backend is required. The helpers below are what
//! every scenario shares.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{EncodingKey, Header};
use tokio::sync::mpsc::UnboundedReceiver;

use shopfront_client::api::ShopApiClient;
use shopfront_client::cart::CartStore;
use shopfront_client::config::ClientConfig;
use shopfront_client::session::{SessionEvent, SessionManager};
use shopfront_client::storage::{KeyValueStore, MemoryStore};

/// A full client wired over an in-memory store.
///
/// The API client points at a port nothing listens on: scenarios that
/// exercise network failure get a fast connection error, everything else
/// never dials out.
pub struct TestHarness {
    pub store: Arc<MemoryStore>,
    pub api: ShopApiClient,
    pub session: SessionManager,
    pub cart: CartStore,
    pub events: UnboundedReceiver<SessionEvent>,
}

/// Build a [`TestHarness`].
///
/// # Panics
///
/// Panics if the HTTP client cannot be constructed, which only happens
/// on a broken TLS setup.
#[must_use]
pub fn harness() -> TestHarness {
    let store = Arc::new(MemoryStore::new());
    let config = ClientConfig {
        api_url: url::Url::parse("http://127.0.0.1:1").expect("static url"),
        http_timeout: Duration::from_secs(2),
        storage_file: "unused.json".into(),
        locale: shopfront_core::Locale::En,
    };
    let api = ShopApiClient::new(&config).expect("http client");

    let kv: Arc<dyn KeyValueStore> = store.clone();
    let (session, events) = SessionManager::new(Arc::clone(&kv), api.clone());
    let cart = CartStore::new(kv, Arc::new(session.clone()));

    TestHarness {
        store,
        api,
        session,
        cart,
        events,
    }
}

/// Mint a bearer token the way the backend would.
///
/// `exp_offset_secs` is relative to now; negative mints an
/// already-expired token. The signing key is irrelevant: the client
/// never verifies signatures.
///
/// # Panics
///
/// Panics if JWT encoding fails, which it cannot for these inputs.
#[must_use]
pub fn mint_token(sub: &str, exp_offset_secs: i64) -> String {
    let exp = now_secs() + exp_offset_secs;
    let claims = serde_json::json!({
        "sub": sub,
        "roles": ["CLIENT"],
        "exp": exp,
        "lang": "en",
    });
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"integration-tests"),
    )
    .expect("token encoding")
}

/// Current wall-clock time as epoch seconds.
///
/// # Panics
///
/// Panics if the system clock is before the Unix epoch.
#[must_use]
pub fn now_secs() -> i64 {
    i64::try_from(
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock after epoch")
            .as_secs(),
    )
    .expect("epoch seconds fit i64")
}
