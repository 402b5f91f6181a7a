//! CLI command implementations.

pub mod account;
pub mod cart;
pub mod orders;
pub mod products;
pub mod session;

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;

use shopfront_client::api::{ApiError, ShopApiClient};
use shopfront_client::cart::CartStore;
use shopfront_client::config::{ClientConfig, ConfigError};
use shopfront_client::session::{NoticeLevel, SessionEvent, SessionManager};
use shopfront_client::storage::{JsonFileStore, KeyValueStore};

/// Errors a CLI command can surface.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A backend call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// The command needs a session and none is stored.
    #[error("Not signed in; run `shop-cli session login` first")]
    NotSignedIn,

    /// An argument failed validation before any call was made.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Everything a command needs, built once per invocation.
///
/// The storage file plays the browser's local storage: the session and
/// cart persisted there carry over between invocations.
pub struct AppContext {
    pub api: ShopApiClient,
    pub session: SessionManager,
    pub cart: CartStore,
    /// Locale rendered before any account locale is known.
    pub default_locale: shopfront_core::Locale,
    events: UnboundedReceiver<SessionEvent>,
}

impl AppContext {
    /// Build the context from environment configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is missing or the HTTP client
    /// cannot be built.
    pub fn from_env() -> Result<Self, CliError> {
        let config = ClientConfig::from_env()?;
        let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open(&config.storage_file));
        let api = ShopApiClient::new(&config)?;
        let (session, events) = SessionManager::new(Arc::clone(&store), api.clone());
        let cart = CartStore::new(store, Arc::new(session.clone()));

        Ok(Self {
            api,
            session,
            cart,
            default_locale: config.locale,
            events,
        })
    }

    /// The stored bearer token, required for authenticated calls.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::NotSignedIn`] when no token is stored.
    pub fn bearer_token(&self) -> Result<String, CliError> {
        self.session.bearer_token().ok_or(CliError::NotSignedIn)
    }

    /// Receive the next session prompt, waiting for one to fire.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    /// Print any session prompts queued up during the command: the
    /// terminal rendition of the modal dialogs and toasts a browser
    /// front end would show.
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            render_event(&event);
        }
    }
}

/// Render one session prompt as terminal output.
#[allow(clippy::print_stdout)]
pub fn render_event(event: &SessionEvent) {
    match event {
        SessionEvent::SessionExpired => {
            println!("! Session expired - you have been signed out.");
        }
        SessionEvent::ExtendOffered => {
            println!("? Session ending soon - run `shop-cli session extend` to stay signed in.");
        }
        SessionEvent::Notice(notice) => match notice.level {
            NoticeLevel::Info => println!("- {}", notice.message_key),
            NoticeLevel::Error => println!("! {}", notice.message_key),
        },
    }
}
