//! Session lifecycle management.
//!
//! Owns the persisted token pair and derives "signed in" from the bearer
//! token's expiry claim at read time: no session object is ever stored.
//! Two scheduled prompts ride on top:
//!
//! - the **expired prompt**: a watcher that fires at expiry, clears the
//!   credentials, and tells the consumer to show a blocking dialog;
//! - the **extend prompt**: a one-shot offer to refresh the session
//!   ahead of expiry.
//!
//! Both are [`ScheduledTask`]s with a single owner, replaced on re-arm
//! and torn down on logout, so remounting a consumer never leaks timers.
//! The manager talks to its consumer exclusively through the
//! [`SessionEvent`] channel handed out at construction.

mod claims;
mod events;
mod task;

pub use claims::Claims;
pub use events::{Notice, NoticeLevel, SessionEvent};

use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::instrument;

use shopfront_core::{Locale, Role};

use crate::api::{Credentials, ShopApiClient, TokenPair};
use crate::storage::KeyValueStore;
use task::ScheduledTask;

/// Storage keys owned by the session manager.
///
/// These names are the persisted storage format shared with earlier
/// frontends of the shop; existing state must keep loading, so they are
/// not up for renaming.
pub mod keys {
    /// The bearer token (JWT).
    pub const JWT_TOKEN: &str = "jwtToken";
    /// The refresh token exchanged for a new pair.
    pub const REFRESH_TOKEN: &str = "refreshToken";
    /// Chosen display locale.
    pub const LOCALE: &str = "locale";
    /// Epoch seconds at which the current token expires.
    pub const TOKEN_TIMEOUT: &str = "tokenTimeout";
}

/// Minimum lead time before expiry at which the extend prompt fires:
/// warn at least three minutes ahead, earlier for short-lived sessions.
const EXTEND_PROMPT_LEAD_MS: i64 = 180_000;

/// Milliseconds until the token expires; negative once past expiry.
const fn expired_delay_ms(exp_secs: i64, now_ms: i64) -> i64 {
    exp_secs.saturating_mul(1000).saturating_sub(now_ms)
}

/// Milliseconds until the extend prompt should fire.
///
/// Sessions shorter than one and a half leads get the prompt at 30% of
/// the lead before expiry instead of the full lead, so the offer still
/// lands meaningfully before the session ends.
const fn extend_delay_ms(exp_secs: i64, now_ms: i64) -> i64 {
    let remaining = expired_delay_ms(exp_secs, now_ms);
    if remaining <= EXTEND_PROMPT_LEAD_MS * 3 / 2 {
        remaining - EXTEND_PROMPT_LEAD_MS * 3 / 10
    } else {
        remaining - EXTEND_PROMPT_LEAD_MS
    }
}

/// Clamp a possibly-negative delay into a sleepable duration.
fn duration_from_ms(ms: i64) -> Duration {
    Duration::from_millis(u64::try_from(ms).unwrap_or(0))
}

// =============================================================================
// SessionManager
// =============================================================================

/// The session lifecycle manager.
///
/// Cheaply cloneable via `Arc`; construct one per process and hand clones
/// to consumers. The paired receiver delivers [`SessionEvent`]s.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    store: Arc<dyn KeyValueStore>,
    api: ShopApiClient,
    events: mpsc::UnboundedSender<SessionEvent>,
    expired_watch: Mutex<Option<ScheduledTask>>,
    extend_prompt: Mutex<Option<ScheduledTask>>,
}

impl SessionManager {
    /// Create a manager over the given store and API client.
    ///
    /// Returns the manager and the event receiver the consumer must
    /// drain; events pushed with no receiver alive are dropped.
    #[must_use]
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        api: ShopApiClient,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let manager = Self {
            inner: Arc::new(SessionInner {
                store,
                api,
                events,
                expired_watch: Mutex::new(None),
                extend_prompt: Mutex::new(None),
            }),
        };
        (manager, receiver)
    }

    // =========================================================================
    // Derived State
    // =========================================================================

    /// Decode the stored bearer token's claims, if any.
    #[must_use]
    pub fn claims(&self) -> Option<Claims> {
        self.inner.claims()
    }

    /// Whether the stored token is absent, undecodable, or past expiry.
    ///
    /// Never fails: every decode problem reads as "expired".
    #[must_use]
    pub fn is_token_expired(&self) -> bool {
        self.inner.is_token_expired()
    }

    /// Whether a live session exists.
    #[must_use]
    pub fn is_user_signed_in(&self) -> bool {
        !self.is_token_expired()
    }

    /// The raw stored bearer token, for authorizing API calls.
    ///
    /// Returned as stored, without an expiry check: the backend is the
    /// authority on whether it still passes.
    #[must_use]
    pub fn bearer_token(&self) -> Option<String> {
        self.inner.store.get(keys::JWT_TOKEN)
    }

    /// Login of the account the stored token was issued to.
    ///
    /// Derived from the subject claim; present whenever the token
    /// decodes, even past expiry.
    #[must_use]
    pub fn current_login(&self) -> Option<String> {
        self.claims().map(|c| c.sub)
    }

    /// Roles carried by the stored token.
    #[must_use]
    pub fn roles(&self) -> Vec<Role> {
        self.claims().map(|c| c.roles).unwrap_or_default()
    }

    /// The persisted locale, falling back to the token's `lang` claim.
    #[must_use]
    pub fn locale(&self) -> Option<Locale> {
        self.inner
            .store
            .get(keys::LOCALE)
            .and_then(|raw| raw.parse().ok())
            .or_else(|| self.claims().and_then(|c| c.lang))
    }

    /// Milliseconds until the stored token expires; negative when past
    /// expiry, `None` when no expiry is known. Callers treat non-positive
    /// values as "immediately".
    #[must_use]
    pub fn session_expired_delay_ms(&self) -> Option<i64> {
        self.inner.session_expired_delay_ms()
    }

    /// Milliseconds until the extend prompt should fire; `None` when no
    /// expiry is known (no prompt gets scheduled then).
    #[must_use]
    pub fn extend_prompt_delay_ms(&self) -> Option<i64> {
        self.inner
            .claims()
            .map(|c| extend_delay_ms(c.exp, Utc::now().timestamp_millis()))
    }

    // =========================================================================
    // Lifecycle Operations
    // =========================================================================

    /// Authenticate and start a session.
    ///
    /// Persists the token pair (plus the locale and expiry marker derived
    /// from the claims) and arms both prompts.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the request
    /// fails; nothing is persisted in that case.
    #[instrument(skip(self, credentials), fields(login = %credentials.login()))]
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<(), crate::api::ApiError> {
        let pair = self.inner.api.authenticate(credentials).await?;
        self.inner.persist_pair(&pair);
        self.schedule_expired_prompt();
        self.schedule_extend_prompt();
        tracing::info!("signed in");
        Ok(())
    }

    /// Arm the expired-prompt watcher.
    ///
    /// The watcher sleeps until the computed expiry. If the token is
    /// still expired when it wakes it clears the credentials and emits
    /// [`SessionEvent::SessionExpired`], but only when a token was
    /// actually present, so a visitor who never signed in sees nothing.
    /// If the token turns out *not* expired (refreshed elsewhere, clock
    /// drift), the watcher re-arms itself: this is a polling fallback,
    /// not an exact one-shot.
    pub fn schedule_expired_prompt(&self) {
        let weak = Arc::downgrade(&self.inner);
        let task = ScheduledTask::spawn(expired_watch(weak));
        arm(&self.inner.expired_watch, task);
    }

    /// Arm the extend prompt.
    ///
    /// No-op when no expiry is known. On fire the prompt is only emitted
    /// if the user is still signed in at that moment.
    pub fn schedule_extend_prompt(&self) {
        let Some(delay) = self.extend_prompt_delay_ms() else {
            return;
        };

        let weak = Arc::downgrade(&self.inner);
        let task = ScheduledTask::spawn(async move {
            tokio::time::sleep(duration_from_ms(delay)).await;
            let Some(inner) = weak.upgrade() else { return };
            if !inner.is_token_expired() {
                inner.emit(SessionEvent::ExtendOffered);
            }
        });
        arm(&self.inner.extend_prompt, task);
    }

    /// Exchange the refresh token for a new pair.
    ///
    /// On success the pair is persisted and the extend prompt re-armed
    /// against the new expiry. On failure only a transient notice is
    /// emitted; the current token may well outlive the failed call, and
    /// the expired-prompt watcher stays the backstop. Either way the
    /// outcome reaches the consumer through the event channel.
    #[instrument(skip(self))]
    pub async fn extend_session(&self) {
        let token = self.inner.store.get(keys::JWT_TOKEN);
        let refresh_token = self.inner.store.get(keys::REFRESH_TOKEN);
        let (Some(token), Some(refresh_token)) = (token, refresh_token) else {
            self.inner
                .emit(SessionEvent::Notice(Notice::error(crate::api::GENERIC_MESSAGE_KEY)));
            return;
        };

        match self.inner.api.extend_session(&refresh_token, &token).await {
            Ok(pair) => {
                self.inner.persist_pair(&pair);
                self.schedule_extend_prompt();
                self.inner
                    .emit(SessionEvent::Notice(Notice::info("session.extend.success")));
                tracing::info!("session extended");
            }
            Err(err) => {
                tracing::warn!(error = %err, "session extension failed");
                self.inner
                    .emit(SessionEvent::Notice(Notice::error(err.message_key())));
            }
        }
    }

    /// End the session: clear every persisted session key and cancel any
    /// pending prompt timers.
    pub fn logout(&self) {
        self.inner.clear_session_keys();
        self.inner.cancel_timers();
        tracing::info!("signed out, session state cleared");
    }
}

// =============================================================================
// Inner Helpers
// =============================================================================

impl SessionInner {
    fn claims(&self) -> Option<Claims> {
        self.store
            .get(keys::JWT_TOKEN)
            .and_then(|token| claims::decode(&token))
    }

    fn is_token_expired(&self) -> bool {
        self.claims()
            .is_none_or(|c| Utc::now().timestamp() >= c.exp)
    }

    fn session_expired_delay_ms(&self) -> Option<i64> {
        self.claims()
            .map(|c| expired_delay_ms(c.exp, Utc::now().timestamp_millis()))
    }

    fn persist_pair(&self, pair: &TokenPair) {
        self.store.set(keys::JWT_TOKEN, &pair.token);
        self.store.set(keys::REFRESH_TOKEN, &pair.refresh_token);
        if let Some(claims) = self.claims() {
            if let Some(lang) = claims.lang {
                self.store.set(keys::LOCALE, lang.as_str());
            }
            self.store.set(keys::TOKEN_TIMEOUT, &claims.exp.to_string());
        }
    }

    fn clear_session_keys(&self) {
        self.store.remove(keys::JWT_TOKEN);
        self.store.remove(keys::REFRESH_TOKEN);
        self.store.remove(keys::LOCALE);
        self.store.remove(keys::TOKEN_TIMEOUT);
    }

    fn cancel_timers(&self) {
        if let Some(task) = take(&self.expired_watch) {
            task.cancel();
        }
        if let Some(task) = take(&self.extend_prompt) {
            task.cancel();
        }
    }

    fn emit(&self, event: SessionEvent) {
        // A consumer that went away just stops listening; nothing to do.
        let _ = self.events.send(event);
    }
}

/// Replace the task in a prompt slot; dropping the old one aborts it.
fn arm(slot: &Mutex<Option<ScheduledTask>>, task: ScheduledTask) {
    *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
}

fn take(slot: &Mutex<Option<ScheduledTask>>) -> Option<ScheduledTask> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).take()
}

/// Body of the expired-prompt watcher.
///
/// Holds only a weak reference so an abandoned manager tears down
/// instead of being kept alive by its own timer.
async fn expired_watch(weak: Weak<SessionInner>) {
    loop {
        let delay = {
            let Some(inner) = weak.upgrade() else { return };
            inner.session_expired_delay_ms().unwrap_or(0)
        };
        tokio::time::sleep(duration_from_ms(delay)).await;

        let Some(inner) = weak.upgrade() else { return };
        if !inner.is_token_expired() {
            // Refreshed behind our back or the clock drifted; poll again.
            continue;
        }
        if inner.store.get(keys::JWT_TOKEN).is_some() {
            inner.clear_session_keys();
            inner.emit(SessionEvent::SessionExpired);
            tracing::info!("session expired, credentials cleared");
        }
        return;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::claims::tests::mint_token;
    use super::*;
    use crate::config::ClientConfig;
    use crate::storage::MemoryStore;

    fn test_manager() -> (
        SessionManager,
        mpsc::UnboundedReceiver<SessionEvent>,
        Arc<MemoryStore>,
    ) {
        let store = Arc::new(MemoryStore::new());
        let config = ClientConfig {
            // Port 1 is never listening; only the failure path dials it.
            api_url: url::Url::parse("http://127.0.0.1:1").unwrap(),
            http_timeout: Duration::from_secs(2),
            storage_file: "unused.json".into(),
            locale: Locale::En,
        };
        let api = ShopApiClient::new(&config).unwrap();
        let (manager, receiver) = SessionManager::new(store.clone(), api);
        (manager, receiver, store)
    }

    fn future_exp(secs_from_now: i64) -> i64 {
        Utc::now().timestamp() + secs_from_now
    }

    // =========================================================================
    // Delay Math
    // =========================================================================

    #[test]
    fn expired_delay_is_signed() {
        assert_eq!(expired_delay_ms(1_000, 900_000), 100_000);
        assert_eq!(expired_delay_ms(1_000, 1_000_000), 0);
        assert_eq!(expired_delay_ms(1_000, 1_300_000), -300_000);
    }

    #[test]
    fn extend_delay_short_session_scales_the_warning_earlier() {
        // 200s remaining is within 1.5 leads (270s), so the prompt fires
        // 54s (0.3 of the lead) before expiry: 200_000 - 54_000.
        assert_eq!(extend_delay_ms(200, 0), 146_000);
    }

    #[test]
    fn extend_delay_long_session_uses_the_full_lead() {
        // 1000s remaining is beyond 1.5 leads, full 180s lead applies.
        assert_eq!(extend_delay_ms(1_000, 0), 820_000);
    }

    #[test]
    fn extend_delay_boundary_sits_at_one_and_a_half_leads() {
        // Exactly 270s remaining still counts as a short session.
        assert_eq!(extend_delay_ms(270, 0), 270_000 - 54_000);
        // Just past it, the full lead applies.
        assert_eq!(extend_delay_ms(271, 0), 271_000 - 180_000);
    }

    // =========================================================================
    // Derived State
    // =========================================================================

    #[test]
    fn missing_and_malformed_tokens_read_as_expired() {
        let (manager, _rx, store) = test_manager();
        assert!(manager.is_token_expired());
        assert!(!manager.is_user_signed_in());

        store.set(keys::JWT_TOKEN, "not-a-jwt");
        assert!(manager.is_token_expired());
        assert_eq!(manager.current_login(), None);
    }

    #[test]
    fn past_expiry_reads_as_expired_but_claims_remain_readable() {
        let (manager, _rx, store) = test_manager();
        store.set(keys::JWT_TOKEN, &mint_token("client1", future_exp(-60)));

        assert!(manager.is_token_expired());
        // The subject is still derivable, e.g. for the cart ledger key.
        assert_eq!(manager.current_login(), Some("client1".to_owned()));
    }

    #[test]
    fn live_token_reads_as_signed_in() {
        let (manager, _rx, store) = test_manager();
        store.set(keys::JWT_TOKEN, &mint_token("client1", future_exp(600)));

        assert!(manager.is_user_signed_in());
        assert_eq!(manager.roles(), vec![Role::Client]);
        assert_eq!(manager.locale(), Some(Locale::En));

        let delay = manager.session_expired_delay_ms().unwrap();
        assert!(delay > 595_000 && delay <= 600_000);
    }

    #[test]
    fn delays_are_none_without_a_decodable_token() {
        let (manager, _rx, _store) = test_manager();
        assert_eq!(manager.session_expired_delay_ms(), None);
        assert_eq!(manager.extend_prompt_delay_ms(), None);
    }

    // =========================================================================
    // Expired Prompt
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn expired_prompt_clears_credentials_and_notifies() {
        let (manager, mut rx, store) = test_manager();
        store.set(keys::JWT_TOKEN, &mint_token("client1", future_exp(-5)));
        store.set(keys::REFRESH_TOKEN, "refresh");
        store.set(keys::LOCALE, "en");
        store.set(keys::TOKEN_TIMEOUT, "0");

        manager.schedule_expired_prompt();

        let event = rx.recv().await;
        assert_eq!(event, Some(SessionEvent::SessionExpired));
        assert_eq!(store.get(keys::JWT_TOKEN), None);
        assert_eq!(store.get(keys::REFRESH_TOKEN), None);
        assert_eq!(store.get(keys::LOCALE), None);
        assert_eq!(store.get(keys::TOKEN_TIMEOUT), None);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_prompt_stays_silent_for_a_visitor_without_a_token() {
        let (manager, mut rx, _store) = test_manager();

        manager.schedule_expired_prompt();

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn expired_prompt_rearms_when_the_token_was_refreshed() {
        let (manager, mut rx, store) = test_manager();
        store.set(keys::JWT_TOKEN, &mint_token("client1", future_exp(3_600)));

        manager.schedule_expired_prompt();

        // The watcher wakes, finds the token still valid, and re-arms
        // instead of firing.
        tokio::time::sleep(Duration::from_secs(7_200)).await;
        assert!(rx.try_recv().is_err());

        // Once the stored token is actually past expiry, the next poll
        // fires the prompt.
        store.set(keys::JWT_TOKEN, &mint_token("client1", future_exp(-5)));
        let event = tokio::time::timeout(Duration::from_secs(7_200), rx.recv())
            .await
            .expect("watcher should fire");
        assert_eq!(event, Some(SessionEvent::SessionExpired));
    }

    // =========================================================================
    // Extend Prompt
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn extend_prompt_fires_while_signed_in() {
        let (manager, mut rx, store) = test_manager();
        store.set(keys::JWT_TOKEN, &mint_token("client1", future_exp(200)));

        manager.schedule_extend_prompt();

        let event = tokio::time::timeout(Duration::from_secs(160), rx.recv())
            .await
            .expect("prompt should fire within the computed delay");
        assert_eq!(event, Some(SessionEvent::ExtendOffered));
    }

    #[tokio::test(start_paused = true)]
    async fn extend_prompt_is_suppressed_once_signed_out() {
        let (manager, mut rx, store) = test_manager();
        store.set(keys::JWT_TOKEN, &mint_token("client1", future_exp(200)));

        manager.schedule_extend_prompt();
        store.remove(keys::JWT_TOKEN);

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn extend_prompt_without_expiry_schedules_nothing() {
        let (manager, mut rx, _store) = test_manager();

        manager.schedule_extend_prompt();

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert!(rx.try_recv().is_err());
    }

    // =========================================================================
    // Extend Session / Logout
    // =========================================================================

    #[tokio::test]
    async fn failed_extension_keeps_the_session_and_emits_a_toast() {
        let (manager, mut rx, store) = test_manager();
        let token = mint_token("client1", future_exp(600));
        store.set(keys::JWT_TOKEN, &token);
        store.set(keys::REFRESH_TOKEN, "refresh");

        // The API client points at a closed port, so the call fails.
        manager.extend_session().await;

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("notice should be emitted")
            .expect("channel open");
        match event {
            SessionEvent::Notice(notice) => {
                assert_eq!(notice.level, NoticeLevel::Error);
                assert_eq!(notice.message_key, crate::api::GENERIC_MESSAGE_KEY);
            }
            other => panic!("expected a notice, got {other:?}"),
        }

        // No forced logout: the old token is still in place.
        assert_eq!(store.get(keys::JWT_TOKEN), Some(token));
        assert!(manager.is_user_signed_in());
    }

    #[tokio::test]
    async fn extension_without_stored_tokens_emits_a_toast() {
        let (manager, mut rx, _store) = test_manager();

        manager.extend_session().await;

        let event = rx.recv().await.expect("channel open");
        assert!(matches!(event, SessionEvent::Notice(n) if n.level == NoticeLevel::Error));
    }

    #[tokio::test(start_paused = true)]
    async fn logout_clears_keys_and_cancels_timers() {
        let (manager, mut rx, store) = test_manager();
        store.set(keys::JWT_TOKEN, &mint_token("client1", future_exp(-5)));
        store.set(keys::REFRESH_TOKEN, "refresh");

        manager.schedule_expired_prompt();
        manager.schedule_extend_prompt();
        manager.logout();

        assert_eq!(store.get(keys::JWT_TOKEN), None);
        assert_eq!(store.get(keys::REFRESH_TOKEN), None);

        // With both timers cancelled nothing fires, even though the
        // token was already past expiry when they were armed.
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert!(rx.try_recv().is_err());
    }
}
