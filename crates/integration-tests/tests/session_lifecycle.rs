//! Session lifecycle scenarios: the manager, its prompts, and the cart
//! store reacting to the same storage.

use std::time::Duration;

use rust_decimal::Decimal;

use shopfront_client::session::{SessionEvent, keys};
use shopfront_client::storage::KeyValueStore;
use shopfront_core::{CartEntry, ProductId, Role};
use shopfront_integration_tests::{harness, mint_token};

fn sample_entry(id: i64) -> CartEntry {
    CartEntry {
        product_id: ProductId::new(id),
        name: format!("Product {id}"),
        price: Decimal::new(1999, 2),
        quantity: 1,
        image_url: None,
        archival: false,
    }
}

// =============================================================================
// Derived Session State
// =============================================================================

#[test]
fn expiry_is_recomputed_from_the_stored_token() {
    let h = harness();

    // No token at all reads as expired.
    assert!(h.session.is_token_expired());

    // A malformed token reads as expired, never as an error.
    h.store.set(keys::JWT_TOKEN, "definitely-not-a-jwt");
    assert!(h.session.is_token_expired());

    // Past expiry reads as expired.
    h.store.set(keys::JWT_TOKEN, &mint_token("client1", -30));
    assert!(h.session.is_token_expired());

    // A live token reads as signed in, with claims exposed.
    h.store.set(keys::JWT_TOKEN, &mint_token("client1", 600));
    assert!(h.session.is_user_signed_in());
    assert_eq!(h.session.current_login(), Some("client1".to_owned()));
    assert_eq!(h.session.roles(), vec![Role::Client]);
}

#[test]
fn prompt_delays_match_the_lead_time_rules() {
    let h = harness();

    // 200s of session left sits under one and a half leads (270s), so
    // the prompt is scheduled 54s before expiry: about 146s out.
    h.store.set(keys::JWT_TOKEN, &mint_token("client1", 200));
    let delay = h.session.extend_prompt_delay_ms().expect("expiry known");
    assert!((145_000..=146_000).contains(&delay), "delay was {delay}");

    // 1000s of session left gets the full 180s lead: about 820s out.
    h.store.set(keys::JWT_TOKEN, &mint_token("client1", 1_000));
    let delay = h.session.extend_prompt_delay_ms().expect("expiry known");
    assert!((819_000..=820_000).contains(&delay), "delay was {delay}");

    // Without a token there is nothing to schedule.
    h.store.remove(keys::JWT_TOKEN);
    assert_eq!(h.session.extend_prompt_delay_ms(), None);
}

// =============================================================================
// Prompt Scenarios
// =============================================================================

#[tokio::test(start_paused = true)]
async fn expired_session_is_torn_down_but_the_cart_survives() {
    let mut h = harness();

    // A signed-in user builds a cart...
    h.store.set(keys::JWT_TOKEN, &mint_token("client1", 600));
    h.store.set(keys::REFRESH_TOKEN, "refresh");
    h.cart.add_to_cart(&sample_entry(1));
    assert_eq!(h.cart.total_quantity(), 1);

    // ...then the token goes stale and the watcher fires.
    h.store.set(keys::JWT_TOKEN, &mint_token("client1", -5));
    h.session.schedule_expired_prompt();

    let event = h.events.recv().await;
    assert_eq!(event, Some(SessionEvent::SessionExpired));

    // Session keys are gone.
    assert_eq!(h.store.get(keys::JWT_TOKEN), None);
    assert_eq!(h.store.get(keys::REFRESH_TOKEN), None);

    // The ledger never expires on its own: it stays in storage under the
    // old login, while reads now resolve to the anonymous ledger.
    assert!(h.store.get("client1-cart").is_some());
    assert_eq!(h.cart.total_quantity(), 0);
}

#[tokio::test(start_paused = true)]
async fn extend_prompt_fires_ahead_of_expiry_for_a_signed_in_user() {
    let mut h = harness();
    h.store.set(keys::JWT_TOKEN, &mint_token("client1", 200));

    h.session.schedule_extend_prompt();

    let event = tokio::time::timeout(Duration::from_secs(160), h.events.recv())
        .await
        .expect("prompt fires within the computed delay");
    assert_eq!(event, Some(SessionEvent::ExtendOffered));
}

#[tokio::test(start_paused = true)]
async fn logout_cancels_pending_prompts() {
    let mut h = harness();
    h.store.set(keys::JWT_TOKEN, &mint_token("client1", -5));
    h.store.set(keys::REFRESH_TOKEN, "refresh");

    h.session.schedule_expired_prompt();
    h.session.schedule_extend_prompt();
    h.session.logout();

    assert_eq!(h.store.get(keys::JWT_TOKEN), None);

    tokio::time::sleep(Duration::from_secs(3_600)).await;
    assert!(h.events.try_recv().is_err(), "no prompt should survive logout");
}

#[tokio::test]
async fn failed_extension_reports_a_toast_and_keeps_the_session() {
    let mut h = harness();
    let token = mint_token("client1", 600);
    h.store.set(keys::JWT_TOKEN, &token);
    h.store.set(keys::REFRESH_TOKEN, "refresh");

    // The harness API client points at a closed port; the refresh call
    // fails with a transport error.
    h.session.extend_session().await;

    let event = tokio::time::timeout(Duration::from_secs(5), h.events.recv())
        .await
        .expect("a notice is emitted")
        .expect("channel open");
    assert!(
        matches!(event, SessionEvent::Notice(_)),
        "expected a toast, got {event:?}"
    );

    // No forced logout; the expired watcher stays the backstop.
    assert_eq!(h.store.get(keys::JWT_TOKEN), Some(token));
    assert!(h.session.is_user_signed_in());
}
