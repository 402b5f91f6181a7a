//! Per-user cart ledger.
//!
//! The cart lives entirely client-side: a JSON array of [`CartEntry`]
//! snapshots under a per-login storage key, mutated synchronously with
//! no server round-trips. Checkout itself happens elsewhere; this module
//! only maintains the ledger and answers questions about it.

use std::cmp::Ordering;
use std::sync::Arc;

use shopfront_core::{CartEntry, ProductId};

use crate::session::SessionManager;
use crate::storage::KeyValueStore;

/// Storage key suffix shared by all cart ledgers.
const CART_KEY_SUFFIX: &str = "-cart";

/// Login stand-in for carts built while signed out. Guests share one
/// ledger on a given store, deliberately.
const ANONYMOUS_LOGIN: &str = "anonymous";

/// Source of the login the ledger key is derived from.
///
/// The session manager is the production implementation; tests plug in a
/// fixed value.
pub trait CartIdentity: Send + Sync {
    /// Login of the current user, or `None` when signed out.
    fn cart_login(&self) -> Option<String>;
}

impl CartIdentity for SessionManager {
    fn cart_login(&self) -> Option<String> {
        self.current_login()
    }
}

// =============================================================================
// CartStore
// =============================================================================

/// The per-user cart ledger over an injected key-value store.
#[derive(Clone)]
pub struct CartStore {
    store: Arc<dyn KeyValueStore>,
    identity: Arc<dyn CartIdentity>,
}

impl CartStore {
    /// Create a cart store over the given storage and identity source.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, identity: Arc<dyn CartIdentity>) -> Self {
        Self { store, identity }
    }

    /// The storage key of the current user's ledger.
    fn cart_key(&self) -> String {
        let login = self
            .identity
            .cart_login()
            .unwrap_or_else(|| ANONYMOUS_LOGIN.to_owned());
        format!("{login}{CART_KEY_SUFFIX}")
    }

    /// Add a product to the ledger, or nudge its stored quantity.
    ///
    /// The supplied entry's quantity is a direction, not an amount: when
    /// the product is already in the ledger, the stored quantity moves by
    /// exactly one step toward the supplied value. Up if the supplied
    /// quantity is greater, down (never below 1) if smaller, not at all
    /// if equal. A product not yet in the ledger is inserted with
    /// quantity 1 regardless of what was supplied.
    ///
    /// Earlier frontends of the shop persisted ledgers built with exactly
    /// this stepping, so it is kept bit-for-bit.
    pub fn add_to_cart(&self, product: &CartEntry) {
        let mut entries = self.entries();

        match entries
            .iter_mut()
            .find(|e| e.product_id == product.product_id)
        {
            Some(existing) => match product.quantity.cmp(&existing.quantity) {
                Ordering::Greater => existing.quantity += 1,
                Ordering::Less => existing.quantity = existing.quantity.saturating_sub(1).max(1),
                Ordering::Equal => {}
            },
            None => {
                let mut entry = product.clone();
                entry.quantity = 1;
                entries.push(entry);
            }
        }

        self.write(&entries);
    }

    /// Delete the entry for `product_id`. No-op when absent.
    pub fn remove_product(&self, product_id: ProductId) {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|e| e.product_id != product_id);
        if entries.len() != before {
            self.write(&entries);
        }
    }

    /// The full ledger for the current user.
    ///
    /// Missing or malformed storage reads as an empty ledger, never an
    /// error.
    #[must_use]
    pub fn entries(&self) -> Vec<CartEntry> {
        self.store
            .get(&self.cart_key())
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    /// Sum of quantities across all entries.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.entries().iter().map(|e| e.quantity).sum()
    }

    /// Empty the ledger.
    ///
    /// Removes the key, then immediately re-writes it as an empty array:
    /// idempotent, and the key is guaranteed to exist in a parseable
    /// state afterwards rather than being absent.
    pub fn clear(&self) {
        let key = self.cart_key();
        self.store.remove(&key);
        self.store.set(&key, "[]");
    }

    fn write(&self, entries: &[CartEntry]) {
        match serde_json::to_string(entries) {
            Ok(serialized) => self.store.set(&self.cart_key(), &serialized),
            Err(e) => tracing::error!(error = %e, "failed to serialize cart ledger"),
        }
    }
}

/// Whether any entry refers to a product withdrawn from sale.
///
/// Callers use this to block checkout while an archival product is still
/// in the cart.
#[must_use]
pub fn any_archival(entries: &[CartEntry]) -> bool {
    entries.iter().any(|e| e.archival)
}
