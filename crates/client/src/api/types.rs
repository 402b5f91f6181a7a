//! Wire types for the external shop REST API.
//!
//! All JSON bodies use camelCase keys. Money amounts travel as decimal
//! strings. Inputs that carry a password hold it as a
//! [`SecretString`] and are serialized by hand at the call site so the
//! secret never picks up a `Serialize` impl.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use shopfront_core::{
    AccountId, AccountState, CartEntry, Email, Locale, OrderId, OrderStatus, OrderedProductId,
    ProductId, Rating, Role,
};

// ─────────────────────────────────────────────────────────────────────────────
// Auth Types
// ─────────────────────────────────────────────────────────────────────────────

/// Bearer credentials issued by the backend.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// JWT used as the bearer token.
    pub token: String,
    /// Opaque token exchanged for a fresh pair.
    pub refresh_token: String,
}

/// Login credentials supplied by the user.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct Credentials {
    login: String,
    password: SecretString,
}

impl Credentials {
    /// Bundle a login and password.
    #[must_use]
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// The account login.
    #[must_use]
    pub fn login(&self) -> &str {
        &self.login
    }

    /// The password, still wrapped.
    #[must_use]
    pub const fn password(&self) -> &SecretString {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Account Types
// ─────────────────────────────────────────────────────────────────────────────

/// The signed-in user's account as returned by `GET /account/self`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Account database ID.
    pub id: AccountId,
    /// Unique login.
    pub login: String,
    /// Contact address.
    pub email: Email,
    /// First name, if the account filled it in.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Last name, if the account filled it in.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Preferred display locale.
    #[serde(default)]
    pub locale: Locale,
    /// Lifecycle state.
    #[serde(default)]
    pub state: AccountState,
    /// Granted roles.
    #[serde(default)]
    pub roles: Vec<Role>,
}

/// Body for `PUT /account/self/edit`.
#[derive(Debug, Default, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditAccountInput {
    /// New first name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// New last name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// Input for `PUT /account/self/change-password`.
///
/// Serialized by hand at the call site; see the module docs.
#[derive(Debug)]
pub struct ChangePasswordInput {
    /// The password being replaced, re-checked server-side.
    pub current_password: SecretString,
    /// The replacement password.
    pub new_password: SecretString,
}

/// Input for `POST /accounts/self/register`.
///
/// Serialized by hand at the call site; see the module docs.
#[derive(Debug)]
pub struct RegisterInput {
    /// Desired login.
    pub login: String,
    /// Contact address the confirmation token is mailed to.
    pub email: Email,
    /// Initial password.
    pub password: SecretString,
    /// Display locale for the confirmation mail and the new account.
    pub locale: Locale,
}

// ─────────────────────────────────────────────────────────────────────────────
// Product Types
// ─────────────────────────────────────────────────────────────────────────────

/// A product listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product database ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Long-form description, when the listing has one.
    #[serde(default)]
    pub description: Option<String>,
    /// Current unit price.
    pub price: Decimal,
    /// Units in stock, when the backend exposes it.
    #[serde(default)]
    pub quantity: Option<u32>,
    /// Primary image.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Withdrawn from sale. Archival products render but cannot be
    /// checked out.
    #[serde(default)]
    pub archival: bool,
}

impl Product {
    /// Snapshot this listing into a cart entry with the given quantity.
    #[must_use]
    pub fn to_cart_entry(&self, quantity: u32) -> CartEntry {
        CartEntry {
            product_id: self.id,
            name: self.name.clone(),
            price: self.price,
            quantity,
            image_url: self.image_url.clone(),
            archival: self.archival,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Order Types
// ─────────────────────────────────────────────────────────────────────────────

/// An order with its line items.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Order database ID.
    pub id: OrderId,
    /// Lifecycle status.
    #[serde(default)]
    pub status: OrderStatus,
    /// Total across all ordered products.
    pub total_price: Decimal,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
    /// The products the order was placed for.
    #[serde(default)]
    pub ordered_products: Vec<OrderedProduct>,
}

/// A product within an order, as it was bought.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderedProduct {
    /// ID of this order line (the rating endpoints key on it).
    pub id: OrderedProductId,
    /// The product that was bought.
    pub product_id: ProductId,
    /// Name at purchase time.
    pub name: String,
    /// Unit price at purchase time.
    pub price: Decimal,
    /// Units bought.
    pub quantity: u32,
    /// The buyer's rating, once left.
    #[serde(default)]
    pub rating: Option<Rating>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Error Body
// ─────────────────────────────────────────────────────────────────────────────

/// Error body shape: the backend sends a localization key in `message`.
#[derive(Debug, Deserialize)]
pub(super) struct ApiMessage {
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_debug_redacts_password() {
        let credentials = Credentials::new("client1", "hunter2-very-secret");
        let debug_output = format!("{credentials:?}");

        assert!(debug_output.contains("client1"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("hunter2-very-secret"));
    }

    #[test]
    fn token_pair_uses_camel_case() {
        let raw = r#"{"token": "jwt-here", "refreshToken": "refresh-here"}"#;
        let pair: TokenPair = serde_json::from_str(raw).expect("deserialize");
        assert_eq!(pair.refresh_token, "refresh-here");
    }

    #[test]
    fn product_tolerates_missing_optional_fields() {
        let raw = r#"{"id": 5, "name": "Kettle", "price": "129.99"}"#;
        let product: Product = serde_json::from_str(raw).expect("deserialize");
        assert!(product.description.is_none());
        assert!(!product.archival);
    }

    #[test]
    fn to_cart_entry_snapshots_the_listing() {
        let raw = r#"{"id": 5, "name": "Kettle", "price": "129.99", "archival": true}"#;
        let product: Product = serde_json::from_str(raw).expect("deserialize");
        let entry = product.to_cart_entry(3);
        assert_eq!(entry.product_id, product.id);
        assert_eq!(entry.quantity, 3);
        assert!(entry.archival);
    }
}
