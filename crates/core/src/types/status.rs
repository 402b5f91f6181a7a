//! Status enums for accounts and orders.

use serde::{Deserialize, Serialize};

/// Order lifecycle status as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Created,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

/// Account lifecycle state.
///
/// New registrations sit in `Unconfirmed` until the emailed confirmation
/// token is redeemed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountState {
    #[default]
    Unconfirmed,
    Active,
    Blocked,
}
