//! Cart ledger entry.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// A denormalized product snapshot plus a chosen quantity.
///
/// This is the unit the per-user cart ledger is made of. The snapshot is
/// taken at add time; the ledger holds at most one entry per product, and
/// `quantity` never drops below 1 while the entry exists.
///
/// Serialized as camelCase JSON: the persisted ledger format predates
/// this crate and existing carts must keep parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    /// Product this entry refers to.
    pub product_id: ProductId,
    /// Product name at add time.
    pub name: String,
    /// Unit price at add time.
    pub price: Decimal,
    /// Chosen quantity, at least 1.
    pub quantity: u32,
    /// Product image, if the listing had one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Whether the product has since been withdrawn from sale. An
    /// archival entry blocks checkout but stays visible in the cart.
    #[serde(default)]
    pub archival: bool,
}

impl CartEntry {
    /// Price of this line: unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}
