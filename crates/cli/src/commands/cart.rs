//! Cart ledger commands.
//!
//! All of these operate on the local storage file; nothing here talks to
//! the backend except `add`, which snapshots the product listing first.

use shopfront_client::cart::any_archival;
use shopfront_core::ProductId;

use super::{AppContext, CliError};

/// Show the current cart.
#[allow(clippy::print_stdout)]
pub fn show(ctx: &AppContext) {
    let entries = ctx.cart.entries();

    if entries.is_empty() {
        println!("Cart is empty.");
        return;
    }

    for entry in &entries {
        let marker = if entry.archival { " [archival]" } else { "" };
        let id = format!("#{}", entry.product_id);
        println!(
            "{id:<7} {:<40} {} x{} = {}{marker}",
            entry.name,
            entry.price,
            entry.quantity,
            entry.line_total(),
        );
    }
    println!("Total items: {}", ctx.cart.total_quantity());

    if any_archival(&entries) {
        println!("! Some products were withdrawn from sale; checkout is blocked until they are removed.");
    }
}

/// Add a product to the cart, or nudge its stored quantity toward
/// `quantity` by one step.
#[allow(clippy::print_stdout)]
pub async fn add(ctx: &AppContext, id: ProductId, quantity: u32) -> Result<(), CliError> {
    if quantity == 0 {
        return Err(CliError::InvalidInput("quantity must be at least 1".to_owned()));
    }

    let product = ctx.api.product_by_id(id).await?;
    ctx.cart.add_to_cart(&product.to_cart_entry(quantity));

    let stored = ctx
        .cart
        .entries()
        .iter()
        .find(|e| e.product_id == id)
        .map_or(0, |e| e.quantity);
    println!("{} - quantity now {stored}.", product.name);
    Ok(())
}

/// Remove a product from the cart.
#[allow(clippy::print_stdout)]
pub fn remove(ctx: &AppContext, id: ProductId) {
    ctx.cart.remove_product(id);
    println!("Removed product {id} from the cart.");
}

/// Empty the cart.
#[allow(clippy::print_stdout)]
pub fn clear(ctx: &AppContext) {
    ctx.cart.clear();
    println!("Cart emptied.");
}
