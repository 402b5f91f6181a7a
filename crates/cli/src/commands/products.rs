//! Product browsing and management commands.

use shopfront_core::ProductId;

use super::{AppContext, CliError};

/// List all products.
#[allow(clippy::print_stdout)]
pub async fn list(ctx: &AppContext) -> Result<(), CliError> {
    let products = ctx.api.products().await?;

    if products.is_empty() {
        println!("No products.");
        return Ok(());
    }

    for product in &products {
        let marker = if product.archival { " [archival]" } else { "" };
        let id = format!("#{}", product.id);
        println!("{id:<7} {:<40} {}{marker}", product.name, product.price);
    }
    Ok(())
}

/// Show one product.
#[allow(clippy::print_stdout)]
pub async fn show(ctx: &AppContext, id: ProductId) -> Result<(), CliError> {
    let product = ctx.api.product_by_id(id).await?;

    println!("Product #{} - {}", product.id, product.name);
    println!("  price: {}", product.price);
    if let Some(quantity) = product.quantity {
        println!("  stock: {quantity}");
    }
    if let Some(description) = &product.description {
        println!("  {description}");
    }
    if product.archival {
        println!("  (withdrawn from sale)");
    }
    Ok(())
}

/// Withdraw a product from sale. Requires a staff role.
#[allow(clippy::print_stdout)]
pub async fn archive(ctx: &AppContext, id: ProductId) -> Result<(), CliError> {
    let token = ctx.bearer_token()?;
    ctx.api.archive_product(&token, id).await?;
    println!("Product {id} archived.");
    Ok(())
}
