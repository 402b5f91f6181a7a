//! Order browsing and rating commands.

use shopfront_core::{OrderId, OrderedProductId, Rating};

use super::{AppContext, CliError};

fn parse_rating(stars: u8) -> Result<Rating, CliError> {
    Rating::new(stars).map_err(|e| CliError::InvalidInput(e.to_string()))
}

/// List visible orders.
#[allow(clippy::print_stdout)]
pub async fn list(ctx: &AppContext) -> Result<(), CliError> {
    let token = ctx.bearer_token()?;
    let orders = ctx.api.orders(&token).await?;

    if orders.is_empty() {
        println!("No orders.");
        return Ok(());
    }

    for order in &orders {
        let id = format!("#{}", order.id);
        println!(
            "{id:<7} {:?} {} ({} items, placed {})",
            order.status,
            order.total_price,
            order.ordered_products.len(),
            order.created_at.format("%Y-%m-%d"),
        );
    }
    Ok(())
}

/// Show one order with its line items.
#[allow(clippy::print_stdout)]
pub async fn show(ctx: &AppContext, id: OrderId) -> Result<(), CliError> {
    let token = ctx.bearer_token()?;
    let order = ctx.api.order_by_id(&token, id).await?;

    println!(
        "Order #{} - {:?}, placed {}",
        order.id,
        order.status,
        order.created_at.format("%Y-%m-%d %H:%M"),
    );
    for line in &order.ordered_products {
        let rating = line
            .rating
            .map_or_else(|| "unrated".to_owned(), |r| r.to_string());
        let id = format!("#{}", line.id);
        println!(
            "  line {id:<7} {:<40} {} x{} ({rating})",
            line.name, line.price, line.quantity,
        );
    }
    println!("Total: {}", order.total_price);
    Ok(())
}

/// Leave a rating on an ordered product.
#[allow(clippy::print_stdout)]
pub async fn rate(ctx: &AppContext, id: OrderedProductId, stars: u8) -> Result<(), CliError> {
    let rating = parse_rating(stars)?;
    let token = ctx.bearer_token()?;
    ctx.api.rate_ordered_product(&token, id, rating).await?;
    println!("Rated line {id}: {rating}.");
    Ok(())
}

/// Replace an existing rating.
#[allow(clippy::print_stdout)]
pub async fn rerate(ctx: &AppContext, id: OrderedProductId, stars: u8) -> Result<(), CliError> {
    let rating = parse_rating(stars)?;
    let token = ctx.bearer_token()?;
    ctx.api.update_rating(&token, id, rating).await?;
    println!("Updated rating on line {id}: {rating}.");
    Ok(())
}

/// Remove a rating.
#[allow(clippy::print_stdout)]
pub async fn unrate(ctx: &AppContext, id: OrderedProductId) -> Result<(), CliError> {
    let token = ctx.bearer_token()?;
    ctx.api.delete_rating(&token, id).await?;
    println!("Removed rating from line {id}.");
    Ok(())
}
