//! Cart commands.

use shop_sync_core::{CartItemId, ProductId, Quantity};
use shop_sync_storefront::models::{AddToCart, CartLineItem};
use shop_sync_storefront::state::AppState;

use super::{CliError, Output};

fn render_line(item: &CartLineItem) -> String {
    let name = item
        .details
        .as_ref()
        .map_or_else(|| format!("product {}", item.product_id), |d| d.name.clone());
    let size = item
        .size
        .as_deref()
        .map(|s| format!(" [{s}]"))
        .unwrap_or_default();

    format!(
        "#{:<6} {name}{size}  {} x {} = {:.2}",
        item.id,
        item.quantity,
        item.price,
        item.line_total()
    )
}

pub async fn list(state: &AppState, out: &Output) -> Result<(), CliError> {
    let cart = state.cart();
    cart.fetch_cart_list().await?;

    let items = cart.items();
    out.emit(&items, || {
        if items.is_empty() {
            return "Cart is empty".to_string();
        }
        let mut lines: Vec<String> = items.iter().map(render_line).collect();
        lines.push(format!(
            "{} item(s), total {:.2}",
            cart.total_count(),
            cart.total_amount()
        ));
        lines.join("\n")
    })
}

pub async fn add(
    state: &AppState,
    out: &Output,
    product_id: ProductId,
    quantity: Quantity,
    size: Option<String>,
) -> Result<(), CliError> {
    let cart = state.cart();
    cart.fetch_cart_list().await?;

    let mut request = AddToCart::new(product_id, quantity);
    if let Some(size) = size {
        request = request.with_size(size);
    }

    let item = cart.add_to_cart(request).await?;
    out.emit(&item, || render_line(&item))
}

pub async fn update(
    state: &AppState,
    out: &Output,
    item_id: CartItemId,
    quantity: Quantity,
) -> Result<(), CliError> {
    let cart = state.cart();
    cart.fetch_cart_list().await?;

    let item = cart.update_item_quantity(&item_id, quantity).await?;
    out.emit(&item, || render_line(&item))
}

pub async fn remove(state: &AppState, item_id: CartItemId) -> Result<(), CliError> {
    let cart = state.cart();
    cart.fetch_cart_list().await?;
    cart.remove_item(&item_id).await?;
    tracing::info!(cart_item_id = %item_id, "Removed");
    Ok(())
}

pub async fn clear(state: &AppState) -> Result<(), CliError> {
    let cart = state.cart();
    cart.fetch_cart_list().await?;
    let count = cart.len();
    cart.clear_cart().await?;
    tracing::info!(count, "Cart cleared");
    Ok(())
}
