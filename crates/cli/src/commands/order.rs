//! Order commands.

use shop_sync_core::{OrderId, OrderStatus, ProductId, Quantity};
use shop_sync_storefront::models::{Order, OrderDraft};
use shop_sync_storefront::state::AppState;

use super::{CliError, Output};

fn render(order: &Order) -> String {
    let total = order
        .total_amount
        .map_or_else(|| "-".to_string(), |t| t.to_string());
    let created = order
        .created_at
        .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());

    format!(
        "Order #{} [{}] {} line(s), total {total}, created {created}",
        order.id,
        order.status,
        order.items.len()
    )
}

pub async fn checkout(state: &AppState, out: &Output) -> Result<(), CliError> {
    state.cart().fetch_cart_list().await?;
    let order = state.orders().checkout(state.cart()).await?;
    out.emit(&order, || render(&order))
}

pub async fn buy(
    state: &AppState,
    out: &Output,
    product_id: ProductId,
    quantity: Quantity,
    size: Option<String>,
    status: Option<OrderStatus>,
) -> Result<(), CliError> {
    let product = state.catalog().fresh_product(&product_id).await?;
    let size = size.filter(|s| !s.trim().is_empty());

    let mut draft = OrderDraft::single(state.session().user_id(), &product, quantity, size);
    draft.status = status;

    let order = state.orders().buy_now(draft).await?;
    out.emit(&order, || render(&order))
}

pub async fn list(state: &AppState, out: &Output) -> Result<(), CliError> {
    let orders = state.orders().list_orders().await?;
    out.emit(&orders, || {
        if orders.is_empty() {
            return "No orders".to_string();
        }
        orders.iter().map(render).collect::<Vec<_>>().join("\n")
    })
}

pub async fn show(state: &AppState, out: &Output, order_id: OrderId) -> Result<(), CliError> {
    let order = state.orders().get_order(&order_id).await?;
    out.emit(&order, || {
        let mut lines = vec![render(&order)];
        lines.extend(order.items.iter().map(|line| {
            let name = line
                .name
                .clone()
                .unwrap_or_else(|| format!("product {}", line.product_id));
            format!("  {name}  {} x {}", line.quantity, line.price)
        }));
        lines.join("\n")
    })
}

pub async fn set_status(
    state: &AppState,
    out: &Output,
    order_id: OrderId,
    status: OrderStatus,
) -> Result<(), CliError> {
    let order = state.orders().update_order_status(&order_id, status).await?;
    out.emit(&order, || render(&order))
}

pub async fn delete(state: &AppState, order_id: OrderId) -> Result<(), CliError> {
    state.orders().delete_order(&order_id).await?;
    tracing::info!(order_id = %order_id, "Order deleted");
    Ok(())
}
