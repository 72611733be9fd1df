//! Catalog commands: browse, search and list categories.

use shop_sync_core::CategoryId;
use shop_sync_storefront::models::{Product, ProductQuery};
use shop_sync_storefront::state::AppState;

use super::{CliError, Output};

fn render(product: &Product) -> String {
    let stock = if product.stock == 0 {
        "out of stock".to_string()
    } else {
        format!("{} in stock", product.stock)
    };
    let star = if product.is_recommended { " *" } else { "" };
    format!("#{:<6} {}{star}  {}  ({stock})", product.id, product.name, product.price)
}

fn emit_products(out: &Output, products: &[Product]) -> Result<(), CliError> {
    out.emit(&products, || {
        if products.is_empty() {
            return "No products".to_string();
        }
        products.iter().map(render).collect::<Vec<_>>().join("\n")
    })
}

pub async fn list(
    state: &AppState,
    out: &Output,
    category: Option<CategoryId>,
    text: Option<String>,
    recommended: bool,
    limit: Option<u32>,
) -> Result<(), CliError> {
    let query = ProductQuery {
        category_id: category,
        text: text.filter(|t| !t.trim().is_empty()),
        recommended,
        limit,
        ..ProductQuery::default()
    };
    let products = state.catalog().products(&query).await?;
    emit_products(out, &products)
}

pub async fn search(state: &AppState, out: &Output, keyword: &str) -> Result<(), CliError> {
    let products = state.catalog().search(keyword).await?;
    emit_products(out, &products)
}

pub async fn categories(state: &AppState, out: &Output) -> Result<(), CliError> {
    let categories = state.catalog().categories().await?;
    out.emit(&categories, || {
        if categories.is_empty() {
            return "No categories".to_string();
        }
        categories
            .iter()
            .map(|c| format!("#{:<6} {}", c.id, c.name))
            .collect::<Vec<_>>()
            .join("\n")
    })
}
