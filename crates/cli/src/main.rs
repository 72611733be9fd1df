//! shop-sync CLI - drive the cart and session from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Log in (identity is persisted to SHOP_SESSION_FILE)
//! shop-sync login -u ana -p pineapple
//!
//! # Add two medium shirts, then show the cart
//! shop-sync cart add 7 -q 2 -s M
//! shop-sync cart list
//!
//! # Turn the cart into an order
//! shop-sync order checkout
//!
//! # Mark an order paid
//! shop-sync order status 12 paid
//!
//! # Find something to buy
//! shop-sync products search mug
//! ```
//!
//! # Commands
//!
//! - `login`, `register`, `logout`, `whoami` - Session
//! - `cart list|add|update|remove|clear` - Cart
//! - `order checkout|buy|list|show|status|delete` - Orders
//! - `products list|search|categories` - Catalog
//!
//! Configuration comes from the environment (see `StorefrontConfig`).
//! `RUST_LOG` controls log verbosity and `SHOP_LOG_JSON=1` switches to JSON logs.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shop_sync_core::{CartItemId, CategoryId, OrderId, OrderStatus, ProductId, Quantity};
use shop_sync_storefront::config::StorefrontConfig;
use shop_sync_storefront::state::AppState;

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "shop-sync")]
#[command(author, version, about = "Cart and order client for the shop API")]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with username and password
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,
    },
    /// Create an account and log into it
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,

        #[arg(short, long)]
        email: String,
    },
    /// Forget the persisted identity
    Logout,
    /// Show the logged-in user
    Whoami {
        /// Reload the profile from the server first
        #[arg(long)]
        refresh: bool,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage orders
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// Browse the catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Fetch and show the cart
    List,
    /// Add a product (merges with an existing line of the same size)
    Add {
        product_id: ProductId,

        #[arg(short, long, default_value = "1", value_parser = parse_quantity)]
        quantity: Quantity,

        #[arg(short, long)]
        size: Option<String>,
    },
    /// Set the quantity of a line item
    Update {
        item_id: CartItemId,

        #[arg(value_parser = parse_quantity)]
        quantity: Quantity,
    },
    /// Remove a line item
    Remove { item_id: CartItemId },
    /// Remove every line item
    Clear,
}

#[derive(Subcommand)]
enum OrderAction {
    /// Order everything in the cart, then clear it
    Checkout,
    /// Buy a single product directly, bypassing the cart
    Buy {
        product_id: ProductId,

        #[arg(short, long, default_value = "1", value_parser = parse_quantity)]
        quantity: Quantity,

        #[arg(short, long)]
        size: Option<String>,

        /// Initial status sent as-is (`pending`, `paid`, ...)
        #[arg(long)]
        status: Option<OrderStatus>,
    },
    /// List your orders
    List,
    /// Show one order
    Show { order_id: OrderId },
    /// Change an order's status
    Status {
        order_id: OrderId,
        status: OrderStatus,
    },
    /// Delete an order
    Delete { order_id: OrderId },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List products, optionally filtered
    List {
        /// Only products in this category
        #[arg(short, long)]
        category: Option<CategoryId>,

        /// Full-text filter
        #[arg(short, long)]
        query: Option<String>,

        /// Only recommended products
        #[arg(long)]
        recommended: bool,

        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Search products by name
    Search { keyword: String },
    /// List product categories
    Categories,
}

fn parse_quantity(raw: &str) -> Result<Quantity, String> {
    let value: i64 = raw.trim().parse().map_err(|e| format!("{e}"))?;
    Quantity::new(value).map_err(|e| e.to_string())
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shop_sync=info".into());
    let json = std::env::var("SHOP_LOG_JSON").is_ok_and(|v| v == "1" || v == "true");

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter));

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(2);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    if let Err(e) = run(cli, config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), CliError> {
    let state = AppState::new(config)?;
    let out = commands::Output::new(cli.json);

    match cli.command {
        Commands::Login { username, password } => {
            commands::session::login(&state, &out, username, password).await?;
        }
        Commands::Register {
            username,
            password,
            email,
        } => commands::session::register(&state, &out, username, password, email).await?,
        Commands::Logout => commands::session::logout(&state)?,
        Commands::Whoami { refresh } => commands::session::whoami(&state, &out, refresh).await?,
        Commands::Cart { action } => match action {
            CartAction::List => commands::cart::list(&state, &out).await?,
            CartAction::Add {
                product_id,
                quantity,
                size,
            } => commands::cart::add(&state, &out, product_id, quantity, size).await?,
            CartAction::Update { item_id, quantity } => {
                commands::cart::update(&state, &out, item_id, quantity).await?;
            }
            CartAction::Remove { item_id } => commands::cart::remove(&state, item_id).await?,
            CartAction::Clear => commands::cart::clear(&state).await?,
        },
        Commands::Order { action } => match action {
            OrderAction::Checkout => commands::order::checkout(&state, &out).await?,
            OrderAction::Buy {
                product_id,
                quantity,
                size,
                status,
            } => commands::order::buy(&state, &out, product_id, quantity, size, status).await?,
            OrderAction::List => commands::order::list(&state, &out).await?,
            OrderAction::Show { order_id } => commands::order::show(&state, &out, order_id).await?,
            OrderAction::Status { order_id, status } => {
                commands::order::set_status(&state, &out, order_id, status).await?;
            }
            OrderAction::Delete { order_id } => commands::order::delete(&state, order_id).await?,
        },
        Commands::Products { action } => match action {
            ProductsAction::List {
                category,
                query,
                recommended,
                limit,
            } => commands::products::list(&state, &out, category, query, recommended, limit).await?,
            ProductsAction::Search { keyword } => {
                commands::products::search(&state, &out, &keyword).await?;
            }
            ProductsAction::Categories => commands::products::categories(&state, &out).await?,
        },
    }
    Ok(())
}
