//! Shopfront CLI - terminal consumer for the shop client.
//!
//! # Usage
//!
//! ```bash
//! # Sign in and keep the session in the local storage file
//! shop-cli session login -l client1 -p 'secret'
//!
//! # Browse products and build a cart
//! shop-cli products list
//! shop-cli cart add 42
//! shop-cli cart show
//!
//! # Stay signed in: renders the extend/expired prompts as they fire
//! shop-cli session watch --auto-extend
//! ```
//!
//! # Commands
//!
//! - `session` - login, logout, extend, status, watch
//! - `account` - self-service: show, edit, email/password/locale changes,
//!   registration and confirmation
//! - `products` - list, show, archive
//! - `cart` - show, add, remove, clear
//! - `orders` - list, show, rate/rerate/unrate

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shopfront_core::{Email, Locale, OrderId, OrderedProductId, ProductId};

mod commands;

use commands::AppContext;

#[derive(Parser)]
#[command(name = "shop-cli")]
#[command(version, about = "Shopfront client CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the sign-in session
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// Account self-service
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
    /// Browse and manage products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Manage the local cart ledger
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Browse orders and rate ordered products
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Sign in and persist the session
    Login {
        /// Account login
        #[arg(short, long)]
        login: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Clear the persisted session
    Logout,
    /// Exchange the refresh token for a fresh session
    Extend,
    /// Show the current session state
    Status,
    /// Stay running and render session prompts as they fire
    Watch {
        /// Extend the session automatically when the prompt fires
        #[arg(long)]
        auto_extend: bool,
    },
}

#[derive(Subcommand)]
enum AccountAction {
    /// Show the signed-in account
    Show,
    /// Update first and last name
    Edit {
        /// New first name
        #[arg(long)]
        first_name: Option<String>,

        /// New last name
        #[arg(long)]
        last_name: Option<String>,
    },
    /// Change the account email address
    ChangeEmail {
        /// The new address
        email: Email,
    },
    /// Change the account password
    ChangePassword {
        /// Current password, re-checked server-side
        #[arg(long)]
        current: String,

        /// Replacement password
        #[arg(long)]
        new: String,
    },
    /// Change the display locale
    ChangeLocale {
        /// Locale tag (en, pl)
        locale: Locale,
    },
    /// Register a new account
    Register {
        /// Desired login
        #[arg(short, long)]
        login: String,

        /// Contact email the confirmation is mailed to
        #[arg(short, long)]
        email: Email,

        /// Initial password
        #[arg(short, long)]
        password: String,

        /// Display locale (en, pl)
        #[arg(long, default_value = "en")]
        locale: Locale,
    },
    /// Redeem a mailed confirmation token
    Confirm {
        /// The token from the confirmation mail
        token: String,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// List all products
    List,
    /// Show one product
    Show {
        /// Product ID
        id: ProductId,
    },
    /// Withdraw a product from sale (staff only)
    Archive {
        /// Product ID
        id: ProductId,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the current cart
    Show,
    /// Add a product, or nudge its quantity toward the given value
    Add {
        /// Product ID
        id: ProductId,

        /// Target quantity the stored one steps toward
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        id: ProductId,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum OrderAction {
    /// List visible orders
    List,
    /// Show one order with its line items
    Show {
        /// Order ID
        id: OrderId,
    },
    /// Rate an ordered product (1-5)
    Rate {
        /// Ordered-product line ID (see `orders show`)
        id: OrderedProductId,

        /// Stars, 1-5
        stars: u8,
    },
    /// Replace an existing rating (1-5)
    Rerate {
        /// Ordered-product line ID
        id: OrderedProductId,

        /// Stars, 1-5
        stars: u8,
    },
    /// Remove a rating
    Unrate {
        /// Ordered-product line ID
        id: OrderedProductId,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing; default to warnings so command output stays clean
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopfront=warn".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut ctx = match AppContext::from_env() {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!("Failed to initialize: {e}");
            std::process::exit(1);
        }
    };

    let result = run(&mut ctx, cli.command).await;

    // Whatever prompts the command queued up still get rendered.
    ctx.drain_events();

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(ctx: &mut AppContext, command: Commands) -> Result<(), commands::CliError> {
    match command {
        Commands::Session { action } => match action {
            SessionAction::Login { login, password } => {
                commands::session::login(ctx, &login, &password).await?;
            }
            SessionAction::Logout => commands::session::logout(ctx),
            SessionAction::Extend => commands::session::extend(ctx).await,
            SessionAction::Status => commands::session::status(ctx),
            SessionAction::Watch { auto_extend } => {
                commands::session::watch(ctx, auto_extend).await?;
            }
        },
        Commands::Account { action } => match action {
            AccountAction::Show => commands::account::show(ctx).await?,
            AccountAction::Edit {
                first_name,
                last_name,
            } => commands::account::edit(ctx, first_name, last_name).await?,
            AccountAction::ChangeEmail { email } => {
                commands::account::change_email(ctx, &email).await?;
            }
            AccountAction::ChangePassword { current, new } => {
                commands::account::change_password(ctx, current, new).await?;
            }
            AccountAction::ChangeLocale { locale } => {
                commands::account::change_locale(ctx, locale).await?;
            }
            AccountAction::Register {
                login,
                email,
                password,
                locale,
            } => commands::account::register(ctx, login, email, password, locale).await?,
            AccountAction::Confirm { token } => commands::account::confirm(ctx, &token).await?,
        },
        Commands::Products { action } => match action {
            ProductAction::List => commands::products::list(ctx).await?,
            ProductAction::Show { id } => commands::products::show(ctx, id).await?,
            ProductAction::Archive { id } => commands::products::archive(ctx, id).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(ctx),
            CartAction::Add { id, quantity } => commands::cart::add(ctx, id, quantity).await?,
            CartAction::Remove { id } => commands::cart::remove(ctx, id),
            CartAction::Clear => commands::cart::clear(ctx),
        },
        Commands::Orders { action } => match action {
            OrderAction::List => commands::orders::list(ctx).await?,
            OrderAction::Show { id } => commands::orders::show(ctx, id).await?,
            OrderAction::Rate { id, stars } => commands::orders::rate(ctx, id, stars).await?,
            OrderAction::Rerate { id, stars } => commands::orders::rerate(ctx, id, stars).await?,
            OrderAction::Unrate { id } => commands::orders::unrate(ctx, id).await?,
        },
    }
    Ok(())
}
