//! Storefront CLI.
//!
//! # Usage
//!
//! ```bash
//! storefront profile set --id 4 --name "Budi" --email budi@example.com \
//!     --phone 0812 --address "Jl. Merdeka 1, Kota Bandung 40115"
//! storefront cart add --product-id 7 --name "Paracetamol" --unit-price 10000 --quantity 2
//! storefront checkout
//! storefront orders list
//! ```

use std::io::{self, Write};

use checkout::Field;
use clap::{Args, Parser, Subcommand};
use storefront::commands::checkout::{CheckoutOptions, PaymentDecision};
use storefront::commands::profile::ProfileInput;
use storefront::commands::{self, cart::AddItem};
use storefront::{App, Config};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "storefront")]
#[command(author, version, about = "Storefront cart, checkout and order history")]
struct Cli {
    /// Print a Prometheus snapshot of checkout metrics when the command ends
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the signed-in customer
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Submit the cart as an order
    Checkout(CheckoutArgs),
    /// Browse and cancel past orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Add a product, merging with an existing line
    Add {
        #[arg(long)]
        product_id: i64,
        #[arg(long)]
        name: String,
        /// Price in minor units
        #[arg(long)]
        unit_price: i64,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
        /// Units available; caps the line quantity
        #[arg(long)]
        stock: Option<u32>,
        #[arg(long)]
        image: Option<String>,
    },
    /// Set a line's quantity; zero or less removes it
    Set {
        #[arg(long)]
        product_id: i64,
        #[arg(short, long, allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove {
        #[arg(long)]
        product_id: i64,
    },
    /// Empty the cart
    Clear,
    /// Show the cart with totals
    Show,
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Save the signed-in customer
    Set {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        postal_code: Option<String>,
    },
    /// Show the shipping details checkout would use
    Show,
}

#[derive(Args)]
struct CheckoutArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    /// Also re-derives city and postal code unless those are given too
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    postal_code: Option<String>,
    /// Treat the payment page as paid without asking
    #[arg(long, conflicts_with = "cancel")]
    paid: bool,
    /// Treat the payment page as closed without paying
    #[arg(long)]
    cancel: bool,
}

impl CheckoutArgs {
    fn into_options(self) -> CheckoutOptions {
        // Address first so explicit city and postal code win over parsed ones
        let overrides = [
            (Field::Address, self.address),
            (Field::Name, self.name),
            (Field::Email, self.email),
            (Field::Phone, self.phone),
            (Field::City, self.city),
            (Field::PostalCode, self.postal_code),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field, v)))
        .collect();

        let decision = match (self.paid, self.cancel) {
            (true, _) => Some(PaymentDecision::Paid),
            (_, true) => Some(PaymentDecision::Cancel),
            _ => None,
        };
        CheckoutOptions {
            overrides,
            decision,
        }
    }
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List your orders, most recent first
    List,
    /// Show the lines of an order
    Lines { order_id: i64 },
    /// Cancel an order that has not shipped
    Cancel { order_id: i64 },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    // 1. Tracing goes to stderr; stdout is for command output
    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    // 2. Optional Prometheus recorder
    let metrics_handle = if cli.metrics {
        match metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder() {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(error = %e, "failed to install Prometheus recorder");
                None
            }
        }
    } else {
        None
    };

    let result = run(cli, config).await;

    if let Some(handle) = metrics_handle {
        print!("{}", handle.render());
    }
    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: Config) -> storefront::Result<()> {
    let app = App::open(config).await?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Add {
                product_id,
                name,
                quantity,
                unit_price,
                stock,
                image,
            } => {
                let item = AddItem {
                    product_id,
                    name,
                    unit_price,
                    quantity,
                    stock,
                    image,
                };
                commands::cart::add(&app, item, &mut out).await?
            }
            CartAction::Set {
                product_id,
                quantity,
            } => commands::cart::set(&app, product_id, quantity, &mut out).await?,
            CartAction::Remove { product_id } => {
                commands::cart::remove(&app, product_id, &mut out).await?
            }
            CartAction::Clear => commands::cart::clear(&app, &mut out).await?,
            CartAction::Show => commands::cart::show(&app, &mut out).await?,
        },
        Commands::Profile { action } => match action {
            ProfileAction::Set {
                id,
                name,
                email,
                phone,
                address,
                city,
                postal_code,
            } => {
                let input = ProfileInput {
                    customer_id: id,
                    name,
                    email,
                    phone,
                    address,
                    city,
                    postal_code,
                };
                commands::profile::set(&app, input, &mut out).await?
            }
            ProfileAction::Show => commands::profile::show(&app, &mut out).await?,
        },
        Commands::Checkout(args) => {
            let mut input = io::stdin().lock();
            commands::checkout::run(&app, args.into_options(), &mut input, &mut out).await?;
        }
        Commands::Orders { action } => match action {
            OrdersAction::List => commands::orders::list(&app, &mut out).await?,
            OrdersAction::Lines { order_id } => {
                commands::orders::lines(&app, order_id, &mut out).await?
            }
            OrdersAction::Cancel { order_id } => {
                commands::orders::cancel(&app, order_id, &mut out).await?
            }
        },
    }

    out.flush().map_err(|e| storefront::StorefrontError::Io {
        path: "<stdout>".into(),
        source: e,
    })
}
