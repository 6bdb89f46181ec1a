//! Febeflo CLI - Shopper cart and Webpay checkout.
//!
//! # Usage
//!
//! ```bash
//! # Add a product to the cart
//! febeflo cart add --id 7 --name "Vestido floral" --price 24990 --category Mujeres --size M
//!
//! # Show the cart
//! febeflo cart show
//!
//! # Pay with courier delivery and write the Webpay form to a file
//! febeflo checkout --region Valparaíso --form-out pay.html
//!
//! # Apply the result page URL the gateway sent the browser to
//! febeflo result "http://127.0.0.1:3000/payment/return?status=success&order=O-1"
//! ```
//!
//! # Commands
//!
//! - `cart` - Add, remove, update or show cart lines
//! - `checkout` - Open a Webpay transaction for the cart
//! - `result` - Apply a payment result, clearing the cart on success
//!
//! The cart lives in `<data-dir>/febeflo-cart.json`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::Write;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use febeflo_core::ProductId;
use febeflo_core::cart::Product;
use febeflo_core::shipping::Delivery;

mod client;
mod commands;
mod storage;

use client::StorefrontClient;

#[derive(Parser)]
#[command(name = "febeflo")]
#[command(author, version, about = "Febeflo shopper CLI")]
struct Cli {
    /// Directory holding the cart file
    #[arg(long, global = true, env = "FEBEFLO_DATA_DIR", default_value = ".febeflo")]
    data_dir: PathBuf,

    /// Storefront server base URL
    #[arg(
        long,
        global = true,
        env = "FEBEFLO_SERVER_URL",
        default_value = "http://127.0.0.1:3000"
    )]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the shopping cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Open a Webpay transaction and print the gateway form
    Checkout {
        #[command(flatten)]
        delivery: DeliveryArgs,

        /// Write the auto-submitting form to this file instead of stdout
        #[arg(long)]
        form_out: Option<PathBuf>,
    },
    /// Apply a payment result URL or query string
    Result {
        /// The `/payment/return` URL, or just its query
        url: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Add one unit of a product
    Add {
        #[arg(long)]
        id: ProductId,

        #[arg(long)]
        name: String,

        /// Unit price in CLP
        #[arg(long)]
        price: u64,

        #[arg(long)]
        category: String,

        #[arg(long)]
        image_url: Option<String>,

        #[arg(long)]
        size: Option<String>,
    },
    /// Remove a product line
    Remove {
        #[arg(long)]
        id: ProductId,

        #[arg(long)]
        size: Option<String>,
    },
    /// Set the quantity of a line (0 or less removes it)
    Update {
        #[arg(long)]
        id: ProductId,

        #[arg(long, allow_negative_numbers = true)]
        quantity: i64,

        #[arg(long)]
        size: Option<String>,
    },
    /// Show lines, units and subtotal
    Show,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct DeliveryArgs {
    /// Ship by courier to this region
    #[arg(long)]
    region: Option<String>,

    /// Pick up at the shop (no shipping fee)
    #[arg(long)]
    pickup: bool,
}

impl From<DeliveryArgs> for Delivery {
    fn from(args: DeliveryArgs) -> Self {
        match args.region {
            Some(region) if !args.pickup => Self::Courier { region },
            _ => Self::StorePickup,
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Logs go to stderr so the gateway form can be piped from stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "febeflo_cli=info,febeflo_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut cart = commands::open_cart(&cli.data_dir);
    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Add {
                id,
                name,
                price,
                category,
                image_url,
                size,
            } => {
                let product = Product {
                    id,
                    name,
                    price: price.into(),
                    image_url,
                    category,
                    sizes: size.iter().cloned().collect(),
                };
                commands::cart::add(&mut cart, &product, size.as_deref(), &mut out)?;
            }
            CartAction::Remove { id, size } => {
                commands::cart::remove(&mut cart, id, size.as_deref(), &mut out)?;
            }
            CartAction::Update { id, quantity, size } => {
                commands::cart::update(&mut cart, id, quantity, size.as_deref(), &mut out)?;
            }
            CartAction::Show => commands::cart::show(&cart, &mut out)?,
        },
        Commands::Checkout { delivery, form_out } => {
            let client = StorefrontClient::new(&cli.server)?;
            let redirect =
                commands::checkout::run(&cart, &client, &delivery.into(), &mut rand::rng())
                    .await?;
            let form = redirect.auto_submit_form()?;

            match form_out {
                Some(path) => {
                    std::fs::write(&path, form)?;
                    tracing::info!(path = %path.display(), "Open the form in a browser to pay");
                }
                None => out.write_all(form.as_bytes())?,
            }
        }
        Commands::Result { url } => {
            commands::result::apply(&url, &mut cart, &mut out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_checkout_requires_one_delivery_option() {
        assert!(Cli::try_parse_from(["febeflo", "checkout"]).is_err());
        assert!(
            Cli::try_parse_from(["febeflo", "checkout", "--pickup", "--region", "RM"]).is_err()
        );
    }

    #[test]
    fn test_delivery_from_args() {
        let cli = Cli::try_parse_from(["febeflo", "checkout", "--region", "Biobío"]);
        let Ok(Cli {
            command: Commands::Checkout { delivery, .. },
            ..
        }) = cli
        else {
            panic!("expected checkout command");
        };
        assert_eq!(
            Delivery::from(delivery),
            Delivery::Courier {
                region: "Biobío".to_string()
            }
        );
    }

    #[test]
    fn test_cart_cannot_be_cleared_by_hand() {
        assert!(Cli::try_parse_from(["febeflo", "cart", "clear"]).is_err());
    }

    #[test]
    fn test_update_accepts_negative_quantity() {
        let cli = Cli::try_parse_from([
            "febeflo", "cart", "update", "--id", "3", "--quantity", "-1",
        ]);
        assert!(cli.is_ok());
    }
}
