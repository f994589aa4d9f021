//! Agro distribution command-line tool

use agro_engine::{
    Config, DistributionSystem, OrderType, ProductId, RetailerId, SupplierId, TransactionRequest,
    TransporterId,
};
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Agricultural distribution ledger
#[derive(Parser, Debug)]
#[command(name = "agro", version, about = "Agricultural distribution ledger")]
struct Cli {
    /// TOML configuration file (environment variables are used otherwise)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data directory, overriding the configuration
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Entity counts and chain verification
    Status,

    /// Verify ledger linkage, failing on a broken link
    Verify,

    /// Print every block
    Chain,

    /// Distribution report as JSON
    Report,

    /// Place an order
    Transact {
        supplier: u32,
        retailer: u32,
        product: u32,
        transporter: u32,
        quantity: u32,
        /// Mark the order as seasonal
        #[arg(long)]
        seasonal: bool,
    },

    /// Plan a delivery route from a supplier through every retailer
    Route {
        supplier: u32,
        /// Price the route with this transporter and record it
        #[arg(long)]
        transporter: Option<u32>,
    },

    /// Suggest a stock allocation for a product
    Allocate {
        product: u32,
        /// Record the plan in the ledger
        #[arg(long)]
        record: bool,
    },

    /// Run the seasonal demand simulation
    Simulate,

    /// Add credit to a retailer
    TopUp { retailer: u32, amount: Decimal },

    /// Print metrics in the Prometheus text format
    Metrics,
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::from_env().context("reading configuration from environment")?,
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let mut system = DistributionSystem::open_or_create(config)
        .context("opening data directory")?;

    let mutated = match cli.cmd {
        Commands::Status => {
            let store = system.store();
            println!("Products:     {}", store.products().count());
            println!("Suppliers:    {}", store.suppliers().count());
            println!("Retailers:    {}", store.retailers().count());
            println!("Transporters: {}", store.transporters().count());
            println!("Transactions: {}", store.transaction_count());
            println!("Blocks:       {}", system.ledger().len());
            println!(
                "Chain:        {}",
                if system.ledger().verify() { "valid" } else { "BROKEN" }
            );
            for description in system.policies().descriptions() {
                println!("Policy:       {}", description);
            }
            false
        }

        Commands::Verify => {
            if let Some(position) = system.ledger().first_broken_link() {
                bail!("ledger linkage broken at block {}", position);
            }
            println!("Ledger valid ({} blocks)", system.ledger().len());
            false
        }

        Commands::Chain => {
            for block in system.ledger() {
                println!("{}", block);
            }
            false
        }

        Commands::Report => {
            print_json(&system.distribution_report())?;
            false
        }

        Commands::Transact {
            supplier,
            retailer,
            product,
            transporter,
            quantity,
            seasonal,
        } => {
            let order_type = if seasonal {
                OrderType::Seasonal
            } else {
                OrderType::Regular
            };
            let request = TransactionRequest::regular(
                SupplierId(supplier),
                RetailerId(retailer),
                ProductId(product),
                TransporterId(transporter),
                quantity,
            )
            .with_order_type(order_type);

            let outcome = system.create_transaction(&request)?;
            print_json(&outcome)?;
            true
        }

        Commands::Route {
            supplier,
            transporter,
        } => {
            let plan = system.optimize_route(SupplierId(supplier))?;
            match transporter {
                Some(id) => {
                    let cost = system.record_route(plan, TransporterId(id))?;
                    print_json(&cost)?;
                    true
                }
                None => {
                    print_json(&plan)?;
                    false
                }
            }
        }

        Commands::Allocate { product, record } => {
            let plan = system.allocate_inventory(ProductId(product))?;
            print_json(&plan)?;
            if record {
                system.record_allocation(&plan)?;
            }
            record
        }

        Commands::Simulate => {
            for order in system.run_seasonal_simulation() {
                match &order.result {
                    Ok(outcome) => println!(
                        "Retailer {} ({} demand): transaction {} {}",
                        order.retailer_id, order.tier, outcome.transaction_id, outcome.status
                    ),
                    Err(e) => println!(
                        "Retailer {} ({} demand): not placed: {}",
                        order.retailer_id, order.tier, e
                    ),
                }
            }
            true
        }

        Commands::TopUp { retailer, amount } => {
            let updated = system.top_up_credit(RetailerId(retailer), amount)?;
            println!(
                "Retailer {} credit: RM{:.2} (annual RM{:.2})",
                updated.id, updated.credit.current, updated.credit.annual
            );
            true
        }

        Commands::Metrics => {
            print!("{}", system.metrics().render()?);
            false
        }
    };

    if mutated {
        system.save().context("saving data directory")?;
    }

    Ok(())
}
