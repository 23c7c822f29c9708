//! Binary entry point: open the customer database and run one query from the
//! command line.
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use lunchly::config::Config;
use lunchly::{Customer, Database};

#[derive(Parser)]
#[command(name = "lunchly", about = "Look up Lunchly customers")]
struct Cli {
    /// SQLite file to use instead of the configured one.
    #[arg(long, global = true)]
    database: Option<PathBuf>,
    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every customer by last name.
    List,
    /// Show one customer.
    Show { id: i64 },
    /// The ten customers with the most reservations.
    Top,
    /// Customers whose first or last name matches exactly.
    Search { name: String },
    /// Reservations booked by a customer.
    Reservations { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.database.clone()).context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let db = Database::open(&config.database_path)
        .await
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;

    let outcome = run(&cli, &db).await;
    db.close().await.context("failed to close database")?;
    outcome
}

async fn run(cli: &Cli, db: &Database) -> Result<()> {
    match &cli.command {
        Command::List => print_customers(cli.json, &Customer::all(db).await?),
        Command::Show { id } => {
            let customer = Customer::get(db, *id).await?;
            if cli.json {
                print_json(&customer)
            } else {
                println!("{}", customer.full_name());
                if let Some(phone) = &customer.phone {
                    println!("  phone: {phone}");
                }
                if let Some(notes) = &customer.notes {
                    println!("  notes: {notes}");
                }
                Ok(())
            }
        }
        Command::Top => print_customers(cli.json, &Customer::top_ten(db).await?),
        Command::Search { name } => {
            print_customers(cli.json, &Customer::search(db, &name.to_lowercase()).await?)
        }
        Command::Reservations { id } => {
            let customer = Customer::get(db, *id).await?;
            let reservations = customer.reservations(db).await?;
            if cli.json {
                return print_json(&reservations);
            }
            println!("{}", customer.full_name());
            for reservation in &reservations {
                println!(
                    "  {} for {}",
                    reservation.formatted_start_at(),
                    reservation.num_guests
                );
            }
            Ok(())
        }
    }
}

fn print_customers(json: bool, customers: &[Customer]) -> Result<()> {
    if json {
        return print_json(customers);
    }
    for customer in customers {
        match customer.id() {
            Some(id) => println!("{id:>5}  {customer}"),
            None => println!("    -  {customer}"),
        }
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to encode JSON")?;
    println!("{text}");
    Ok(())
}
