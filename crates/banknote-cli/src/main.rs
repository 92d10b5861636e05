//! Reconcile the banknote warehouse tables with their declarations.

use banknote::{DdlOperation, PgWarehouse, Reconciler, TableSchema, WarehouseConfig, models};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "banknote")]
#[command(about = "Keep the banknote warehouse tables in line with their declarations")]
#[command(version)]
struct Cli {
    /// Database connection URL (overrides DATABASE_URL)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending schema changes
    Migrate {
        /// Only reconcile this table
        #[arg(short, long)]
        table: Option<String>,
    },
    /// Show pending schema changes without applying them
    Plan {
        /// Only plan this table
        #[arg(short, long)]
        table: Option<String>,
    },
    /// List the declared tables
    Tables,
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("banknote=info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("{} {}", "error:".red().bold(), err);
        let mut source = err.source();
        while let Some(cause) = source {
            eprintln!("  {} {}", "caused by:".dimmed(), cause);
            source = cause.source();
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Commands::Tables => {
            for table in models::all() {
                print!("{}", table);
            }
            Ok(())
        }
        Commands::Plan { table } => {
            let tables = selected(table.as_deref())?;
            let warehouse = connect(cli.database_url)?;
            let reconciler = Reconciler::new(&warehouse);
            for table in &tables {
                let diff = reconciler.plan(table).await?;
                if diff.is_empty() {
                    println!("{} {}", table.name.bold(), "up to date".dimmed());
                    continue;
                }
                println!("{}", table.name.bold());
                for op in diff.operations() {
                    println!("  {}", colored(&op));
                }
            }
            Ok(())
        }
        Commands::Migrate { table } => {
            let tables = selected(table.as_deref())?;
            let warehouse = connect(cli.database_url)?;
            let reconciler = Reconciler::new(&warehouse);
            for table in &tables {
                let applied = reconciler.reconcile(table).await?;
                if applied.is_empty() {
                    println!("{} {}", table.name.bold(), "up to date".dimmed());
                    continue;
                }
                println!(
                    "{} {}",
                    table.name.bold(),
                    format!("{} change(s) applied", applied.len()).green()
                );
                for op in &applied {
                    println!("  {}", colored(op));
                }
            }
            Ok(())
        }
    }
}

fn selected(table: Option<&str>) -> CliResult<Vec<TableSchema>> {
    match table {
        None => Ok(models::all()),
        Some(name) => match models::by_name(name) {
            Some(schema) => Ok(vec![schema]),
            None => Err(format!("unknown table {:?}", name).into()),
        },
    }
}

fn connect(database_url: Option<String>) -> CliResult<PgWarehouse> {
    let config = WarehouseConfig::from_lookup(|var| {
        if var == banknote::config::DATABASE_URL && database_url.is_some() {
            return database_url.clone();
        }
        std::env::var(var).ok()
    })?;
    tracing::info!(database = %config.masked_url(), "connecting");
    Ok(PgWarehouse::connect(&config)?)
}

fn colored(op: &DdlOperation) -> String {
    let line = op.to_string();
    match op {
        DdlOperation::CreateTable(_) | DdlOperation::AddColumn { .. } => line.green().to_string(),
        DdlOperation::DropColumn { .. } => line.red().to_string(),
        DdlOperation::ModifyColumn { .. } => line.yellow().to_string(),
    }
}
