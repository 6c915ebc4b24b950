use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing_subscriber::EnvFilter;

mod analytics;
mod api;
mod db;
mod error;
mod export;
mod generator;
mod models;

#[derive(Parser)]
#[command(name = "sales-dashboard")]
#[command(about = "Business analytics dashboard over synthetic sales data", long_about = None)]
struct Cli {
    /// SQLite database file (falls back to DASHBOARD_DB, then analytics.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Regenerate sample data, then serve the dashboard and API
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        #[arg(long, default_value_t = 8002)]
        port: u16,
        /// Sales rows to generate on startup; 0 keeps the existing dataset
        #[arg(long, default_value_t = 1000)]
        records: usize,
        /// Fix the RNG seed for reproducible datasets
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value = "static")]
        static_dir: PathBuf,
    },
    /// Create the database schema
    InitDb,
    /// Regenerate the sample dataset without serving
    Seed {
        #[arg(long, default_value_t = 1000)]
        records: usize,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Write a CSV export (or the full Excel workbook) to disk
    Export {
        /// sales, products, regions, or excel for the whole workbook
        #[arg(long)]
        table: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let db_path = cli
        .db
        .or_else(|| std::env::var("DASHBOARD_DB").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("analytics.db"));

    let pool = connect(&db_path)
        .await
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;
    db::init_db(&pool).await?;

    match cli.command {
        Commands::Serve {
            host,
            port,
            records,
            seed,
            static_dir,
        } => {
            if records > 0 {
                let dataset = generator::sample_dataset(records, Utc::now().date_naive(), seed);
                db::rebuild(&pool, &dataset).await?;
                tracing::info!(records, "sample dataset regenerated");
            }

            let app = api::router(api::AppState { pool, static_dir });
            let addr: SocketAddr = format!("{host}:{port}")
                .parse()
                .context("invalid listen address")?;
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("failed to bind {addr}"))?;

            tracing::info!(%addr, "dashboard listening");
            axum::serve(listener, app).await.context("server error")?;
        }
        Commands::InitDb => {
            println!("Schema ready.");
        }
        Commands::Seed { records, seed } => {
            let dataset = generator::sample_dataset(records, Utc::now().date_naive(), seed);
            db::rebuild(&pool, &dataset).await?;
            println!("Generated {records} sales records.");
        }
        Commands::Export { table, out } => {
            let now = Utc::now();
            let (bytes, default_name) = match table.as_str() {
                "sales" => (
                    export::to_csv(&db::fetch_sales(&pool, None, None, None, None).await?)?,
                    export::export_filename("sales", "csv", now),
                ),
                "products" => (
                    export::to_csv(&db::fetch_products(&pool).await?)?,
                    export::export_filename("products", "csv", now),
                ),
                "regions" => (
                    export::to_csv(&db::fetch_regions(&pool).await?)?,
                    export::export_filename("regions", "csv", now),
                ),
                "excel" => {
                    let sales = db::fetch_sales(&pool, None, None, None, None).await?;
                    let products = db::fetch_products(&pool).await?;
                    let regions = db::fetch_regions(&pool).await?;
                    let summary = analytics::summarize(&sales, now.date_naive());
                    (
                        export::to_xlsx(&sales, &products, &regions, &summary.metrics)?,
                        export::export_filename("analytics", "xlsx", now),
                    )
                }
                other => anyhow::bail!("unknown export table: {other}"),
            };

            let out = out.unwrap_or_else(|| PathBuf::from(default_name));
            std::fs::write(&out, bytes)?;
            println!("Export written to {}.", out.display());
        }
    }

    Ok(())
}

async fn connect(path: &Path) -> sqlx::Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}
