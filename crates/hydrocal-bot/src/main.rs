//! Hydrocal: a Telegram bot that tracks daily water, food calories, and
//! workouts against personalized goals.

mod bot;
mod chart;
mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hydrocal_store::Database;

use crate::bot::Bot;
use crate::config::load_bot_config;

#[derive(Parser)]
#[command(name = "hydrocal", version, about = "Water and calorie tracking Telegram bot")]
struct Cli {
    /// Path to the SQLite database file.
    #[arg(long, global = true, default_value = "data/hydrocal.db")]
    db: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the bot and poll Telegram for updates.
    Run,
    /// Create the database and apply migrations, then exit.
    Setup,
    /// Print database statistics.
    Status,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present; secrets may also come from the real env.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Run => cmd_run(cli.db).await,
        Command::Setup => cmd_setup(cli.db).await,
        Command::Status => cmd_status(cli.db).await,
    }
}

async fn open_database(path: String) -> Result<Database> {
    if let Some(parent) = std::path::Path::new(&path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create database directory {}", parent.display()))?;
    }
    let db = Database::open_and_migrate(path).await?;
    Ok(db)
}

async fn cmd_run(db_path: String) -> Result<()> {
    let db = open_database(db_path).await?;
    let config = load_bot_config();
    let bot = Bot::from_env(db, config)?;
    bot.run().await
}

async fn cmd_setup(db_path: String) -> Result<()> {
    let db = open_database(db_path.clone()).await?;
    drop(db);
    println!("database ready at {db_path}");
    Ok(())
}

async fn cmd_status(db_path: String) -> Result<()> {
    let db = open_database(db_path).await?;

    let (users, profiles, snapshots) = db
        .execute(|conn| {
            let users: i64 =
                conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
            let profiles: i64 = conn.query_row(
                "SELECT COUNT(*) FROM users WHERE water_goal > 0 AND calorie_goal > 0",
                [],
                |row| row.get(0),
            )?;
            let snapshots: i64 =
                conn.query_row("SELECT COUNT(*) FROM user_history", [], |row| row.get(0))?;
            Ok((users, profiles, snapshots))
        })
        .await?;

    println!("users:             {users}");
    println!("complete profiles: {profiles}");
    println!("history snapshots: {snapshots}");
    Ok(())
}
