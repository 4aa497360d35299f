mod config;
mod maintain_cmd;
mod serve;
mod user_cmd;

#[cfg(test)]
mod test_util;

use clap::{Parser, Subcommand};

use quiver_db::{pool, schema};

use config::QuiverConfig;

#[derive(Parser)]
#[command(name = "quiver", about = "Archery training plan service")]
struct Cli {
    /// Database URL (overrides QUIVER_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a quiver config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/quiver")]
        db_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the quiver database (requires config file or env vars)
    DbInit,
    /// Run the HTTP API server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 8080)]
        port: u16,
        /// Seconds between retention sweeps (0 disables the background sweep)
        #[arg(long, default_value_t = 3600)]
        sweep_interval_secs: u64,
    },
    /// Run the retention sweeps once and exit
    Maintain {
        /// Days a student may stay inactive before being purged
        #[arg(long, default_value_t = quiver_core::retention::INACTIVE_PURGE_DAYS)]
        inactive_days: i64,
    },
    /// User account management
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Add a user account
    Add {
        /// Unique login name
        username: String,
        /// Password for the new account
        #[arg(long)]
        password: String,
        /// Role: admin, coach or archer
        #[arg(long, default_value = "coach")]
        role: String,
    },
    /// List user accounts
    List,
}

/// Execute the `quiver init` command: write config file.
fn cmd_init(db_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let token_secret = config::generate_token_secret();

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        auth: config::AuthSection {
            token_secret: token_secret.clone(),
        },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!(
        "  auth.token_secret = {}...{}",
        &token_secret[..8],
        &token_secret[56..]
    );
    println!();
    println!("Next: run `quiver db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `quiver db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = QuiverConfig::resolve(cli_db_url)?;

    println!("Initializing quiver database...");

    // 1. Create the database if it does not exist.
    pool::ensure_database_exists(&resolved.db_config).await?;

    // 2. Connect to the target database.
    let db_pool = pool::create_pool(&resolved.db_config).await?;

    // 3. Run migrations, then the column-level guard for pre-migration
    //    databases.
    pool::run_migrations(&db_pool).await?;
    schema::ensure_retention_schema(&db_pool).await?;

    // 4. Print success with table counts.
    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    // 5. Clean shutdown.
    db_pool.close().await;

    println!("quiver db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { db_url, force } => {
            cmd_init(&db_url, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Serve {
            bind,
            port,
            sweep_interval_secs,
        } => {
            let resolved = QuiverConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            // The guard is fatal on failure: the server must never run
            // against a store missing the retention columns.
            schema::ensure_retention_schema(&db_pool).await?;
            let result = serve::run_serve(
                db_pool.clone(),
                resolved.token_config,
                &bind,
                port,
                sweep_interval_secs,
            )
            .await;
            db_pool.close().await;
            result?;
        }
        Commands::Maintain { inactive_days } => {
            let resolved = QuiverConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = maintain_cmd::run_maintain(&db_pool, inactive_days).await;
            db_pool.close().await;
            result?;
        }
        Commands::User { command } => {
            let resolved = QuiverConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = user_cmd::run_user_command(command, &db_pool).await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}
