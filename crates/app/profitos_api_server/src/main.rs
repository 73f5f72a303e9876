//! ProfitOS API server binary.
//!
//! `serve` (the default) runs migrations when a database is configured and
//! listens until Ctrl-C. `migrate`, `seed` and `purge-tokens` are one-shot
//! maintenance commands.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use profitos_api::AppState;
use profitos_api::config::ApiConfig;
use profitos_core::auth::queries::PgAuthRepository;
use profitos_core::auth::{SessionManager, seed_user};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info,profitos_api=debug,profitos_core=debug";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser, Debug)]
#[command(name = "profitos_api_server", about = "ProfitOS API server", version)]
struct Args {
    /// Port to listen on.
    #[arg(
        long,
        global = true,
        env = "PORT",
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    port: Option<u16>,

    /// PostgreSQL connection URL.
    #[arg(long, global = true, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Run the HTTP server.
    Serve,
    /// Apply pending database migrations and exit.
    Migrate,
    /// Create a development user if the email is not taken.
    Seed {
        #[arg(long, default_value = "test@gmail.com")]
        email: String,
        #[arg(long, default_value = "test")]
        password: String,
    },
    /// Delete expired refresh tokens.
    PurgeTokens,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env()?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(url) = args.database_url {
        config.database_url = Some(url);
    }

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Migrate => {
            let pool = connect_required(&config).await?;
            profitos_api::migrate(&pool).await?;
            info!("migrations applied");
            Ok(())
        }
        Command::Seed { email, password } => {
            let pool = connect_required(&config).await?;
            profitos_api::migrate(&pool).await?;
            let repo = PgAuthRepository::new(pool);
            if seed_user(&repo, &email, &password).await? {
                info!(%email, "seed user created");
            } else {
                info!(%email, "seed user already exists");
            }
            Ok(())
        }
        Command::PurgeTokens => {
            let pool = connect_required(&config).await?;
            let sessions =
                SessionManager::new(Arc::new(PgAuthRepository::new(pool)), None, config.ttls);
            sessions.purge_expired_refresh_tokens().await?;
            Ok(())
        }
    }
}

async fn serve(config: ApiConfig) -> Result<(), BoxError> {
    info!(addr = %config.bind_addr(), "starting profitos_api_server");

    let pool = match &config.database_url {
        Some(url) => {
            let pool = connect(url, config.db_max_connections).await?;
            info!("running database migrations");
            profitos_api::migrate(&pool).await?;
            Some(pool)
        }
        None => {
            warn!("DATABASE_URL not set; running without a database");
            None
        }
    };
    if config.jwt_secret.is_none() {
        warn!("JWT_SECRET not set; auth routes disabled");
    }

    let bind_addr = config.bind_addr();
    let state = AppState::new(config, pool)?;
    let app = profitos_api::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    info!(max_connections, "configuring connection pool");
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(url)
        .await
}

async fn connect_required(config: &ApiConfig) -> Result<PgPool, BoxError> {
    let url = config
        .database_url
        .as_deref()
        .ok_or("DATABASE_URL is required for this command")?;
    Ok(connect(url, config.db_max_connections).await?)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
