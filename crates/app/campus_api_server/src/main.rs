//! Campus API server binary.
//!
//! Reads configuration from the environment (and `.env`), applies
//! command-line overrides, runs migrations, then serves the REST API.

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "campus_api_server", about = "Campus API server")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:3100")]
    bind: String,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/campus"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 10)]
    max_connections: u32,

    /// Keycloak base URL.
    #[arg(long, env = "KEYCLOAK_SERVER_URL")]
    keycloak_url: Option<String>,

    /// Keycloak realm.
    #[arg(long, env = "KEYCLOAK_REALM")]
    keycloak_realm: Option<String>,

    /// Verify token signatures against `KEYCLOAK_PUBLIC_KEY`.
    #[arg(long, default_value_t = false)]
    verify_signature: bool,

    /// Skip database migrations at startup.
    #[arg(long, default_value_t = false)]
    no_migrate: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,campus_api=debug,campus_core=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    let mut config = campus_api::config::ApiConfig::from_env();
    config.bind_addr = args.bind;
    config.pg_connection_url = args.database_url;
    if let Some(url) = args.keycloak_url {
        config.identity.server_url = url;
    }
    if let Some(realm) = args.keycloak_realm {
        config.identity.realm = realm;
    }
    config.identity.verify_signature |= args.verify_signature;

    info!(
        version = campus_core::version(),
        bind = %config.bind_addr,
        userinfo = %config.identity.userinfo_url(),
        "starting campus_api_server"
    );

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&config.pg_connection_url)
        .await?;

    if args.no_migrate {
        info!("skipping database migrations");
    } else {
        info!("running database migrations");
        campus_api::migrate(&pool).await?;
    }

    let state = campus_api::AppState::new(pool, config.clone())?;
    let app = campus_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app).await?;

    Ok(())
}
