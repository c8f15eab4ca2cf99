//! Entry-point: loads settings, prepares persistence and serves the social API.

mod server;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr, eyre};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use checkin_social::inbound::http::health::HealthState;
use checkin_social::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use server::{ServerConfig, ServerSettings, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ServerSettings::load_from_iter(std::env::args_os())
        .map_err(|err| eyre!("failed to load settings: {err}"))?;

    let mut config = ServerConfig::new(
        settings.session_key()?,
        settings.cookie_secure(),
        settings.same_site()?,
        settings.bind_addr()?,
    );

    if let Some(database_url) = settings.database_url.as_deref() {
        run_pending_migrations(database_url)
            .await
            .wrap_err("database migration failed")?;
        let pool =
            DbPool::new(PoolConfig::new(database_url).with_max_size(settings.pool_max_size()))
                .await
                .wrap_err("failed to build database pool")?;
        config = config.with_db_pool(pool);
    }

    let bind_addr = config.bind_addr();
    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    info!(%bind_addr, "listening");
    server.await?;
    Ok(())
}
