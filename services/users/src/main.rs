use anyhow::Result;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use common::database;
use users::{config::Settings, registry::ModelRegistry, store::PgUserStore};

static REGISTRY: ModelRegistry<PgUserStore> = ModelRegistry::new();

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::from_env()?;

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_new(&settings.log_level)?)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting user document service");

    // Initialize database connection pool
    let db_config = database::DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    let user_model = REGISTRY.user_model(|| PgUserStore::new(pool.clone()));

    if settings.sync_indexes {
        user_model.store().sync_indexes().await?;
    }

    let count = user_model.count().await?;
    info!("User model ready: {} documents", count);

    Ok(())
}
