use std::sync::Arc;

use shared::{build_provider, db, Relay};
use sqlx::PgPool;
use tracing::info;

use super::config::ServerConfig;

pub struct State {
    pub config: ServerConfig,
    pub db_pool: PgPool,
    pub relay: Relay,
}

impl State {
    pub async fn new(config: ServerConfig) -> shared::Result<Arc<Self>> {
        let db_pool = db::create_pool(&config.database_url).await?;
        db::ensure_schema(&db_pool).await?;

        let provider = build_provider(&config.provider).await?;
        info!("Using generation provider: {}", provider.name());

        tokio::fs::create_dir_all(&config.upload_dir)
            .await
            .map_err(|e| shared::Error::Config(format!("Cannot create upload dir: {e}")))?;

        Ok(Arc::new(Self {
            config,
            db_pool,
            relay: Relay::new(provider),
        }))
    }
}
