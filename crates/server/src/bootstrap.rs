use std::sync::Arc;

use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::{info, warn};

use tally_core::config::{AppConfig, ConfigError, LoadOptions};
use tally_core::dialogue::{Collaborators, Dialogue, ResponseCatalog};
use tally_db::{
    connect, migrations, DbPool, SqlAccountDirectory, SqlExpenseLedger, SqlSessionCache,
};
use tally_nlp::{NlpClient, NlpError};
use tally_telegram::TelegramClient;

use crate::webhook::WebhookState;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub dialogue: Arc<Dialogue>,
    pub telegram: TelegramClient,
    pub nlp: NlpClient,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("nlp client setup failed: {0}")]
    Nlp(#[source] NlpError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let deps = Collaborators {
        cache: Arc::new(SqlSessionCache::new(db_pool.clone())),
        users: Arc::new(SqlAccountDirectory::new(db_pool.clone())),
        ledger: Arc::new(SqlExpenseLedger::new(db_pool.clone())),
        catalog: ResponseCatalog::default(),
    };

    let telegram = TelegramClient::new(&config.telegram);
    let nlp = NlpClient::new(&config.nlp).map_err(BootstrapError::Nlp)?;

    Ok(Application { config, db_pool, dialogue: Arc::new(Dialogue::new(deps)), telegram, nlp })
}

impl Application {
    pub fn webhook_state(&self) -> WebhookState {
        WebhookState::new(
            Arc::clone(&self.dialogue),
            self.telegram.clone(),
            self.nlp.clone(),
            self.config.telegram.bot_token.expose_secret().to_string(),
        )
    }

    /// Best-effort webhook registration: a failure is logged and the server
    /// still comes up, since the webhook can be pointed at the bot manually.
    pub async fn register_webhook(&self, domain: &str) {
        let url = format!(
            "{}/telegram/{}",
            domain.trim_end_matches('/'),
            self.config.telegram.bot_token.expose_secret()
        );
        match self.telegram.set_webhook(&url).await {
            Ok(()) => info!(
                event_name = "system.bootstrap.webhook_registered",
                "telegram webhook registered"
            ),
            Err(error) => warn!(
                event_name = "system.bootstrap.webhook_failed",
                error = %error,
                "telegram webhook registration failed"
            ),
        }
    }
}
