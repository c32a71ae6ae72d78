//! Database wiring and sea-orm-backed store adapters for the decision engine.

mod catalog;
mod grants;

use sea_orm::{Database, DatabaseConnection};
use thiserror::Error;

pub use catalog::SeaOrmCatalog;
pub use grants::{GrantService, GrantServiceError};

/// Shared connection handle alias.
pub type DbPool = DatabaseConnection;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database url missing from environment")]
    MissingUrl,
    #[error(transparent)]
    Connect(#[from] sea_orm::DbErr),
}

/// Environment-driven connection settings.
#[derive(Clone, Debug)]
pub struct DatabaseSettings {
    env_key: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            env_key: "DATABASE_URL".to_string(),
        }
    }
}

impl DatabaseSettings {
    pub fn from_env() -> Self {
        Self::default()
    }

    pub fn new(env_key: impl Into<String>) -> Self {
        Self {
            env_key: env_key.into(),
        }
    }

    pub fn database_url(&self) -> Result<String, DbError> {
        std::env::var(&self.env_key).map_err(|_| DbError::MissingUrl)
    }
}

pub async fn connect(settings: &DatabaseSettings) -> Result<DbPool, DbError> {
    let url = settings.database_url()?;
    Ok(Database::connect(url).await?)
}
