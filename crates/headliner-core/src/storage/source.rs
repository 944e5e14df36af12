use async_trait::async_trait;

use super::database::{release, Database};
use super::news_repo::NewsRepository;
use crate::config::DatabaseConfig;
use crate::error::FetchError;
use crate::news::NewsItem;
use crate::Result;

/// Anything that can produce the latest ranked headlines
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch_latest_news(&self) -> std::result::Result<Vec<NewsItem>, FetchError>;
}

/// News source backed by the scraped headlines table
pub struct SqlNewsSource {
    db: Database,
    table: String,
    general_sites: Vec<String>,
    sports_sites: Vec<String>,
}

impl SqlNewsSource {
    pub fn new(config: &DatabaseConfig) -> Result<Self> {
        Ok(Self::with_database(Database::new(config)?, config))
    }

    pub fn with_database(db: Database, config: &DatabaseConfig) -> Self {
        Self {
            db,
            table: config.table.clone(),
            general_sites: config.general_sites.clone(),
            sports_sites: config.sports_sites.clone(),
        }
    }
}

#[async_trait]
impl NewsSource for SqlNewsSource {
    async fn fetch_latest_news(&self) -> std::result::Result<Vec<NewsItem>, FetchError> {
        let mut conn = self.db.connect().await.map_err(|e| {
            tracing::error!("{}", e);
            e
        })?;

        let result = NewsRepository::new(&mut conn, &self.table)
            .latest(&self.general_sites, &self.sports_sites)
            .await;

        release(conn).await;

        match result {
            Ok(items) => {
                tracing::info!("Fetched {} headlines", items.len());
                Ok(items)
            }
            Err(e) => {
                tracing::error!("News query failed: {}", e);
                Err(FetchError::QueryFailed(e.to_string()))
            }
        }
    }
}
