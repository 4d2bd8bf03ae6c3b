//! Business logic services

pub mod assets;
pub mod assistant;
pub mod batch;
pub mod enrichment;
pub mod imports;
pub mod lifecycle;
pub mod retry;
pub mod users;

use crate::{config::AppConfig, error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub assets: assets::AssetService,
    pub imports: imports::ImportService,
    pub assistant: assistant::AssistantService,
    pub users: users::UsersService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> AppResult<Self> {
        let client = enrichment::EnrichmentClient::from_config(&config.enrichment)?;
        if client.is_none() {
            tracing::warn!("No completion endpoint configured, AI enrichment disabled");
        }
        Ok(Self::with_client(repository, config, client))
    }

    /// Services around an explicit enrichment client, or none
    pub fn with_client(
        repository: Repository,
        config: &AppConfig,
        client: Option<enrichment::EnrichmentClient>,
    ) -> Self {
        let enricher = client
            .clone()
            .map(|c| batch::BatchEnricher::new(c, config.enrichment.batch_size));

        Self {
            assets: assets::AssetService::new(
                repository.assets.clone(),
                config.lifecycle.operation_timeout(),
            ),
            imports: imports::ImportService::new(
                repository.assets.clone(),
                enricher,
                config.import.max_persisted,
            ),
            assistant: assistant::AssistantService::new(client),
            users: users::UsersService::new(repository.users),
        }
    }
}
