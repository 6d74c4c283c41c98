//! Composition root: wires the file stores, providers, and use cases.

use anyhow::{Context, Result};
use proofing_application::{
    GalleryLoader, OperatorUseCase, OutboxWorker, SelectionEventBus, SelectionUseCase,
    SessionCache,
};
use proofing_core::config::ProofingConfig;
use proofing_core::gallery::FileListingProvider;
use proofing_infrastructure::{
    ConfigService, HttpEmailDispatcher, HttpFileListingProvider, LocalDirectoryProvider,
    ProofingPaths, TomlOutboxRepository, TomlSelectionSessionRepository,
};
use std::path::PathBuf;
use std::sync::Arc;

pub struct AppContext {
    pub paths: ProofingPaths,
    pub config_path: PathBuf,
    pub config: ProofingConfig,
    pub repository: Arc<TomlSelectionSessionRepository>,
    pub outbox: Arc<TomlOutboxRepository>,
    pub cache: Arc<SessionCache>,
    pub events: SelectionEventBus,
}

impl AppContext {
    pub fn load(data_dir: Option<PathBuf>) -> Result<Self> {
        let paths = match data_dir {
            Some(dir) => ProofingPaths::with_base(dir),
            None => ProofingPaths::new(),
        };

        let config_service =
            ConfigService::new(&paths).context("Failed to resolve configuration path")?;
        let config = config_service.get_config();

        let repository = TomlSelectionSessionRepository::new(paths.sessions_dir()?)
            .context("Failed to open session store")?;
        let outbox =
            TomlOutboxRepository::new(paths.outbox_dir()?).context("Failed to open outbox")?;

        Ok(Self {
            config_path: config_service.path().clone(),
            paths,
            config,
            repository: Arc::new(repository),
            outbox: Arc::new(outbox),
            cache: Arc::new(SessionCache::new()),
            events: SelectionEventBus::new(),
        })
    }

    pub fn operator(&self) -> OperatorUseCase {
        OperatorUseCase::new(
            self.repository.clone(),
            self.cache.clone(),
            self.events.clone(),
            self.config.access_token_length,
        )
    }

    pub fn selection(&self) -> SelectionUseCase {
        SelectionUseCase::new(
            self.repository.clone(),
            self.outbox.clone(),
            self.cache.clone(),
            self.events.clone(),
            self.config.autosave_interval(),
        )
    }

    /// The configured listing API, or photos under `<data_dir>/photos` when
    /// no API is set up.
    pub fn provider(&self) -> Result<Arc<dyn FileListingProvider>> {
        if self.config.storage.is_configured() {
            let provider = HttpFileListingProvider::new(self.config.storage.clone())?;
            return Ok(Arc::new(provider));
        }
        let root = self.paths.data_dir()?.join("photos");
        tracing::debug!(root = %root.display(), "Using local directory provider");
        Ok(Arc::new(LocalDirectoryProvider::new(root)))
    }

    pub fn gallery(&self) -> Result<GalleryLoader> {
        Ok(GalleryLoader::new(self.provider()?))
    }

    pub fn outbox_worker(&self) -> Result<OutboxWorker> {
        let dispatcher = HttpEmailDispatcher::new(self.config.email.clone())?;
        Ok(OutboxWorker::new(
            self.outbox.clone(),
            Arc::new(dispatcher),
            self.config.outbox_max_attempts,
            self.config.outbox_poll_interval(),
        ))
    }
}
