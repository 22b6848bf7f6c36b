//! Wiring shared by the commands: config, snapshot store, cache, manager.

use std::sync::Arc;

use arbor_cache::FileCache;
use arbor_config::{CliSettings, Config};
use arbor_pages::{CACHE_FORMAT_VERSION, PageManager, PagesConfig, RouteTable};
use arbor_storage::{FileSystem, FsGateway, Language, MemoryStore, PageStore};

use super::GlobalArgs;
use crate::error::CliError;

/// An opened site for one command run.
pub(super) struct Site {
    pub(super) config: Config,
    pub(super) language: Language,
    pub(super) pages: PageManager,
    store: Arc<MemoryStore>,
    fs: Arc<dyn FileSystem>,
}

impl Site {
    /// Load config and the store snapshot, and wire up the page manager.
    pub(super) fn open(global: &GlobalArgs) -> Result<Self, CliError> {
        let cli_settings = CliSettings {
            snapshot: global.snapshot.clone(),
            cache_dir: global.cache_dir.clone(),
            language: global.language.clone(),
        };
        let config = Config::load(global.config.as_deref(), Some(&cli_settings))?;
        let language = Language::new(config.resolved.default_language.clone())?;

        let fs: Arc<dyn FileSystem> = Arc::new(FsGateway::new());
        let store = Arc::new(MemoryStore::load(fs.as_ref(), &config.resolved.snapshot)?);
        let cache = Arc::new(FileCache::new(
            Arc::clone(&fs),
            config.resolved.cache_dir.clone(),
            CACHE_FORMAT_VERSION,
        ));
        let pages_config = PagesConfig {
            max_revisions: config.pages.max_revisions,
            max_url_attempts: config.pages.max_url_attempts,
            web_root: config.resolved.web_root.clone(),
            multi_language: config.resolved.multi_language,
        };
        let pages = PageManager::new(
            Arc::clone(&store) as Arc<dyn PageStore>,
            cache,
            Arc::clone(&fs),
            RouteTable::new(&config.routes.paths),
            pages_config,
        );

        tracing::debug!(
            snapshot = %config.resolved.snapshot.display(),
            cache_dir = %config.resolved.cache_dir.display(),
            language = %language,
            "site opened"
        );
        Ok(Self {
            config,
            language,
            pages,
            store,
            fs,
        })
    }

    /// Every configured language.
    pub(super) fn languages(&self) -> Result<Vec<Language>, CliError> {
        self.config
            .resolved
            .languages
            .iter()
            .map(|code| Language::new(code.clone()).map_err(CliError::from))
            .collect()
    }

    /// Write the store snapshot back after a mutation.
    pub(super) fn save(&self) -> Result<(), CliError> {
        self.store
            .save(self.fs.as_ref(), &self.config.resolved.snapshot)?;
        tracing::debug!(snapshot = %self.config.resolved.snapshot.display(), "snapshot saved");
        Ok(())
    }
}
