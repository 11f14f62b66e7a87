//! Process bootstrap: load configuration, open the metadata store, and lay
//! out the content store skeleton. Both the worker binary and integration
//! tests share this so there is exactly one way to stand the engine up.

use atr_config::AppConfig;
use atr_core::EngineResult;
use atr_storage::ContentStore;
use sqlx::SqlitePool;

/// The running engine's shared handles. Cheap to clone: `SqlitePool` and
/// `ContentStore` are themselves handle types over a connection pool and a
/// path respectively.
#[derive(Clone)]
pub struct Engine {
    pub config: AppConfig,
    pub pool: SqlitePool,
    pub store: ContentStore,
}

impl Engine {
    /// Loads configuration via the standard discovery order, opens (and
    /// migrates) the metadata store, and ensures the content store's
    /// directory skeleton exists.
    pub async fn bootstrap() -> EngineResult<Self> {
        let config = atr_config::load()?;
        Self::bootstrap_with_config(config).await
    }

    pub async fn bootstrap_with_config(config: AppConfig) -> EngineResult<Self> {
        std::fs::create_dir_all(&config.state_dir)?;

        let pool = atr_db::connect(config.database_path().as_str()).await?;
        atr_db::run_migrations(&pool).await?;

        let store = ContentStore::new(config.state_dir.clone());
        store.ensure_skeleton()?;

        Ok(Self { config, pool, store })
    }

    /// Runs the task executor's claim loop once to its lifetime bound,
    /// with no external collaborators wired and the checker registry
    /// empty. A deployment that needs signature verification, RAT
    /// scanning, SBOM scoring, SVN import, or mail delivery constructs its
    /// own [`atr_tasks::collaborators::Collaborators`] and
    /// [`atr_tasks::dispatch::CheckerRegistry`] and calls
    /// [`atr_tasks::worker::run_loop`] directly instead.
    pub async fn run_worker_once(&self) -> EngineResult<usize> {
        let checkers = atr_tasks::dispatch::CheckerRegistry::new();
        let collaborators = atr_tasks::collaborators::Collaborators::default();
        atr_tasks::worker::run_loop(&self.pool, &self.store, &checkers, &collaborators).await
    }
}
