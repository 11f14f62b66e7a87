//! Trait seams for the external systems a handful of task handlers call
//! out to. None of the concrete integrations (SMTP, SVN/rsync ingest, an
//! external metadata registry, a distribution publishing pipeline, key
//! server import) are implemented here — that is out of scope per the
//! purpose-and-scope non-goals — but the handlers that would call them are
//! fully exercisable against a test double.

use async_trait::async_trait;
use atr_core::EngineResult;
use serde_json::Value;

/// Sends a message to a mailing list thread (or starts a new one) and
/// returns the thread/message id the release row should remember.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, to: &[String], subject: &str, body: &str) -> EngineResult<String>;
}

/// Imports a set of already-staged files into the project's SVN
/// distribution area.
#[async_trait]
pub trait SvnImporter: Send + Sync {
    async fn import_files(&self, project_name: &str, version_name: &str, rel_paths: &[String]) -> EngineResult<()>;
}

/// Refreshes project metadata (e.g. committee roster, PMC chair) from an
/// external directory.
#[async_trait]
pub trait MetadataRefresher: Send + Sync {
    async fn refresh(&self, project_name: &str) -> EngineResult<Value>;
}

/// Publishes a finished release to an external distribution platform
/// (e.g. a package index mirror).
#[async_trait]
pub trait DistributionPublisher: Send + Sync {
    async fn publish(&self, release_name: &str, platform: &str) -> EngineResult<Value>;
}

/// Imports an uploaded OpenPGP public key file into the keys store.
#[async_trait]
pub trait KeyImporter: Send + Sync {
    async fn import_file(&self, asf_uid: &str, key_text: &str) -> EngineResult<Value>;
}

/// The full set of external collaborators a worker is configured with.
/// Each is optional: a deployment that has not wired one simply fails any
/// task that needs it with [`atr_core::EngineError::External`].
#[derive(Default)]
pub struct Collaborators {
    pub message_sender: Option<std::sync::Arc<dyn MessageSender>>,
    pub svn_importer: Option<std::sync::Arc<dyn SvnImporter>>,
    pub metadata_refresher: Option<std::sync::Arc<dyn MetadataRefresher>>,
    pub distribution_publisher: Option<std::sync::Arc<dyn DistributionPublisher>>,
    pub key_importer: Option<std::sync::Arc<dyn KeyImporter>>,
}
