pub mod check_result;
pub mod committee;
pub mod distribution;
pub mod keys;
pub mod project;
pub mod release;
pub mod release_policy;
pub mod revision;
pub mod task;
pub mod text_value;

pub use check_result::{CheckResult, CheckResultIgnore, CheckResultIgnoreStatus, CheckResultStatus};
pub use committee::Committee;
pub use distribution::{Distribution, DistributionPlatform};
pub use keys::{PersonalAccessToken, PublicSigningKey, SshKey, WorkflowSshKey};
pub use project::{Project, ProjectStatus};
pub use release::{Release, ReleasePhase};
pub use release_policy::{LicenseCheckMode, ReleasePolicy};
pub use revision::Revision;
pub use task::{Task, TaskStatus, TaskType};
pub use text_value::{RevisionCounter, TextValue};
