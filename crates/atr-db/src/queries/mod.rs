pub mod check_result;
pub mod committee;
pub mod project;
pub mod release;
pub mod revision;
pub mod task;

pub use check_result::CheckResultQuery;
pub use committee::CommitteeQuery;
pub use project::ProjectQuery;
pub use release::ReleaseQuery;
pub use revision::RevisionQuery;
pub use task::TaskQuery;
