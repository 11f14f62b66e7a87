//! The transactional metadata store: committees, projects, releases,
//! revisions, tasks, check results, keys, distributions, and the
//! namespaced text-value table used for small bits of state that don't
//! warrant their own schema.

pub mod entities;
pub mod migrations;
pub mod queries;
pub mod session;

pub use entities::*;
pub use migrations::run_migrations;
pub use queries::{
    CheckResultQuery, CommitteeQuery, ProjectQuery, ReleaseQuery, RevisionQuery, TaskQuery,
};
pub use session::{connect, Session};
