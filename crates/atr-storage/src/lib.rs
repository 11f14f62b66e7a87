//! The content store: the POSIX directory tree that holds release
//! artifacts outside the database, plus the primitives (atomic write,
//! atomic rename, hard-link cloning, a release-scoped write lock, and
//! chunked content hashing) that every higher layer composes.

pub mod atomic;
pub mod hash;
pub mod layout;
pub mod lock;

pub use atomic::{clone_tree_hardlinked, clone_tree_hardlinked_dry_run, remove_tree, rename_atomic, write_file_atomic};
pub use hash::hash_file;
pub use layout::ContentStore;
pub use lock::{acquire as acquire_release_lock, LockError, ReleaseLock};
