//! Startup configuration: discovery, parsing, and the immutable
//! [`AppConfig`] struct passed by reference throughout the engine.

mod discovery;
mod loader;
mod model;
mod secrets;

pub use discovery::discover_config_path;
pub use loader::{load, load_from_path};
pub use model::{AppConfig, RawConfig};
pub use secrets::generate_secret;
