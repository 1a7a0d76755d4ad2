// Public modules
pub mod config;
pub mod domains;
pub mod errors;
pub mod ffi;
pub mod types;
pub mod validation;

pub use config::TableConfig;
pub use domains::table::{TableSession, TableSnapshot};

/// Sets up `env_logger` once per process. `RUST_LOG` defaults to `debug` in
/// debug builds and `info` in release builds.
pub fn initialize_logging() {
    let default_level = if cfg!(debug_assertions) { "debug" } else { "info" };
    let env = env_logger::Env::default().default_filter_or(default_level);

    // Already initialized is fine
    let _ = env_logger::Builder::from_env(env).try_init();
    log::debug!("Logging initialized");
}
