//! Logging utilities
//!
//! The engine logs through the `log` facade; `env_logger` is the backend.
//! `RUST_LOG` always wins over the level passed to [`init_with_level`].

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system from `RUST_LOG`
pub fn init() {
    env_logger::init();
}

/// Initialize logging with a default filter such as `"info"` or `"retro_engine=debug"`.
///
/// Calling this twice is harmless; the second call is ignored.
pub fn init_with_level(default_filter: &str) {
    let env = env_logger::Env::default().default_filter_or(default_filter);
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("logger already initialized");
    }
}
