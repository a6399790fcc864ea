//! Logging bootstrap over the standard `log` facade.
//!
//! Configure once at startup; everything else uses the standard macros
//! (`log::info!`, `log::warn!`, ...). Safe to call more than once.

use std::sync::Once;

use crate::config::LoggingSettings;

static INIT: Once = Once::new();

/// Initialize logging from settings. `RUST_LOG` still wins when set, so
/// operators keep their usual escape hatch.
pub fn init(settings: &LoggingSettings) {
    let level = settings.level.clone();
    INIT.call_once(move || {
        let env = env_logger::Env::default().default_filter_or(level);
        env_logger::Builder::from_env(env).init();
    });
}

/// Initialize with an explicit level, ignoring settings.
pub fn init_with_level(level: &str) {
    init(&LoggingSettings { level: level.to_string() });
}
