//! Taskgen logging wiring.
//!
//! Thin log4rs setup used by binaries and long-running generators; library
//! code only ever emits through the `log` facade.

use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    config::{Appender, Config, Root},
    filter::threshold::ThresholdFilter,
};
use std::sync::Once;

// Re-export log to provide users with a consistent interface
pub use log::{debug, error, info, trace, warn, Level};

static INIT: Once = Once::new();

/// Initializes the logging subsystem with default configuration: a console
/// appender at `Info`. Safe to call more than once; only the first call
/// takes effect.
pub fn init_logging() {
    init_logging_with_level(LevelFilter::Info)
}

pub fn init_logging_with_level(level: LevelFilter) {
    INIT.call_once(|| {
        let stdout = ConsoleAppender::builder().target(Target::Stdout).build();

        let config = Config::builder()
            .appender(
                Appender::builder()
                    .filter(Box::new(ThresholdFilter::new(level)))
                    .build("stdout", Box::new(stdout)),
            )
            .build(Root::builder().appender("stdout").build(level));

        match config {
            Ok(config) => match log4rs::init_config(config) {
                Ok(_) => log::info!("Taskgen logging initialized"),
                Err(e) => eprintln!("Failed to initialize taskgen logging: {}", e),
            },
            Err(e) => eprintln!("Failed to build taskgen logging config: {}", e),
        }
    });
}

/// Initializes logging from a log4rs YAML configuration file.
pub fn init_logging_from_file(config_path: &str) -> Result<(), String> {
    let mut result = Ok(());
    INIT.call_once(
        || match log4rs::init_file(config_path, Default::default()) {
            Ok(_) => log::info!("Taskgen logging initialized from {}", config_path),
            Err(e) => result = Err(format!("Failed to initialize logging: {}", e)),
        },
    );
    result
}
