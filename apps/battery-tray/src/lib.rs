//! Battery tray application: configuration, capacity export, the GTK tray
//! front end and the installer.

#[cfg(target_os = "linux")]
pub mod app;
pub mod config;
pub mod export;
#[cfg(unix)]
pub mod install;

use tracing_subscriber::EnvFilter;

/// Name of the tray executable, as installed and autostarted.
pub const BINARY_NAME: &str = "battery-tray";

/// Initializes structured logging (`RUST_LOG` overrides the `info` default).
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}
