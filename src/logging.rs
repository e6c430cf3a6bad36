use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Installs the global subscriber once. `RUST_LOG` wins over `default_level`.
pub fn init(default_level: &str) {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        let installed = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init();
        if let Err(err) = installed {
            eprintln!("avatar-studio: logging already initialised: {err}");
        }
    });
}

pub fn level_for(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}
