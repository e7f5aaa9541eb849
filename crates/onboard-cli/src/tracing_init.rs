use tracing_subscriber::{filter::LevelFilter, EnvFilter};

pub(crate) fn default_level(debug: bool) -> LevelFilter {
    if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    }
}

/// Installs the global subscriber; `RUST_LOG` overrides the default level.
///
/// Returns false when a subscriber was already installed.
pub fn init_tracing(debug: bool) -> bool {
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level(debug).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .try_init()
        .is_ok()
}
