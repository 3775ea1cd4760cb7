//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Install the global JSON subscriber
///
/// The filter comes from `service.log_level`; an unparsable directive falls
/// back to `info`. Returns `false` when a subscriber was already installed.
pub fn init_tracing(config: &Config) -> bool {
    let filter = EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(
            environment = %config.service.environment,
            "Tracing initialized for service: {}",
            config.service.name
        );
    }

    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_rejected() {
        let config = Config::default();
        let _ = init_tracing(&config);
        assert!(!init_tracing(&config));
    }
}
