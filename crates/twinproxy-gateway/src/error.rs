//! Gateway error types.

use std::io;

use twinproxy_config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("{protocol} bind failed: {source}")]
    Bind {
        protocol: &'static str,
        source: io::Error,
    },

    #[error("no frontend could be started")]
    NoFrontends,
}
