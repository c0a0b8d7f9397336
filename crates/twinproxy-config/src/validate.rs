//! Configuration validation logic.

use crate::Config;
use crate::defaults::{max_relay_buffer_size, min_relay_buffer_size};
use crate::loader::ConfigError;
use crate::types::FrontendConfig;

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let socks = config.socks_frontend();
    let http = config.http_frontend();

    if socks.is_none() && http.is_none() {
        return Err(ConfigError::Validation(
            "at least one of 'socks' or 'http' must be enabled".into(),
        ));
    }
    if let Some(f) = &socks {
        validate_frontend("socks", f)?;
    }
    if let Some(f) = &http {
        validate_frontend("http", f)?;
    }
    if let (Some(s), Some(h)) = (&socks, &http)
        && s.port != 0
        && s.port == h.port
        && s.address.trim() == h.address.trim()
    {
        return Err(ConfigError::Validation(format!(
            "socks and http cannot both listen on {}:{}",
            s.address, s.port
        )));
    }

    let net = &config.network;
    if net.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "network.connect_timeout_secs must be > 0".into(),
        ));
    }
    if net.idle_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "network.idle_timeout_secs must be > 0".into(),
        ));
    }
    if net.handshake_timeout_secs == Some(0) {
        return Err(ConfigError::Validation(
            "network.handshake_timeout_secs must be > 0 when set".into(),
        ));
    }
    if net.relay_buffer_size < min_relay_buffer_size() {
        return Err(ConfigError::Validation(format!(
            "network.relay_buffer_size must be >= {}",
            min_relay_buffer_size()
        )));
    }
    if net.relay_buffer_size > max_relay_buffer_size() {
        return Err(ConfigError::Validation(
            "network.relay_buffer_size must be <= 1MB".into(),
        ));
    }
    if net.connection_backlog == 0 {
        return Err(ConfigError::Validation(
            "network.connection_backlog must be > 0".into(),
        ));
    }

    if let Some(format) = config.logging.format.as_deref()
        && !matches!(format, "pretty" | "compact" | "json")
    {
        return Err(ConfigError::Validation(
            "logging.format must be 'pretty', 'compact' or 'json'".into(),
        ));
    }
    if let Some(output) = config.logging.output.as_deref()
        && !matches!(output, "stdout" | "stderr")
    {
        return Err(ConfigError::Validation(
            "logging.output must be 'stdout' or 'stderr'".into(),
        ));
    }
    Ok(())
}

fn validate_frontend(name: &str, frontend: &FrontendConfig) -> Result<(), ConfigError> {
    if frontend.address.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{name}Address is empty")));
    }
    if frontend
        .auth
        .as_ref()
        .is_some_and(|p| p.as_os_str().is_empty())
    {
        return Err(ConfigError::Validation(format!(
            "{name}Auth must not be an empty path"
        )));
    }
    Ok(())
}
