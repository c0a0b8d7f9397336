//! Default value functions for serde deserialization.
//!
//! These functions forward to constants defined in `twinproxy_core::defaults`.

use twinproxy_core::defaults;

/// Generate default value functions that forward to twinproxy_core::defaults constants.
macro_rules! default_fns {
    ($($fn_name:ident => $const_name:ident : $ty:ty),* $(,)?) => {
        $(
            pub(crate) fn $fn_name() -> $ty {
                defaults::$const_name
            }
        )*
    };
}

/// Generate default value functions that return String from &str constants.
macro_rules! default_string_fns {
    ($($fn_name:ident => $const_name:ident),* $(,)?) => {
        $(
            pub(crate) fn $fn_name() -> String {
                defaults::$const_name.to_string()
            }
        )*
    };
}

default_fns! {
    default_socks_port            => DEFAULT_SOCKS_PORT: u16,
    default_http_port             => DEFAULT_HTTP_PORT: u16,
    default_connect_timeout_secs  => DEFAULT_CONNECT_TIMEOUT_SECS: u64,
    default_idle_timeout_secs     => DEFAULT_IDLE_TIMEOUT_SECS: u64,
    default_relay_buffer_size     => DEFAULT_RELAY_BUFFER_SIZE: usize,
    default_connection_backlog    => DEFAULT_CONNECTION_BACKLOG: u32,
    min_relay_buffer_size         => MIN_RELAY_BUFFER_SIZE: usize,
    max_relay_buffer_size         => MAX_RELAY_BUFFER_SIZE: usize,
}

default_string_fns! {
    default_listen_address => DEFAULT_LISTEN_ADDRESS,
}
