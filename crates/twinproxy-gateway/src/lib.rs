//! Gateway composing the twinproxy frontends.
//!
//! [`Gateway`] reads a [`Config`](twinproxy_config::Config) once, announces
//! each enabled frontend with a CONFIG event, makes sure its credential file
//! exists and binds it. The two frontends are independent: one failing to
//! bind does not stop the other.

pub mod cli;
mod error;
mod gateway;

pub use cli::ServeArgs;
pub use error::GatewayError;
pub use gateway::{Gateway, RunningGateway};
