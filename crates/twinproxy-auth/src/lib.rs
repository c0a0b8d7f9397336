//! Credential checking for twinproxy.
//!
//! Credentials live in an htpasswd-style file of `username:hash` lines. The
//! [`AuthGate`] turns a verifier's answer into an [`AuthDecision`] for one
//! SOCKS connection or one HTTP request.
//!
//! # Example
//!
//! ```
//! use twinproxy_auth::{AuthGate, MemoryCredentials, encode_basic};
//!
//! # async fn example() {
//! let gate = AuthGate::new(MemoryCredentials::from_pairs([("alice", "wonderland")]));
//!
//! let decision = gate.evaluate("alice", "wonderland").await;
//! assert!(decision.allowed);
//!
//! let header = encode_basic("alice", "wrong");
//! assert!(!gate.evaluate_basic(Some(&header)).await.allowed);
//! # }
//! ```

mod basic;
pub mod cli;
mod entry;
mod error;
mod gate;
mod hash;
mod memory;
mod result;
mod store;
mod traits;

pub use basic::{BasicCredentials, encode_basic, parse_basic};
pub use entry::{CredentialEntry, Line, parse_entries};
pub use error::AuthError;
pub use gate::{AuthGate, AuthMethod};
pub use hash::{Scheme, apr1_crypt, hash_password, sha1_hash, verify_hash};
pub use memory::MemoryCredentials;
pub use result::{AuthDecision, AuthResult};
pub use store::{CredentialStore, EnsureOutcome};
pub use traits::CredentialVerifier;
