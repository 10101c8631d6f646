//! wallink Core Library
//!
//! Session establishment with a wallet reachable only through deep links:
//! - Outbound `connect`/`disconnect` request URLs
//! - Inbound redirect parsing and payload decryption
//! - The caller-owned connection state machine
//! - Configuration resolution and common error types

pub mod config;
pub mod connection;
pub mod error;
pub mod payload;
pub mod redirect;
pub mod request;
pub mod session;
pub mod tracing_init;

pub use config::Config;
pub use connection::{ConnectionContext, ConnectionEvent, Phase};
pub use error::{Error, FailureReason, Result};
pub use payload::{AccountKey, BoxDecryptor, PayloadDecryptor, SessionPayload, SessionToken};
pub use session::SessionState;
