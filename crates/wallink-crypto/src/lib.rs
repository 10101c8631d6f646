//! `wallink` deep-link session crypto
//!
//! Primitives for establishing an encrypted session with a wallet that is
//! only reachable through one-shot URL redirects.
//!
//! ## Crypto primitives
//!
//! - **Keypair**: X25519 ephemeral keypair per connection attempt
//! - **Shared secret**: X25519 ECDH → HSalsa20 (NaCl `box` precomputation)
//! - **Encryption**: XSalsa20-Poly1305, 24-byte nonce supplied with each message
//! - **Wire encoding**: Base58 for every key, nonce and ciphertext

pub mod base58;
pub mod error;
pub mod keypair;
pub mod shared;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use error::CryptoError;
pub use keypair::{EphemeralKeyPair, KEY_SIZE, is_canonical_public_key};
pub use shared::{NONCE_SIZE, SealedBox, SharedSecret, TAG_SIZE};
