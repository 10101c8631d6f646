//! Ephemeral keypair management.
//!
//! Each connection attempt gets its own X25519 keypair. The public half is
//! sent to the wallet in the connect request; the secret half never leaves
//! this process and is wiped when the keypair is dropped.

use rand::rngs::OsRng;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroize;

use crate::base58;
use crate::error::CryptoError;
use crate::shared::{SharedSecret, derive_shared_secret};

/// Size of an X25519 public or secret key.
pub const KEY_SIZE: usize = 32;

/// Whether `key` is the canonical encoding of a field element: top bit clear
/// and value below 2^255 - 19.
pub fn is_canonical_public_key(key: &[u8; KEY_SIZE]) -> bool {
    if key[31] & 0x80 != 0 {
        return false;
    }
    let at_or_above_p =
        key[31] == 0x7f && key[1..31].iter().all(|&b| b == 0xff) && key[0] >= 0xed;
    !at_or_above_p
}

/// An X25519 keypair scoped to a single connection attempt.
///
/// `StaticSecret` zeroizes itself on drop, so discarding the keypair discards
/// the secret.
pub struct EphemeralKeyPair {
    secret: StaticSecret,
    public: PublicKey,
}

impl std::fmt::Debug for EphemeralKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralKeyPair")
            .field("public", &self.public_base58())
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl EphemeralKeyPair {
    /// Generate a fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Reconstruct from raw 32-byte secret key bytes.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != KEY_SIZE {
            return Err(CryptoError::InvalidLength {
                what: "secret key",
                expected: KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; KEY_SIZE];
        arr.copy_from_slice(bytes);
        let secret = StaticSecret::from(arr);
        let public = PublicKey::from(&secret);
        arr.zeroize();
        Ok(Self { secret, public })
    }

    /// Get the public key as raw bytes.
    pub fn public_bytes(&self) -> [u8; KEY_SIZE] {
        *self.public.as_bytes()
    }

    /// Get the public key in its wire form.
    pub fn public_base58(&self) -> String {
        base58::encode(self.public.as_bytes())
    }

    /// Precompute the shared secret with the peer's encryption public key.
    pub fn shared_secret_with(&self, peer_public: &[u8; KEY_SIZE]) -> SharedSecret {
        derive_shared_secret(&self.secret, peer_public)
    }
}
