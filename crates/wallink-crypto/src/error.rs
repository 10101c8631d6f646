//! Crypto error types.

/// Errors from cryptographic and wire-encoding operations.
///
/// Variants never carry key material, only lengths and labels.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Invalid Base58 in {what}")]
    InvalidBase58 { what: &'static str },

    #[error("Invalid {what} length: expected {expected}, got {actual}")]
    InvalidLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Decryption failed")]
    DecryptionFailed,
}
