//! Error types for wallink core library.

use thiserror::Error;

/// Result type alias using wallink `Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Non-protocol failures: configuration, URL construction, I/O.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL parse error
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Crypto error while building a request
    #[error("Crypto error: {0}")]
    Crypto(#[from] wallink_crypto::CryptoError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a connection attempt ended in `Failed`.
///
/// Messages are safe to show to users: they never include key material,
/// ciphertext or session tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    /// Malformed Base58 or a key of the wrong length in the redirect.
    #[error("Malformed redirect: {0}")]
    DecodeFailure(String),

    /// The payload did not authenticate under the session key. Tampering,
    /// wrong key, wrong nonce and corrupt data all land here.
    #[error("Wallet response could not be authenticated")]
    AuthenticationFailure,

    /// The wallet reported an error itself.
    #[error("Wallet returned error {code}: {message}")]
    PeerError { code: String, message: String },

    /// The redirect belongs to a connection attempt that has been superseded.
    #[error("Redirect belongs to a superseded connection attempt")]
    StaleContext,

    /// The attempt outlived the configured timeout.
    #[error("Connection attempt expired")]
    Expired,
}

impl From<wallink_crypto::CryptoError> for FailureReason {
    fn from(err: wallink_crypto::CryptoError) -> Self {
        Self::DecodeFailure(err.to_string())
    }
}
