//! Base58 codec for keys, nonces and payloads carried in URL query parameters.
//!
//! Uses the Bitcoin alphabet, which is what wallets put on the wire.

use crate::error::CryptoError;

/// Encode raw bytes as Base58.
pub fn encode(bytes: &[u8]) -> String {
    bs58::encode(bytes).into_string()
}

/// Decode a Base58 string of any length.
///
/// `what` labels the field in the returned error.
pub fn decode(input: &str, what: &'static str) -> Result<Vec<u8>, CryptoError> {
    bs58::decode(input)
        .into_vec()
        .map_err(|_| CryptoError::InvalidBase58 { what })
}

/// Decode a Base58 string that must yield exactly `N` bytes.
pub fn decode_fixed<const N: usize>(
    input: &str,
    what: &'static str,
) -> Result<[u8; N], CryptoError> {
    let bytes = decode(input, what)?;
    <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| CryptoError::InvalidLength {
        what,
        expected: N,
        actual: bytes.len(),
    })
}
