//! Wallet-side helpers for tests.
//!
//! Plays the wallet's half of the exchange so callers can produce realistic
//! redirect parameters without a real wallet.

use crate::base58;
use crate::error::CryptoError;
use crate::keypair::{EphemeralKeyPair, KEY_SIZE};
use crate::shared::NONCE_SIZE;

/// Base58 redirect parameters as a wallet would send them.
#[derive(Debug, Clone)]
pub struct WalletResponse {
    /// `phantom_encryption_public_key`
    pub encryption_public_key: String,
    /// `data`
    pub data: String,
    /// `nonce`
    pub nonce: String,
}

/// Encrypt `plaintext` to `dapp_public` from the given wallet keypair.
pub fn wallet_response(
    wallet: &EphemeralKeyPair,
    dapp_public: &[u8; KEY_SIZE],
    plaintext: &[u8],
    nonce: &[u8; NONCE_SIZE],
) -> Result<WalletResponse, CryptoError> {
    let shared = wallet.shared_secret_with(dapp_public);
    let ciphertext = shared.seal_with_nonce(plaintext, nonce)?;
    Ok(WalletResponse {
        encryption_public_key: wallet.public_base58(),
        data: base58::encode(&ciphertext),
        nonce: base58::encode(nonce),
    })
}

/// Like [`wallet_response`] with a fresh wallet keypair and random nonce.
pub fn random_wallet_response(
    dapp_public: &[u8; KEY_SIZE],
    plaintext: &[u8],
) -> Result<WalletResponse, CryptoError> {
    let wallet = EphemeralKeyPair::generate();
    let sealed = wallet.shared_secret_with(dapp_public).seal(plaintext)?;
    Ok(WalletResponse {
        encryption_public_key: wallet.public_base58(),
        data: base58::encode(&sealed.ciphertext),
        nonce: base58::encode(&sealed.nonce),
    })
}
