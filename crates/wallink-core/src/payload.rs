//! Encrypted payloads exchanged with the wallet.
//!
//! Inbound payloads are opened with the session's shared secret and parsed
//! as JSON. Every failure on that path (bad Base58, wrong nonce length, tag
//! mismatch, malformed JSON, bad account key) is reported as the same
//! `AuthenticationFailure` so a caller cannot learn which step rejected it.

use serde::{Deserialize, Serialize};
use wallink_crypto::{KEY_SIZE, NONCE_SIZE, SharedSecret, base58};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{FailureReason, Result};

/// The wallet's long-term account public key (Ed25519, 32 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountKey([u8; KEY_SIZE]);

impl AccountKey {
    pub fn from_base58(s: &str) -> std::result::Result<Self, wallink_crypto::CryptoError> {
        base58::decode_fixed::<KEY_SIZE>(s, "account key").map(Self)
    }

    pub const fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Display for AccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&base58::encode(&self.0))
    }
}

impl std::fmt::Debug for AccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountKey({self})")
    }
}

/// Opaque credential the wallet issues to scope later requests.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}

/// Decrypted body of a successful connect response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPayload {
    pub session: SessionToken,
    pub account: AccountKey,
}

/// Wire form of the payload; wiped on drop so the token never outlives an
/// early return.
#[derive(Deserialize, Zeroize, ZeroizeOnDrop)]
struct RawSessionPayload {
    session: String,
    public_key: String,
}

/// Turns an encrypted connect response into a [`SessionPayload`].
pub trait PayloadDecryptor {
    fn decrypt(
        &self,
        data: &str,
        nonce: &str,
        secret: &SharedSecret,
    ) -> std::result::Result<SessionPayload, FailureReason>;
}

/// XSalsa20-Poly1305 box decryptor used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxDecryptor;

impl PayloadDecryptor for BoxDecryptor {
    fn decrypt(
        &self,
        data: &str,
        nonce: &str,
        secret: &SharedSecret,
    ) -> std::result::Result<SessionPayload, FailureReason> {
        decrypt_payload(data, nonce, secret)
    }
}

/// Decode, authenticate, decrypt and parse a Base58 connect payload.
pub fn decrypt_payload(
    data: &str,
    nonce: &str,
    secret: &SharedSecret,
) -> std::result::Result<SessionPayload, FailureReason> {
    let plaintext = open_json(data, nonce, secret).ok_or(FailureReason::AuthenticationFailure)?;
    let mut raw: RawSessionPayload =
        serde_json::from_slice(&plaintext).map_err(|_| FailureReason::AuthenticationFailure)?;
    let account = AccountKey::from_base58(&raw.public_key)
        .map_err(|_| FailureReason::AuthenticationFailure)?;
    let session = SessionToken::new(std::mem::take(&mut raw.session));
    Ok(SessionPayload { session, account })
}

fn open_json(data: &str, nonce: &str, secret: &SharedSecret) -> Option<Zeroizing<Vec<u8>>> {
    let ciphertext = base58::decode(data, "data").ok()?;
    let nonce = base58::decode_fixed::<NONCE_SIZE>(nonce, "nonce").ok()?;
    secret.open(&ciphertext, &nonce).ok().map(Zeroizing::new)
}

/// Base58 nonce and ciphertext ready to be placed in a request URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedPayload {
    pub nonce: String,
    pub payload: String,
}

/// Serialize `value` to JSON and seal it under a fresh nonce.
pub fn encrypt_payload<T: Serialize>(value: &T, secret: &SharedSecret) -> Result<EncryptedPayload> {
    let json = Zeroizing::new(serde_json::to_vec(value)?);
    let sealed = secret.seal(&json)?;
    Ok(EncryptedPayload {
        nonce: base58::encode(&sealed.nonce),
        payload: base58::encode(&sealed.ciphertext),
    })
}
