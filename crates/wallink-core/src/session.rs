//! Established wallet session.
//!
//! A `SessionState` only exists after a connect response has been
//! authenticated. It owns the keypair and shared secret of the attempt that
//! produced it; dropping it (or turning it into a disconnect request) wipes
//! both along with the session token.

use serde::Serialize;
use url::Url;
use wallink_crypto::{EphemeralKeyPair, KEY_SIZE, SharedSecret, base58};

use crate::error::Result;
use crate::payload::{AccountKey, EncryptedPayload, SessionPayload, SessionToken, encrypt_payload};
use crate::request::build_disconnect_url;

pub struct SessionState {
    attempt_id: String,
    keypair: EphemeralKeyPair,
    shared_secret: SharedSecret,
    peer_public: [u8; KEY_SIZE],
    token: SessionToken,
    account: AccountKey,
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("attempt_id", &self.attempt_id)
            .field("account", &self.account)
            .field("token", &self.token)
            .field("shared_secret", &self.shared_secret)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct DisconnectBody<'a> {
    session: &'a str,
}

impl SessionState {
    pub(crate) fn new(
        attempt_id: String,
        keypair: EphemeralKeyPair,
        shared_secret: SharedSecret,
        peer_public: [u8; KEY_SIZE],
        payload: SessionPayload,
    ) -> Self {
        Self {
            attempt_id,
            keypair,
            shared_secret,
            peer_public,
            token: payload.session,
            account: payload.account,
        }
    }

    /// Id of the connection attempt this session came from.
    pub fn attempt_id(&self) -> &str {
        &self.attempt_id
    }

    pub const fn token(&self) -> &SessionToken {
        &self.token
    }

    /// The wallet's long-term account key.
    pub const fn account(&self) -> AccountKey {
        self.account
    }

    pub const fn shared_secret(&self) -> &SharedSecret {
        &self.shared_secret
    }

    /// The wallet's per-session encryption key, Base58.
    pub fn peer_public_base58(&self) -> String {
        base58::encode(&self.peer_public)
    }

    /// Our ephemeral public key, Base58. Later requests must name it so the
    /// wallet can find the same shared secret.
    pub fn dapp_public_base58(&self) -> String {
        self.keypair.public_base58()
    }

    /// Seal a JSON request body under the session's shared secret.
    pub fn encrypt<T: Serialize>(&self, value: &T) -> Result<EncryptedPayload> {
        encrypt_payload(value, &self.shared_secret)
    }

    /// Build the wallet `disconnect` request and discard the session.
    pub fn into_disconnect_request(self, base_url: &str, redirect_link: &str) -> Result<Url> {
        let encrypted = self.encrypt(&DisconnectBody {
            session: self.token.as_str(),
        })?;
        build_disconnect_url(
            base_url,
            &self.dapp_public_base58(),
            redirect_link,
            &encrypted,
        )
    }
}
