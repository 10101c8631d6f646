//! Connection state machine.
//!
//! `Idle → AwaitingPeer → Connected | Failed`. The context is an ordinary
//! value owned by the caller: it builds the outbound connect URL, then is
//! fed each inbound deep link and reports what happened. It holds at most
//! one pending attempt; starting a new one discards the previous keypair, so
//! a late response to an old attempt can never produce a session.

use std::time::Instant;

use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;
use wallink_crypto::{EphemeralKeyPair, KEY_SIZE, SharedSecret, is_canonical_public_key};

use crate::config::Config;
use crate::error::{FailureReason, Result};
use crate::payload::{AccountKey, BoxDecryptor, PayloadDecryptor, SessionPayload};
use crate::redirect::Redirect;
use crate::request::{ConnectionParams, build_connect_url, tag_redirect_link};
use crate::session::SessionState;

/// Externally visible phase of the current attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingPeer,
    Connected,
    Failed,
}

/// Result of feeding one inbound redirect to the context.
#[derive(Debug)]
pub enum ConnectionEvent {
    /// The wallet's response authenticated; the caller now owns the session.
    Connected(SessionState),
    Failed(FailureReason),
    /// Not a redirect for the pending attempt; nothing changed.
    Ignored,
}

struct PendingAttempt {
    id: String,
    keypair: EphemeralKeyPair,
    started: Instant,
}

enum State {
    Idle,
    AwaitingPeer(PendingAttempt),
    Connected { account: AccountKey },
    Failed { reason: FailureReason },
}

enum Outcome {
    Ignored,
    Stale,
    Fail(FailureReason),
    Connect {
        peer_public: [u8; KEY_SIZE],
        secret: SharedSecret,
        payload: SessionPayload,
    },
}

/// Caller-owned connection context.
pub struct ConnectionContext<D = BoxDecryptor> {
    config: Config,
    decryptor: D,
    state: State,
}

impl ConnectionContext<BoxDecryptor> {
    pub fn new(config: Config) -> Self {
        Self::with_decryptor(config, BoxDecryptor)
    }
}

impl<D: PayloadDecryptor> ConnectionContext<D> {
    pub const fn with_decryptor(config: Config, decryptor: D) -> Self {
        Self {
            config,
            decryptor,
            state: State::Idle,
        }
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub const fn phase(&self) -> Phase {
        match self.state {
            State::Idle => Phase::Idle,
            State::AwaitingPeer(_) => Phase::AwaitingPeer,
            State::Connected { .. } => Phase::Connected,
            State::Failed { .. } => Phase::Failed,
        }
    }

    /// Id of the attempt waiting for a redirect, if any.
    pub fn pending_attempt_id(&self) -> Option<&str> {
        match &self.state {
            State::AwaitingPeer(pending) => Some(&pending.id),
            _ => None,
        }
    }

    /// Base58 public key of the pending attempt.
    pub fn pending_public_key(&self) -> Option<String> {
        match &self.state {
            State::AwaitingPeer(pending) => Some(pending.keypair.public_base58()),
            _ => None,
        }
    }

    pub const fn connected_account(&self) -> Option<AccountKey> {
        match self.state {
            State::Connected { account } => Some(account),
            _ => None,
        }
    }

    pub const fn failure(&self) -> Option<&FailureReason> {
        match &self.state {
            State::Failed { reason } => Some(reason),
            _ => None,
        }
    }

    /// Whether the pending attempt has outlived `attempt.timeout_secs`.
    pub fn is_expired(&self) -> bool {
        match (&self.state, self.config.attempt.timeout()) {
            (State::AwaitingPeer(pending), Some(timeout)) => pending.started.elapsed() >= timeout,
            _ => false,
        }
    }

    /// Start a new attempt and return the `connect` URL to open.
    ///
    /// Always generates a fresh keypair; any attempt still pending is
    /// superseded and its keypair discarded.
    pub fn build_connection_request(&mut self) -> Result<Url> {
        let keypair = EphemeralKeyPair::generate();
        let id = Uuid::new_v4().to_string();
        let params = ConnectionParams {
            dapp_encryption_public_key: keypair.public_base58(),
            cluster: self.config.dapp.cluster.clone(),
            app_url: self.config.dapp.app_url.clone(),
            redirect_link: tag_redirect_link(&self.config.dapp.redirect_link, &id)?,
        };
        let url = build_connect_url(&self.config.wallet.base_url, &params)?;

        if let Some(previous) = self.pending_attempt_id() {
            info!(superseded = %previous, attempt_id = %id, "Superseding pending connection attempt");
        }
        info!(attempt_id = %id, cluster = %params.cluster, "Starting connection attempt");
        self.state = State::AwaitingPeer(PendingAttempt {
            id,
            keypair,
            started: Instant::now(),
        });
        Ok(url)
    }

    /// Feed one inbound deep link to the state machine.
    pub fn handle_inbound_redirect(&mut self, raw_url: &str) -> ConnectionEvent {
        let Ok(redirect) = Redirect::parse(raw_url) else {
            debug!("Ignoring unparsable redirect");
            return ConnectionEvent::Ignored;
        };

        match self.evaluate(&redirect) {
            Outcome::Ignored => ConnectionEvent::Ignored,
            Outcome::Stale => {
                warn!(
                    redirect_attempt = redirect.attempt_id().unwrap_or_default(),
                    "Rejecting redirect for superseded attempt"
                );
                ConnectionEvent::Failed(FailureReason::StaleContext)
            }
            Outcome::Fail(reason) => self.fail(reason),
            Outcome::Connect {
                peer_public,
                secret,
                payload,
            } => self.connect(peer_public, secret, payload),
        }
    }

    /// Drop any pending attempt or outcome and return to `Idle`.
    pub fn reset(&mut self) {
        self.state = State::Idle;
    }

    /// Build the wallet `disconnect` request for `session`, discarding it
    /// and returning the context to `Idle`.
    pub fn disconnect(&mut self, session: SessionState, redirect_link: &str) -> Result<Url> {
        info!(attempt_id = %session.attempt_id(), "Disconnecting session");
        self.reset();
        session.into_disconnect_request(&self.config.wallet.base_url, redirect_link)
    }

    fn evaluate(&self, redirect: &Redirect) -> Outcome {
        let State::AwaitingPeer(pending) = &self.state else {
            debug!("Ignoring redirect: no attempt pending");
            return Outcome::Ignored;
        };

        // An errorCode answers the connect request whatever path it arrives on.
        let peer_error = redirect.peer_error();
        if peer_error.is_none() && !redirect.targets(&self.config.dapp.response_path) {
            debug!(attempt_id = %pending.id, "Ignoring redirect for another path");
            return Outcome::Ignored;
        }

        if let Some(id) = redirect.attempt_id() {
            if !bool::from(id.as_bytes().ct_eq(pending.id.as_bytes())) {
                return Outcome::Stale;
            }
        }

        if self.is_expired() {
            return Outcome::Fail(FailureReason::Expired);
        }

        if let Some((code, message)) = peer_error {
            return Outcome::Fail(FailureReason::PeerError { code, message });
        }

        let response = match redirect.connect_response() {
            Ok(response) => response,
            Err(reason) => return Outcome::Fail(reason),
        };

        // x25519 ignores the top bit and reduces mod p, so a non-canonical
        // key would open the same box as its canonical twin.
        if !is_canonical_public_key(&response.peer_public) {
            return Outcome::Fail(FailureReason::AuthenticationFailure);
        }

        let secret = pending.keypair.shared_secret_with(&response.peer_public);
        match self
            .decryptor
            .decrypt(response.data, response.nonce, &secret)
        {
            Ok(payload) => Outcome::Connect {
                peer_public: response.peer_public,
                secret,
                payload,
            },
            Err(reason) => Outcome::Fail(reason),
        }
    }

    fn fail(&mut self, reason: FailureReason) -> ConnectionEvent {
        if let Some(id) = self.pending_attempt_id() {
            warn!(attempt_id = %id, %reason, "Connection attempt failed");
        }
        self.state = State::Failed {
            reason: reason.clone(),
        };
        ConnectionEvent::Failed(reason)
    }

    fn connect(
        &mut self,
        peer_public: [u8; KEY_SIZE],
        secret: SharedSecret,
        payload: SessionPayload,
    ) -> ConnectionEvent {
        let account = payload.account;
        let pending = match std::mem::replace(&mut self.state, State::Connected { account }) {
            State::AwaitingPeer(pending) => pending,
            // evaluate() only yields Connect while an attempt is pending
            other => {
                self.state = other;
                return ConnectionEvent::Ignored;
            }
        };
        info!(attempt_id = %pending.id, %account, "Wallet connected");
        ConnectionEvent::Connected(SessionState::new(
            pending.id,
            pending.keypair,
            secret,
            peer_public,
            payload,
        ))
    }
}
