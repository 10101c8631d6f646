//! Box precomputation and per-message authenticated encryption.
//!
//! The shared secret is the NaCl `box_beforenm` value: the X25519 product of
//! our secret and the peer's public key, run through HSalsa20 with a zero
//! input block. Every message of the session is then opened or sealed with
//! XSalsa20-Poly1305 under that key, so the curve multiplication happens once
//! per connection.

use crypto_secretbox::XSalsa20Poly1305;
use crypto_secretbox::aead::generic_array::GenericArray;
use crypto_secretbox::aead::{Aead, KeyInit};
use rand::RngCore;
use rand::rngs::OsRng;
use salsa20::cipher::consts::U10;
use subtle::ConstantTimeEq;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;
use crate::keypair::KEY_SIZE;

/// Nonce size for XSalsa20-Poly1305.
pub const NONCE_SIZE: usize = 24;

/// Poly1305 tag length prepended to every box.
pub const TAG_SIZE: usize = 16;

/// A sealed message and the nonce it was sealed under.
#[derive(Debug, Clone)]
pub struct SealedBox {
    pub ciphertext: Vec<u8>,
    pub nonce: [u8; NONCE_SIZE],
}

/// Symmetric key shared with the wallet for the lifetime of one session.
///
/// Lives only in memory. Cleared on drop; `Debug` never prints it and
/// equality is constant time.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret {
    key: [u8; KEY_SIZE],
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedSecret([REDACTED])")
    }
}

impl PartialEq for SharedSecret {
    fn eq(&self, other: &Self) -> bool {
        self.key.ct_eq(&other.key).into()
    }
}

impl Eq for SharedSecret {}

/// X25519 followed by HSalsa20 over a zero block.
pub(crate) fn derive_shared_secret(
    local_secret: &StaticSecret,
    peer_public: &[u8; KEY_SIZE],
) -> SharedSecret {
    let dh = local_secret.diffie_hellman(&PublicKey::from(*peer_public));
    let mut derived = salsa20::hsalsa::<U10>(
        GenericArray::from_slice(dh.as_bytes()),
        &GenericArray::default(),
    );
    let mut key = [0u8; KEY_SIZE];
    key.copy_from_slice(&derived);
    derived.as_mut_slice().zeroize();
    SharedSecret { key }
}

impl SharedSecret {
    /// Wrap raw precomputed key bytes.
    pub const fn from_bytes(key: [u8; KEY_SIZE]) -> Self {
        Self { key }
    }

    /// Raw key bytes. Handle with care.
    pub const fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }

    fn cipher(&self) -> XSalsa20Poly1305 {
        XSalsa20Poly1305::new(GenericArray::from_slice(&self.key))
    }

    /// Verify and decrypt a box.
    ///
    /// Fails with `InvalidLength` for a nonce that is not 24 bytes and with
    /// `DecryptionFailed` for anything the authenticator rejects.
    pub fn open(&self, ciphertext: &[u8], nonce: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if nonce.len() != NONCE_SIZE {
            return Err(CryptoError::InvalidLength {
                what: "nonce",
                expected: NONCE_SIZE,
                actual: nonce.len(),
            });
        }
        self.cipher()
            .decrypt(GenericArray::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)
    }

    /// Seal `plaintext` under a fresh random nonce.
    pub fn seal(&self, plaintext: &[u8]) -> Result<SealedBox, CryptoError> {
        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);
        let ciphertext = self.seal_with_nonce(plaintext, &nonce)?;
        Ok(SealedBox { ciphertext, nonce })
    }

    /// Seal `plaintext` under a caller-chosen nonce. The nonce must never be
    /// reused with the same secret.
    pub fn seal_with_nonce(
        &self,
        plaintext: &[u8],
        nonce: &[u8; NONCE_SIZE],
    ) -> Result<Vec<u8>, CryptoError> {
        self.cipher()
            .encrypt(GenericArray::from_slice(nonce), plaintext)
            .map_err(|_| CryptoError::EncryptionFailed)
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::keypair::EphemeralKeyPair;
    use crypto_box::aead::{AeadCore, OsRng as BoxRng};
    use crypto_box::SalsaBox;
    use proptest::prelude::*;

    fn secret_pair() -> (SharedSecret, SharedSecret) {
        let a = EphemeralKeyPair::generate();
        let b = EphemeralKeyPair::generate();
        (
            a.shared_secret_with(&b.public_bytes()),
            b.shared_secret_with(&a.public_bytes()),
        )
    }

    #[test]
    fn derivation_is_symmetric() {
        let (ab, ba) = secret_pair();
        assert_eq!(ab, ba);
    }

    #[test]
    fn derivation_is_idempotent() {
        let a = EphemeralKeyPair::from_secret_bytes(&[1u8; 32]).unwrap();
        let peer = EphemeralKeyPair::from_secret_bytes(&[2u8; 32]).unwrap();
        let first = a.shared_secret_with(&peer.public_bytes());
        let second = a.shared_secret_with(&peer.public_bytes());
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn different_peers_produce_different_secrets() {
        let local = EphemeralKeyPair::generate();
        let p1 = EphemeralKeyPair::generate();
        let p2 = EphemeralKeyPair::generate();
        assert_ne!(
            local.shared_secret_with(&p1.public_bytes()),
            local.shared_secret_with(&p2.public_bytes())
        );
    }

    #[test]
    fn opens_box_sealed_by_crypto_box() {
        let dapp = EphemeralKeyPair::generate();
        let wallet_secret = crypto_box::SecretKey::generate(&mut BoxRng);
        let wallet_public = wallet_secret.public_key();

        let wallet_box = SalsaBox::new(&crypto_box::PublicKey::from(dapp.public_bytes()), &wallet_secret);
        let nonce = SalsaBox::generate_nonce(&mut BoxRng);
        let ciphertext = wallet_box.encrypt(&nonce, &b"hello dapp"[..]).unwrap();

        let shared = dapp.shared_secret_with(wallet_public.as_bytes());
        let plaintext = shared.open(&ciphertext, nonce.as_slice()).unwrap();
        assert_eq!(plaintext, b"hello dapp");
    }

    #[test]
    fn crypto_box_opens_our_seal() {
        let dapp = EphemeralKeyPair::generate();
        let wallet_secret = crypto_box::SecretKey::generate(&mut BoxRng);
        let shared = dapp.shared_secret_with(wallet_secret.public_key().as_bytes());

        let sealed = shared.seal(b"hello wallet").unwrap();
        let wallet_box = SalsaBox::new(&crypto_box::PublicKey::from(dapp.public_bytes()), &wallet_secret);
        let plaintext = wallet_box
            .decrypt(GenericArray::from_slice(&sealed.nonce), sealed.ciphertext.as_slice())
            .unwrap();
        assert_eq!(plaintext, b"hello wallet");
    }

    #[test]
    fn seal_open_roundtrip() {
        let (ab, ba) = secret_pair();
        let sealed = ab.seal(b"payload").unwrap();
        assert_eq!(sealed.ciphertext.len(), b"payload".len() + TAG_SIZE);
        assert_eq!(ba.open(&sealed.ciphertext, &sealed.nonce).unwrap(), b"payload");
    }

    #[test]
    fn seal_uses_fresh_nonces() {
        let (ab, _) = secret_pair();
        let first = ab.seal(b"x").unwrap();
        let second = ab.seal(b"x").unwrap();
        assert_ne!(first.nonce, second.nonce);
        assert_ne!(first.ciphertext, second.ciphertext);
    }

    #[test]
    fn open_with_wrong_secret_fails() {
        let (ab, _) = secret_pair();
        let (_, other) = secret_pair();
        let sealed = ab.seal(b"secret").unwrap();
        assert!(matches!(
            other.open(&sealed.ciphertext, &sealed.nonce),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn open_rejects_wrong_nonce_length() {
        let (ab, _) = secret_pair();
        let result = ab.open(b"data", &[0u8; 12]);
        assert!(matches!(
            result,
            Err(CryptoError::InvalidLength {
                what: "nonce",
                expected: NONCE_SIZE,
                actual: 12
            })
        ));
    }

    #[test]
    fn open_rejects_truncated_ciphertext() {
        let (ab, _) = secret_pair();
        assert!(ab.open(&[0u8; TAG_SIZE - 1], &[0u8; NONCE_SIZE]).is_err());
        assert!(ab.open(&[], &[0u8; NONCE_SIZE]).is_err());
    }

    #[test]
    fn debug_impl_redacts_key() {
        let secret = SharedSecret::from_bytes([0x11; 32]);
        assert_eq!(format!("{secret:?}"), "SharedSecret([REDACTED])");
    }

    proptest! {
        #[test]
        fn prop_symmetry(a in prop::array::uniform32(any::<u8>()), b in prop::array::uniform32(any::<u8>())) {
            let ka = EphemeralKeyPair::from_secret_bytes(&a).unwrap();
            let kb = EphemeralKeyPair::from_secret_bytes(&b).unwrap();
            prop_assert_eq!(
                ka.shared_secret_with(&kb.public_bytes()),
                kb.shared_secret_with(&ka.public_bytes())
            );
        }

        #[test]
        fn prop_ciphertext_bit_flip_rejected(
            msg in prop::collection::vec(any::<u8>(), 0..128),
            bit in 0usize..1024,
        ) {
            let (ab, ba) = secret_pair();
            let sealed = ab.seal(&msg).unwrap();
            let mut tampered = sealed.ciphertext.clone();
            let idx = bit % (tampered.len() * 8);
            tampered[idx / 8] ^= 1 << (idx % 8);
            prop_assert!(ba.open(&tampered, &sealed.nonce).is_err());
        }

        #[test]
        fn prop_nonce_bit_flip_rejected(bit in 0usize..(NONCE_SIZE * 8)) {
            let (ab, ba) = secret_pair();
            let sealed = ab.seal(b"{\"session\":\"abc\"}").unwrap();
            let mut nonce = sealed.nonce;
            nonce[bit / 8] ^= 1 << (bit % 8);
            prop_assert!(ba.open(&sealed.ciphertext, &nonce).is_err());
        }
    }
}
