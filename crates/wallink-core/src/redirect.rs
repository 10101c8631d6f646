//! Inbound redirect parsing.
//!
//! The platform hands us the full deep link the wallet opened. Only query
//! parameters and the path (or, for custom-scheme links such as
//! `wallink://onConnect`, the host) carry meaning.

use url::Url;
use wallink_crypto::{KEY_SIZE, base58};

use crate::error::FailureReason;

pub const PARAM_ATTEMPT: &str = "attempt";
pub const PARAM_ERROR_CODE: &str = "errorCode";
pub const PARAM_ERROR_MESSAGE: &str = "errorMessage";
pub const PARAM_PEER_KEY: &str = "phantom_encryption_public_key";
pub const PARAM_DATA: &str = "data";
pub const PARAM_NONCE: &str = "nonce";

/// A parsed inbound deep link.
#[derive(Debug, Clone)]
pub struct Redirect {
    url: Url,
    params: Vec<(String, String)>,
}

/// The encrypted parts of a connect response, with the peer key already
/// decoded and length-checked.
#[derive(Debug)]
pub struct ConnectResponse<'a> {
    pub peer_public: [u8; KEY_SIZE],
    pub data: &'a str,
    pub nonce: &'a str,
}

impl Redirect {
    pub fn parse(raw: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(raw.trim())?;
        let params = url.query_pairs().into_owned().collect();
        Ok(Self { url, params })
    }

    /// First value of a query parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn attempt_id(&self) -> Option<&str> {
        self.param(PARAM_ATTEMPT)
    }

    /// `(code, message)` when the wallet reported an error.
    pub fn peer_error(&self) -> Option<(String, String)> {
        let code = self.param(PARAM_ERROR_CODE).filter(|c| !c.is_empty())?;
        let message = self.param(PARAM_ERROR_MESSAGE).unwrap_or_default();
        Some((code.to_string(), message.to_string()))
    }

    /// Whether the link targets `segment`, either as a path segment or as
    /// the host of a custom-scheme link.
    pub fn targets(&self, segment: &str) -> bool {
        let in_path = self
            .url
            .path_segments()
            .is_some_and(|mut segs| segs.any(|s| s == segment));
        in_path || self.url.host_str() == Some(segment)
    }

    /// Pull the connect-response fields out, decoding the peer key.
    pub fn connect_response(&self) -> Result<ConnectResponse<'_>, FailureReason> {
        let required = |name: &'static str| {
            self.param(name)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| FailureReason::DecodeFailure(format!("missing {name}")))
        };
        let peer_key = required(PARAM_PEER_KEY)?;
        let data = required(PARAM_DATA)?;
        let nonce = required(PARAM_NONCE)?;
        let peer_public = base58::decode_fixed::<KEY_SIZE>(peer_key, "peer public key")?;
        Ok(ConnectResponse {
            peer_public,
            data,
            nonce,
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn custom_scheme_host_is_matched() {
        let r = Redirect::parse("wallink://onConnect?data=abc").unwrap();
        assert!(r.targets("onConnect"));
        assert!(!r.targets("onDisconnect"));
    }

    #[test]
    fn path_segment_is_matched() {
        let r = Redirect::parse("exp://127.0.0.1:19000/--/onConnect?nonce=x").unwrap();
        assert!(r.targets("onConnect"));
        let r = Redirect::parse("https://dapp.example/callbacks/onConnectLater").unwrap();
        assert!(!r.targets("onConnect"));
    }

    #[test]
    fn peer_error_requires_nonempty_code() {
        let r = Redirect::parse("wallink://onConnect?errorCode=4001&errorMessage=User%20rejected")
            .unwrap();
        assert_eq!(
            r.peer_error(),
            Some(("4001".to_string(), "User rejected".to_string()))
        );

        let r = Redirect::parse("wallink://onConnect?errorCode=").unwrap();
        assert!(r.peer_error().is_none());
    }

    #[test]
    fn first_duplicate_param_wins() {
        let r = Redirect::parse("wallink://x?attempt=a&attempt=b").unwrap();
        assert_eq!(r.attempt_id(), Some("a"));
    }

    #[test]
    fn connect_response_reports_missing_fields() {
        let r = Redirect::parse("wallink://onConnect?data=abc&nonce=def").unwrap();
        assert_eq!(
            r.connect_response().unwrap_err(),
            FailureReason::DecodeFailure("missing phantom_encryption_public_key".into())
        );
    }

    #[test]
    fn connect_response_rejects_short_peer_key() {
        let key = base58::encode(&[3u8; 31]);
        let r = Redirect::parse(&format!(
            "wallink://onConnect?phantom_encryption_public_key={key}&data=abc&nonce=def"
        ))
        .unwrap();
        assert!(matches!(
            r.connect_response(),
            Err(FailureReason::DecodeFailure(msg)) if msg.contains("expected 32, got 31")
        ));
    }

    #[test]
    fn connect_response_decodes_peer_key() {
        let key = [4u8; 32];
        let r = Redirect::parse(&format!(
            "wallink://onConnect?phantom_encryption_public_key={}&data=abc&nonce=def",
            base58::encode(&key)
        ))
        .unwrap();
        let resp = r.connect_response().unwrap();
        assert_eq!(resp.peer_public, key);
        assert_eq!(resp.data, "abc");
        assert_eq!(resp.nonce, "def");
    }
}
