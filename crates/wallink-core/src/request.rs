//! Outbound wallet requests.
//!
//! Building a URL and opening it are separate: these functions only
//! construct, the caller hands the result to the platform link opener.

use url::Url;

use crate::error::Result;
use crate::payload::EncryptedPayload;

/// Query fields of a `connect` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    /// Base58 ephemeral public key.
    pub dapp_encryption_public_key: String,
    pub cluster: String,
    pub app_url: String,
    pub redirect_link: String,
}

/// `{base}connect?dapp_encryption_public_key=..&cluster=..&app_url=..&redirect_link=..`
pub fn build_connect_url(base_url: &str, params: &ConnectionParams) -> Result<Url> {
    let mut url = endpoint(base_url, "connect")?;
    url.query_pairs_mut()
        .append_pair("dapp_encryption_public_key", &params.dapp_encryption_public_key)
        .append_pair("cluster", &params.cluster)
        .append_pair("app_url", &params.app_url)
        .append_pair("redirect_link", &params.redirect_link);
    Ok(url)
}

/// `{base}disconnect?dapp_encryption_public_key=..&nonce=..&redirect_link=..&payload=..`
pub fn build_disconnect_url(
    base_url: &str,
    dapp_encryption_public_key: &str,
    redirect_link: &str,
    encrypted: &EncryptedPayload,
) -> Result<Url> {
    let mut url = endpoint(base_url, "disconnect")?;
    url.query_pairs_mut()
        .append_pair("dapp_encryption_public_key", dapp_encryption_public_key)
        .append_pair("nonce", &encrypted.nonce)
        .append_pair("redirect_link", redirect_link)
        .append_pair("payload", &encrypted.payload);
    Ok(url)
}

/// Append `attempt=<id>` so the wallet echoes it back on redirect.
pub fn tag_redirect_link(redirect_link: &str, attempt_id: &str) -> Result<String> {
    let mut url = Url::parse(redirect_link)?;
    url.query_pairs_mut()
        .append_pair(crate::redirect::PARAM_ATTEMPT, attempt_id);
    Ok(url.into())
}

fn endpoint(base_url: &str, action: &str) -> Result<Url> {
    let mut base = Url::parse(base_url)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join(action)?)
}
