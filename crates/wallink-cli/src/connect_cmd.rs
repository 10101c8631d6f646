//! `wallink connect`: run one connection attempt over stdin/stdout.
//!
//! User-facing output uses writeln! to stdout (this is a CLI binary, not debug output).

use std::io::{BufRead, Write};

use clap::Args;
use tracing::debug;
use wallink_core::{Config, ConnectionContext, ConnectionEvent, PayloadDecryptor, Phase};

/// Overrides for the `connect` subcommand; anything unset falls back to config.
#[derive(Args, Debug, Default)]
pub struct ConnectArgs {
    /// Target cluster (e.g. "devnet", "mainnet-beta")
    #[arg(long)]
    pub cluster: Option<String>,

    /// App URL shown to the user by the wallet
    #[arg(long)]
    pub app_url: Option<String>,

    /// Deep link the wallet redirects back to
    #[arg(long)]
    pub redirect_link: Option<String>,

    /// Wallet universal-link base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Give up on a redirect that arrives after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// After connecting, print a disconnect URL redirecting to this link
    #[arg(long = "disconnect", value_name = "REDIRECT_LINK")]
    pub disconnect_link: Option<String>,
}

impl ConnectArgs {
    /// Apply CLI overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut Config) -> anyhow::Result<()> {
        if let Some(cluster) = &self.cluster {
            config.dapp.cluster.clone_from(cluster);
        }
        if let Some(app_url) = &self.app_url {
            config.dapp.app_url.clone_from(app_url);
        }
        if let Some(link) = &self.redirect_link {
            config.dapp.redirect_link.clone_from(link);
        }
        if let Some(base) = &self.base_url {
            config.wallet.base_url.clone_from(base);
        }
        if self.timeout_secs.is_some() {
            config.attempt.timeout_secs = self.timeout_secs;
        }
        config.validate()?;
        Ok(())
    }
}

/// Start an attempt, print its URL, then wait for the redirect on `input`.
pub fn run(
    config: Config,
    args: &ConnectArgs,
    input: impl BufRead,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let mut ctx = ConnectionContext::new(config);
    let url = ctx.build_connection_request()?;
    writeln!(out, "Open this URL to connect your wallet:\n\n  {url}\n")?;
    writeln!(out, "Paste the redirect URL here:")?;
    await_redirect(&mut ctx, input, out, args.disconnect_link.as_deref())
}

/// Feed lines from `input` to the context until the attempt resolves.
pub fn await_redirect<D: PayloadDecryptor>(
    ctx: &mut ConnectionContext<D>,
    input: impl BufRead,
    out: &mut impl Write,
    disconnect_link: Option<&str>,
) -> anyhow::Result<()> {
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match ctx.handle_inbound_redirect(&line) {
            ConnectionEvent::Ignored => {
                debug!("Redirect not for this attempt");
                writeln!(out, "Not a connect response for this attempt, still waiting.")?;
            }
            ConnectionEvent::Failed(reason) => {
                if ctx.phase() != Phase::AwaitingPeer {
                    anyhow::bail!("Connection failed: {reason}");
                }
                writeln!(out, "Rejected: {reason}. Still waiting.")?;
            }
            ConnectionEvent::Connected(session) => {
                writeln!(out, "Connected with: {}", session.account())?;
                if let Some(link) = disconnect_link {
                    let url = ctx.disconnect(session, link)?;
                    writeln!(out, "Disconnect URL:\n\n  {url}")?;
                }
                return Ok(());
            }
        }
    }
    anyhow::bail!("Input closed before the wallet responded")
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use wallink_crypto::base58;
    use wallink_crypto::testing::random_wallet_response;

    const ACCOUNT: &str = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin";

    fn response_line(ctx: &ConnectionContext) -> String {
        let dapp = base58::decode_fixed::<32>(&ctx.pending_public_key().unwrap(), "key").unwrap();
        let json = format!(r#"{{"session":"abc123","public_key":"{ACCOUNT}"}}"#);
        let resp = random_wallet_response(&dapp, json.as_bytes()).unwrap();
        format!(
            "wallink://onConnect?phantom_encryption_public_key={}&data={}&nonce={}",
            resp.encryption_public_key, resp.data, resp.nonce
        )
    }

    #[test]
    fn args_override_config() {
        let args = ConnectArgs {
            cluster: Some("mainnet-beta".into()),
            timeout_secs: Some(120),
            ..Default::default()
        };
        let mut config = Config::default();
        args.apply(&mut config).unwrap();
        assert_eq!(config.dapp.cluster, "mainnet-beta");
        assert_eq!(config.attempt.timeout_secs, Some(120));
        assert_eq!(config.dapp.app_url, "https://phantom.app");
    }

    #[test]
    fn disconnect_flag_parses() {
        #[derive(clap::Parser)]
        struct Harness {
            #[command(flatten)]
            args: ConnectArgs,
        }
        let harness = <Harness as clap::Parser>::try_parse_from([
            "wallink",
            "--disconnect",
            "wallink://onDisconnect",
        ])
        .unwrap();
        assert_eq!(
            harness.args.disconnect_link.as_deref(),
            Some("wallink://onDisconnect")
        );
    }

    #[test]
    fn invalid_override_is_rejected() {
        let args = ConnectArgs {
            base_url: Some("nope".into()),
            ..Default::default()
        };
        assert!(args.apply(&mut Config::default()).is_err());
    }

    #[test]
    fn connects_after_skipping_unrelated_lines() {
        let mut ctx = ConnectionContext::new(Config::default());
        ctx.build_connection_request().unwrap();
        let input = format!("\nwallink://somewhere\n{}\n", response_line(&ctx));

        let mut out = Vec::new();
        await_redirect(&mut ctx, input.as_bytes(), &mut out, None).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("still waiting"));
        assert!(out.contains(&format!("Connected with: {ACCOUNT}")));
    }

    #[test]
    fn prints_disconnect_url_when_asked() {
        let mut ctx = ConnectionContext::new(Config::default());
        ctx.build_connection_request().unwrap();
        let input = response_line(&ctx);

        let mut out = Vec::new();
        await_redirect(&mut ctx, input.as_bytes(), &mut out, Some("wallink://onDisconnect"))
            .unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("https://phantom.app/ul/v1/disconnect?"));
    }

    #[test]
    fn peer_error_ends_with_error() {
        let mut ctx = ConnectionContext::new(Config::default());
        ctx.build_connection_request().unwrap();
        let input = "wallink://onConnect?errorCode=4001&errorMessage=User%20rejected\n";

        let mut out = Vec::new();
        let err = await_redirect(&mut ctx, input.as_bytes(), &mut out, None).unwrap_err();
        assert!(err.to_string().contains("4001"));
    }

    #[test]
    fn closed_input_is_an_error() {
        let mut ctx = ConnectionContext::new(Config::default());
        ctx.build_connection_request().unwrap();
        let mut out = Vec::new();
        assert!(await_redirect(&mut ctx, &b""[..], &mut out, None).is_err());
    }

    #[test]
    fn run_prints_connect_url() {
        let mut out = Vec::new();
        let result = run(Config::default(), &ConnectArgs::default(), &b""[..], &mut out);
        assert!(result.is_err());
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("https://phantom.app/ul/v1/connect?dapp_encryption_public_key="));
    }
}
