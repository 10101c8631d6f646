//! `wallink config`: show the resolved configuration.

use std::io::Write;

use wallink_core::Config;

/// Write `config` as pretty JSON.
pub fn run(config: &Config, out: &mut impl Write) -> anyhow::Result<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(config)?)?;
    Ok(())
}
