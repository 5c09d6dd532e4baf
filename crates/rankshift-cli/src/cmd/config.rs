//! `rankshift config`: print the effective configuration.

use std::io::Write;

use anyhow::Result;

use rankshift_core::config::Config;

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Execute `rankshift config`.
pub fn run_config(config: &Config, source: &std::path::Path, output: OutputMode) -> Result<()> {
    let toml = config.to_toml()?;
    let origin = if source.exists() {
        source.display().to_string()
    } else {
        format!("{} (not found, defaults)", source.display())
    };
    render_mode(
        output,
        config,
        |_, w| w.write_all(toml.as_bytes()),
        |_, w| {
            pretty_section(w, "Configuration")?;
            pretty_kv(w, "Source", &origin)?;
            writeln!(w)?;
            w.write_all(toml.as_bytes())
        },
    )
}
