// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::error::{Error, Result};

#[derive(Serialize)]
struct ConfigView<'a> {
    state_dir: &'a Path,
    effective_remote_url: String,
    #[serde(flatten)]
    config: &'a Config,
}

/// Print the loaded config, plus where it came from.
pub fn run(state_dir: &Path, output: OutputFormat) -> Result<()> {
    let config = Config::load(state_dir)?;

    match output {
        OutputFormat::Text => {
            println!("# state dir: {}", state_dir.display());
            let effective = config.remote_url();
            if effective != config.remote.url {
                println!("# remote url overridden by environment: {}", effective);
            }
            let content = toml::to_string_pretty(&config)
                .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
            print!("{}", content);
        }
        OutputFormat::Json => {
            let view = ConfigView {
                state_dir,
                effective_remote_url: config.remote_url(),
                config: &config,
            };
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
    }
    Ok(())
}
