// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use tally_core::SqliteStore;

use crate::config::{db_path, init_state_dir};
use crate::error::Result;

pub fn run(state_dir: &Path, remote: Option<String>) -> Result<()> {
    let config = init_state_dir(state_dir, remote.as_deref())?;
    // Create the database up front so permission problems surface here
    SqliteStore::open(&db_path(state_dir))?;

    println!("Initialized tally in {}", state_dir.display());
    println!("Remote: {}", config.remote.url);
    Ok(())
}
