// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use crate::cli::OutputFormat;
use crate::display::format_dead_letter;
use crate::error::Result;

use super::{print_list, Access, Context};

pub fn run(state_dir: &Path, clear: bool, output: OutputFormat) -> Result<()> {
    if clear {
        let ctx = Context::open(state_dir, Access::Exclusive)?;
        let removed = ctx.coordinator.queue().clear_dead_letters()?;
        let noun = if removed == 1 { "dead letter" } else { "dead letters" };
        println!("Cleared {} {}", removed, noun);
        return Ok(());
    }

    let ctx = Context::open(state_dir, Access::Shared)?;
    let letters = ctx.coordinator.queue().dead_letters()?;
    print_list(&letters, output, "No dead letters.", format_dead_letter)
}
