// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use crate::cli::OutputFormat;
use crate::display::{format_alert, format_category, format_reminder, format_transaction};
use crate::error::Result;
use crate::sync::Collection;

use super::{print_list, Access, Context};

/// Print the last cached snapshot of a collection. Never fetches.
pub fn run(state_dir: &Path, collection: Collection, output: OutputFormat) -> Result<()> {
    let ctx = Context::open(state_dir, Access::Shared)?;
    let cache = ctx.coordinator.cache();
    let empty = format!("No cached {}. Run 'tally sync' while online.", collection);

    match collection {
        Collection::Transactions => {
            print_list(&cache.transactions()?, output, &empty, |t| {
                vec![format_transaction(t)]
            })
        }
        Collection::Categories => print_list(&cache.categories()?, output, &empty, |c| {
            vec![format_category(c)]
        }),
        Collection::Alerts => print_list(&cache.alerts()?, output, &empty, |a| {
            vec![format_alert(a)]
        }),
        Collection::Reminders => print_list(&cache.reminders()?, output, &empty, |r| {
            vec![format_reminder(r)]
        }),
    }
}
