// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::CommandContext;
use crate::utils::parse_month;
use crate::widget::{read_summary, summary_for, write_summary};
use anyhow::{Result, anyhow};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches, ctx: &CommandContext) -> Result<()> {
    let path = ctx
        .widget_path
        .as_ref()
        .ok_or_else(|| anyhow!("Widget output is disabled"))?;
    match m.subcommand() {
        Some(("show", _)) => match read_summary(path)? {
            Some(s) => println!("{}", serde_json::to_string_pretty(&s)?),
            None => println!("No widget summary at {}", path.display()),
        },
        Some(("refresh", sub)) => {
            let month = match sub.get_one::<String>("month") {
                Some(m) => parse_month(m)?,
                None => ctx.current_month(),
            };
            let summary = summary_for(conn, &month)?;
            write_summary(path, &summary)?;
            println!("Wrote widget summary for {} to {}", month, path.display());
        }
        _ => {}
    }
    Ok(())
}
