// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::CommandContext;
use crate::reminders::{ScheduledReminder, items_with_reminders, sync_reminders};
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use std::fs;

pub fn handle(conn: &Connection, m: &clap::ArgMatches, ctx: &CommandContext) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => list(conn, sub, ctx)?,
        Some(("sync", sub)) => sync(conn, sub, ctx)?,
        _ => {}
    }
    Ok(())
}

#[derive(Serialize)]
pub struct ReminderRow {
    pub item_id: i64,
    pub date: String,
    pub identifier: String,
    pub fire_time: String,
    pub upcoming: bool,
}

pub fn query_rows(conn: &Connection, ctx: &CommandContext) -> Result<Vec<ReminderRow>> {
    let mut data = Vec::new();
    for item in items_with_reminders(conn)? {
        let Some(offset) = item.reminder_offset else {
            continue;
        };
        let fire_time = ctx.clock.fire_time(item.date, offset);
        data.push(ReminderRow {
            item_id: item.id,
            date: item.date.to_string(),
            identifier: item.reminder_id.unwrap_or_default(),
            fire_time: fire_time
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "out of range".to_string()),
            upcoming: fire_time.is_some_and(|t| t > ctx.clock.now),
        });
    }
    Ok(data)
}

fn list(conn: &Connection, sub: &clap::ArgMatches, ctx: &CommandContext) -> Result<()> {
    let data = query_rows(conn, ctx)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|r| {
                vec![
                    r.item_id.to_string(),
                    r.date.clone(),
                    r.fire_time.clone(),
                    if r.upcoming { "yes" } else { "no" }.to_string(),
                    r.identifier.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Item", "Date", "Fires", "Upcoming", "Identifier"], rows)
        );
    }
    Ok(())
}

fn sync(conn: &Connection, sub: &clap::ArgMatches, ctx: &CommandContext) -> Result<()> {
    let pending: Vec<ScheduledReminder> = match sub.get_one::<String>("pending") {
        Some(path) => {
            let path = path.trim();
            let content =
                fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
            serde_json::from_str(&content)
                .with_context(|| format!("parsing pending reminders in {}", path))?
        }
        None => Vec::new(),
    };
    let instructions = sync_reminders(conn, &pending, &ctx.clock)?;
    println!("{}", serde_json::to_string_pretty(&instructions)?);
    Ok(())
}
