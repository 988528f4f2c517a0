// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::CommandContext;
use crate::aggregate::change_set;
use crate::family;
use crate::utils::{maybe_print_json, parse_month, pretty_table};
use crate::widget;
use anyhow::Result;
use rusqlite::{Connection, params};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches, ctx: &CommandContext) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let month = parse_month(sub.get_one::<String>("month").unwrap())?;
            let name = sub.get_one::<String>("name").unwrap().trim().to_string();
            family::add_category(conn, &month, &name)?;
            println!("Added category '{}' to {}", name, month);
        }
        Some(("list", sub)) => {
            let month = parse_month(sub.get_one::<String>("month").unwrap())?;
            let data = list_names(conn, &month)?;
            println!(
                "{}",
                pretty_table(&["Category"], data.into_iter().map(|n| vec![n]).collect())
            );
        }
        Some(("rm", sub)) => {
            let month = parse_month(sub.get_one::<String>("month").unwrap())?;
            let name = sub.get_one::<String>("name").unwrap().trim().to_string();
            let result = family::delete_category(conn, &month, &name)?;
            let changes = change_set(conn, &result)?;
            if let Some(path) = &ctx.widget_path {
                widget::refresh_if_current(path, &changes, &ctx.current_month())?;
            }
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &changes)? {
                println!(
                    "Removed category '{}' from {} ({} item(s))",
                    name,
                    month,
                    result.deleted.len()
                );
            }
        }
        _ => {}
    }
    Ok(())
}

pub fn list_names(conn: &Connection, month: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT c.name FROM categories c JOIN months m ON c.month_id=m.id
         WHERE m.key=?1 ORDER BY c.name",
    )?;
    let rows = stmt.query_map(params![month], |r| r.get::<_, String>(0))?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(data)
}
