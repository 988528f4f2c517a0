// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::family::{LocatedItem, all_items, items_in_month};
use crate::utils::parse_month;
use anyhow::{Result, anyhow};
use rusqlite::Connection;
use serde_json::json;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("items", sub)) => export_items(conn, sub),
        _ => Ok(()),
    }
}

fn export_items(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().trim().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap().trim().to_string();
    if fmt != "csv" && fmt != "json" {
        return Err(anyhow!("Unknown format: {} (use csv|json)", fmt));
    }

    let items: Vec<LocatedItem> = match sub.get_one::<String>("month") {
        Some(m) => items_in_month(conn, &parse_month(m)?)?,
        None => all_items(conn)?,
    };

    if fmt == "csv" {
        let mut wtr = csv::Writer::from_path(&out)?;
        wtr.write_record([
            "id", "date", "month", "category", "type", "amount", "detail", "family", "repeats",
            "reminder_offset",
        ])?;
        for l in items {
            wtr.write_record([
                l.item.id.to_string(),
                l.item.date.to_string(),
                l.month_key,
                l.category,
                l.item.kind.as_str().to_string(),
                l.item.amount.to_string(),
                l.item.detail.unwrap_or_default(),
                l.item.family.map(|f| f.id).unwrap_or_default(),
                l.item.rule.map(|r| r.label()).unwrap_or_default(),
                l.item
                    .reminder_offset
                    .map(|o| o.to_string())
                    .unwrap_or_default(),
            ])?;
        }
        wtr.flush()?;
    } else {
        let rows: Vec<serde_json::Value> = items
            .into_iter()
            .map(|l| {
                json!({
                    "id": l.item.id,
                    "date": l.item.date.to_string(),
                    "month": l.month_key,
                    "category": l.category,
                    "type": l.item.kind.as_str(),
                    "amount": l.item.amount.to_string(),
                    "detail": l.item.detail,
                    "family": l.item.family.map(|f| f.id),
                    "rule": l.item.rule,
                    "reminder_offset": l.item.reminder_offset,
                })
            })
            .collect();
        std::fs::write(&out, serde_json::to_string_pretty(&rows)?)?;
    }
    println!("Exported items to {}", out);
    Ok(())
}
