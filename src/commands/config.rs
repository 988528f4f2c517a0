// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::db_path;
use crate::utils::{
    get_currency, get_reminder_time, parse_time, pretty_table, set_currency, set_reminder_time,
};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", _)) => {
            let rows = vec![
                vec!["currency".to_string(), get_currency(conn)?],
                vec![
                    "reminder_time".to_string(),
                    get_reminder_time(conn)?.format("%H:%M").to_string(),
                ],
                vec!["database".to_string(), db_path()?.display().to_string()],
            ];
            println!("{}", pretty_table(&["Setting", "Value"], rows));
        }
        Some(("set", sub)) => {
            if let Some(ccy) = sub.get_one::<String>("currency") {
                set_currency(conn, ccy)?;
                println!("Currency set to {}", get_currency(conn)?);
            }
            if let Some(raw) = sub.get_one::<String>("reminder_time") {
                let time = parse_time(raw)?;
                set_reminder_time(conn, time)?;
                println!("Reminder time set to {}", time.format("%H:%M"));
            }
        }
        _ => {}
    }
    Ok(())
}
