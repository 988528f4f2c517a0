// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use monthbook::commands::CommandContext;
use monthbook::{cli, commands, db, logging};

fn main() -> Result<()> {
    logging::init();
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let mut conn = db::open_or_init()?;
    let ctx = CommandContext::from_system(&conn)?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("item", sub)) => commands::items::handle(&mut conn, sub, &ctx)?,
        Some(("category", sub)) => commands::categories::handle(&mut conn, sub, &ctx)?,
        Some(("report", sub)) => commands::reports::handle(&conn, sub)?,
        Some(("reminders", sub)) => commands::reminders::handle(&conn, sub, &ctx)?,
        Some(("widget", sub)) => commands::widget::handle(&conn, sub, &ctx)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, sub)?,
        Some(("config", sub)) => commands::config::handle(&conn, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&conn)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
