// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::CommandContext;
use crate::aggregate::{ChangeSet, change_set};
use crate::family::{
    self, DeleteItemRequest, EditItemRequest, FamilyResult, ItemChanges, NewItemRequest,
};
use crate::models::{INCOME_CATEGORY, ItemKind, RecurrenceRule};
use crate::reminders::ReminderInstruction;
use crate::utils::{
    fmt_money, get_currency, maybe_print_json, parse_date, parse_decimal, parse_kind,
    parse_month, parse_unit, pretty_table,
};
use crate::widget;
use anyhow::{Result, anyhow};
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches, ctx: &CommandContext) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub, ctx)?,
        Some(("edit", sub)) => edit(conn, sub, ctx)?,
        Some(("rm", sub)) => remove(conn, sub, ctx)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

pub fn new_item_request(sub: &clap::ArgMatches) -> Result<NewItemRequest> {
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let kind = parse_kind(sub.get_one::<String>("type").unwrap())?;
    let category_name = match sub.get_one::<String>("category") {
        Some(c) => c.trim().to_string(),
        None if kind == ItemKind::Income => INCOME_CATEGORY.to_string(),
        None => return Err(anyhow!("--category is required for spending items")),
    };
    let detail = sub.get_one::<String>("detail").map(|s| s.to_string());
    let reminder_offset = sub.get_one::<i64>("remind").copied();

    let rule = match (sub.get_one::<i64>("every"), sub.get_one::<String>("until")) {
        (Some(period), Some(until)) => Some(RecurrenceRule {
            period: *period,
            unit: parse_unit(sub.get_one::<String>("unit").unwrap())?,
            end_date: parse_date(until)?,
            reminder_offset,
        }),
        _ => None,
    };

    Ok(NewItemRequest {
        amount,
        kind,
        date,
        detail,
        category_name,
        rule,
        reminder_offset,
    })
}

/// Recomputes totals for what `result` touched, refreshes the widget file
/// and prints the outcome.
fn finish(
    conn: &Connection,
    sub: &clap::ArgMatches,
    ctx: &CommandContext,
    verb: &str,
    result: &FamilyResult,
) -> Result<ChangeSet> {
    let changes = change_set(conn, result)?;
    if let Some(path) = &ctx.widget_path {
        widget::refresh_if_current(path, &changes, &ctx.current_month())?;
    }

    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    if !maybe_print_json(json_flag, jsonl_flag, &changes)? {
        let ids = match verb {
            "Created" => &result.created,
            "Deleted" => &result.deleted,
            _ => &result.updated,
        };
        println!("{} {} item(s): {:?}", verb, ids.len(), ids);
        let ccy = get_currency(conn)?;
        let rows: Vec<Vec<String>> = changes
            .months
            .iter()
            .map(|m| {
                vec![
                    m.month_key.clone(),
                    fmt_money(&m.income, &ccy),
                    fmt_money(&m.spending, &ccy),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Month", "Income", "Spending"], rows));
        for r in &changes.reminders {
            match r {
                ReminderInstruction::Schedule(s) => {
                    println!("Reminder {} at {}", s.identifier, s.fire_time)
                }
                ReminderInstruction::Cancel { identifier } => {
                    println!("Reminder {} cancelled", identifier)
                }
            }
        }
    }
    Ok(changes)
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches, ctx: &CommandContext) -> Result<()> {
    let req = new_item_request(sub)?;
    let result = family::create_family(conn, &req, &ctx.clock)?;
    finish(conn, sub, ctx, "Created", &result)?;
    Ok(())
}

fn edit(conn: &mut Connection, sub: &clap::ArgMatches, ctx: &CommandContext) -> Result<()> {
    let item_id = *sub.get_one::<i64>("id").unwrap();
    let changes = ItemChanges {
        amount: sub
            .get_one::<String>("amount")
            .map(|s| parse_decimal(s))
            .transpose()?,
        detail: sub.get_one::<String>("detail").map(|s| s.to_string()),
        date: sub
            .get_one::<String>("date")
            .map(|s| parse_date(s))
            .transpose()?,
    };
    if changes.is_empty() {
        return Err(anyhow!("Nothing to change: pass --amount, --detail or --date"));
    }
    let req = EditItemRequest {
        item_id,
        changes,
        propagate: sub.get_flag("propagate"),
    };
    let result = family::edit_item(conn, &req, &ctx.clock)?;
    finish(conn, sub, ctx, "Updated", &result)?;
    Ok(())
}

fn remove(conn: &mut Connection, sub: &clap::ArgMatches, ctx: &CommandContext) -> Result<()> {
    let req = DeleteItemRequest {
        item_id: *sub.get_one::<i64>("id").unwrap(),
        propagate: sub.get_flag("propagate"),
    };
    let result = family::delete_item(conn, &req)?;
    finish(conn, sub, ctx, "Deleted", &result)?;
    Ok(())
}

#[derive(Serialize)]
pub struct ItemRow {
    pub id: i64,
    pub date: String,
    pub category: String,
    pub kind: String,
    pub amount: String,
    pub detail: String,
    pub repeats: String,
    pub reminder: String,
}

pub fn query_rows(conn: &Connection, month: &str) -> Result<Vec<ItemRow>> {
    let items = family::items_in_month(conn, month)?;
    Ok(items
        .into_iter()
        .map(|l| ItemRow {
            id: l.item.id,
            date: l.item.date.to_string(),
            category: l.category,
            kind: l.item.kind.as_str().to_string(),
            amount: l.item.amount.to_string(),
            detail: l.item.detail.unwrap_or_default(),
            repeats: l.item.rule.map(|r| r.label()).unwrap_or_default(),
            reminder: l
                .item
                .reminder_offset
                .map(|o| format!("{} min before", o))
                .unwrap_or_default(),
        })
        .collect())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let month = parse_month(sub.get_one::<String>("month").unwrap())?;
    let data = query_rows(conn, &month)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.category.clone(),
                    r.kind.clone(),
                    r.amount.clone(),
                    r.detail.clone(),
                    r.repeats.clone(),
                    r.reminder.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Category", "Type", "Amount", "Detail", "Repeats", "Reminder"],
                rows,
            )
        );
    }
    Ok(())
}
