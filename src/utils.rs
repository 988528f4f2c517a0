// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{CoreError, CoreResult};
use crate::models::{INCOME_CATEGORY, ItemKind, RecurrenceUnit};
use anyhow::{Context, Result, anyhow};
use chrono::{Datelike, NaiveDate, NaiveTime};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

static MONTH_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(0[1-9]|1[0-2])$").expect("month key pattern"));

pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_REMINDER_TIME: &str = "09:00";

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_month(s: &str) -> Result<String> {
    let s = s.trim();
    if !MONTH_KEY.is_match(s) {
        return Err(anyhow!("Invalid month '{}', expected YYYY-MM", s));
    }
    Ok(s.to_string())
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn parse_kind(s: &str) -> Result<ItemKind> {
    ItemKind::from_db(&s.trim().to_lowercase())
        .ok_or_else(|| anyhow!("Invalid type '{}', expected income|spending", s))
}

pub fn parse_unit(s: &str) -> Result<RecurrenceUnit> {
    let norm = s.trim().to_lowercase();
    RecurrenceUnit::from_db(norm.strip_suffix('s').unwrap_or(&norm))
        .ok_or_else(|| anyhow!("Invalid unit '{}', expected day|week|month", s))
}

pub fn parse_time(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .with_context(|| format!("Invalid time '{}', expected HH:MM", s))
}

/// Canonical month key for a date.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

pub fn year_of_key(key: &str) -> Option<i32> {
    MONTH_KEY
        .captures(key)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn fmt_money(d: &Decimal, ccy: &str) -> String {
    format!("{} {:.2}", ccy, d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

pub fn id_for_month(conn: &Connection, key: &str) -> CoreResult<Option<i64>> {
    Ok(conn
        .query_row("SELECT id FROM months WHERE key=?1", params![key], |r| {
            r.get(0)
        })
        .optional()?)
}

/// Returns the month's id, creating it together with its fixed income
/// category on first use.
pub fn ensure_month(conn: &Connection, key: &str) -> CoreResult<i64> {
    if let Some(id) = id_for_month(conn, key)? {
        return Ok(id);
    }
    conn.execute("INSERT INTO months(key) VALUES (?1)", params![key])?;
    let id = conn.last_insert_rowid();
    conn.execute(
        "INSERT INTO categories(month_id, name) VALUES (?1, ?2)",
        params![id, INCOME_CATEGORY],
    )?;
    tracing::debug!(month = key, "created month");
    Ok(id)
}

pub fn id_for_category(conn: &Connection, month_id: i64, name: &str) -> CoreResult<Option<i64>> {
    Ok(conn
        .query_row(
            "SELECT id FROM categories WHERE month_id=?1 AND name=?2",
            params![month_id, name],
            |r| r.get(0),
        )
        .optional()?)
}

pub fn ensure_category(conn: &Connection, month_id: i64, name: &str) -> CoreResult<i64> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::InvalidItem("category name must not be empty".into()));
    }
    if let Some(id) = id_for_category(conn, month_id, name)? {
        return Ok(id);
    }
    conn.execute(
        "INSERT INTO categories(month_id, name) VALUES (?1, ?2)",
        params![month_id, name],
    )?;
    Ok(conn.last_insert_rowid())
}

// Settings
fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![key],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v)
}

fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub fn get_currency(conn: &Connection) -> Result<String> {
    Ok(get_setting(conn, "currency")?.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()))
}

pub fn set_currency(conn: &Connection, ccy: &str) -> Result<()> {
    set_setting(conn, "currency", &ccy.trim().to_uppercase())
}

/// Time of day reminders are anchored to before the offset is subtracted.
pub fn get_reminder_time(conn: &Connection) -> Result<NaiveTime> {
    let raw = get_setting(conn, "reminder_time")?
        .unwrap_or_else(|| DEFAULT_REMINDER_TIME.to_string());
    parse_time(&raw)
}

pub fn set_reminder_time(conn: &Connection, time: NaiveTime) -> Result<()> {
    set_setting(conn, "reminder_time", &time.format("%H:%M").to_string())
}
