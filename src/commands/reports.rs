// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::aggregate::{calc_year_totals, category_totals, month_keys_in_year, recompute_month_totals};
use crate::utils::{fmt_money, get_currency, maybe_print_json, parse_month, pretty_table};
use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("month", sub)) => month(conn, sub)?,
        Some(("year", sub)) => year(conn, sub)?,
        Some(("categories", sub)) => categories(conn, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Serialize)]
struct MonthReport {
    month: String,
    income: String,
    spending: String,
    net: String,
}

fn month(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let key = parse_month(sub.get_one::<String>("month").unwrap())?;
    let totals = recompute_month_totals(conn, &key)?;
    let report = MonthReport {
        month: key,
        income: format!("{:.2}", totals.income),
        spending: format!("{:.2}", totals.spending),
        net: format!("{:.2}", totals.income - totals.spending),
    };
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
        println!(
            "{}",
            pretty_table(
                &["Month", "Income", "Spending", "Net"],
                vec![vec![report.month, report.income, report.spending, report.net]],
            )
        );
    }
    Ok(())
}

fn year(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let year = *sub.get_one::<i32>("year").unwrap();
    let totals = calc_year_totals(conn, year)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &totals)? {
        return Ok(());
    }
    let ccy = get_currency(conn)?;
    let mut rows = Vec::new();
    for key in month_keys_in_year(conn, year)? {
        let m = recompute_month_totals(conn, &key)?;
        rows.push(vec![
            key,
            fmt_money(&m.income, &ccy),
            fmt_money(&m.spending, &ccy),
        ]);
    }
    rows.push(vec![
        format!("{} total", year),
        fmt_money(&totals.total_income, &ccy),
        fmt_money(&totals.total_spending, &ccy),
    ]);
    println!("{}", pretty_table(&["Month", "Income", "Spending"], rows));
    println!(
        "Largest monthly amount: {}",
        fmt_money(&totals.max_amount_per_month, &ccy)
    );
    Ok(())
}

fn categories(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let key = parse_month(sub.get_one::<String>("month").unwrap())?;
    let data = category_totals(conn, &key)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .into_iter()
            .map(|c| {
                vec![
                    c.name,
                    c.kind.as_str().to_string(),
                    c.items.to_string(),
                    format!("{:.2}", c.total),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Category", "Type", "Items", "Total"], rows)
        );
    }
    Ok(())
}
