// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{CoreError, CoreResult};
use crate::family::FamilyResult;
use crate::models::ItemKind;
use crate::reminders::ReminderInstruction;
use crate::utils::year_of_key;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MonthTotals {
    pub income: Decimal,
    pub spending: Decimal,
}

impl MonthTotals {
    pub fn add(&mut self, kind: ItemKind, amount: Decimal) {
        match kind {
            ItemKind::Income => self.income += amount,
            ItemKind::Spending => self.spending += amount,
        }
    }

    /// Larger of the two buckets, used to scale charts.
    pub fn peak(&self) -> Decimal {
        self.income.max(self.spending)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct YearTotals {
    pub year: i32,
    pub total_income: Decimal,
    pub total_spending: Decimal,
    pub max_amount_per_month: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub name: String,
    pub kind: ItemKind,
    pub total: Decimal,
    pub items: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthTotalsChanged {
    pub month_key: String,
    pub income: Decimal,
    pub spending: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearTotalsChanged {
    pub year: i32,
    pub total_income: Decimal,
    pub total_spending: Decimal,
    pub max_month_amount: Decimal,
}

/// Everything the UI layer needs to refresh after a mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    pub months: Vec<MonthTotalsChanged>,
    pub years: Vec<YearTotalsChanged>,
    pub reminders: Vec<ReminderInstruction>,
}

impl ChangeSet {
    pub fn month(&self, key: &str) -> Option<&MonthTotalsChanged> {
        self.months.iter().find(|m| m.month_key == key)
    }
}

fn parse_amount(raw: &str, item_id: i64) -> CoreResult<Decimal> {
    raw.parse::<Decimal>().map_err(|_| {
        CoreError::DataIntegrity(format!("item {} has invalid amount '{}'", item_id, raw))
    })
}

fn parse_kind(raw: &str, item_id: i64) -> CoreResult<ItemKind> {
    ItemKind::from_db(raw).ok_or_else(|| {
        CoreError::DataIntegrity(format!("item {} has invalid kind '{}'", item_id, raw))
    })
}

/// Income and spending of one month, bucketed by each item's kind. A month
/// that does not exist yet totals zero.
pub fn recompute_month_totals(conn: &Connection, key: &str) -> CoreResult<MonthTotals> {
    let mut stmt = conn.prepare_cached(
        "SELECT i.id, i.amount, i.kind FROM items i
         JOIN categories c ON i.category_id=c.id
         JOIN months m ON c.month_id=m.id
         WHERE m.key=?1",
    )?;
    let mut rows = stmt.query(params![key])?;
    let mut totals = MonthTotals::default();
    while let Some(r) = rows.next()? {
        let id: i64 = r.get(0)?;
        let amount: String = r.get(1)?;
        let kind: String = r.get(2)?;
        totals.add(parse_kind(&kind, id)?, parse_amount(&amount, id)?);
    }
    Ok(totals)
}

pub fn month_keys_in_year(conn: &Connection, year: i32) -> CoreResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT key FROM months WHERE key LIKE ?1 ORDER BY key")?;
    let rows = stmt.query_map(params![format!("{:04}-%", year)], |r| r.get::<_, String>(0))?;
    let mut keys = Vec::new();
    for row in rows {
        keys.push(row?);
    }
    Ok(keys)
}

pub fn calc_year_totals(conn: &Connection, year: i32) -> CoreResult<YearTotals> {
    let mut totals = YearTotals {
        year,
        ..Default::default()
    };
    for key in month_keys_in_year(conn, year)? {
        let m = recompute_month_totals(conn, &key)?;
        totals.total_income += m.income;
        totals.total_spending += m.spending;
        if m.peak() > totals.max_amount_per_month {
            totals.max_amount_per_month = m.peak();
        }
    }
    Ok(totals)
}

/// Per-category totals for a month. The bucket follows the category, not the
/// per-item flag: the income category is income, everything else spending.
pub fn category_totals(conn: &Connection, key: &str) -> CoreResult<Vec<CategoryTotal>> {
    let mut stmt = conn.prepare(
        "SELECT c.name, i.id, i.amount FROM categories c
         JOIN months m ON c.month_id=m.id
         LEFT JOIN items i ON i.category_id=c.id
         WHERE m.key=?1
         ORDER BY c.name",
    )?;
    let mut rows = stmt.query(params![key])?;
    let mut by_name: BTreeMap<String, CategoryTotal> = BTreeMap::new();
    while let Some(r) = rows.next()? {
        let name: String = r.get(0)?;
        let id: Option<i64> = r.get(1)?;
        let amount: Option<String> = r.get(2)?;
        let entry = by_name.entry(name.clone()).or_insert_with(|| CategoryTotal {
            kind: ItemKind::for_category(&name),
            name,
            total: Decimal::ZERO,
            items: 0,
        });
        if let (Some(id), Some(amount)) = (id, amount) {
            entry.total += parse_amount(&amount, id)?;
            entry.items += 1;
        }
    }
    let mut out: Vec<CategoryTotal> = by_name.into_values().collect();
    out.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
    Ok(out)
}

/// Recomputes totals for every month and year a family operation touched.
pub fn change_set(conn: &Connection, result: &FamilyResult) -> CoreResult<ChangeSet> {
    let mut changes = ChangeSet {
        reminders: result.reminders.clone(),
        ..Default::default()
    };
    let mut years = BTreeSet::new();
    for key in &result.touched_months {
        let totals = recompute_month_totals(conn, key)?;
        changes.months.push(MonthTotalsChanged {
            month_key: key.clone(),
            income: totals.income,
            spending: totals.spending,
        });
        if let Some(year) = year_of_key(key) {
            years.insert(year);
        }
    }
    for year in years {
        let totals = calc_year_totals(conn, year)?;
        changes.years.push(YearTotalsChanged {
            year,
            total_income: totals.total_income,
            total_spending: totals.total_spending,
            max_month_amount: totals.max_amount_per_month,
        });
    }
    Ok(changes)
}
