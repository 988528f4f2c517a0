// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::family::{ITEM_COLUMN_COUNT, ITEM_COLUMNS, item_from_row};
use crate::models::ItemKind;
use crate::recurrence::occurrence_index;
use crate::utils::{month_key, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection) -> Result<()> {
    let rows = find_issues(conn)?;
    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

pub fn find_issues(conn: &Connection) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();

    let mut stmt = conn.prepare(&format!(
        "SELECT {}, c.name, m.key FROM items i
         LEFT JOIN categories c ON i.category_id=c.id
         LEFT JOIN months m ON c.month_id=m.id
         ORDER BY i.date, i.id",
        ITEM_COLUMNS
    ))?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let item = match item_from_row(r)? {
            Ok(item) => item,
            Err(msg) => {
                rows.push(vec!["unreadable_item".into(), msg]);
                continue;
            }
        };
        let category: Option<String> = r.get(ITEM_COLUMN_COUNT)?;
        let key: Option<String> = r.get(ITEM_COLUMN_COUNT + 1)?;

        // 1) Items hanging off a missing category or month
        let (Some(category), Some(key)) = (category, key) else {
            rows.push(vec![
                "orphan_item".into(),
                format!("item {} (category {})", item.id, item.category_id),
            ]);
            continue;
        };

        // 2) Date filed under the wrong month
        if month_key(item.date) != key {
            rows.push(vec![
                "wrong_month".into(),
                format!("item {} dated {} stored in {}", item.id, item.date, key),
            ]);
        }

        // 3) Kind disagreeing with the category
        if ItemKind::for_category(&category) != item.kind {
            rows.push(vec![
                "kind_category_mismatch".into(),
                format!(
                    "item {} is {} in '{}'",
                    item.id,
                    item.kind.as_str(),
                    category
                ),
            ]);
        }

        // 4) Family members off their series
        if let (Some(family), Some(rule)) = (&item.family, &item.rule) {
            if occurrence_index(family.anchor, rule, item.date).is_none() {
                rows.push(vec![
                    "family_off_schedule".into(),
                    format!("item {} dated {} ({})", item.id, item.date, rule.label()),
                ]);
            }
        }

        // 5) Reminder offset without an identifier
        if item.reminder_offset.is_some() && item.reminder_id.is_none() {
            rows.push(vec![
                "reminder_unassigned".into(),
                format!("item {}", item.id),
            ]);
        }
    }
    Ok(rows)
}
