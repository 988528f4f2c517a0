// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Item families: a root item plus the sister items generated from its
//! recurrence rule. Sisters are found by query (same family id, same rule
//! copy, same category name) rather than stored links.
//!
//! Every mutating call runs in a single transaction; returning early with an
//! error drops the transaction and leaves the store untouched.

use crate::error::{CoreError, CoreResult, ReminderError};
use crate::models::{
    FamilyRef, INCOME_CATEGORY, Item, ItemKind, MAX_REMINDER_OFFSET, RecurrenceRule,
    RecurrenceUnit,
};
use crate::recurrence;
use crate::reminders::{self, ReminderClock, ReminderInstruction};
use crate::utils::{ensure_category, ensure_month, id_for_category, id_for_month, month_key};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info};
use uuid::Uuid;

pub(crate) const ITEM_COLUMNS: &str = "i.id, i.category_id, i.amount, i.kind, i.date, i.detail, \
     i.family_id, i.family_anchor, i.rec_period, i.rec_unit, i.rec_end, i.reminder_offset, i.reminder_id";

pub(crate) const ITEM_COLUMN_COUNT: usize = 13;

#[derive(Debug, Clone)]
pub struct NewItemRequest {
    pub amount: Decimal,
    pub kind: ItemKind,
    pub date: NaiveDate,
    pub detail: Option<String>,
    pub category_name: String,
    pub rule: Option<RecurrenceRule>,
    /// Minutes before the occurrence; falls back to the rule's offset.
    pub reminder_offset: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct ItemChanges {
    pub amount: Option<Decimal>,
    /// `Some("")` clears the detail.
    pub detail: Option<String>,
    /// Applies to the edited item only, never to sisters.
    pub date: Option<NaiveDate>,
}

impl ItemChanges {
    pub fn is_empty(&self) -> bool {
        self.amount.is_none() && self.detail.is_none() && self.date.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct EditItemRequest {
    pub item_id: i64,
    pub changes: ItemChanges,
    pub propagate: bool,
}

#[derive(Debug, Clone)]
pub struct DeleteItemRequest {
    pub item_id: i64,
    pub propagate: bool,
}

/// What a family operation changed: item ids, the months whose totals need
/// recomputing, and the reminder intents for the notification collaborator.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FamilyResult {
    pub created: Vec<i64>,
    pub updated: Vec<i64>,
    pub deleted: Vec<i64>,
    pub touched_months: BTreeSet<String>,
    pub reminders: Vec<ReminderInstruction>,
}

/// An item together with the category and month it hangs off.
#[derive(Debug, Clone, Serialize)]
pub struct LocatedItem {
    pub item: Item,
    pub category: String,
    pub month_key: String,
}

pub(crate) fn item_from_row(r: &Row<'_>) -> rusqlite::Result<Result<Item, String>> {
    let id: i64 = r.get(0)?;
    let amount_s: String = r.get(2)?;
    let kind_s: String = r.get(3)?;
    let family_id: Option<String> = r.get(6)?;
    let family_anchor: Option<NaiveDate> = r.get(7)?;
    let period: Option<i64> = r.get(8)?;
    let unit_s: Option<String> = r.get(9)?;
    let end: Option<NaiveDate> = r.get(10)?;
    let reminder_offset: Option<i64> = r.get(11)?;

    let Ok(amount) = amount_s.parse::<Decimal>() else {
        return Ok(Err(format!("item {} has invalid amount '{}'", id, amount_s)));
    };
    let Some(kind) = ItemKind::from_db(&kind_s) else {
        return Ok(Err(format!("item {} has invalid kind '{}'", id, kind_s)));
    };
    let rule = match (period, unit_s, end) {
        (Some(period), Some(unit_s), Some(end_date)) => {
            let Some(unit) = RecurrenceUnit::from_db(&unit_s) else {
                return Ok(Err(format!("item {} has invalid unit '{}'", id, unit_s)));
            };
            Some(RecurrenceRule {
                period,
                unit,
                end_date,
                reminder_offset,
            })
        }
        _ => None,
    };
    let family = match (family_id, family_anchor) {
        (Some(id), Some(anchor)) => Some(FamilyRef { id, anchor }),
        _ => None,
    };

    Ok(Ok(Item {
        id,
        category_id: r.get(1)?,
        amount,
        kind,
        date: r.get(4)?,
        detail: r.get(5)?,
        rule,
        reminder_offset,
        reminder_id: r.get(12)?,
        family,
    }))
}

type RawLocated = (Result<Item, String>, Option<String>, Option<String>);

fn located_from_row(r: &Row<'_>) -> rusqlite::Result<RawLocated> {
    Ok((
        item_from_row(r)?,
        r.get(ITEM_COLUMN_COUNT)?,
        r.get(ITEM_COLUMN_COUNT + 1)?,
    ))
}

fn check_located((item, category, key): RawLocated) -> CoreResult<LocatedItem> {
    let item = item.map_err(CoreError::DataIntegrity)?;
    let category = category.ok_or_else(|| {
        CoreError::DataIntegrity(format!(
            "item {} references missing category {}",
            item.id, item.category_id
        ))
    })?;
    let month_key = key.ok_or_else(|| {
        CoreError::DataIntegrity(format!(
            "category '{}' of item {} references a missing month",
            category, item.id
        ))
    })?;
    Ok(LocatedItem {
        item,
        category,
        month_key,
    })
}

fn located_query(filter: &str) -> String {
    format!(
        "SELECT {}, c.name, m.key FROM items i
         LEFT JOIN categories c ON i.category_id=c.id
         LEFT JOIN months m ON c.month_id=m.id
         {}",
        ITEM_COLUMNS, filter
    )
}

pub fn load_item(conn: &Connection, item_id: i64) -> CoreResult<LocatedItem> {
    let row = conn
        .query_row(
            &located_query("WHERE i.id=?1"),
            params![item_id],
            located_from_row,
        )
        .optional()?;
    match row {
        Some(row) => check_located(row),
        None => Err(CoreError::ItemNotFound(item_id)),
    }
}

/// Sisters of `target` dated on or after `from`, excluding `target` itself.
fn sisters_from(
    conn: &Connection,
    target: &LocatedItem,
    from: NaiveDate,
) -> CoreResult<Vec<LocatedItem>> {
    let (Some(family), Some(rule)) = (&target.item.family, &target.item.rule) else {
        return Ok(Vec::new());
    };
    let mut stmt = conn.prepare(&located_query(
        "WHERE i.family_id=?1 AND i.date>=?2 AND i.id<>?3 ORDER BY i.date, i.id",
    ))?;
    let rows = stmt.query_map(
        params![family.id, from, target.item.id],
        located_from_row,
    )?;
    let mut out = Vec::new();
    for row in rows {
        let sister = check_located(row?)?;
        if sister.item.rule.as_ref() == Some(rule) && sister.category == target.category {
            out.push(sister);
        }
    }
    Ok(out)
}

pub fn items_in_month(conn: &Connection, key: &str) -> CoreResult<Vec<LocatedItem>> {
    let mut stmt = conn.prepare(&located_query("WHERE m.key=?1 ORDER BY i.date, i.id"))?;
    let rows = stmt.query_map(params![key], located_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(check_located(row?)?);
    }
    Ok(out)
}

pub fn all_items(conn: &Connection) -> CoreResult<Vec<LocatedItem>> {
    let mut stmt = conn.prepare(&located_query("ORDER BY i.date, i.id"))?;
    let rows = stmt.query_map([], located_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(check_located(row?)?);
    }
    Ok(out)
}

fn insert_item(conn: &Connection, item: &Item) -> CoreResult<i64> {
    let rule = item.rule.as_ref();
    conn.execute(
        "INSERT INTO items(category_id, amount, kind, date, detail, family_id, family_anchor,
                           rec_period, rec_unit, rec_end, reminder_offset, reminder_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            item.category_id,
            item.amount.to_string(),
            item.kind.as_str(),
            item.date,
            item.detail,
            item.family.as_ref().map(|f| f.id.as_str()),
            item.family.as_ref().map(|f| f.anchor),
            rule.map(|r| r.period),
            rule.map(|r| r.unit.as_str()),
            rule.map(|r| r.end_date),
            item.reminder_offset,
            item.reminder_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn update_item(conn: &Connection, item: &Item) -> CoreResult<usize> {
    let rule = item.rule.as_ref();
    Ok(conn.execute(
        "UPDATE items SET category_id=?2, amount=?3, kind=?4, date=?5, detail=?6,
                family_id=?7, family_anchor=?8, rec_period=?9, rec_unit=?10, rec_end=?11,
                reminder_offset=?12, reminder_id=?13
         WHERE id=?1",
        params![
            item.id,
            item.category_id,
            item.amount.to_string(),
            item.kind.as_str(),
            item.date,
            item.detail,
            item.family.as_ref().map(|f| f.id.as_str()),
            item.family.as_ref().map(|f| f.anchor),
            rule.map(|r| r.period),
            rule.map(|r| r.unit.as_str()),
            rule.map(|r| r.end_date),
            item.reminder_offset,
            item.reminder_id,
        ],
    )?)
}

fn normalize_detail(detail: Option<&str>) -> Option<String> {
    detail
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

fn check_amount(amount: Decimal) -> CoreResult<()> {
    if amount < Decimal::ZERO {
        return Err(CoreError::InvalidItem(format!(
            "amount must not be negative, got {}",
            amount
        )));
    }
    Ok(())
}

fn validate_request(req: &NewItemRequest) -> CoreResult<()> {
    check_amount(req.amount)?;
    let name = req.category_name.trim();
    if name.is_empty() {
        return Err(CoreError::InvalidItem("category name must not be empty".into()));
    }
    let implied = ItemKind::for_category(name);
    if implied != req.kind {
        return Err(CoreError::InvalidItem(format!(
            "{} items belong in {}, not in '{}'",
            req.kind.as_str(),
            if req.kind == ItemKind::Income {
                format!("the '{}' category", INCOME_CATEGORY)
            } else {
                "a spending category".to_string()
            },
            name
        )));
    }
    if let Some(offset) = req.reminder_offset {
        if !(0..=MAX_REMINDER_OFFSET).contains(&offset) {
            return Err(CoreError::InvalidItem(format!(
                "reminder offset must be between 0 and {} minutes, got {}",
                MAX_REMINDER_OFFSET, offset
            )));
        }
    }
    if let Some(rule) = &req.rule {
        recurrence::validate(req.date, rule)?;
    }
    Ok(())
}

/// Creates the root item and, when a rule is given, one sister per further
/// occurrence. Months and the named category are created on demand.
pub fn create_family(
    conn: &mut Connection,
    req: &NewItemRequest,
    clock: &ReminderClock,
) -> CoreResult<FamilyResult> {
    validate_request(req)?;
    let category_name = req.category_name.trim();
    let dates = match &req.rule {
        Some(rule) => recurrence::expand(req.date, rule)?,
        None => vec![req.date],
    };
    let reminder_offset = req
        .reminder_offset
        .or_else(|| req.rule.as_ref().and_then(|r| r.reminder_offset));
    let rule = req.rule.clone().map(|mut r| {
        r.reminder_offset = reminder_offset;
        r
    });
    let family = rule.as_ref().map(|_| FamilyRef {
        id: Uuid::new_v4().to_string(),
        anchor: req.date,
    });
    let detail = normalize_detail(req.detail.as_deref());

    let tx = conn.transaction()?;
    let mut result = FamilyResult::default();
    for date in dates {
        let key = month_key(date);
        let month_id = ensure_month(&tx, &key)?;
        let category_id = ensure_category(&tx, month_id, category_name)?;
        let mut item = Item {
            id: 0,
            category_id,
            amount: req.amount,
            kind: req.kind,
            date,
            detail: detail.clone(),
            rule: rule.clone(),
            reminder_offset,
            reminder_id: None,
            family: family.clone(),
        };
        item.id = insert_item(&tx, &item)?;
        if let Some(reminder) = reminders::schedule_or_skip(&mut item, true, clock) {
            result.reminders.push(reminder);
        }
        if item.reminder_id.is_some() {
            tx.execute(
                "UPDATE items SET reminder_id=?2 WHERE id=?1",
                params![item.id, item.reminder_id],
            )?;
        }
        result.created.push(item.id);
        result.touched_months.insert(key);
    }
    tx.commit()?;

    info!(
        items = result.created.len(),
        category = category_name,
        family = family.as_ref().map(|f| f.id.as_str()),
        "created items"
    );
    Ok(result)
}

fn apply_changes(item: &mut Item, changes: &ItemChanges) {
    if let Some(amount) = changes.amount {
        item.amount = amount;
    }
    if let Some(detail) = &changes.detail {
        item.detail = normalize_detail(Some(detail));
    }
}

/// Edits one item. With `propagate`, amount and detail also flow to every
/// sister dated on or after the item; earlier sisters keep their values.
/// Without it, the item is detached from its family.
pub fn edit_item(
    conn: &mut Connection,
    req: &EditItemRequest,
    clock: &ReminderClock,
) -> CoreResult<FamilyResult> {
    if let Some(amount) = req.changes.amount {
        check_amount(amount)?;
    }
    let tx = conn.transaction()?;
    let target = load_item(&tx, req.item_id)?;
    let mut result = FamilyResult::default();
    result.touched_months.insert(target.month_key.clone());

    if req.propagate {
        for mut sister in sisters_from(&tx, &target, target.item.date)? {
            apply_changes(&mut sister.item, &req.changes);
            update_item(&tx, &sister.item)?;
            result.updated.push(sister.item.id);
            result.touched_months.insert(sister.month_key);
        }
    }

    let mut item = target.item.clone();
    apply_changes(&mut item, &req.changes);
    if !req.propagate {
        item.detach();
    }
    if let Some(new_date) = req.changes.date.filter(|d| *d != item.date) {
        let key = month_key(new_date);
        let month_id = ensure_month(&tx, &key)?;
        item.category_id = ensure_category(&tx, month_id, &target.category)?;
        item.date = new_date;
        // off the arithmetic sequence now
        item.detach();
        result.touched_months.insert(key);

        if item.reminder_offset.is_some() {
            let previous = item.reminder_id.clone();
            match reminders::schedule_reminder(&mut item, true, clock) {
                Ok(s) => result.reminders.push(ReminderInstruction::Schedule(s)),
                Err(ReminderError::Past { .. }) => {
                    if let Some(id) = previous {
                        result.reminders.push(reminders::cancel_reminder(&id));
                    }
                }
                Err(err) => debug!(item = item.id, %err, "reminder skipped"),
            }
        }
    }
    update_item(&tx, &item)?;
    result.updated.insert(0, item.id);
    tx.commit()?;

    info!(
        item = req.item_id,
        propagate = req.propagate,
        updated = result.updated.len(),
        "edited items"
    );
    Ok(result)
}

/// Deletes one item, or with `propagate` the item and every later sister.
/// A sister that is already gone is skipped.
pub fn delete_item(conn: &mut Connection, req: &DeleteItemRequest) -> CoreResult<FamilyResult> {
    let tx = conn.transaction()?;
    let target = load_item(&tx, req.item_id)?;
    let mut victims = Vec::new();
    if req.propagate {
        victims = sisters_from(&tx, &target, target.item.date)?;
    }
    victims.insert(0, target);

    let mut result = FamilyResult::default();
    for victim in victims {
        let n = tx.execute("DELETE FROM items WHERE id=?1", params![victim.item.id])?;
        if n == 0 {
            debug!(item = victim.item.id, "sister already gone");
            continue;
        }
        result.deleted.push(victim.item.id);
        result.touched_months.insert(victim.month_key);
        if let Some(id) = &victim.item.reminder_id {
            result.reminders.push(reminders::cancel_reminder(id));
        }
    }
    tx.commit()?;

    info!(
        item = req.item_id,
        propagate = req.propagate,
        deleted = result.deleted.len(),
        "deleted items"
    );
    Ok(result)
}

// Categories

pub fn add_category(conn: &mut Connection, key: &str, name: &str) -> CoreResult<i64> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::InvalidItem("category name must not be empty".into()));
    }
    if name == INCOME_CATEGORY {
        return Err(CoreError::InvalidItem(format!(
            "'{}' is reserved for the income category",
            INCOME_CATEGORY
        )));
    }
    let tx = conn.transaction()?;
    let month_id = ensure_month(&tx, key)?;
    if id_for_category(&tx, month_id, name)?.is_some() {
        return Err(CoreError::InvalidItem(format!(
            "category '{}' already exists in {}",
            name, key
        )));
    }
    let id = ensure_category(&tx, month_id, name)?;
    tx.commit()?;
    Ok(id)
}

/// Removes a category together with its items, cancelling their reminders.
pub fn delete_category(conn: &mut Connection, key: &str, name: &str) -> CoreResult<FamilyResult> {
    let name = name.trim();
    if name == INCOME_CATEGORY {
        return Err(CoreError::InvalidItem(format!(
            "the '{}' category cannot be removed",
            INCOME_CATEGORY
        )));
    }
    let not_found = || CoreError::CategoryNotFound {
        month: key.to_string(),
        name: name.to_string(),
    };
    let tx = conn.transaction()?;
    let month_id = id_for_month(&tx, key)?.ok_or_else(not_found)?;
    let category_id = id_for_category(&tx, month_id, name)?.ok_or_else(not_found)?;

    let mut result = FamilyResult::default();
    {
        let mut stmt =
            tx.prepare("SELECT id, reminder_id FROM items WHERE category_id=?1 ORDER BY date, id")?;
        let rows = stmt.query_map(params![category_id], |r| {
            Ok((r.get::<_, i64>(0)?, r.get::<_, Option<String>>(1)?))
        })?;
        for row in rows {
            let (id, reminder_id) = row?;
            result.deleted.push(id);
            if let Some(rid) = reminder_id {
                result.reminders.push(reminders::cancel_reminder(&rid));
            }
        }
    }
    tx.execute("DELETE FROM categories WHERE id=?1", params![category_id])?;
    tx.commit()?;
    result.touched_months.insert(key.to_string());

    info!(month = key, category = name, items = result.deleted.len(), "removed category");
    Ok(result)
}
