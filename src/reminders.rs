// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Reminder scheduling intents. Nothing here delivers a notification; the
//! functions compute what the notification collaborator should schedule or
//! cancel, keyed by a stable identifier stored on the item.

use crate::error::{CoreError, CoreResult, ReminderError};
use crate::family::item_from_row;
use crate::models::Item;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};
use uuid::Uuid;

/// Wall clock used to decide whether a reminder is still in the future, and
/// the time of day occurrences are anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderClock {
    pub now: NaiveDateTime,
    pub time_of_day: NaiveTime,
}

impl ReminderClock {
    pub fn new(now: NaiveDateTime, time_of_day: NaiveTime) -> Self {
        Self { now, time_of_day }
    }

    /// `None` when the offset does not fit the calendar.
    pub fn fire_time(&self, date: NaiveDate, offset_minutes: i64) -> Option<NaiveDateTime> {
        date.and_time(self.time_of_day)
            .checked_sub_signed(TimeDelta::try_minutes(offset_minutes)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledReminder {
    pub identifier: String,
    pub fire_time: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReminderInstruction {
    Schedule(ScheduledReminder),
    Cancel { identifier: String },
}

/// Computes the schedule for one item. An existing identifier is always
/// reused; a new one is minted only when `create_new` is set. The identifier
/// is assigned before the fire time is checked, so an item whose reminder is
/// already past keeps its id for a later reschedule.
pub fn schedule_reminder(
    item: &mut Item,
    create_new: bool,
    clock: &ReminderClock,
) -> Result<ScheduledReminder, ReminderError> {
    let offset = item.reminder_offset.ok_or(ReminderError::NoOffset(item.id))?;
    let identifier = match &item.reminder_id {
        Some(id) => id.clone(),
        None if create_new => {
            let id = Uuid::new_v4().to_string();
            item.reminder_id = Some(id.clone());
            id
        }
        None => return Err(ReminderError::NoIdentifier(item.id)),
    };
    let fire_time = clock
        .fire_time(item.date, offset)
        .ok_or(ReminderError::OutOfRange {
            item_id: item.id,
            offset,
        })?;
    if fire_time <= clock.now {
        return Err(ReminderError::Past {
            item_id: item.id,
            fire_time,
        });
    }
    Ok(ScheduledReminder {
        identifier,
        fire_time,
    })
}

pub fn cancel_reminder(identifier: &str) -> ReminderInstruction {
    ReminderInstruction::Cancel {
        identifier: identifier.to_string(),
    }
}

/// Schedules the item's reminder if it has one, logging the non-fatal skips.
pub(crate) fn schedule_or_skip(
    item: &mut Item,
    create_new: bool,
    clock: &ReminderClock,
) -> Option<ReminderInstruction> {
    if item.reminder_offset.is_none() {
        return None;
    }
    match schedule_reminder(item, create_new, clock) {
        Ok(s) => Some(ReminderInstruction::Schedule(s)),
        Err(err) => {
            debug!(item = item.id, %err, "reminder skipped");
            None
        }
    }
}

/// Items that carry a reminder, read fresh from the store.
pub fn items_with_reminders(conn: &Connection) -> CoreResult<Vec<Item>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM items i WHERE i.reminder_offset IS NOT NULL ORDER BY i.date, i.id",
        crate::family::ITEM_COLUMNS
    ))?;
    let rows = stmt.query_map([], item_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?.map_err(CoreError::DataIntegrity)?);
    }
    Ok(out)
}

/// Reconciles the reminders the notification collaborator reports as pending
/// with what the store says should be pending. Safe to run from a separate
/// connection while foreground edits happen: it only reads items and never
/// mints identifiers.
pub fn sync_reminders(
    conn: &Connection,
    pending: &[ScheduledReminder],
    clock: &ReminderClock,
) -> CoreResult<Vec<ReminderInstruction>> {
    let mut wanted: HashMap<String, ScheduledReminder> = HashMap::new();
    for mut item in items_with_reminders(conn)? {
        match schedule_reminder(&mut item, false, clock) {
            Ok(s) => {
                wanted.insert(s.identifier.clone(), s);
            }
            Err(ReminderError::Past { .. }) => {}
            Err(err) => warn!(item = item.id, %err, "reminder not synced"),
        }
    }

    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for p in pending {
        seen.insert(p.identifier.as_str());
        match wanted.get(&p.identifier) {
            Some(w) if w.fire_time == p.fire_time => {}
            Some(w) => out.push(ReminderInstruction::Schedule(w.clone())),
            None => out.push(cancel_reminder(&p.identifier)),
        }
    }
    let mut missing: Vec<&ScheduledReminder> = wanted
        .values()
        .filter(|w| !seen.contains(w.identifier.as_str()))
        .collect();
    missing.sort_by(|a, b| {
        a.fire_time
            .cmp(&b.fire_time)
            .then_with(|| a.identifier.cmp(&b.identifier))
    });
    out.extend(
        missing
            .into_iter()
            .map(|w| ReminderInstruction::Schedule(w.clone())),
    );
    debug!(instructions = out.len(), "reminders synced");
    Ok(out)
}
