// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use monthbook::db;
use monthbook::error::{CoreError, ReminderError};
use monthbook::family::{
    DeleteItemRequest, EditItemRequest, ItemChanges, NewItemRequest, create_family, delete_item,
    edit_item, load_item,
};
use monthbook::models::{Item, ItemKind, MAX_REMINDER_OFFSET, RecurrenceRule, RecurrenceUnit};
use monthbook::reminders::{
    ReminderClock, ReminderInstruction, ScheduledReminder, cancel_reminder, schedule_reminder,
    sync_reminders,
};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn at(date: NaiveDate, h: u32, min: u32) -> NaiveDateTime {
    date.and_hms_opt(h, min, 0).unwrap()
}

fn clock() -> ReminderClock {
    ReminderClock::new(
        at(d(2020, 12, 1), 0, 0),
        NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
    )
}

fn bare_item(date: NaiveDate, offset: Option<i64>) -> Item {
    Item {
        id: 7,
        category_id: 1,
        amount: Decimal::from(20),
        kind: ItemKind::Spending,
        date,
        detail: None,
        rule: None,
        reminder_offset: offset,
        reminder_id: None,
        family: None,
    }
}

fn bills(start: NaiveDate, until: NaiveDate, offset: i64) -> NewItemRequest {
    NewItemRequest {
        amount: Decimal::from(60),
        kind: ItemKind::Spending,
        date: start,
        detail: Some("Phone".into()),
        category_name: "Bills".into(),
        rule: Some(RecurrenceRule {
            period: 1,
            unit: RecurrenceUnit::Month,
            end_date: until,
            reminder_offset: Some(offset),
        }),
        reminder_offset: None,
    }
}

fn scheduled(instructions: &[ReminderInstruction]) -> Vec<ScheduledReminder> {
    instructions
        .iter()
        .filter_map(|i| match i {
            ReminderInstruction::Schedule(s) => Some(s.clone()),
            ReminderInstruction::Cancel { .. } => None,
        })
        .collect()
}

fn reminder_ids(conn: &Connection) -> Vec<Option<String>> {
    let mut stmt = conn
        .prepare("SELECT reminder_id FROM items ORDER BY date, id")
        .unwrap();
    stmt.query_map([], |r| r.get(0))
        .unwrap()
        .map(|r| r.unwrap())
        .collect()
}

#[test]
fn fire_time_is_offset_from_the_reminder_time() {
    let c = clock();
    assert_eq!(c.fire_time(d(2021, 1, 10), 0), Some(at(d(2021, 1, 10), 9, 0)));
    assert_eq!(c.fire_time(d(2021, 1, 10), 90), Some(at(d(2021, 1, 10), 7, 30)));
    assert_eq!(c.fire_time(d(2021, 1, 10), 600), Some(at(d(2021, 1, 9), 23, 0)));
    assert_eq!(c.fire_time(d(2021, 1, 10), i64::MAX / 2), None);
}

#[test]
fn oversized_offsets_are_rejected_or_reported() {
    let mut conn = db::open_in_memory().unwrap();
    let mut req = bills(d(2021, 1, 3), d(2021, 3, 1), 0);
    req.reminder_offset = Some(i64::MAX / 2);
    assert!(matches!(
        create_family(&mut conn, &req, &clock()),
        Err(CoreError::InvalidItem(_))
    ));

    let req = bills(d(2021, 1, 3), d(2021, 3, 1), MAX_REMINDER_OFFSET + 1);
    assert!(matches!(
        create_family(&mut conn, &req, &clock()),
        Err(CoreError::InvalidRule(_))
    ));

    let req = bills(d(2022, 1, 3), d(2022, 3, 1), MAX_REMINDER_OFFSET);
    let result = create_family(&mut conn, &req, &clock()).unwrap();
    assert_eq!(scheduled(&result.reminders).len(), 2);
    assert_eq!(
        scheduled(&result.reminders)[0].fire_time,
        at(d(2021, 1, 3), 9, 0)
    );

    let mut item = bare_item(d(2021, 1, 10), Some(i64::MAX / 2));
    assert_eq!(
        schedule_reminder(&mut item, true, &clock()).unwrap_err(),
        ReminderError::OutOfRange {
            item_id: 7,
            offset: i64::MAX / 2,
        }
    );

    // A row written before the bound existed must not break sync.
    conn.execute("UPDATE items SET reminder_offset=?1", params![i64::MAX / 2])
        .unwrap();
    assert!(sync_reminders(&conn, &[], &clock()).unwrap().is_empty());
}

#[test]
fn identifier_is_minted_once_and_reused() {
    let mut item = bare_item(d(2021, 1, 10), Some(60));
    let first = schedule_reminder(&mut item, true, &clock()).unwrap();
    assert_eq!(item.reminder_id.as_deref(), Some(first.identifier.as_str()));
    assert_eq!(first.fire_time, at(d(2021, 1, 10), 8, 0));

    let second = schedule_reminder(&mut item, true, &clock()).unwrap();
    assert_eq!(first, second);
    let third = schedule_reminder(&mut item, false, &clock()).unwrap();
    assert_eq!(first, third);
}

#[test]
fn past_reminders_still_get_an_identifier() {
    let mut item = bare_item(d(2020, 11, 30), Some(0));
    let err = schedule_reminder(&mut item, true, &clock()).unwrap_err();
    assert_eq!(
        err,
        ReminderError::Past {
            item_id: 7,
            fire_time: at(d(2020, 11, 30), 9, 0),
        }
    );
    assert!(item.reminder_id.is_some());
}

#[test]
fn missing_identifier_or_offset_is_reported() {
    let mut item = bare_item(d(2021, 1, 10), Some(5));
    assert_eq!(
        schedule_reminder(&mut item, false, &clock()).unwrap_err(),
        ReminderError::NoIdentifier(7)
    );
    assert!(item.reminder_id.is_none());

    let mut item = bare_item(d(2021, 1, 10), None);
    assert_eq!(
        schedule_reminder(&mut item, true, &clock()).unwrap_err(),
        ReminderError::NoOffset(7)
    );
}

#[test]
fn instructions_serialize_with_an_action_tag() {
    let json = serde_json::to_value(cancel_reminder("abc")).unwrap();
    assert_eq!(json["action"], "cancel");
    assert_eq!(json["identifier"], "abc");

    let schedule = ReminderInstruction::Schedule(ScheduledReminder {
        identifier: "xyz".into(),
        fire_time: at(d(2021, 2, 1), 9, 0),
    });
    let json = serde_json::to_value(&schedule).unwrap();
    assert_eq!(json["action"], "schedule");
    let back: ReminderInstruction = serde_json::from_value(json).unwrap();
    assert_eq!(back, schedule);
}

#[test]
fn family_members_each_get_their_own_reminder() {
    let mut conn = db::open_in_memory().unwrap();
    let result = create_family(&mut conn, &bills(d(2020, 11, 15), d(2021, 2, 1), 30), &clock())
        .unwrap();
    assert_eq!(result.created.len(), 3);

    // November is already past: identifier stored, nothing scheduled.
    let plan = scheduled(&result.reminders);
    assert_eq!(plan.len(), 2);
    assert_eq!(plan[0].fire_time, at(d(2020, 12, 15), 8, 30));
    assert_eq!(plan[1].fire_time, at(d(2021, 1, 15), 8, 30));

    let ids = reminder_ids(&conn);
    assert!(ids.iter().all(|id| id.is_some()));
    assert_ne!(ids[0], ids[1]);
    assert_eq!(ids[1].as_deref(), Some(plan[0].identifier.as_str()));
}

#[test]
fn deleting_members_cancels_their_reminders() {
    let mut conn = db::open_in_memory().unwrap();
    let created = create_family(&mut conn, &bills(d(2021, 1, 3), d(2021, 4, 1), 0), &clock())
        .unwrap()
        .created;
    let expected: Vec<ReminderInstruction> = reminder_ids(&conn)[1..]
        .iter()
        .map(|id| cancel_reminder(id.as_deref().unwrap()))
        .collect();

    let result = delete_item(
        &mut conn,
        &DeleteItemRequest {
            item_id: created[1],
            propagate: true,
        },
    )
    .unwrap();
    assert_eq!(result.reminders, expected);
}

#[test]
fn moving_an_item_reschedules_its_reminder() {
    let mut conn = db::open_in_memory().unwrap();
    let created = create_family(&mut conn, &bills(d(2021, 1, 3), d(2021, 3, 1), 60), &clock())
        .unwrap()
        .created;
    let before = load_item(&conn, created[0]).unwrap().item.reminder_id;

    let result = edit_item(
        &mut conn,
        &EditItemRequest {
            item_id: created[0],
            changes: ItemChanges {
                date: Some(d(2021, 1, 20)),
                ..Default::default()
            },
            propagate: false,
        },
        &clock(),
    )
    .unwrap();
    let plan = scheduled(&result.reminders);
    assert_eq!(plan.len(), 1);
    assert_eq!(Some(plan[0].identifier.clone()), before);
    assert_eq!(plan[0].fire_time, at(d(2021, 1, 20), 8, 0));

    // Moving into the past cancels instead.
    let result = edit_item(
        &mut conn,
        &EditItemRequest {
            item_id: created[0],
            changes: ItemChanges {
                date: Some(d(2020, 11, 2)),
                ..Default::default()
            },
            propagate: false,
        },
        &clock(),
    )
    .unwrap();
    assert_eq!(
        result.reminders,
        vec![cancel_reminder(before.as_deref().unwrap())]
    );
}

#[test]
fn sync_schedules_cancels_and_reschedules() {
    let mut conn = db::open_in_memory().unwrap();
    create_family(&mut conn, &bills(d(2021, 1, 3), d(2021, 4, 1), 0), &clock()).unwrap();
    let ids: Vec<String> = reminder_ids(&conn).into_iter().flatten().collect();
    assert_eq!(ids.len(), 3);

    let pending = vec![
        ScheduledReminder {
            identifier: ids[0].clone(),
            fire_time: at(d(2021, 1, 3), 9, 0),
        },
        ScheduledReminder {
            identifier: ids[1].clone(),
            fire_time: at(d(2021, 2, 3), 7, 0),
        },
        ScheduledReminder {
            identifier: "orphan".into(),
            fire_time: at(d(2021, 5, 1), 9, 0),
        },
    ];
    let out = sync_reminders(&conn, &pending, &clock()).unwrap();
    assert_eq!(
        out,
        vec![
            ReminderInstruction::Schedule(ScheduledReminder {
                identifier: ids[1].clone(),
                fire_time: at(d(2021, 2, 3), 9, 0),
            }),
            cancel_reminder("orphan"),
            ReminderInstruction::Schedule(ScheduledReminder {
                identifier: ids[2].clone(),
                fire_time: at(d(2021, 3, 3), 9, 0),
            }),
        ]
    );

    // Nothing pending: everything still ahead gets scheduled, oldest first.
    let out = sync_reminders(&conn, &[], &clock()).unwrap();
    let fire_times: Vec<NaiveDateTime> = scheduled(&out).iter().map(|s| s.fire_time).collect();
    assert_eq!(
        fire_times,
        vec![
            at(d(2021, 1, 3), 9, 0),
            at(d(2021, 2, 3), 9, 0),
            at(d(2021, 3, 3), 9, 0),
        ]
    );
}

#[test]
fn sync_never_mints_identifiers() {
    let mut conn = db::open_in_memory().unwrap();
    create_family(&mut conn, &bills(d(2021, 1, 3), d(2021, 3, 1), 0), &clock()).unwrap();
    conn.execute(
        "UPDATE items SET reminder_id=NULL WHERE date=?1",
        params![d(2021, 2, 3)],
    )
    .unwrap();
    let before = reminder_ids(&conn);

    let out = sync_reminders(&conn, &[], &clock()).unwrap();
    assert_eq!(scheduled(&out).len(), 1);
    assert_eq!(reminder_ids(&conn), before);
    assert!(before[1].is_none());
}

#[test]
fn sync_reads_committed_state_next_to_a_writer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("book.sqlite");
    let mut writer = db::open_at(&path).unwrap();
    let reader = db::open_at(&path).unwrap();

    create_family(&mut writer, &bills(d(2021, 1, 3), d(2021, 3, 1), 0), &clock()).unwrap();
    assert_eq!(sync_reminders(&reader, &[], &clock()).unwrap().len(), 2);

    let tx = writer.transaction().unwrap();
    tx.execute("UPDATE items SET reminder_offset=NULL", []).unwrap();
    // Uncommitted: the background pass still sees both reminders.
    assert_eq!(sync_reminders(&reader, &[], &clock()).unwrap().len(), 2);
    tx.commit().unwrap();

    assert!(sync_reminders(&reader, &[], &clock()).unwrap().is_empty());
}

#[derive(Clone, Default)]
struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn skipped_reminders_are_logged_with_the_stored_item_id() {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let mut conn = db::open_in_memory().unwrap();
    let created = tracing::subscriber::with_default(subscriber, || {
        create_family(&mut conn, &bills(d(2020, 11, 15), d(2021, 1, 1), 0), &clock())
            .unwrap()
            .created
    });

    let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
    let skipped: Vec<&str> = logs
        .lines()
        .filter(|l| l.contains("reminder skipped"))
        .collect();
    assert_eq!(skipped.len(), 1);
    assert!(skipped[0].contains(&format!("item={}", created[0])));
    assert!(skipped[0].contains(&format!("for item {} would fire", created[0])));
    assert!(created[0] > 0);
}
