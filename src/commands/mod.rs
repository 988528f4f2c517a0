// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod categories;
pub mod config;
pub mod doctor;
pub mod exporter;
pub mod items;
pub mod reminders;
pub mod reports;
pub mod widget;

use crate::reminders::ReminderClock;
use crate::utils::{get_reminder_time, month_key};
use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use rusqlite::Connection;
use std::path::PathBuf;

/// Handles the commands need besides the connection: the clock and where the
/// widget summary goes (`None` disables writing it).
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub clock: ReminderClock,
    pub widget_path: Option<PathBuf>,
}

impl CommandContext {
    pub fn from_system(conn: &Connection) -> Result<Self> {
        Ok(Self {
            clock: ReminderClock::new(Local::now().naive_local(), get_reminder_time(conn)?),
            widget_path: Some(crate::widget::widget_path()?),
        })
    }

    pub fn at(conn: &Connection, now: NaiveDateTime, widget_path: Option<PathBuf>) -> Result<Self> {
        Ok(Self {
            clock: ReminderClock::new(now, get_reminder_time(conn)?),
            widget_path,
        })
    }

    pub fn current_month(&self) -> String {
        month_key(self.clock.now.date())
    }
}
