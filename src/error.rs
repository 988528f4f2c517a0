// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Errors raised by the ledger core. Any of these aborts the current
/// operation and rolls back its transaction.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid recurrence rule: {0}")]
    InvalidRule(String),

    #[error("Data integrity violation: {0}")]
    DataIntegrity(String),

    #[error("Invalid item: {0}")]
    InvalidItem(String),

    #[error("Item {0} not found")]
    ItemNotFound(i64),

    #[error("Category '{name}' not found in {month}")]
    CategoryNotFound { month: String, name: String },

    #[error(transparent)]
    Db(#[from] rusqlite::Error),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Reasons a reminder was not scheduled. None of these are fatal; callers log
/// and move on.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReminderError {
    #[error("Reminder for item {item_id} would fire at {fire_time}, which is not in the future")]
    Past {
        item_id: i64,
        fire_time: NaiveDateTime,
    },

    #[error("Item {0} has no reminder identifier")]
    NoIdentifier(i64),

    #[error("Item {0} has no reminder offset")]
    NoOffset(i64),

    #[error("Reminder offset of item {item_id} ({offset} minutes) is out of range")]
    OutOfRange { item_id: i64, offset: i64 },
}
