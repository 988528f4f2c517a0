// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{CoreError, CoreResult};
use crate::models::{MAX_REMINDER_OFFSET, RecurrenceRule, RecurrenceUnit};
use chrono::{Days, Months, NaiveDate};

pub fn validate(start: NaiveDate, rule: &RecurrenceRule) -> CoreResult<()> {
    if rule.period <= 0 {
        return Err(CoreError::InvalidRule(format!(
            "period must be positive, got {}",
            rule.period
        )));
    }
    if rule.end_date <= start {
        return Err(CoreError::InvalidRule(format!(
            "end date {} must be after start {}",
            rule.end_date, start
        )));
    }
    if let Some(offset) = rule.reminder_offset {
        if !(0..=MAX_REMINDER_OFFSET).contains(&offset) {
            return Err(CoreError::InvalidRule(format!(
                "reminder offset must be between 0 and {} minutes, got {}",
                MAX_REMINDER_OFFSET, offset
            )));
        }
    }
    Ok(())
}

/// The k-th occurrence counted from `start`. Month steps clamp the day to the
/// target month's length, always measured from `start` so a Jan 31 series
/// lands on Feb 28 and then Mar 31. A step too large for the calendar ends
/// the series; the first occurrence is always `start`.
pub fn nth_occurrence(start: NaiveDate, rule: &RecurrenceRule, k: u32) -> Option<NaiveDate> {
    if k == 0 {
        return Some(start);
    }
    let period = u32::try_from(rule.period).ok()?;
    let steps = period.checked_mul(k)?;
    match rule.unit {
        RecurrenceUnit::Day => start.checked_add_days(Days::new(steps as u64)),
        RecurrenceUnit::Week => start.checked_add_days(Days::new(steps as u64 * 7)),
        RecurrenceUnit::Month => start.checked_add_months(Months::new(steps)),
    }
}

/// Lazily walks the occurrences of a rule. Restartable: build a new one from
/// the same inputs to replay the sequence.
#[derive(Debug, Clone)]
pub struct Occurrences<'a> {
    start: NaiveDate,
    rule: &'a RecurrenceRule,
    next: u32,
    done: bool,
}

impl<'a> Occurrences<'a> {
    pub fn new(start: NaiveDate, rule: &'a RecurrenceRule) -> CoreResult<Self> {
        validate(start, rule)?;
        Ok(Self {
            start,
            rule,
            next: 0,
            done: false,
        })
    }
}

impl Iterator for Occurrences<'_> {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        if self.done {
            return None;
        }
        match nth_occurrence(self.start, self.rule, self.next) {
            Some(d) if d < self.rule.end_date => {
                self.next += 1;
                Some(d)
            }
            _ => {
                self.done = true;
                None
            }
        }
    }
}

pub fn expand(start: NaiveDate, rule: &RecurrenceRule) -> CoreResult<Vec<NaiveDate>> {
    Ok(Occurrences::new(start, rule)?.collect())
}

/// Position of `date` within the series anchored at `start`, if it is one of
/// its occurrences.
pub fn occurrence_index(start: NaiveDate, rule: &RecurrenceRule, date: NaiveDate) -> Option<usize> {
    Occurrences::new(start, rule)
        .ok()?
        .take_while(|d| *d <= date)
        .position(|d| d == date)
}
