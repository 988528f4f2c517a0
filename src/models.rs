// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Name of the fixed category every month carries for income.
pub const INCOME_CATEGORY: &str = "Income";

/// Largest reminder offset accepted, in minutes (one year).
pub const MAX_REMINDER_OFFSET: i64 = 365 * 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Income,
    Spending,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Income => "income",
            ItemKind::Spending => "spending",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "income" => Some(ItemKind::Income),
            "spending" => Some(ItemKind::Spending),
            _ => None,
        }
    }

    /// Kind implied by the category an item lives in.
    pub fn for_category(name: &str) -> Self {
        if name == INCOME_CATEGORY {
            ItemKind::Income
        } else {
            ItemKind::Spending
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceUnit {
    Day,
    Week,
    Month,
}

impl RecurrenceUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceUnit::Day => "day",
            RecurrenceUnit::Week => "week",
            RecurrenceUnit::Month => "month",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "day" => Some(RecurrenceUnit::Day),
            "week" => Some(RecurrenceUnit::Week),
            "month" => Some(RecurrenceUnit::Month),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub period: i64,
    pub unit: RecurrenceUnit,
    /// Exclusive upper bound for generated dates.
    pub end_date: NaiveDate,
    /// Minutes before each occurrence.
    pub reminder_offset: Option<i64>,
}

impl RecurrenceRule {
    pub fn label(&self) -> String {
        let unit = self.unit.as_str();
        if self.period == 1 {
            format!("every {} until {}", unit, self.end_date)
        } else {
            format!("every {} {}s until {}", self.period, unit, self.end_date)
        }
    }
}

/// Links a member to its family: the shared id and the date of the root item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyRef {
    pub id: String,
    pub anchor: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub category_id: i64,
    pub amount: Decimal,
    pub kind: ItemKind,
    pub date: NaiveDate,
    pub detail: Option<String>,
    pub rule: Option<RecurrenceRule>,
    pub reminder_offset: Option<i64>,
    pub reminder_id: Option<String>,
    pub family: Option<FamilyRef>,
}

impl Item {
    pub fn is_recurring(&self) -> bool {
        self.rule.is_some() && self.family.is_some()
    }

    /// Drops the recurrence copy so the item stands alone.
    pub fn detach(&mut self) {
        self.rule = None;
        self.family = None;
    }
}
