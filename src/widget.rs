// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::aggregate::{ChangeSet, recompute_month_totals};
use crate::db::data_dir;
use anyhow::{Context, Result};
use rusqlite::Connection;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Record the home-screen widget reads. Amounts are plain JSON numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetSummary {
    pub month: String,
    pub income: f64,
    pub spending: f64,
}

impl WidgetSummary {
    pub fn new(month: &str, income: Decimal, spending: Decimal) -> Self {
        Self {
            month: month.to_string(),
            income: income.to_f64().unwrap_or_default(),
            spending: spending.to_f64().unwrap_or_default(),
        }
    }
}

pub fn widget_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("widget.json"))
}

pub fn summary_for(conn: &Connection, key: &str) -> Result<WidgetSummary> {
    let totals = recompute_month_totals(conn, key)?;
    Ok(WidgetSummary::new(key, totals.income, totals.spending))
}

/// Writes through a temp file and rename so a reader never sees half a file.
pub fn write_summary(path: &Path, summary: &WidgetSummary) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string(summary).context("serializing widget summary failed")?;
    fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

pub fn read_summary(path: &Path) -> Result<Option<WidgetSummary>> {
    if !path.exists() {
        return Ok(None);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let summary = serde_json::from_str(&content).context("parsing widget summary failed")?;
    Ok(Some(summary))
}

/// Rewrites the widget file when `changes` include the current month.
pub fn refresh_if_current(
    path: &Path,
    changes: &ChangeSet,
    current_month: &str,
) -> Result<Option<WidgetSummary>> {
    let Some(month) = changes.month(current_month) else {
        return Ok(None);
    };
    let summary = WidgetSummary::new(&month.month_key, month.income, month.spending);
    write_summary(path, &summary)?;
    tracing::debug!(month = current_month, path = %path.display(), "widget summary written");
    Ok(Some(summary))
}
