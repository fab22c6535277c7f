// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search request options and filter-value conversion.
//!
//! The engine only understands integers and strings: booleans become 0/1,
//! dates and times become epoch seconds, everything else passes through
//! unchanged. The same conversion applies to equality filter values and to
//! range-filter bounds.

use chrono::{DateTime, NaiveDate, Utc};

use crate::search::client::EngineValue;

/// A caller-side filter value, before engine conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Bool(bool),
    Int(i64),
    Str(String),
    Date(NaiveDate),
    Time(DateTime<Utc>),
}

impl FilterValue {
    /// Convert to the engine's representation.
    #[must_use]
    pub fn to_engine(&self) -> EngineValue {
        match self {
            FilterValue::Bool(true) => EngineValue::Int(1),
            FilterValue::Bool(false) => EngineValue::Int(0),
            FilterValue::Int(n) => EngineValue::Int(*n),
            FilterValue::Str(s) => EngineValue::Str(s.clone()),
            FilterValue::Date(date) => {
                let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
                EngineValue::Int(midnight.and_utc().timestamp())
            }
            FilterValue::Time(time) => EngineValue::Int(time.timestamp()),
        }
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        FilterValue::Bool(b)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        FilterValue::Int(n)
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Str(s.to_string())
    }
}

impl From<NaiveDate> for FilterValue {
    fn from(date: NaiveDate) -> Self {
        FilterValue::Date(date)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(time: DateTime<Utc>) -> Self {
        FilterValue::Time(time)
    }
}

/// Options for one search call; immutable once the search starts.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub(crate) index: Option<String>,
    pub(crate) page: Option<u64>,
    pub(crate) per_page: Option<u64>,
    pub(crate) filters: Vec<(String, Vec<FilterValue>)>,
    pub(crate) ranges: Vec<(String, FilterValue, FilterValue)>,
}

impl SearchOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Search a specific index instead of the model's default.
    pub fn index(mut self, name: impl Into<String>) -> Self {
        self.index = Some(name.into());
        self
    }

    /// 1-based page number; page 1 when unset.
    pub fn page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    /// Page size; the configured default when unset.
    pub fn per_page(mut self, per_page: u64) -> Self {
        self.per_page = Some(per_page);
        self
    }

    /// Value-equality filter: `column` must equal any of `values`.
    pub fn filter<I, V>(mut self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FilterValue>,
    {
        self.filters
            .push((column.into(), values.into_iter().map(Into::into).collect()));
        self
    }

    /// Single-value convenience form of [`filter`](Self::filter).
    pub fn filter_value(self, column: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.filter(column, [value.into()])
    }

    /// Range filter: `column` must lie in `[min, max]`.
    pub fn between(
        mut self,
        column: impl Into<String>,
        min: impl Into<FilterValue>,
        max: impl Into<FilterValue>,
    ) -> Self {
        self.ranges.push((column.into(), min.into(), max.into()));
        self
    }
}
