//! Search performance reports.
//!
//! A [`ReportSource`] answers one dimension-keyed query for a site
//! property. [`query_report`] and [`page_report`] turn the raw rows into
//! sorted, rounded tables.

pub mod search_console;

pub use search_console::SearchConsoleSource;

use async_trait::async_trait;
use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::app::{AppError, Result};
use crate::domain::{PageRow, PageTable, QueryRow, QueryTable};

/// Grouping key of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Query,
    Page,
}

impl Dimension {
    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::Query => "query",
            Dimension::Page => "page",
        }
    }
}

/// How a page filter compares against the page URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    Equals,
    Contains,
}

impl FilterMode {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterMode::Equals => "equals",
            FilterMode::Contains => "contains",
        }
    }
}

/// Server-side restriction of a report to matching pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFilter {
    pub value: String,
    pub mode: FilterMode,
}

impl PageFilter {
    pub fn equals(page: impl Into<String>) -> Self {
        Self {
            value: page.into(),
            mode: FilterMode::Equals,
        }
    }

    pub fn contains(fragment: impl Into<String>) -> Self {
        Self {
            value: fragment.into(),
            mode: FilterMode::Contains,
        }
    }
}

/// Closed date range, both ends included
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Range ending on `today` that reaches back `|days| + 1` days.
    ///
    /// The sign of `days` is ignored, so `-90` and `90` give the same range.
    pub fn lookback(today: NaiveDate, days: i64) -> Self {
        let start = today - Duration::days(days.abs() + 1);
        Self { start, end: today }
    }

    pub fn lookback_from_today(days: i64) -> Self {
        Self::lookback(Local::now().date_naive(), days)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub property: String,
    pub dimension: Dimension,
    pub lookback_days: i64,
    pub page_filter: Option<PageFilter>,
}

/// One row as returned by the API: dimension keys plus metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub clicks: f64,
    #[serde(default)]
    pub impressions: f64,
    #[serde(default)]
    pub ctr: f64,
    #[serde(default)]
    pub position: f64,
}

impl ReportRow {
    fn key(&self) -> Result<&str> {
        self.keys
            .first()
            .map(String::as_str)
            .ok_or_else(|| AppError::Other("report row has no dimension key".into()))
    }
}

/// Source of search performance reports
#[async_trait]
pub trait ReportSource: Send + Sync {
    async fn fetch(&self, request: &ReportRequest) -> Result<Vec<ReportRow>>;
}

/// Query-dimension report, sorted by impressions and rounded
pub async fn query_report(
    source: &dyn ReportSource,
    property: &str,
    lookback_days: i64,
    page_filter: Option<PageFilter>,
    decimals: u32,
) -> Result<QueryTable> {
    let request = ReportRequest {
        property: property.to_string(),
        dimension: Dimension::Query,
        lookback_days,
        page_filter,
    };

    let rows = source
        .fetch(&request)
        .await?
        .into_iter()
        .map(|row| {
            Ok(QueryRow::new(
                row.key()?,
                row.clicks.round() as i64,
                row.impressions.round() as i64,
                row.ctr,
                row.position,
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(property, rows = rows.len(), "query report fetched");

    let mut table = QueryTable::new(rows);
    table.sort_by_impressions();
    table.round(decimals);
    Ok(table)
}

/// Page-dimension report, sorted by impressions and rounded
pub async fn page_report(
    source: &dyn ReportSource,
    property: &str,
    lookback_days: i64,
    decimals: u32,
) -> Result<PageTable> {
    let request = ReportRequest {
        property: property.to_string(),
        dimension: Dimension::Page,
        lookback_days,
        page_filter: None,
    };

    let rows = source
        .fetch(&request)
        .await?
        .into_iter()
        .map(|row| {
            Ok(PageRow {
                page: row.key()?.to_string(),
                clicks: row.clicks.round() as i64,
                impressions: row.impressions.round() as i64,
                ctr: row.ctr,
                position: row.position,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(property, rows = rows.len(), "page report fetched");

    let mut table = PageTable::new(rows);
    table.sort_by_impressions();
    table.round(decimals);
    Ok(table)
}
