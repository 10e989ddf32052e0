// src/timeseries.rs
//! Year-keyed monthly series of site metrics.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::catalog::TimeWindow;
use crate::error::MonitorError;
use crate::processing::stats::round_to;
use crate::processing::MetricSet;

/// Decimal places kept in the persisted series.
pub const STORED_DECIMALS: i32 = 4;

/// One calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// `[first day, first day of next month)`
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.first_day(), self.next().first_day())
    }

    pub fn year_key(&self) -> String {
        self.year.to_string()
    }

    /// Abbreviated month name, e.g. "Jan".
    pub fn month_label(&self) -> String {
        self.first_day().format("%b").to_string()
    }

    /// Every month from `start` to `end`, both included.
    pub fn range(start: Period, end: Period) -> Vec<Period> {
        let mut periods = Vec::new();
        let mut current = start;
        while current <= end {
            periods.push(current);
            current = current.next();
        }
        periods
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = MonitorError;

    /// Parses `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MonitorError::Config(format!("invalid period {s:?}, expected YYYY-MM"));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Period::new(year, month).ok_or_else(invalid)
    }
}

/// Parallel per-month sequences of one year. All sequences always have the
/// same length and each month label appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawYearSeries")]
pub struct YearSeries {
    months: Vec<String>,
    ndvi: Vec<Option<f64>>,
    ndmi: Vec<Option<f64>>,
    bsi: Vec<Option<f64>>,
    image_dates: Vec<String>,
}

#[derive(Deserialize)]
struct RawYearSeries {
    months: Vec<String>,
    ndvi: Vec<Option<f64>>,
    ndmi: Vec<Option<f64>>,
    bsi: Vec<Option<f64>>,
    #[serde(default)]
    image_dates: Option<Vec<String>>,
}

impl TryFrom<RawYearSeries> for YearSeries {
    type Error = String;

    fn try_from(raw: RawYearSeries) -> Result<Self, Self::Error> {
        let n = raw.months.len();
        // Files written before image dates were tracked carry none
        let image_dates = raw.image_dates.unwrap_or_else(|| vec![String::new(); n]);
        if raw.ndvi.len() != n || raw.ndmi.len() != n || raw.bsi.len() != n || image_dates.len() != n {
            return Err(format!(
                "sequence lengths differ: months={}, ndvi={}, ndmi={}, bsi={}, image_dates={}",
                n,
                raw.ndvi.len(),
                raw.ndmi.len(),
                raw.bsi.len(),
                image_dates.len()
            ));
        }
        for (i, month) in raw.months.iter().enumerate() {
            if raw.months[..i].contains(month) {
                return Err(format!("month {month:?} appears more than once"));
            }
        }
        Ok(Self {
            months: raw.months,
            ndvi: raw.ndvi,
            ndmi: raw.ndmi,
            bsi: raw.bsi,
            image_dates,
        })
    }
}

impl YearSeries {
    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    pub fn months(&self) -> &[String] {
        &self.months
    }

    pub fn ndvi(&self) -> &[Option<f64>] {
        &self.ndvi
    }

    pub fn ndmi(&self) -> &[Option<f64>] {
        &self.ndmi
    }

    pub fn bsi(&self) -> &[Option<f64>] {
        &self.bsi
    }

    pub fn image_dates(&self) -> &[String] {
        &self.image_dates
    }

    pub fn position(&self, month_label: &str) -> Option<usize> {
        self.months.iter().position(|m| m == month_label)
    }

    /// Stored (rounded) metrics for a month.
    pub fn get(&self, month_label: &str) -> Option<(Option<f64>, Option<f64>, Option<f64>)> {
        self.position(month_label)
            .map(|i| (self.ndvi[i], self.ndmi[i], self.bsi[i]))
    }

    fn upsert(&mut self, month_label: &str, metrics: &MetricSet) {
        let round = |v: Option<f64>| v.map(|v| round_to(v, STORED_DECIMALS));
        let image_date = metrics.image_date.to_string();

        match self.position(month_label) {
            Some(i) => {
                self.ndvi[i] = round(metrics.ndvi);
                self.ndmi[i] = round(metrics.ndmi);
                self.bsi[i] = round(metrics.bsi);
                self.image_dates[i] = image_date;
            }
            None => {
                self.months.push(month_label.to_string());
                self.ndvi.push(round(metrics.ndvi));
                self.ndmi.push(round(metrics.ndmi));
                self.bsi.push(round(metrics.bsi));
                self.image_dates.push(image_date);
            }
        }
    }
}

/// Year key -> monthly series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoricalSeries {
    years: BTreeMap<String, YearSeries>,
}

impl HistoricalSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a month, or overwrite it in place if the label already exists.
    pub fn upsert(&mut self, year: &str, month_label: &str, metrics: &MetricSet) {
        self.years
            .entry(year.to_string())
            .or_default()
            .upsert(month_label, metrics);
    }

    pub fn upsert_period(&mut self, period: Period, metrics: &MetricSet) {
        self.upsert(&period.year_key(), &period.month_label(), metrics);
    }

    pub fn year(&self, year: &str) -> Option<&YearSeries> {
        self.years.get(year)
    }

    pub fn period(&self, period: Period) -> Option<(Option<f64>, Option<f64>, Option<f64>)> {
        self.year(&period.year_key())
            .and_then(|series| series.get(&period.month_label()))
    }

    pub fn years(&self) -> impl Iterator<Item = (&String, &YearSeries)> {
        self.years.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}
