use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{HazardReport, ReportStatus};

/// Dashboard report selector.
///
/// Any value that is not one of the named selectors is compared verbatim
/// against `hazard_type`, so an unknown type simply matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReportFilter {
    #[default]
    All,
    CriticalHigh,
    Unverified,
    Recent,
    HazardType(String),
}

impl ReportFilter {
    pub fn as_str(&self) -> &str {
        match self {
            ReportFilter::All => "all",
            ReportFilter::CriticalHigh => "critical_high",
            ReportFilter::Unverified => "unverified",
            ReportFilter::Recent => "recent",
            ReportFilter::HazardType(t) => t.as_str(),
        }
    }

    pub fn matches(&self, report: &HazardReport, now: DateTime<Utc>) -> bool {
        match self {
            ReportFilter::All => true,
            ReportFilter::CriticalHigh => report.severity.is_high_or_critical(),
            ReportFilter::Unverified => report.status == ReportStatus::Pending,
            ReportFilter::Recent => report.created_date > now - Duration::hours(24),
            ReportFilter::HazardType(t) => report.hazard_type.as_str() == t,
        }
    }

    /// Keeps the input order.
    pub fn apply<'a>(&self, reports: &'a [HazardReport], now: DateTime<Utc>) -> Vec<&'a HazardReport> {
        reports.iter().filter(|r| self.matches(r, now)).collect()
    }
}

impl FromStr for ReportFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "" | "all" => ReportFilter::All,
            "critical_high" => ReportFilter::CriticalHigh,
            "unverified" => ReportFilter::Unverified,
            "recent" => ReportFilter::Recent,
            other => ReportFilter::HazardType(other.to_string()),
        })
    }
}

impl fmt::Display for ReportFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

/// Options offered by the dashboard's map selector.
pub fn filter_options() -> Vec<FilterOption> {
    [
        ("all", "All Reports"),
        ("critical_high", "High Severity"),
        ("unverified", "Unverified"),
        ("recent", "Last 24h"),
        ("tsunami", "Tsunami"),
        ("storm_surge", "Storm Surge"),
        ("high_waves", "High Waves"),
    ]
    .into_iter()
    .map(|(value, label)| FilterOption {
        value: value.to_string(),
        label: label.to_string(),
    })
    .collect()
}
