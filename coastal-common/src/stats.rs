//! Aggregates behind the dashboard cards and the analytics charts.
//!
//! Functions that depend on "today" take the current time in the display
//! time zone; day membership is decided by local calendar date.

use chrono::{DateTime, Duration, NaiveDate, TimeZone};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{HazardReport, HazardType, ReportStatus, Severity};
use crate::presentation::{capitalize, hazard_label};

pub const TIMELINE_DAYS: usize = 7;
pub const TOP_LOCATIONS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
pub struct ReportStats {
    pub total: usize,
    pub critical_high: usize,
    pub pending: usize,
    pub today: usize,
}

impl ReportStats {
    pub fn compute<Tz: TimeZone>(reports: &[HazardReport], now: &DateTime<Tz>) -> Self {
        let today = now.date_naive();
        let tz = now.timezone();
        Self {
            total: reports.len(),
            critical_high: reports
                .iter()
                .filter(|r| r.severity.is_high_or_critical())
                .count(),
            pending: reports
                .iter()
                .filter(|r| r.status == ReportStatus::Pending)
                .count(),
            today: reports
                .iter()
                .filter(|r| r.created_date.with_timezone(&tz).date_naive() >= today)
                .count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct HazardTypeCount {
    pub hazard_type: HazardType,
    pub label: String,
    pub count: usize,
}

/// Only types that occur, in the order they are first seen.
pub fn count_by_hazard_type(reports: &[HazardReport]) -> Vec<HazardTypeCount> {
    let mut counts: Vec<HazardTypeCount> = Vec::new();
    for report in reports {
        match counts.iter_mut().find(|c| c.hazard_type == report.hazard_type) {
            Some(entry) => entry.count += 1,
            None => counts.push(HazardTypeCount {
                hazard_type: report.hazard_type,
                label: hazard_label(report.hazard_type),
                count: 1,
            }),
        }
    }
    counts
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SeverityCount {
    pub severity: Severity,
    pub label: String,
    pub count: usize,
}

/// Always four buckets, least to most severe.
pub fn severity_distribution(reports: &[HazardReport]) -> Vec<SeverityCount> {
    Severity::ALL
        .iter()
        .map(|severity| SeverityCount {
            severity: *severity,
            label: capitalize(severity.as_str()),
            count: reports.iter().filter(|r| r.severity == *severity).count(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TimelineDay {
    pub date: NaiveDate,
    pub label: String,
    pub reports: usize,
    pub high_severity: usize,
}

/// Seven entries, oldest first; the last one is today.
pub fn timeline<Tz: TimeZone>(reports: &[HazardReport], now: &DateTime<Tz>) -> Vec<TimelineDay> {
    let today = now.date_naive();
    let tz = now.timezone();
    let local_dates: Vec<(NaiveDate, bool)> = reports
        .iter()
        .map(|r| {
            (
                r.created_date.with_timezone(&tz).date_naive(),
                r.severity.is_high_or_critical(),
            )
        })
        .collect();

    (0..TIMELINE_DAYS as i64)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            let on_day = local_dates.iter().filter(|(d, _)| *d == date);
            TimelineDay {
                date,
                label: date.format("%b %-d").to_string(),
                reports: on_day.clone().count(),
                high_severity: on_day.filter(|(_, high)| *high).count(),
            }
        })
        .collect()
}

/// Mean urgency with missing scores counted as 5. `None` for an empty list.
pub fn average_urgency(reports: &[HazardReport]) -> Option<f64> {
    if reports.is_empty() {
        return None;
    }
    let sum: u64 = reports.iter().map(|r| u64::from(r.effective_urgency())).sum();
    Some(sum as f64 / reports.len() as f64)
}

pub fn format_average_urgency(average: Option<f64>) -> String {
    match average {
        Some(value) => format!("{value:.1}"),
        None => "—".to_string(),
    }
}

pub fn total_social_mentions(reports: &[HazardReport]) -> u64 {
    reports
        .iter()
        .map(|r| u64::from(r.social_media_mentions))
        .sum()
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LocationEntry {
    pub report_id: String,
    pub location_name: String,
    pub hazard_type: HazardType,
    pub urgency_score: Option<u8>,
}

/// The most recent reports' locations as listed on the trends tab. Expects a
/// newest-first list.
pub fn top_locations(reports: &[HazardReport]) -> Vec<LocationEntry> {
    reports
        .iter()
        .take(TOP_LOCATIONS)
        .map(|r| LocationEntry {
            report_id: r.id.clone(),
            location_name: r
                .location_name
                .clone()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
            hazard_type: r.hazard_type,
            urgency_score: r.urgency_score,
        })
        .collect()
}
