use std::fmt::Display;

use chrono::TimeZone;
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{HazardReport, HazardType, ReportStatus, Role, Severity};

pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// "storm_surge" -> "Storm Surge"
pub fn hazard_label(hazard_type: HazardType) -> String {
    hazard_type
        .as_str()
        .split('_')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn hazard_icon(hazard_type: HazardType) -> &'static str {
    match hazard_type {
        HazardType::Tsunami => "🌊",
        HazardType::StormSurge => "🌀",
        HazardType::HighWaves => "〰️",
        HazardType::CoastalFlooding => "💧",
        HazardType::Erosion => "🏔️",
        HazardType::AbnormalSeaBehavior => "⚠️",
        HazardType::Other => "❗",
    }
}

/// A report as shown in the dashboard list view.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ReportCard {
    pub id: String,
    pub icon: String,
    pub title: String,
    pub hazard_type: HazardType,
    pub hazard_label: String,
    pub severity: Severity,
    pub severity_badge: String,
    pub status: ReportStatus,
    pub status_badge: String,
    pub description: String,
    pub location: String,
    pub created_display: String,
    pub created_by: String,
    pub urgency_line: Option<String>,
    pub mentions_line: Option<String>,
    pub has_media: bool,
    pub first_media_url: Option<String>,
}

impl ReportCard {
    pub fn from_report<Tz>(report: &HazardReport, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        Self {
            id: report.id.clone(),
            icon: hazard_icon(report.hazard_type).to_string(),
            title: report.title.clone(),
            hazard_type: report.hazard_type,
            hazard_label: hazard_label(report.hazard_type),
            severity: report.severity,
            severity_badge: report.severity.as_str().to_uppercase(),
            status: report.status,
            status_badge: report.status.as_str().to_uppercase(),
            description: report.description.clone(),
            location: report
                .location_name
                .clone()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| "Unknown location".to_string()),
            created_display: report
                .created_date
                .with_timezone(tz)
                .format("%b %-d, %-I:%M %p")
                .to_string(),
            created_by: report.created_by.clone(),
            urgency_line: report
                .urgency_score
                .map(|score| format!("Urgency: {score}/10")),
            mentions_line: (report.social_media_mentions > 0)
                .then(|| format!("{} mentions", report.social_media_mentions)),
            has_media: !report.media_urls.is_empty(),
            first_media_url: report.media_urls.first().cloned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct NavItem {
    pub title: String,
    pub path: String,
    pub roles: Vec<Role>,
}

fn all_nav_items() -> Vec<NavItem> {
    let everyone = vec![Role::Citizen, Role::Official, Role::Analyst];
    vec![
        NavItem {
            title: "Dashboard".to_string(),
            path: "/dashboard".to_string(),
            roles: everyone.clone(),
        },
        NavItem {
            title: "Submit Report".to_string(),
            path: "/submit-report".to_string(),
            roles: everyone,
        },
        NavItem {
            title: "Analytics".to_string(),
            path: "/analytics".to_string(),
            roles: vec![Role::Official, Role::Analyst],
        },
    ]
}

/// Visibility only; the backend owns access control.
pub fn navigation_for(role: Role) -> Vec<NavItem> {
    all_nav_items()
        .into_iter()
        .filter(|item| item.roles.contains(&role))
        .collect()
}

pub fn can_view_analytics(role: Role) -> bool {
    role != Role::Citizen
}

pub fn role_label(role: Role) -> String {
    capitalize(role.as_str())
}
