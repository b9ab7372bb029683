//! Map view model: markers, social-media hotspot circles and the legend.

use std::fmt::Display;

use chrono::TimeZone;
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{HazardReport, HazardType, Severity};
use crate::presentation::{hazard_icon, ReportCard};

pub const DEFAULT_CENTER: (f64, f64) = (20.5937, 78.9629);
pub const DEFAULT_ZOOM: u8 = 5;
pub const TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const TILE_ATTRIBUTION: &str =
    "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors";

/// Reports need strictly more mentions than this to get a hotspot circle.
pub const HOTSPOT_MENTION_THRESHOLD: u32 = 5;
const MIN_HOTSPOT_RADIUS_M: f64 = 5000.0;
const MAX_HOTSPOT_RADIUS_M: f64 = 50000.0;
const METERS_PER_MENTION: f64 = 1000.0;

pub fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Low => "#22c55e",
        Severity::Moderate => "#f59e0b",
        Severity::High => "#ef4444",
        Severity::Critical => "#dc2626",
    }
}

/// Presentational heuristic, not a statistical model.
pub fn hotspot_radius(mentions: u32, urgency: Option<u8>) -> f64 {
    let base = (f64::from(mentions) * METERS_PER_MENTION).max(MIN_HOTSPOT_RADIUS_M);
    let multiplier = match urgency {
        Some(score) if score > 0 => f64::from(score) / 5.0,
        _ => 1.0,
    };
    (base * multiplier).min(MAX_HOTSPOT_RADIUS_M)
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MapMarker {
    pub report_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub icon: String,
    pub hazard_type: HazardType,
    pub severity: Severity,
    pub color: String,
    pub popup: ReportCard,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct HotspotCircle {
    pub report_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_m: f64,
    pub color: String,
    pub fill_opacity: f64,
    pub opacity: f64,
    pub weight: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LegendEntry {
    pub severity: Severity,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MapView {
    pub center_lat: f64,
    pub center_lng: f64,
    pub zoom: u8,
    pub tile_url: String,
    pub attribution: String,
    pub markers: Vec<MapMarker>,
    pub hotspots: Vec<HotspotCircle>,
    pub legend: Vec<LegendEntry>,
}

impl MapView {
    pub fn from_reports<'a, I, Tz>(reports: I, tz: &Tz) -> Self
    where
        I: IntoIterator<Item = &'a HazardReport>,
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let mut markers = Vec::new();
        let mut hotspots = Vec::new();
        for report in reports {
            let color = severity_color(report.severity).to_string();
            if report.social_media_mentions > HOTSPOT_MENTION_THRESHOLD {
                hotspots.push(HotspotCircle {
                    report_id: report.id.clone(),
                    latitude: report.latitude,
                    longitude: report.longitude,
                    radius_m: hotspot_radius(report.social_media_mentions, report.urgency_score),
                    color: color.clone(),
                    fill_opacity: 0.1,
                    opacity: 0.3,
                    weight: 2,
                });
            }
            markers.push(MapMarker {
                report_id: report.id.clone(),
                latitude: report.latitude,
                longitude: report.longitude,
                icon: hazard_icon(report.hazard_type).to_string(),
                hazard_type: report.hazard_type,
                severity: report.severity,
                color,
                popup: ReportCard::from_report(report, tz),
            });
        }

        Self {
            center_lat: DEFAULT_CENTER.0,
            center_lng: DEFAULT_CENTER.1,
            zoom: DEFAULT_ZOOM,
            tile_url: TILE_URL.to_string(),
            attribution: TILE_ATTRIBUTION.to_string(),
            markers,
            hotspots,
            legend: Severity::ALL
                .iter()
                .map(|s| LegendEntry {
                    severity: *s,
                    color: severity_color(*s).to_string(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::report;
    use chrono::Utc;

    #[test]
    fn test_hotspot_radius() {
        assert_eq!(hotspot_radius(10, Some(10)), 20000.0);
        assert_eq!(hotspot_radius(6, None), 6000.0);
        assert_eq!(hotspot_radius(2, Some(5)), 5000.0);
        assert_eq!(hotspot_radius(3, Some(1)), 1000.0);
        assert_eq!(hotspot_radius(40, Some(10)), 50000.0);
        assert_eq!(hotspot_radius(8, Some(0)), 8000.0);
    }

    #[test]
    fn test_map_view_markers_and_hotspots() {
        let now = Utc::now();
        let mut loud = report("loud", Severity::High, now);
        loud.social_media_mentions = 10;
        loud.urgency_score = Some(10);
        let mut edge = report("edge", Severity::Low, now);
        edge.social_media_mentions = 5;
        let reports = vec![loud, edge];

        let view = MapView::from_reports(&reports, &Utc);
        assert_eq!(view.markers.len(), 2);
        assert_eq!(view.hotspots.len(), 1);
        assert_eq!(view.hotspots[0].report_id, "loud");
        assert_eq!(view.hotspots[0].radius_m, 20000.0);
        assert_eq!(view.hotspots[0].color, "#ef4444");
        assert_eq!(view.legend.len(), 4);
        assert_eq!((view.center_lat, view.center_lng, view.zoom), (20.5937, 78.9629, 5));
    }
}
