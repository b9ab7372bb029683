//! Command line client for the hazard dashboard services: prints the
//! dashboard and analytics aggregates, submits reports and runs the social
//! analysis without going through the HTTP server.

use std::path::PathBuf;
use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use clap::{Parser, Subcommand};
use coastal_common::filter::ReportFilter;
use coastal_common::presentation::ReportCard;
use coastal_common::stats::{
    average_urgency, format_average_urgency, timeline, top_locations, total_social_mentions, ReportStats,
};
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

use hazard_dashboard::app_state::AppState;
use hazard_dashboard::clients::Session;
use hazard_dashboard::config::Config;
use hazard_dashboard::handlers::session::require_user;
use hazard_dashboard::services::geolocation::{self, PositionReport};
use hazard_dashboard::services::reports;
use hazard_dashboard::services::social_analysis;
use hazard_dashboard::services::submission::{self, MediaUpload, ReportDraft};

#[derive(Parser, Debug)]
#[command(name = "hazard-cli", about = "Coastal hazard reports from the command line")]
struct Args {
    #[arg(long, env = "BACKEND_BASE_URL")]
    backend_base_url: String,
    #[arg(long, env = "BACKEND_APP_ID")]
    app_id: String,
    /// Bearer token of the signed-in user
    #[arg(long, env = "HAZARD_TOKEN", hide_env_values = true)]
    token: String,
    /// Print JSON instead of text
    #[arg(long, default_value_t = false)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dashboard cards and the filtered report list
    Stats {
        #[arg(long, default_value = "all")]
        filter: String,
    },
    /// Last seven days, average urgency and top locations
    Timeline,
    /// Submit a new hazard report
    Submit {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        hazard_type: String,
        /// low, moderate, high or critical
        #[arg(long, default_value = "moderate")]
        severity: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: String,
        #[arg(long, allow_hyphen_values = true)]
        lon: String,
        #[arg(long)]
        location_name: Option<String>,
        /// Photos or videos to attach, uploaded in the given order
        #[arg(long = "media")]
        media: Vec<PathBuf>,
    },
    /// Run the simulated social-media analysis
    Social,
    /// Resolve coordinates to a place name the way the submit form does
    Locate {
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hazard_dashboard=warn")),
        )
        .init();

    let args = Args::parse();
    let config = Config::from_env_with(args.backend_base_url.clone(), args.app_id.clone())
        .context("loading configuration")?;
    config.validate().context("validating configuration")?;
    let state = AppState::new(config).context("building HTTP clients")?;
    let session = Session::with_token(args.token.clone());
    let user = require_user(&state, &session)
        .await
        .context("signing in with HAZARD_TOKEN")?;
    tracing::debug!("signed in as {} ({})", user.full_name, user.role.as_str());

    match args.command {
        Command::Stats { ref filter } => print_dashboard(&state, &session, filter, args.json).await,
        Command::Timeline => print_timeline(&state, &session, args.json).await,
        Command::Submit {
            title,
            description,
            hazard_type,
            severity,
            lat,
            lon,
            location_name,
            media,
        } => {
            let draft = ReportDraft {
                title,
                description,
                hazard_type,
                severity,
                latitude: lat,
                longitude: lon,
                location_name,
                media: media.iter().map(read_media).collect::<Result<Vec<_>>>()?,
            };
            let receipt = submission::submit(&state, &session, draft).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&receipt)?);
            } else {
                println!("Report Submitted! {}", receipt.message);
                println!("  id: {}", receipt.report.id);
                println!("  urgency: {}/10", receipt.report.effective_urgency());
                println!("  media: {}", receipt.report.media_urls.len());
                println!("Redirecting to dashboard...");
            }
            sleep(StdDuration::from_millis(receipt.redirect_after_ms)).await;
            print_dashboard(&state, &session, "all", args.json).await
        }
        Command::Social => {
            let result = social_analysis::run(&state, &session).await;
            if let Some(err) = &result.last_error {
                anyhow::bail!("social analysis failed: {err}");
            }
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Command::Locate { lat, lon } => {
            let position = match (lat, lon) {
                (Some(latitude), Some(longitude)) => PositionReport::Fix { latitude, longitude },
                _ => PositionReport::Failed { reason: None },
            };
            let fill = geolocation::resolve(&state.geocoder, position).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&fill)?);
            } else {
                println!("{}, {}  {}", fill.latitude, fill.longitude, fill.location_name);
            }
            Ok(())
        }
    }
}

fn read_media(path: &PathBuf) -> Result<MediaUpload> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload".to_string());
    let content_type = match path.extension().and_then(|e| e.to_str()).map(str::to_lowercase).as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        _ => "application/octet-stream",
    };
    Ok(MediaUpload {
        file_name,
        content_type: content_type.to_string(),
        data_base64: STANDARD.encode(bytes),
    })
}

async fn print_dashboard(state: &AppState, session: &Session, filter: &str, json: bool) -> Result<()> {
    let all = reports::current_reports(state, session, state.config.dashboard_report_limit).await;
    let tz = state.config.display_tz();
    let now = Utc::now();
    let stats = ReportStats::compute(&all, &now.with_timezone(&tz));
    let filter: ReportFilter = filter.parse().unwrap_or_default();
    let cards: Vec<ReportCard> = filter
        .apply(&all, now)
        .into_iter()
        .map(|r| ReportCard::from_report(r, &tz))
        .collect();

    if json {
        let out = serde_json::json!({ "stats": stats, "filter": filter.to_string(), "reports": cards });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!(
        "Total Reports: {}  High Severity: {}  Pending: {}  Today: {}",
        stats.total, stats.critical_high, stats.pending, stats.today
    );
    if cards.is_empty() {
        println!("No reports match the current filter.");
    }
    for card in cards {
        println!(
            "{} [{}] [{}] {} - {} ({})",
            card.icon, card.severity_badge, card.status_badge, card.title, card.location, card.created_display
        );
    }
    Ok(())
}

async fn print_timeline(state: &AppState, session: &Session, json: bool) -> Result<()> {
    let all = reports::current_reports(state, session, state.config.analytics_report_limit).await;
    let now = Utc::now().with_timezone(&state.config.display_tz());
    let days = timeline(&all, &now);
    let average = average_urgency(&all);
    let locations = top_locations(&all);

    if json {
        let out = serde_json::json!({
            "timeline": days,
            "average_urgency": average,
            "social_mentions": total_social_mentions(&all),
            "top_locations": locations,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Reports Timeline (Last 7 Days)");
    for day in &days {
        println!("  {:<7} {:>4} reports  {:>4} high severity", day.label, day.reports, day.high_severity);
    }
    println!("Avg Urgency: {}", format_average_urgency(average));
    println!("Social Mentions: {}", total_social_mentions(&all));
    println!("Top Locations");
    for entry in locations {
        let urgency = entry
            .urgency_score
            .map(|s| format!("{s}/10"))
            .unwrap_or_else(|| "N/A".to_string());
        println!("  {} ({}) urgency {}", entry.location_name, entry.hazard_type, urgency);
    }
    Ok(())
}
