use anyhow::{Context, Result};
use chrono::Local;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::geo::{GeoCache, GeoLookup, GeoResolver, IpApiClient};
use crate::report::{render_html, ReportData, ReportOptions};
use crate::{reader, stats, Args, StatsError};

/// Printed instead of a report when the server has not written a log yet.
pub const NO_LOG_MESSAGE: &str = "No log file found yet.";

#[derive(Debug)]
pub struct DashboardSummary {
    pub record_count: usize,
    pub total_mounts: u64,
    pub unique_files: usize,
    pub unique_clients: usize,
    /// Entries in the geolocation cache after the run, when geolocation is on.
    pub cached_locations: Option<usize>,
    pub output: PathBuf,
}

/// Builds the dashboard with the real geolocation service and the current time.
pub fn generate_dashboard(args: &Args) -> Result<DashboardSummary> {
    let lookup = if args.no_geo {
        None
    } else {
        Some(IpApiClient::new(
            &args.geo_endpoint,
            Duration::from_secs(args.geo_timeout),
        )?)
    };
    let generated_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

    generate_dashboard_with(args, lookup, &generated_at)
}

/// Reads the log, aggregates, resolves locations and writes the HTML page.
///
/// `lookup` is only used when geolocation is enabled. A missing log surfaces
/// as [`crate::StatsError::MissingInput`] before anything is written.
pub fn generate_dashboard_with<L: GeoLookup>(
    args: &Args,
    lookup: Option<L>,
    generated_at: &str,
) -> Result<DashboardSummary> {
    let total_start_time = Instant::now();
    info!(action = "start", component = "dashboard", log = ?args.log, "Starting dashboard generation");

    let records = reader::read_records(&args.log)?;
    let snapshot = stats::aggregate(&records, args.top_files, args.top_clients);
    info!(
        action = "aggregate",
        component = "dashboard",
        total_mounts = snapshot.total_mounts,
        unique_files = snapshot.unique_files,
        unique_clients = snapshot.unique_clients,
        "Computed statistics"
    );

    let recent = if args.no_recent {
        Vec::new()
    } else {
        stats::recent_activity(&records, args.recent)
    };

    let (countries, cached_locations) = match lookup.filter(|_| !args.no_geo) {
        Some(lookup) => {
            let cache = GeoCache::load(&args.cache);
            let delay = Duration::from_millis(args.geo_delay_ms);
            let mut resolver = GeoResolver::new(cache, lookup, delay);
            let countries = resolver.resolve_all(stats::distinct_clients(&records));

            let mut cache = resolver.into_cache();
            if let Err(e) = cache.save(&args.cache) {
                warn!(action = "save", component = "geo_cache", error = %e, "Could not persist geolocation cache");
            }
            (countries, Some(cache.len()))
        }
        None => (HashMap::new(), None),
    };

    let options = ReportOptions {
        title: args.title.clone(),
        geolocation: cached_locations.is_some(),
        recent_activity: !args.no_recent,
        redact: args.redact,
    };
    let data = ReportData {
        generated_at,
        snapshot: &snapshot,
        countries: &countries,
        recent: &recent,
    };
    let html = render_html(&data, &options);

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {:?}", parent))?;
    }
    fs::write(&args.output, html)
        .with_context(|| format!("Failed to write dashboard to {:?}", args.output))?;

    info!(
        action = "complete",
        component = "dashboard",
        output = ?args.output,
        duration_ms = total_start_time.elapsed().as_millis(),
        "Dashboard written"
    );

    Ok(DashboardSummary {
        record_count: records.len(),
        total_mounts: snapshot.total_mounts,
        unique_files: snapshot.unique_files,
        unique_clients: snapshot.unique_clients,
        cached_locations,
        output: args.output.clone(),
    })
}

/// True when a run stopped because the activity log does not exist.
pub fn is_missing_input(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<StatsError>(),
        Some(StatsError::MissingInput(_))
    )
}

pub fn print_summary(summary: &DashboardSummary) {
    println!(
        "Parsed {} log entries: {} mounts of {} files by {} clients",
        crate::utils::format_number(summary.record_count as u64),
        crate::utils::format_number(summary.total_mounts),
        crate::utils::format_number(summary.unique_files as u64),
        crate::utils::format_number(summary.unique_clients as u64)
    );
    if let Some(entries) = summary.cached_locations {
        println!("Geolocation cache holds {} addresses", entries);
    }
    println!("Stats generated: {}", summary.output.display());
}
