//! HTML rendering for the dashboard.
//!
//! Everything here is formatting only: counts, rankings and countries arrive
//! already computed. The page is a single file with inline styles.

use std::collections::HashMap;

use crate::classify::LogRecord;
use crate::stats::AggregateSnapshot;
use crate::utils::{format_number, redact_address};

const STYLE: &str = r#"
        body { font-family: sans-serif; background: #f4f4f4; padding: 20px; }
        .container { max-width: 960px; margin: auto; background: white; padding: 20px; border-radius: 8px; box-shadow: 0 0 10px rgba(0,0,0,0.1); }
        h1 { color: #333; border-bottom: 2px solid #007bff; padding-bottom: 10px; }
        .cards { display: flex; gap: 20px; margin-bottom: 30px; }
        .card { flex: 1; background: #007bff; color: white; padding: 20px; border-radius: 5px; text-align: center; }
        .card h2 { margin: 0; font-size: 3em; }
        table { width: 100%; border-collapse: collapse; margin-bottom: 30px; }
        th, td { padding: 10px; border-bottom: 1px solid #ddd; text-align: left; }
        th { background-color: #f8f9fa; }
        .muted { color: #999; font-style: italic; }
        .mono { font-family: monospace; }
"#;

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub title: String,
    pub geolocation: bool,
    pub recent_activity: bool,
    pub redact: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            title: "TNFS Server Activity".to_string(),
            geolocation: true,
            recent_activity: true,
            redact: false,
        }
    }
}

/// Everything the page shows, computed ahead of time.
pub struct ReportData<'a> {
    pub generated_at: &'a str,
    pub snapshot: &'a AggregateSnapshot,
    /// Address to country, for every address the page mentions.
    pub countries: &'a HashMap<String, String>,
    /// Newest first.
    pub recent: &'a [&'a LogRecord],
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn render_filename(filename: &str) -> String {
    if filename.is_empty() {
        r#"<span class="muted">(none)</span>"#.to_string()
    } else {
        html_escape(filename)
    }
}

fn render_address(address: &str, options: &ReportOptions) -> String {
    if options.redact {
        html_escape(&redact_address(address))
    } else {
        html_escape(address)
    }
}

fn render_country(address: &str, data: &ReportData) -> String {
    let country = data
        .countries
        .get(address)
        .map(String::as_str)
        .unwrap_or(crate::geo::UNKNOWN);
    html_escape(country)
}

fn empty_row(html: &mut String, columns: usize) {
    html.push_str(&format!(
        "            <tr><td colspan=\"{}\" class=\"muted\">No data yet</td></tr>\n",
        columns
    ));
}

fn render_cards(html: &mut String, snapshot: &AggregateSnapshot) {
    html.push_str("        <div class=\"cards\">\n");
    for (value, label) in [
        (snapshot.total_mounts, "Total Mounts"),
        (snapshot.unique_files as u64, "Unique Files"),
        (snapshot.unique_clients as u64, "Unique Clients"),
    ] {
        html.push_str(&format!(
            "            <div class=\"card\"><h2>{}</h2><p>{}</p></div>\n",
            format_number(value),
            label
        ));
    }
    html.push_str("        </div>\n");
}

fn render_top_files(html: &mut String, snapshot: &AggregateSnapshot) {
    html.push_str(&format!("        <h3>Top {} Mounted Images</h3>\n", snapshot.top_files.len()));
    html.push_str("        <table>\n");
    html.push_str("            <tr><th>Rank</th><th>Filename</th><th>Mounts</th></tr>\n");
    if snapshot.top_files.is_empty() {
        empty_row(html, 3);
    }
    for (i, (file, count)) in snapshot.top_files.iter().enumerate() {
        html.push_str(&format!(
            "            <tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            i + 1,
            render_filename(file),
            format_number(*count)
        ));
    }
    html.push_str("        </table>\n");
}

fn render_top_clients(html: &mut String, data: &ReportData, options: &ReportOptions) {
    let clients = &data.snapshot.top_clients;
    let columns = if options.geolocation { 4 } else { 3 };

    html.push_str(&format!("        <h3>Top {} Active Clients</h3>\n", clients.len()));
    html.push_str("        <table>\n");
    html.push_str("            <tr><th>Rank</th><th>Client</th>");
    if options.geolocation {
        html.push_str("<th>Country</th>");
    }
    html.push_str("<th>Mounts</th></tr>\n");

    if clients.is_empty() {
        empty_row(html, columns);
    }
    for (i, (address, count)) in clients.iter().enumerate() {
        html.push_str(&format!(
            "            <tr><td>{}</td><td class=\"mono\">{}</td>",
            i + 1,
            render_address(address, options)
        ));
        if options.geolocation {
            html.push_str(&format!("<td>{}</td>", render_country(address, data)));
        }
        html.push_str(&format!("<td>{}</td></tr>\n", format_number(*count)));
    }
    html.push_str("        </table>\n");
}

fn render_recent(html: &mut String, data: &ReportData, options: &ReportOptions) {
    let columns = if options.geolocation { 5 } else { 4 };

    html.push_str("        <h3>Recent Activity</h3>\n");
    html.push_str("        <table>\n");
    html.push_str("            <tr><th>Time</th><th>Client</th>");
    if options.geolocation {
        html.push_str("<th>Country</th>");
    }
    html.push_str("<th>Command</th><th>Filename</th></tr>\n");

    if data.recent.is_empty() {
        empty_row(html, columns);
    }
    for record in data.recent {
        html.push_str(&format!(
            "            <tr><td>{}</td><td class=\"mono\">{}</td>",
            html_escape(&record.timestamp),
            render_address(&record.client_address, options)
        ));
        if options.geolocation {
            html.push_str(&format!("<td>{}</td>", render_country(&record.client_address, data)));
        }
        html.push_str(&format!(
            "<td class=\"mono\">{}</td><td>{}</td></tr>\n",
            html_escape(&record.command),
            render_filename(&record.filename)
        ));
    }
    html.push_str("        </table>\n");
}

pub fn render_html(data: &ReportData, options: &ReportOptions) -> String {
    let title = html_escape(&options.title);
    let mut html = String::with_capacity(16 * 1024);

    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    html.push_str("    <meta charset=\"utf-8\">\n");
    html.push_str(&format!("    <title>{}</title>\n", title));
    html.push_str(&format!("    <style>{}    </style>\n", STYLE));
    html.push_str("</head>\n<body>\n    <div class=\"container\">\n");
    html.push_str(&format!("        <h1>{}</h1>\n", title));
    html.push_str(&format!(
        "        <p>Last Updated: {}</p>\n",
        html_escape(data.generated_at)
    ));

    render_cards(&mut html, data.snapshot);
    render_top_files(&mut html, data.snapshot);
    render_top_clients(&mut html, data, options);
    if options.recent_activity {
        render_recent(&mut html, data, options);
    }

    html.push_str("    </div>\n</body>\n</html>\n");
    html
}
