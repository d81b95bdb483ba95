use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "tnfstats",
    about = "Generate a static HTML dashboard from a TNFS server activity log",
    version,
    long_about = None
)]
pub struct Args {
    /// Activity log written by the TNFS server
    #[arg(short, long, default_value = "tnfsd_stats.csv")]
    pub log: PathBuf,

    /// Where to write the HTML dashboard
    #[arg(short, long, default_value = "index.html")]
    pub output: PathBuf,

    /// Geolocation cache file
    #[arg(short, long, default_value = "geo_cache.json")]
    pub cache: PathBuf,

    /// Number of files in the top files table
    #[arg(long, default_value_t = 20)]
    pub top_files: usize,

    /// Number of clients in the top clients table
    #[arg(long, default_value_t = 10)]
    pub top_clients: usize,

    /// Number of rows in the recent activity table
    #[arg(long, default_value_t = 20)]
    pub recent: usize,

    /// Disable country lookups for client addresses
    #[arg(long)]
    pub no_geo: bool,

    /// Disable the recent activity table
    #[arg(long)]
    pub no_recent: bool,

    /// Geolocation service endpoint, queried as {endpoint}/{address}
    #[arg(long, default_value = "http://ip-api.com/json")]
    pub geo_endpoint: String,

    /// Delay before each uncached lookup, in milliseconds
    #[arg(long, default_value_t = 1500)]
    pub geo_delay_ms: u64,

    /// Timeout for a single lookup, in seconds
    #[arg(long, default_value_t = 5)]
    pub geo_timeout: u64,

    /// Mask client addresses in the published report
    #[arg(long)]
    pub redact: bool,

    /// Page heading
    #[arg(long, default_value = "TNFS Server Activity")]
    pub title: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_without_arguments() {
        let args = Args::try_parse_from(["tnfstats"]).unwrap();
        assert_eq!(args.log, PathBuf::from("tnfsd_stats.csv"));
        assert_eq!(args.output, PathBuf::from("index.html"));
        assert_eq!(args.top_files, 20);
        assert_eq!(args.top_clients, 10);
        assert_eq!(args.recent, 20);
        assert!(!args.no_geo);
    }

    #[test]
    fn overrides() {
        let args = Args::try_parse_from([
            "tnfstats",
            "--log",
            "/var/log/tnfs.csv",
            "--no-geo",
            "--top-clients",
            "5",
            "--redact",
        ])
        .unwrap();
        assert_eq!(args.log, PathBuf::from("/var/log/tnfs.csv"));
        assert!(args.no_geo);
        assert!(args.redact);
        assert_eq!(args.top_clients, 5);
    }
}
