use time::macros::format_description;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::EnvFilter;

pub fn setup_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(LocalTime::new(format_description!(
            "[hour]:[minute]:[second].[subsecond digits:3]"
        )))
        .with_writer(std::io::stderr)
        .init();
}

pub fn format_number(num: u64) -> String {
    let digits = num.to_string();
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// Masks the host part of a client address for publishing.
///
/// IPv4 keeps the first two octets (`8.8.*.*`), IPv6 keeps the first two
/// groups. Anything else is masked character by character.
pub fn redact_address(address: &str) -> String {
    let v4: Vec<&str> = address.split('.').collect();
    if v4.len() == 4 {
        return format!("{}.{}.*.*", v4[0], v4[1]);
    }

    if address.contains(':') {
        let groups: Vec<&str> = address.split(':').filter(|g| !g.is_empty()).collect();
        if groups.len() > 2 {
            return format!("{}:{}:*", groups[0], groups[1]);
        }
    }

    "*".repeat(address.chars().count())
}

pub fn validate_args(args: &crate::args::Args) -> anyhow::Result<()> {
    if args.top_files == 0 {
        anyhow::bail!("--top-files must be greater than 0");
    }

    if args.top_clients == 0 {
        anyhow::bail!("--top-clients must be greater than 0");
    }

    if args.recent == 0 {
        anyhow::bail!("--recent must be greater than 0");
    }

    if args.geo_timeout == 0 {
        anyhow::bail!("--geo-timeout must be greater than 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn thousands_separators() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn redacts_ipv4() {
        assert_eq!(redact_address("8.8.4.4"), "8.8.*.*");
    }

    #[test]
    fn redacts_ipv6() {
        assert_eq!(redact_address("2001:db8:85a3::8a2e:370:7334"), "2001:db8:*");
    }

    #[test]
    fn redacts_unknown_shapes() {
        assert_eq!(redact_address("host"), "****");
    }

    #[test]
    fn rejects_zero_counts() {
        let args = crate::args::Args::try_parse_from(["tnfstats", "--recent", "0"]).unwrap();
        assert!(validate_args(&args).is_err());

        let args = crate::args::Args::try_parse_from(["tnfstats"]).unwrap();
        assert!(validate_args(&args).is_ok());
    }
}
