use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::net::IpAddr;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::{LookupError, StatsError};

pub const LOCAL: &str = "Local";
pub const UNKNOWN: &str = "Unknown";

/// Loopback, private, link-local and unspecified ranges, plus their
/// IPv4-mapped IPv6 forms.
pub fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.octets()[0] == 0
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_private_ip(IpAddr::V4(v4));
            }
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                // fc00::/7 unique local
                || first & 0xfe00 == 0xfc00
                // fe80::/10 link local
                || first & 0xffc0 == 0xfe80
        }
    }
}

/// False for anything that is not a valid IP address.
pub fn is_private(address: &str) -> bool {
    address.parse::<IpAddr>().is_ok_and(is_private_ip)
}

/// Persistent address to country memo. Entries are only ever added.
#[derive(Debug, Default, Clone)]
pub struct GeoCache {
    entries: BTreeMap<String, String>,
    dirty: bool,
}

impl GeoCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the cache, starting empty if the file is absent or unreadable.
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                info!(action = "load", component = "geo_cache", file_path = ?path, error = %e, "No usable cache file, starting empty");
                return Self::new();
            }
        };

        match serde_json::from_str::<BTreeMap<String, String>>(&content) {
            Ok(entries) => {
                info!(action = "loaded", component = "geo_cache", file_path = ?path, entry_count = entries.len(), "Loaded geolocation cache");
                Self {
                    entries,
                    dirty: false,
                }
            }
            Err(e) => {
                warn!(action = "parse", component = "geo_cache", file_path = ?path, error = %e, "Cache file is corrupt, starting empty");
                Self::new()
            }
        }
    }

    /// Writes the cache back if anything was added since it was loaded.
    pub fn save(&mut self, path: &Path) -> Result<(), StatsError> {
        if !self.dirty {
            debug!(action = "skip", component = "geo_cache", "Cache unchanged, not saving");
            return Ok(());
        }

        let to_error = |source| StatsError::CacheSave {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(to_error)?;
        }
        let json = serde_json::to_string_pretty(&self.entries).map_err(|e| to_error(e.into()))?;

        // The cache file is only ever replaced by rename, never truncated in place.
        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);
        fs::write(&tmp_path, json).map_err(to_error)?;
        fs::rename(&tmp_path, path).map_err(to_error)?;

        self.dirty = false;
        info!(action = "saved", component = "geo_cache", file_path = ?path, entry_count = self.entries.len(), "Saved geolocation cache");
        Ok(())
    }

    pub fn get(&self, address: &str) -> Option<&str> {
        self.entries.get(address).map(String::as_str)
    }

    /// Records a country unless the address already has one.
    pub fn insert(&mut self, address: &str, country: &str) {
        if !self.entries.contains_key(address) {
            self.entries.insert(address.to_string(), country.to_string());
            self.dirty = true;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// Looks up the country for a public address.
pub trait GeoLookup {
    fn lookup(&self, address: &str) -> Result<String, LookupError>;
}

impl<L: GeoLookup + ?Sized> GeoLookup for &L {
    fn lookup(&self, address: &str) -> Result<String, LookupError> {
        (**self).lookup(address)
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    country: Option<String>,
    message: Option<String>,
}

/// Client for ip-api.com style endpoints (`{endpoint}/{address}`).
pub struct IpApiClient {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl IpApiClient {
    pub fn new(endpoint: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(format!("tnfstats/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
        })
    }
}

impl GeoLookup for IpApiClient {
    fn lookup(&self, address: &str) -> Result<String, LookupError> {
        let url = format!("{}/{}", self.endpoint, address);
        let response = self.client.get(&url).send()?;

        if !response.status().is_success() {
            return Err(LookupError::Status(response.status().as_u16()));
        }

        let body: IpApiResponse = response.json()?;
        if body.status != "success" {
            return Err(LookupError::Rejected(
                body.message.unwrap_or_else(|| body.status.clone()),
            ));
        }

        body.country
            .filter(|c| !c.trim().is_empty())
            .ok_or(LookupError::MissingCountry)
    }
}

/// Resolves client addresses to countries through the cache, falling back to
/// a rate limited lookup for addresses it has not seen before.
pub struct GeoResolver<L> {
    cache: GeoCache,
    lookup: L,
    delay: Duration,
}

impl<L: GeoLookup> GeoResolver<L> {
    pub fn new(cache: GeoCache, lookup: L, delay: Duration) -> Self {
        Self {
            cache,
            lookup,
            delay,
        }
    }

    pub fn resolve(&mut self, address: &str) -> String {
        let ip = match address.parse::<IpAddr>() {
            Ok(ip) => ip,
            Err(_) => {
                debug!(action = "parse", component = "geo_resolver", address, "Not an IP address, skipping lookup");
                return UNKNOWN.to_string();
            }
        };

        if is_private_ip(ip) {
            self.cache.insert(address, LOCAL);
            return LOCAL.to_string();
        }

        if let Some(country) = self.cache.get(address) {
            return country.to_string();
        }

        thread::sleep(self.delay);
        match self.lookup.lookup(&ip.to_string()) {
            Ok(country) => {
                info!(action = "lookup", component = "geo_resolver", address, country = %country, "Resolved address");
                self.cache.insert(address, &country);
                country
            }
            // Failures stay out of the cache so the next run retries them.
            Err(e) => {
                warn!(action = "lookup", component = "geo_resolver", address, error = %e, "Lookup failed");
                UNKNOWN.to_string()
            }
        }
    }

    /// Resolves each address once, printing progress for the ones that need a lookup.
    pub fn resolve_all<'a, I>(&mut self, addresses: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let start_time = Instant::now();
        let mut countries = HashMap::new();
        let mut looked_up = 0;

        for address in addresses {
            if countries.contains_key(address) {
                continue;
            }
            if self.needs_lookup(address) {
                looked_up += 1;
                println!("Looking up location for {}...", address);
            }
            let country = self.resolve(address);
            countries.insert(address.to_string(), country);
        }

        info!(
            action = "complete",
            component = "geo_resolver",
            address_count = countries.len(),
            lookup_count = looked_up,
            duration_ms = start_time.elapsed().as_millis(),
            "Resolved client locations"
        );
        countries
    }

    fn needs_lookup(&self, address: &str) -> bool {
        let public = address
            .parse::<IpAddr>()
            .is_ok_and(|ip| !is_private_ip(ip));
        public && self.cache.get(address).is_none()
    }

    pub fn cache(&self) -> &GeoCache {
        &self.cache
    }

    pub fn into_cache(self) -> GeoCache {
        self.cache
    }
}
