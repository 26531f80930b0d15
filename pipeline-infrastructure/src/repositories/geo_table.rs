use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use anyhow::Result;
use ip_network::IpNetwork;
use ip_network_table::IpNetworkTable;
use tracing::{info, warn};

use pipeline_domain::ports::GeoResolver;
use pipeline_domain::GeoInfo;

use crate::repositories::loader::{cell, column_index, parse_csv, read_table_source};

/// Longest-prefix geolocation table loaded from
/// `network,country_code,region,latitude,longitude` CSV rows.
pub struct CidrGeoResolver {
    table: IpNetworkTable<GeoInfo>,
    entries: usize,
}

impl std::fmt::Debug for CidrGeoResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CidrGeoResolver")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl CidrGeoResolver {
    pub async fn load(path: &str) -> Result<Self> {
        let content = read_table_source(path).await?;
        let resolver = Self::from_csv_str(&content)?;
        info!(path = %path, entries = resolver.len(), "loaded geo table");
        Ok(resolver)
    }

    pub fn from_csv_str(content: &str) -> Result<Self> {
        let (headers, records) = parse_csv(content)?;
        let network_idx = column_index(&headers, "network")?;
        let country_idx = headers.iter().position(|h| h == "country_code");
        let region_idx = headers.iter().position(|h| h == "region");
        let latitude_idx = headers.iter().position(|h| h == "latitude");
        let longitude_idx = headers.iter().position(|h| h == "longitude");

        let mut resolver = Self {
            table: IpNetworkTable::new(),
            entries: 0,
        };
        let mut skipped = 0usize;
        for (line, record) in records.iter().enumerate() {
            let Some(network) = cell(record, Some(network_idx)).and_then(parse_network) else {
                skipped += 1;
                warn!(line = line + 2, "skipping geo row with invalid network");
                continue;
            };
            let info = GeoInfo {
                country_code: cell(record, country_idx).map(str::to_ascii_uppercase),
                region: cell(record, region_idx).map(str::to_string),
                latitude: cell(record, latitude_idx).and_then(|v| v.parse().ok()),
                longitude: cell(record, longitude_idx).and_then(|v| v.parse().ok()),
            };
            resolver.table.insert(network, info);
            resolver.entries += 1;
        }
        if skipped > 0 {
            warn!(skipped, "geo table rows skipped");
        }
        Ok(resolver)
    }

    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }
}

impl GeoResolver for CidrGeoResolver {
    fn resolve(&self, ip: &str) -> Option<GeoInfo> {
        let addr = normalize(ip.trim().parse::<IpAddr>().ok()?);
        if !is_public(addr) {
            return None;
        }
        self.table
            .longest_match(addr)
            .map(|(_, info)| info.clone())
    }
}

/// Accepts CIDR notation or a bare address (stored as /32 or /128).
fn parse_network(raw: &str) -> Option<IpNetwork> {
    if let Ok(network) = raw.parse::<IpNetwork>() {
        return Some(network);
    }
    match raw.parse::<IpAddr>().ok()? {
        IpAddr::V4(v4) => IpNetwork::new(v4, 32).ok(),
        IpAddr::V6(v6) => IpNetwork::new(v6, 128).ok(),
    }
}

fn normalize(addr: IpAddr) -> IpAddr {
    match addr {
        IpAddr::V6(v6) => v6
            .to_ipv4_mapped()
            .map(IpAddr::V4)
            .unwrap_or(IpAddr::V6(v6)),
        v4 => v4,
    }
}

fn is_public(addr: IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => is_public_v4(v4),
        IpAddr::V6(v6) => is_public_v6(v6),
    }
}

fn is_public_v4(addr: Ipv4Addr) -> bool {
    !(addr.is_private()
        || addr.is_loopback()
        || addr.is_link_local()
        || addr.is_unspecified()
        || addr.is_broadcast())
}

fn is_public_v6(addr: Ipv6Addr) -> bool {
    let first = addr.segments()[0];
    let unique_local = (first & 0xfe00) == 0xfc00;
    let link_local = (first & 0xffc0) == 0xfe80;
    !(addr.is_loopback() || addr.is_unspecified() || unique_local || link_local)
}
