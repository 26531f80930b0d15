use async_trait::async_trait;

use crate::entities::GeoInfo;

/// Static IP geolocation dataset.
pub trait GeoResolver: Send + Sync {
    /// `None` for private, malformed or unmapped addresses.
    fn resolve(&self, ip: &str) -> Option<GeoInfo>;
}

/// ISO country code to display name table.
pub trait CountryDirectory: Send + Sync {
    fn country_name(&self, code: &str) -> Option<String>;
}

/// Remote lookup of the human-readable name behind a font source URL.
#[async_trait]
pub trait SourceNameFetcher: Send + Sync {
    async fn fetch_name(&self, url: &str) -> anyhow::Result<String>;
}
