use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use pipeline_domain::ports::SourceNameFetcher;

#[derive(Debug, Deserialize)]
struct SourceDescriptor {
    name: String,
}

/// Resolves a font source URL by fetching its JSON descriptor.
pub struct HttpSourceNameFetcher {
    client: Client,
}

impl HttpSourceNameFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SourceNameFetcher for HttpSourceNameFetcher {
    async fn fetch_name(&self, url: &str) -> Result<String> {
        let url = url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            bail!("unsupported source url scheme: {}", url);
        }
        let descriptor: SourceDescriptor = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        parse_name(descriptor)
    }
}

fn parse_name(descriptor: SourceDescriptor) -> Result<String> {
    let name = descriptor.name.trim();
    if name.is_empty() {
        return Err(anyhow!("source descriptor has an empty name"));
    }
    Ok(name.to_string())
}
