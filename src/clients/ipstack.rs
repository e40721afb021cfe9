use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;

use crate::config::IpstackConfig;

/// The slice of an ipstack lookup response that gets persisted. `zip` arrives
/// as a string on the wire and is parsed to an integer at the ingest site.
#[derive(Debug, Deserialize)]
pub struct IpstackRecord {
    pub ip: String,
    pub country_name: Option<String>,
    pub region_name: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Clone)]
pub struct IpstackClient {
    client: Client,
    base_url: String,
    access_key: String,
}

impl IpstackClient {
    pub fn from_config(config: &IpstackConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(u64::from(
                config.request_timeout_seconds,
            )))
            .user_agent("geodex/0.1")
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_key: config.access_key.clone(),
        })
    }

    pub async fn lookup(&self, ip: &str) -> Result<Option<IpstackRecord>> {
        let url = format!("{}/{}?access_key={}", self.base_url, ip, self.access_key);
        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("ipstack API error: {} - {}", status, body));
        }

        let record: IpstackRecord = response.json().await?;

        Ok(Some(record))
    }
}
