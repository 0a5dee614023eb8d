//! Weather provider access
//!
//! URL templates for every product, manifest parsing, and the
//! [`ProviderClient`] seam used to fetch raw bytes. Any non-2xx response or
//! transport failure comes back as a [`FetchError`]; callers treat it as "no
//! data for this slice".

pub mod error;
pub mod http;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

pub use error::{FetchError, Result};
pub use http::{HttpConfig, ReqwestClient};

/// Timestamp format used in provider paths and the version manifest
pub const PROVIDER_TIME_FORMAT: &str = "%Y%m%d_%H%M";

pub const DEFAULT_BASE_URL: &str = "https://www.meteoschweiz.admin.ch/product/output";
pub const DEFAULT_MANIFEST_URL: &str = "https://www.meteoswiss.admin.ch/product/output/versions.json";

const RAIN_PRODUCT: &str = "inca/precipitation/rate";

/// Fetches raw bytes from a URL
#[async_trait]
pub trait ProviderClient: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes>;
}

/// Height of the wind forecast product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WindLevel {
    #[default]
    #[serde(rename = "10m")]
    TenMeters,
    #[serde(rename = "2000m")]
    TwoThousandMeters,
}

impl WindLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindLevel::TenMeters => "10m",
            WindLevel::TwoThousandMeters => "2000m",
        }
    }

    fn family(&self) -> String {
        format!("wind-{}", self.as_str())
    }

    /// Manifest key of the wind product family
    pub fn product(&self) -> String {
        format!("cosmo/{}/images", self.family())
    }
}

impl fmt::Display for WindLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn format_time(ts: &DateTime<Utc>) -> String {
    ts.format(PROVIDER_TIME_FORMAT).to_string()
}

/// Latest production run per product, as published by the provider
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: HashMap<String, String>,
}

impl Manifest {
    pub fn parse(body: &[u8]) -> Result<Self> {
        let entries: HashMap<String, serde_json::Value> = serde_json::from_slice(body)?;
        let entries = entries
            .into_iter()
            .filter_map(|(key, value)| match value {
                serde_json::Value::String(s) => Some((key, s)),
                _ => None,
            })
            .collect();
        Ok(Self { entries })
    }

    pub fn version(&self, product: &str) -> Result<DateTime<Utc>> {
        let value = self
            .entries
            .get(product)
            .ok_or_else(|| FetchError::MissingProduct(product.to_string()))?;

        NaiveDateTime::parse_from_str(value, PROVIDER_TIME_FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(|_| FetchError::InvalidVersion {
                product: product.to_string(),
                value: value.clone(),
            })
    }
}

/// Provider endpoints bound to a client
#[derive(Clone)]
pub struct Provider {
    client: Arc<dyn ProviderClient>,
    base_url: String,
    manifest_url: String,
    wind_level: WindLevel,
}

impl Provider {
    pub fn new(
        client: Arc<dyn ProviderClient>,
        base_url: impl Into<String>,
        manifest_url: impl Into<String>,
        wind_level: WindLevel,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            manifest_url: manifest_url.into(),
            wind_level,
        }
    }

    pub fn wind_level(&self) -> WindLevel {
        self.wind_level
    }

    pub fn radar_url(&self, ts: &DateTime<Utc>) -> String {
        format!("{}/radar/rzc/radar_rzc.{}.json", self.base_url, format_time(ts))
    }

    pub fn rain_url(&self, version: &DateTime<Utc>, ts: &DateTime<Utc>) -> String {
        format!(
            "{}/{}/version__{}/rate_{}.json",
            self.base_url,
            RAIN_PRODUCT,
            format_time(version),
            format_time(ts)
        )
    }

    pub fn wind_strength_url(&self, version: &DateTime<Utc>, ts: &DateTime<Utc>) -> String {
        self.wind_url(version, ts, "json")
    }

    pub fn wind_direction_url(&self, version: &DateTime<Utc>, ts: &DateTime<Utc>) -> String {
        self.wind_url(version, ts, "png")
    }

    fn wind_url(&self, version: &DateTime<Utc>, ts: &DateTime<Utc>, ext: &str) -> String {
        format!(
            "{}/{}/version__{}/{}_{}.{}",
            self.base_url,
            self.wind_level.product(),
            format_time(version),
            self.wind_level.family(),
            format_time(ts),
            ext
        )
    }

    pub async fn fetch(&self, url: &str) -> Result<Bytes> {
        self.client.fetch(url).await
    }

    /// Fetches the version manifest; one fetch serves every walk of a cycle
    pub async fn manifest(&self) -> Result<Manifest> {
        let body = self.client.fetch(&self.manifest_url).await?;
        Manifest::parse(&body)
    }

    pub fn rain_version(&self, manifest: &Manifest) -> Result<DateTime<Utc>> {
        manifest.version(RAIN_PRODUCT)
    }

    pub fn wind_version(&self, manifest: &Manifest) -> Result<DateTime<Utc>> {
        manifest.version(&self.wind_level.product())
    }
}
