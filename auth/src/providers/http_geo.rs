//! HTTP geolocation implementation backed by ip-api.com.

use crate::providers::GeoLocator;
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;

/// Fields requested from the lookup endpoint.
#[derive(Debug, Deserialize)]
struct GeoResponse {
    status: String,
    #[serde(default)]
    city: String,
    #[serde(default, rename = "countryCode")]
    country_code: String,
    /// UTC offset in seconds.
    #[serde(default)]
    offset: i64,
}

/// Geolocator backed by the ip-api.com JSON endpoint.
///
/// Lookup failures of any kind degrade to the placeholder values; they are
/// never fatal to the calling flow.
#[derive(Debug, Clone)]
pub struct HttpGeoLocator {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGeoLocator {
    /// Create a locator against the given base URL
    /// (e.g., "<http://ip-api.com>").
    #[must_use]
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(3))
            .build()
            .unwrap_or_default();

        Self { client, base_url }
    }

    async fn lookup(&self, ip: IpAddr) -> Option<GeoResponse> {
        let url = format!(
            "{}/json/{ip}?fields=status,city,countryCode,offset",
            self.base_url
        );

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(ip = %ip, error = %e, "Geolocation request failed");
                return None;
            }
        };

        match response.json::<GeoResponse>().await {
            Ok(body) if body.status == "success" => Some(body),
            Ok(body) => {
                tracing::debug!(ip = %ip, status = %body.status, "Geolocation lookup unresolved");
                None
            }
            Err(e) => {
                tracing::warn!(ip = %ip, error = %e, "Geolocation response malformed");
                None
            }
        }
    }
}

impl GeoLocator for HttpGeoLocator {
    async fn city_country(&self, ip: IpAddr) -> (String, String) {
        match self.lookup(ip).await {
            Some(body) if !body.city.is_empty() && !body.country_code.is_empty() => {
                (body.city, body.country_code)
            }
            _ => ("-".to_string(), "-".to_string()),
        }
    }

    async fn timezone_offset(&self, ip: IpAddr) -> String {
        let Some(body) = self.lookup(ip).await else {
            return "00:00".to_string();
        };

        let sign = if body.offset < 0 { "-" } else { "+" };
        let abs = body.offset.abs();
        format!("{sign}{:02}:{:02}", abs / 3600, (abs % 3600) / 60)
    }
}
