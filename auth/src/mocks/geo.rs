//! Mock geolocator for testing.

use crate::providers::GeoLocator;
use std::future::Future;

/// Mock geolocator returning fixed values.
#[derive(Debug, Clone)]
pub struct MockGeoLocator {
    city: String,
    country: String,
    offset: String,
}

impl MockGeoLocator {
    /// Create a locator that answers with the given city/country/offset.
    #[must_use]
    pub fn new(city: &str, country: &str, offset: &str) -> Self {
        Self {
            city: city.to_string(),
            country: country.to_string(),
            offset: offset.to_string(),
        }
    }
}

impl Default for MockGeoLocator {
    fn default() -> Self {
        Self::new("-", "-", "00:00")
    }
}

impl GeoLocator for MockGeoLocator {
    fn city_country(&self, _ip: std::net::IpAddr) -> impl Future<Output = (String, String)> + Send {
        let city = self.city.clone();
        let country = self.country.clone();

        async move { (city, country) }
    }

    fn timezone_offset(&self, _ip: std::net::IpAddr) -> impl Future<Output = String> + Send {
        let offset = self.offset.clone();

        async move { offset }
    }
}
