//! Geolocation trait.

use std::future::Future;
use std::net::IpAddr;

/// City/country/timezone lookups for client IPs.
///
/// Lookups never fail: implementations degrade to the `"-"` placeholders and
/// the UTC offset when the backend is unreachable or the IP is unknown.
pub trait GeoLocator: Send + Sync {
    /// Resolve an IP to `(city, country)`, `("-", "-")` when unknown.
    fn city_country(&self, ip: IpAddr) -> impl Future<Output = (String, String)> + Send;

    /// Resolve an IP to a `"+HH:MM"`/`"-HH:MM"` UTC offset, `"00:00"` when
    /// unknown.
    fn timezone_offset(&self, ip: IpAddr) -> impl Future<Output = String> + Send;
}

/// Locator that knows nothing: every lookup degrades to the placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullGeoLocator;

impl GeoLocator for NullGeoLocator {
    async fn city_country(&self, _ip: IpAddr) -> (String, String) {
        ("-".to_string(), "-".to_string())
    }

    async fn timezone_offset(&self, _ip: IpAddr) -> String {
        "00:00".to_string()
    }
}
