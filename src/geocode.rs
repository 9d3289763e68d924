use anyhow::Result;
use tracing::warn;

use crate::types::{Coordinate, Query};

/// Turns free-text addresses into coordinates.
pub trait Geocoder {
    /// `Ok(None)` when the service has no match.
    fn resolve_address(&self, address: &str) -> Result<Option<Coordinate>>;
}

/// Geocode one query per non-blank line of input.
/// Lookup failures become queries without a coordinate; they never abort.
pub fn geocode_queries<G: Geocoder + ?Sized>(geocoder: &G, addresses: &[String]) -> Vec<Query> {
    addresses.iter()
        .map(|address| address.trim())
        .filter(|address| !address.is_empty())
        .map(|address| {
            let coordinate = match geocoder.resolve_address(address) {
                Ok(Some(coordinate)) => Some(coordinate),
                Ok(None) => {
                    warn!(%address, "no geocoding match");
                    None
                }
                Err(e) => {
                    warn!(%address, error = %e, "geocoding failed");
                    None
                }
            };
            Query::new(address, coordinate)
        })
        .collect()
}

#[cfg(feature = "download")]
pub use nominatim::NominatimGeocoder;

#[cfg(feature = "download")]
mod nominatim {
    use anyhow::{Context, Result};
    use serde::Deserialize;
    use tracing::debug;

    use super::Geocoder;
    use crate::{common::ReqwestClient, types::Coordinate};

    pub const NOMINATIM_SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";

    /// One hit from the Nominatim `jsonv2` search format; coordinates arrive as strings.
    #[derive(Debug, Deserialize)]
    struct Place {
        lat: String,
        lon: String,
    }

    /// OpenStreetMap Nominatim search, first hit wins.
    pub struct NominatimGeocoder {
        client: ReqwestClient,
        endpoint: String,
    }

    impl NominatimGeocoder {
        pub fn new(client: ReqwestClient) -> Self {
            Self { client, endpoint: NOMINATIM_SEARCH_URL.to_string() }
        }

        pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
            self.endpoint = endpoint.into();
            self
        }
    }

    impl Geocoder for NominatimGeocoder {
        fn resolve_address(&self, address: &str) -> Result<Option<Coordinate>> {
            debug!(%address, "[geocode] searching");
            let places: Vec<Place> = self.client.inner()
                .get(&self.endpoint)
                .query(&[("q", address), ("format", "jsonv2"), ("limit", "1")])
                .send()
                .with_context(|| format!("GET {}", self.endpoint))?
                .error_for_status()
                .with_context(|| format!("GET {} returned error status", self.endpoint))?
                .json()
                .context("invalid geocoding response")?;

            places.first()
                .map(|place| {
                    let lat = place.lat.parse::<f64>().with_context(|| format!("invalid latitude {:?}", place.lat))?;
                    let lon = place.lon.parse::<f64>().with_context(|| format!("invalid longitude {:?}", place.lon))?;
                    Coordinate::new(lat, lon)
                })
                .transpose()
        }
    }

}
