use async_trait::async_trait;
use devcamper_config::GeocoderConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};
use utoipa::ToSchema;

/// Mean Earth radius in miles.
pub const EARTH_RADIUS_MILES: f64 = 3963.0;

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoder request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("geocoder returned status {0}")]
    Status(u16),
}

/// A GeoJSON point plus the address parts the geocoder resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeoLocation {
    #[serde(rename = "type")]
    pub kind: String,
    /// `[longitude, latitude]`
    pub coordinates: [f64; 2],
    #[serde(default)]
    pub formatted_address: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zipcode: String,
    #[serde(default)]
    pub country: String,
}

impl GeoLocation {
    pub fn point(longitude: f64, latitude: f64) -> Self {
        Self {
            kind: "Point".to_string(),
            coordinates: [longitude, latitude],
            formatted_address: String::new(),
            street: String::new(),
            city: String::new(),
            state: String::new(),
            zipcode: String::new(),
            country: String::new(),
        }
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }

    /// Great-circle distance in miles.
    pub fn distance_miles(&self, other: &GeoLocation) -> f64 {
        let (lat1, lat2) = (self.latitude().to_radians(), other.latitude().to_radians());
        let d_lat = lat2 - lat1;
        let d_lng = (other.longitude() - self.longitude()).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_MILES * a.sqrt().asin()
    }
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolves a free-form address. `Ok(None)` when nothing matched.
    async fn geocode(&self, address: &str) -> Result<Option<GeoLocation>, GeocodeError>;
}

/// Picks MapQuest when an API key is configured.
pub fn geocoder_from_config(config: &GeocoderConfig) -> Box<dyn Geocoder> {
    match &config.api_key {
        Some(key) => Box::new(MapQuestGeocoder::new(key.clone(), config.base_url.clone())),
        None => Box::new(NoopGeocoder),
    }
}

pub struct MapQuestGeocoder {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Deserialize)]
struct MapQuestResponse {
    #[serde(default)]
    results: Vec<MapQuestResult>,
}

#[derive(Deserialize)]
struct MapQuestResult {
    #[serde(default)]
    locations: Vec<MapQuestLocation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapQuestLocation {
    lat_lng: MapQuestLatLng,
    #[serde(default)]
    street: String,
    #[serde(default)]
    admin_area5: String,
    #[serde(default)]
    admin_area3: String,
    #[serde(default)]
    admin_area1: String,
    #[serde(default)]
    postal_code: String,
}

#[derive(Deserialize)]
struct MapQuestLatLng {
    lat: f64,
    lng: f64,
}

impl From<MapQuestLocation> for GeoLocation {
    fn from(loc: MapQuestLocation) -> Self {
        let formatted_address = [
            loc.street.as_str(),
            loc.admin_area5.as_str(),
            &format!("{} {}", loc.admin_area3, loc.postal_code),
            loc.admin_area1.as_str(),
        ]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

        Self {
            kind: "Point".to_string(),
            coordinates: [loc.lat_lng.lng, loc.lat_lng.lat],
            formatted_address,
            street: loc.street,
            city: loc.admin_area5,
            state: loc.admin_area3,
            zipcode: loc.postal_code,
            country: loc.admin_area1,
        }
    }
}

impl MapQuestGeocoder {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
        }
    }
}

#[async_trait]
impl Geocoder for MapQuestGeocoder {
    #[instrument(skip(self))]
    async fn geocode(&self, address: &str) -> Result<Option<GeoLocation>, GeocodeError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("key", self.api_key.as_str()), ("location", address)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeocodeError::Status(response.status().as_u16()));
        }

        let body: MapQuestResponse = response.json().await?;
        let location = body
            .results
            .into_iter()
            .flat_map(|r| r.locations)
            .next()
            .map(GeoLocation::from);

        debug!(found = location.is_some(), "Geocoded address");
        Ok(location)
    }
}

/// Resolves nothing; used when no geocoding service is configured.
pub struct NoopGeocoder;

#[async_trait]
impl Geocoder for NoopGeocoder {
    async fn geocode(&self, _address: &str) -> Result<Option<GeoLocation>, GeocodeError> {
        Ok(None)
    }
}
