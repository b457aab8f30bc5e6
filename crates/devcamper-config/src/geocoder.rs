use std::env;

/// MapQuest-compatible geocoding endpoint.
///
/// Without `GEOCODER_API_KEY` addresses are stored without a location.
#[derive(Clone, Debug)]
pub struct GeocoderConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

impl GeocoderConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: env::var("GEOCODER_API_KEY").ok().filter(|k| !k.is_empty()),
            base_url: env::var("GEOCODER_BASE_URL")
                .unwrap_or_else(|_| "https://www.mapquestapi.com/geocoding/v1/address".to_string()),
        }
    }
}
