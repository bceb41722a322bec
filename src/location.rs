//! Approximate location value type

use serde::{Deserialize, Serialize};

/// A single approximate latitude/longitude sample.
///
/// The `provider` tags where the sample came from (GPS, network, a bulk
/// import). It is not persisted: rows read back from storage always carry
/// the store's fixed read-back tag, whatever was set at insert time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproximateLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "unknown_provider")]
    pub provider: String,
}

impl ApproximateLocation {
    pub fn new(provider: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            provider: provider.into(),
        }
    }
}

fn unknown_provider() -> String {
    "unknown".to_string()
}

impl std::fmt::Display for ApproximateLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}, {}", self.provider, self.latitude, self.longitude)
    }
}
