// shared/src/lib.rs

use serde::Serialize;

pub mod config;

/// Which upstream service a request (and its cache entry) belongs to.
/// The discriminator is part of the cache key, so geocode and suggest
/// results for the same text never shadow each other.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Geocode,
    Suggest,
}

impl ServiceType {
    /// Value stored in the `service_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Geocode => "geocode",
            ServiceType::Suggest => "suggest",
        }
    }

    /// Human-facing upstream name used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            ServiceType::Geocode => "Yandex Geocode",
            ServiceType::Suggest => "Yandex Suggest",
        }
    }

    /// Short service name used in the unavailable-credential message.
    pub fn service_name(&self) -> &'static str {
        match self {
            ServiceType::Geocode => "Geocoding",
            ServiceType::Suggest => "Suggest",
        }
    }
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
