use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::prompt::FORECAST_KEYS;

/// Body of `POST /forecast`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastRequest {
    #[serde(default)]
    pub location: Option<String>,
}

impl ForecastRequest {
    pub fn new(location: impl Into<String>) -> Self {
        Self { location: Some(location.into()) }
    }

    /// Lenient decoding: anything that is not an object with a string
    /// `location` decodes as a request without a location.
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }

    /// The location as sent by the caller, unless it is missing or blank.
    pub fn validated_location(&self) -> Option<&str> {
        self.location.as_deref().filter(|loc| !loc.trim().is_empty())
    }
}

/// Parsed provider output, forwarded as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Forecast(pub Value);

impl Forecast {
    pub fn into_inner(self) -> Value {
        self.0
    }

    pub fn day(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Expected day keys that are absent or not strings.
    pub fn missing_days(&self) -> Vec<&'static str> {
        FORECAST_KEYS
            .iter()
            .copied()
            .filter(|key| self.day(key).is_none())
            .collect()
    }
}

/// Success body: `{"result": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastEnvelope {
    pub result: Forecast,
}

/// Error body: `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
