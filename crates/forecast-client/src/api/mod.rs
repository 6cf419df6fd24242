// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Forecast API layer.
//!
//! Defines the request vocabulary (models, variables, coordinates), the
//! decoded [`ModelSeries`] shape, and the [`ForecastSource`] trait that the
//! pipelines fan out over. The Open-Meteo implementation lives in
//! [`open_meteo`].

mod open_meteo;

pub use open_meteo::{OpenMeteoSource, SourceConfig, DEFAULT_BASE_URL};

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ramp::Rgb;

/// Errors that can occur while fetching or decoding one forecast request.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Parse(String),

    #[error("variable '{0}' missing from response")]
    MissingVariable(String),

    #[error("hour {hour} out of range (series has {len} values)")]
    HourOutOfRange { hour: usize, len: usize },

    #[error("no value reported at hour {0}")]
    EmptyValue(usize),

    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

/// A WGS-84 coordinate in degrees.
///
/// No range validation is applied; grid points past the poles are carried
/// through as-is and left for the API to reject.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3},{:.3}", self.latitude, self.longitude)
    }
}

/// Forecast model selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelId {
    /// NOAA GFS, queried through the generic forecast endpoint.
    Gfs,
    /// ECMWF, which has its own dedicated endpoint.
    Ecmwf,
}

impl ModelId {
    pub const ALL: [Self; 2] = [Self::Gfs, Self::Ecmwf];

    /// Identifier used in URLs and config files
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gfs => "gfs",
            Self::Ecmwf => "ecmwf",
        }
    }

    /// Legend label for chart traces
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Gfs => "GFS",
            Self::Ecmwf => "ECMWF",
        }
    }

    /// Fixed display color of this model's trace
    #[must_use]
    pub const fn color(self) -> Rgb {
        match self {
            Self::Gfs => Rgb::new(0xff, 0x6b, 0x6b),
            Self::Ecmwf => Rgb::new(0x4d, 0xab, 0xf7),
        }
    }

    #[must_use]
    pub const fn endpoint(self) -> Endpoint {
        match self {
            Self::Ecmwf => Endpoint::Ecmwf,
            Self::Gfs => Endpoint::Forecast,
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown model identifier: {0}")]
pub struct UnknownModel(pub String);

impl FromStr for ModelId {
    type Err = UnknownModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gfs" => Ok(Self::Gfs),
            "ecmwf" => Ok(Self::Ecmwf),
            _ => Err(UnknownModel(s.to_string())),
        }
    }
}

/// The two URL shapes exposed by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `/ecmwf`, model implied by the path.
    Ecmwf,
    /// `/forecast`, model passed as a query parameter.
    Forecast,
}

/// An hourly variable name such as `temperature_2m`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variable(String);

impl Variable {
    /// Variables offered by the control surface.
    pub const CHOICES: [&'static str; 7] = [
        "temperature_2m",
        "relative_humidity_2m",
        "apparent_temperature",
        "precipitation",
        "cloud_cover",
        "wind_speed_10m",
        "surface_pressure",
    ];

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Variable {
    fn default() -> Self {
        Self::new(Self::CHOICES[0])
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build the request URL for one model at one point.
#[must_use]
pub fn request_url(base_url: &str, model: ModelId, point: GeoPoint, variable: &Variable) -> String {
    let base = base_url.trim_end_matches('/');
    match model.endpoint() {
        Endpoint::Ecmwf => format!(
            "{base}/ecmwf?latitude={}&longitude={}&hourly={variable}&timezone=UTC",
            point.latitude, point.longitude
        ),
        Endpoint::Forecast => format!(
            "{base}/forecast?latitude={}&longitude={}&hourly={variable}&model={model}&timezone=UTC",
            point.latitude, point.longitude
        ),
    }
}

/// Hourly time series returned for one model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSeries {
    pub model: ModelId,
    pub times: Vec<DateTime<Utc>>,
    /// `None` where the API reported `null`.
    pub values: Vec<Option<f64>>,
}

impl ModelSeries {
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at an hour index, failing when the index is past the end or the
    /// slot is empty.
    pub fn value_at(&self, hour: usize) -> Result<f64, FetchError> {
        match self.values.get(hour) {
            Some(Some(value)) => Ok(*value),
            Some(None) => Err(FetchError::EmptyValue(hour)),
            None => Err(FetchError::HourOutOfRange {
                hour,
                len: self.values.len(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct HourlyResponse {
    hourly: HourlyBlock,
}

#[derive(Debug, Deserialize)]
struct HourlyBlock {
    time: Vec<String>,
    #[serde(flatten)]
    columns: HashMap<String, serde_json::Value>,
}

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Decode a response body into a [`ModelSeries`].
pub fn decode_series(model: ModelId, variable: &Variable, body: &[u8]) -> Result<ModelSeries, FetchError> {
    let response: HourlyResponse =
        serde_json::from_slice(body).map_err(|e| FetchError::Parse(e.to_string()))?;
    let HourlyBlock { time, mut columns } = response.hourly;

    let column = columns
        .remove(variable.as_str())
        .ok_or_else(|| FetchError::MissingVariable(variable.to_string()))?;
    let values: Vec<Option<f64>> =
        serde_json::from_value(column).map_err(|e| FetchError::Parse(e.to_string()))?;

    if values.len() != time.len() {
        return Err(FetchError::Parse(format!(
            "{} timestamps but {} values",
            time.len(),
            values.len()
        )));
    }

    let times = time
        .iter()
        .map(|t| {
            NaiveDateTime::parse_from_str(t, TIME_FORMAT)
                .map(|naive| naive.and_utc())
                .map_err(|e| FetchError::Parse(format!("invalid timestamp '{t}': {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ModelSeries { model, times, values })
}

/// A source of hourly forecast series.
///
/// Implemented over HTTP by [`OpenMeteoSource`]; tests substitute in-memory
/// sources.
#[async_trait]
pub trait ForecastSource: Send + Sync {
    async fn fetch_hourly(
        &self,
        point: GeoPoint,
        model: ModelId,
        variable: &Variable,
    ) -> Result<ModelSeries, FetchError>;
}
