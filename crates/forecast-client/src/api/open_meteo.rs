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

//! Open-Meteo HTTP source.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;

use super::{decode_series, request_url, FetchError, ForecastSource, GeoPoint, ModelId, ModelSeries, Variable};

/// Public Open-Meteo API root
pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com/v1";

/// Configuration for [`OpenMeteoSource`].
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// API root, without a trailing endpoint name.
    pub base_url: String,
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

/// [`ForecastSource`] backed by the Open-Meteo REST API.
#[derive(Debug, Clone)]
pub struct OpenMeteoSource {
    client: reqwest::Client,
    base_url: String,
}

impl OpenMeteoSource {
    pub fn new(config: SourceConfig) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ForecastSource for OpenMeteoSource {
    async fn fetch_hourly(
        &self,
        point: GeoPoint,
        model: ModelId,
        variable: &Variable,
    ) -> Result<ModelSeries, FetchError> {
        let url = request_url(&self.base_url, model, point, variable);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        decode_series(model, variable, &body)
    }
}
