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

//! Application configuration management.
//!
//! Settings are persisted in TOML via confy. Every field has a serde default
//! so older or hand-edited files keep loading as new fields are added.

use std::str::FromStr;
use std::time::Duration;

use forecast_client::{
    ClientConfig, ColorRamp, FailurePolicy, FieldStyle, GridConfig, LayerStyle, ModelId,
    Parameters, SourceConfig, Variable,
};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::map::MapStyle;

const APP_NAME: &str = "meteofield-desktop";
const CONFIG_NAME: &str = "config";

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration schema version for migrations
    pub config_version: u32,

    /// Forecast API base URL, without trailing slash
    pub api_base_url: String,

    /// Per-request timeout. No timeout when unset.
    pub request_timeout_secs: Option<u64>,

    /// Variable selected at startup
    pub default_variable: String,

    /// Chart models checked at startup
    pub default_models: Vec<String>,

    /// Model sampled for the map field at startup
    pub default_map_model: String,

    /// Field hour at startup
    pub default_hour: u32,

    /// Upper bound of the hour slider
    pub max_hour: u32,

    pub failure_policy: FailurePolicy,

    /// Basemap style
    pub map_style: MapStyle,

    pub initial_lat: f64,
    pub initial_lon: f64,
    pub initial_zoom: f64,

    /// Show the welcome overlay on startup
    pub show_welcome: bool,

    // Tables last so TOML output stays valid
    pub grid: GridConfig,
    pub ramp: ColorRamp,
    pub field_style: FieldStyle,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: 1,
            api_base_url: forecast_client::api::DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: None,
            default_variable: Variable::default().as_str().to_string(),
            default_models: ModelId::ALL.iter().map(|m| m.as_str().to_string()).collect(),
            default_map_model: ModelId::Gfs.as_str().to_string(),
            default_hour: 0,
            max_hour: 167,
            failure_policy: FailurePolicy::default(),
            map_style: MapStyle::default(),
            initial_lat: 50.0,
            initial_lon: 12.0,
            initial_zoom: 4.0,
            show_welcome: true,
            grid: GridConfig::default(),
            ramp: ColorRamp::default(),
            field_style: FieldStyle::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, CONFIG_NAME).map(Self::validated)
    }

    /// Replace values that parse but cannot be used with their defaults.
    fn validated(mut self) -> Self {
        self.grid = self.grid.validated();
        self
    }

    /// Load configuration, falling back to defaults on any error
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, CONFIG_NAME, self)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<std::path::PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    /// Settings for the forecast client.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            source: SourceConfig {
                base_url: self.api_base_url.trim_end_matches('/').to_string(),
                timeout: self.request_timeout_secs.map(Duration::from_secs),
            },
            grid: self.grid,
            layer_style: LayerStyle {
                ramp: self.ramp.clone(),
                marker: self.field_style,
            },
            failure_policy: self.failure_policy,
        }
    }

    /// Control values at startup. Unknown model names are skipped and the
    /// hour is clamped to the slider range.
    pub fn initial_parameters(&self) -> Parameters {
        let mut models = Vec::new();
        for name in &self.default_models {
            match ModelId::from_str(name) {
                Ok(model) if !models.contains(&model) => models.push(model),
                Ok(_) => {}
                Err(e) => warn!("Ignoring configured model: {}", e),
            }
        }
        // Keep the checkbox order stable regardless of config order
        models.sort();

        let map_model = ModelId::from_str(&self.default_map_model).unwrap_or_else(|e| {
            warn!("{}; map model falls back to {}", e, ModelId::Gfs);
            ModelId::Gfs
        });

        Parameters {
            variable: Variable::new(self.default_variable.clone()),
            models,
            map_model,
            hour: self.default_hour.min(self.max_hour) as usize,
        }
    }
}
