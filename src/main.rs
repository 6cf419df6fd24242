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

mod app;
mod config;
mod map;
mod ui;

use clap::Parser;
use eframe::egui;
use forecast_client::GeoPoint;
use log::{info, warn};

use app::MeteoFieldApp;
use config::AppConfig;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Click the map to compare forecast models and see a variable nearby
#[derive(Parser, Debug)]
#[command(name = "meteofield-desktop", author, version, about, long_about = None)]
struct Args {
    /// Initial map center latitude
    #[arg(long, allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Initial map center longitude
    #[arg(long, allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Initial map zoom level
    #[arg(long)]
    zoom: Option<f64>,

    /// Select the initial center at startup
    #[arg(long)]
    select: bool,

    /// Overwrite the config file with defaults before starting
    #[arg(long)]
    reset_config: bool,
}

impl Args {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(lat) = self.lat {
            config.initial_lat = lat;
        }
        if let Some(lon) = self.lon {
            config.initial_lon = lon;
        }
        if let Some(zoom) = self.zoom {
            config.initial_zoom = zoom;
        }
    }
}

fn load_config(reset: bool) -> AppConfig {
    if reset {
        let config = AppConfig::default();
        match config.save() {
            Ok(()) => info!("Config reset to defaults"),
            Err(e) => warn!("Failed to reset config: {}", e),
        }
        return config;
    }
    AppConfig::load_or_default()
}

fn main() -> Result<(), eframe::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    info!("Starting MeteoField Desktop...");

    let mut config = load_config(args.reset_config);
    if let Ok(path) = AppConfig::get_config_path() {
        info!("Config file: {}", path.display());
    }
    args.apply(&mut config);

    let runtime = tokio::runtime::Runtime::new().map_err(|e| eframe::Error::AppCreation(Box::new(e)))?;
    let handle = runtime.handle().clone();

    let selection = args
        .select
        .then(|| GeoPoint::new(config.initial_lat, config.initial_lon));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_title("MeteoField Desktop"),
        ..Default::default()
    };

    eframe::run_native(
        "MeteoField Desktop",
        options,
        Box::new(move |cc| {
            info!("Creating application...");
            Ok(Box::new(MeteoFieldApp::new(&cc.egui_ctx, config, handle, selection)?))
        }),
    )
}
