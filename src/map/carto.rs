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

use eframe::egui;
use serde::{Deserialize, Serialize};
use walkers::sources::{Attribution, TileSource};
use walkers::{HttpOptions, HttpTiles, TileId};

/// Carto basemap flavour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapStyle {
    /// Dark matter
    #[default]
    Dark,
    /// Positron
    Light,
}

impl MapStyle {
    /// Path segment of the style on the Carto CDN
    pub fn as_str(self) -> &'static str {
        match self {
            MapStyle::Dark => "dark_all",
            MapStyle::Light => "light_all",
        }
    }

    /// Color for overlay text and markers that reads on this basemap
    pub fn foreground(self) -> egui::Color32 {
        match self {
            MapStyle::Dark => egui::Color32::WHITE,
            MapStyle::Light => egui::Color32::from_rgb(30, 30, 30),
        }
    }
}

/// Tile source for Carto CDN basemap tiles
/// Uses subdomain load balancing across a-d.basemaps.cartocdn.com
#[derive(Debug, Clone, Copy, Default)]
pub struct CartoTileSource {
    style: MapStyle,
}

impl CartoTileSource {
    pub fn new(style: MapStyle) -> Self {
        Self { style }
    }
}

impl TileSource for CartoTileSource {
    fn tile_url(&self, tile_id: TileId) -> String {
        let subdomain = ['a', 'b', 'c', 'd'][((tile_id.x + tile_id.y) % 4) as usize];

        format!(
            "https://{}.basemaps.cartocdn.com/{}/{}/{}/{}.png",
            subdomain,
            self.style.as_str(),
            tile_id.zoom,
            tile_id.x,
            tile_id.y
        )
    }

    fn attribution(&self) -> Attribution {
        Attribution {
            text: "© OpenStreetMap contributors, © CARTO",
            url: "https://carto.com/attributions",
            logo_light: None,
            logo_dark: None,
        }
    }
}

/// Basemap tiles with an on-disk cache per style
pub fn basemap_tiles(style: MapStyle, ctx: &egui::Context) -> HttpTiles {
    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(|| std::path::PathBuf::from(".cache"))
        .join("meteofield-desktop")
        .join("tiles")
        .join(style.as_str());

    let http_options = HttpOptions {
        cache: Some(cache_dir),
        ..Default::default()
    };

    HttpTiles::with_options(CartoTileSource::new(style), http_options, ctx.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_url_uses_style_and_subdomain() {
        let dark = CartoTileSource::new(MapStyle::Dark);
        let light = CartoTileSource::new(MapStyle::Light);
        let tile = TileId { x: 17, y: 11, zoom: 5 };

        assert_eq!(dark.tile_url(tile), "https://a.basemaps.cartocdn.com/dark_all/5/17/11.png");
        assert_eq!(light.tile_url(tile), "https://a.basemaps.cartocdn.com/light_all/5/17/11.png");
    }
}
