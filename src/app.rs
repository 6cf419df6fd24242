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

//! The eframe application: map, controls, chart and overlays.

use eframe::egui;
use forecast_client::{Client, FetchError, GeoPoint};
use log::{debug, info, warn};
use tokio::runtime::Handle;
use walkers::{HttpTiles, Map, MapMemory, Position};

use crate::config::AppConfig;
use crate::map::{basemap_tiles, MapStyle};
use crate::ui::field_plugin::to_position;
use crate::ui::{ChartPanel, ClickCapture, ControlEvent, ControlPanel, FieldPoints, Overlays, SelectionMarker};

pub struct MeteoFieldApp {
    config: AppConfig,
    client: Client,
    tiles: HttpTiles,
    map_memory: MapMemory,
    map_center: Position,
    controls: ControlPanel,
    chart_panel: ChartPanel,
    overlays: Overlays,
}

impl std::fmt::Debug for MeteoFieldApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeteoFieldApp")
            .field("client", &self.client)
            .field("controls", &self.controls)
            .finish_non_exhaustive()
    }
}

impl MeteoFieldApp {
    pub fn new(
        ctx: &egui::Context,
        config: AppConfig,
        runtime: Handle,
        initial_selection: Option<GeoPoint>,
    ) -> Result<Self, FetchError> {
        let mut client = Client::open_meteo(runtime, config.client_config())?;
        let repaint_ctx = ctx.clone();
        client.set_notifier(move || repaint_ctx.request_repaint());

        let mut map_memory = MapMemory::default();
        if map_memory.set_zoom(config.initial_zoom).is_err() {
            warn!("Initial zoom {} out of range, keeping default", config.initial_zoom);
        }

        let params = config.initial_parameters();
        let controls = ControlPanel::new(params, config.max_hour as usize, config.map_style);

        let mut app = Self {
            tiles: basemap_tiles(config.map_style, ctx),
            map_memory,
            map_center: to_position(GeoPoint::new(config.initial_lat, config.initial_lon)),
            controls,
            chart_panel: ChartPanel,
            overlays: Overlays::new(config.show_welcome && initial_selection.is_none()),
            client,
            config,
        };

        if let Some(point) = initial_selection {
            app.select(point);
        }

        info!("App initialized successfully");
        Ok(app)
    }

    fn select(&mut self, point: GeoPoint) {
        self.client.select_point(point, self.controls.parameters());
    }

    fn handle_control_events(&mut self, ctx: &egui::Context, events: Vec<ControlEvent>) {
        for event in events {
            match event {
                ControlEvent::ParametersChanged => {
                    if !self.client.parameters_changed(self.controls.parameters()) {
                        debug!("Parameters changed before any selection");
                    }
                }
                ControlEvent::ResetZoom => {
                    self.client.reset_zoom();
                }
                ControlEvent::MapStyleChanged(style) => self.set_map_style(ctx, style),
            }
        }
    }

    fn set_map_style(&mut self, ctx: &egui::Context, style: MapStyle) {
        info!("Switching basemap to {:?}", style);
        self.tiles = basemap_tiles(style, ctx);
        self.config.map_style = style;
        self.save_config();
    }

    fn save_config(&self) {
        if let Err(e) = self.config.save() {
            warn!("Failed to save config: {}", e);
        }
    }

    fn draw_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("MeteoField").size(16.0).strong());

                for report in self.client.failure_reports() {
                    ui.add_space(12.0);
                    ui.label(
                        egui::RichText::new(format!("⚠ {report}"))
                            .color(egui::Color32::from_rgb(255, 200, 100)),
                    );
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("About").clicked() {
                        self.overlays.open_about();
                    }
                });
            });
        });
    }

    fn draw_map(&mut self, ui: &mut egui::Ui) {
        let mut clicked = None;
        let foreground = self.config.map_style.foreground();
        let session = self.client.session();

        let mut map = Map::new(Some(&mut self.tiles), &mut self.map_memory, self.map_center)
            .with_plugin(ClickCapture { clicked: &mut clicked });
        if let Some(layer) = session.field().layer() {
            map = map.with_plugin(FieldPoints { layer });
        }
        if let Some(point) = session.selected() {
            map = map.with_plugin(SelectionMarker { point, color: foreground });
        }
        ui.add(map);

        // Navigation control
        let rect = ui.max_rect();
        egui::Area::new(egui::Id::new("zoom_controls"))
            .fixed_pos(rect.right_top() + egui::vec2(-44.0, 10.0))
            .show(ui.ctx(), |ui| {
                ui.vertical(|ui| {
                    if ui.button(egui::RichText::new("➕").size(14.0)).clicked() && self.map_memory.zoom_in().is_err() {
                        debug!("Already at maximum zoom");
                    }
                    if ui.button(egui::RichText::new("➖").size(14.0)).clicked() && self.map_memory.zoom_out().is_err() {
                        debug!("Already at minimum zoom");
                    }
                });
            });

        // The welcome window is modal
        if let Some(point) = clicked.filter(|_| !self.overlays.is_welcome_open()) {
            self.select(point);
        }
    }
}

impl eframe::App for MeteoFieldApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        for applied in self.client.poll() {
            debug!("Pipeline result: {:?}", applied);
        }

        self.draw_top_bar(ctx);

        let events = egui::SidePanel::left("controls")
            .resizable(false)
            .default_width(220.0)
            .show(ctx, |ui| self.controls.show(ui))
            .inner;
        self.handle_control_events(ctx, events);

        egui::TopBottomPanel::bottom("chart")
            .resizable(true)
            .default_height(260.0)
            .show(ctx, |ui| {
                self.chart_panel.show(ui, self.client.chart_mut());
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.draw_map(ui);
            });

        if let Some(show_at_startup) = self.overlays.show(ctx) {
            if show_at_startup != self.config.show_welcome {
                self.config.show_welcome = show_at_startup;
                self.save_config();
            }
        }
    }
}
