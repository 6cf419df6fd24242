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

use egui::{Color32, RichText};
use log::warn;

const OPEN_METEO_URL: &str = "https://open-meteo.com/";
const CARTO_URL: &str = "https://carto.com/attributions";

/// Welcome and About windows.
#[derive(Debug)]
pub struct Overlays {
    welcome_open: bool,
    show_welcome_next_time: bool,
    about_open: bool,
}

impl Overlays {
    pub fn new(show_welcome: bool) -> Self {
        Self {
            welcome_open: show_welcome,
            show_welcome_next_time: true,
            about_open: false,
        }
    }

    pub fn open_about(&mut self) {
        self.about_open = true;
    }

    pub fn is_welcome_open(&self) -> bool {
        self.welcome_open
    }

    /// Draw whichever overlays are open. Returns `Some(show_at_startup)`
    /// when the welcome window is dismissed.
    pub fn show(&mut self, ctx: &egui::Context) -> Option<bool> {
        let mut dismissed = None;

        if self.welcome_open {
            egui::Window::new("Welcome")
                .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                .collapsible(false)
                .resizable(false)
                .frame(overlay_frame(ctx))
                .show(ctx, |ui| {
                    ui.label(RichText::new("MeteoField").size(20.0).strong());
                    ui.add_space(6.0);
                    ui.label("Click anywhere on the map to chart the hourly forecast there.");
                    ui.label("Each chart line is one forecast model.");
                    ui.label("The colored dots show the chosen hour on a grid around your click.");
                    ui.add_space(8.0);
                    ui.checkbox(&mut self.show_welcome_next_time, "Show at startup");
                    ui.add_space(4.0);
                    if ui.button(RichText::new("Start").strong()).clicked() {
                        self.welcome_open = false;
                        dismissed = Some(self.show_welcome_next_time);
                    }
                });
        }

        if self.about_open {
            egui::Window::new("About")
                .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                .collapsible(false)
                .resizable(false)
                .frame(overlay_frame(ctx))
                .show(ctx, |ui| {
                    ui.label(RichText::new(format!("MeteoField Desktop {}", env!("CARGO_PKG_VERSION"))).strong());
                    ui.add_space(6.0);
                    ui.label("Compares forecast models at a point and maps one hour of a variable nearby.");
                    ui.add_space(6.0);
                    ui.horizontal(|ui| {
                        ui.label("Forecast data:");
                        link(ui, "Open-Meteo", OPEN_METEO_URL);
                    });
                    ui.horizontal(|ui| {
                        ui.label("Basemap:");
                        link(ui, "© OpenStreetMap contributors, © CARTO", CARTO_URL);
                    });
                    ui.add_space(8.0);
                    if ui.button("Close").clicked() {
                        self.about_open = false;
                    }
                });
        }

        dismissed
    }
}

fn overlay_frame(ctx: &egui::Context) -> egui::Frame {
    egui::Frame::window(&ctx.style())
        .fill(Color32::from_rgba_unmultiplied(25, 30, 35, 240))
        .stroke(egui::Stroke::new(1.0, Color32::from_rgb(60, 80, 100)))
        .corner_radius(6.0)
}

fn link(ui: &mut egui::Ui, text: &str, url: &str) {
    if ui.link(text).on_hover_text(url).clicked() {
        if let Err(e) = webbrowser::open(url) {
            warn!("Failed to open {}: {}", url, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let overlays = Overlays::new(true);
        assert!(overlays.is_welcome_open());
        assert!(!overlays.about_open);

        let overlays = Overlays::new(false);
        assert!(!overlays.is_welcome_open());
    }
}
