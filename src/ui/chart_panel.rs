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

//! Forecast chart rendering with egui_plot.
//!
//! The plot id includes the chart instance id, so a replaced chart starts
//! from fresh pan/zoom state instead of inheriting the old one.

use chrono::{DateTime, Utc};
use egui_plot::{Legend, Line, Plot};
use forecast_client::{ChartInstance, ChartSlot};

/// Day and hour label for an x position, or empty between hours.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, reason = "checked non-negative integer")]
pub fn hour_label(axis: &[DateTime<Utc>], x: f64) -> String {
    if x < 0.0 || x.fract().abs() > 1e-6 {
        return String::new();
    }
    axis.get(x.round() as usize)
        .map(|t| t.format("%d %Hh").to_string())
        .unwrap_or_default()
}

#[derive(Debug, Default)]
pub struct ChartPanel;

impl ChartPanel {
    pub fn show(&mut self, ui: &mut egui::Ui, slot: &mut ChartSlot) {
        let Some(chart) = slot.active_mut() else {
            ui.centered_and_justified(|ui| {
                ui.label(
                    egui::RichText::new("Click on the map to load a forecast")
                        .color(egui::Color32::from_rgb(150, 150, 150)),
                );
            });
            return;
        };

        let reset = chart.take_zoom_reset();
        Self::plot(ui, chart, reset);
    }

    fn plot(ui: &mut egui::Ui, chart: &ChartInstance, reset: bool) {
        let axis = chart.axis().to_vec();

        // Pan and zoom along time only
        let mut plot = Plot::new(("forecast_chart", chart.id()))
            .legend(Legend::default())
            .allow_zoom([true, false])
            .allow_drag([true, false])
            .allow_scroll([true, false])
            .y_axis_label(chart.variable().as_str())
            .x_axis_formatter(move |mark, _range| hour_label(&axis, mark.value));
        if reset {
            plot = plot.reset();
        }

        plot.show(ui, |plot_ui| {
            for trace in chart.traces() {
                let color = super::color32(trace.color);
                // Null gaps split a trace into several lines. They share the
                // label, so the legend still shows one entry per model.
                for segment in trace.segments() {
                    plot_ui.line(Line::new(trace.label.as_str(), segment).color(color));
                }
            }
        });
    }
}
