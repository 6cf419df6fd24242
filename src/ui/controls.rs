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

//! Control panel: variable, chart models, map model, field hour.
//!
//! The panel owns the current [`Parameters`] and reports changes as
//! [`ControlEvent`]s. It never talks to the client directly.

use egui::RichText;
use forecast_client::{ModelId, Parameters, Variable};

use crate::map::MapStyle;

/// Something the user changed this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// Any forecast parameter changed; both pipelines should rerun.
    ParametersChanged,
    ResetZoom,
    MapStyleChanged(MapStyle),
}

#[derive(Debug)]
pub struct ControlPanel {
    params: Parameters,
    max_hour: usize,
    map_style: MapStyle,
    /// Hour moved but not yet committed (slider still held)
    hour_pending: bool,
}

impl ControlPanel {
    pub fn new(params: Parameters, max_hour: usize, map_style: MapStyle) -> Self {
        Self {
            params,
            max_hour,
            map_style,
            hour_pending: false,
        }
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    pub fn show(&mut self, ui: &mut egui::Ui) -> Vec<ControlEvent> {
        let mut events = Vec::new();

        ui.label(RichText::new("◈ FORECAST").color(egui::Color32::from_rgb(100, 180, 220)).strong());
        ui.add_space(4.0);

        let mut variable_changed = false;
        egui::ComboBox::from_label("Variable")
            .selected_text(self.params.variable.as_str())
            .show_ui(ui, |ui| {
                for choice in Variable::CHOICES {
                    variable_changed |= ui
                        .selectable_value(&mut self.params.variable, Variable::new(choice), choice)
                        .changed();
                }
            });
        if variable_changed {
            events.push(ControlEvent::ParametersChanged);
        }

        ui.add_space(6.0);
        ui.label("Chart models");
        for model in ModelId::ALL {
            let mut checked = self.params.models.contains(&model);
            let text = RichText::new(model.label()).color(super::color32(model.color()));
            if ui.checkbox(&mut checked, text).changed() {
                set_model(&mut self.params.models, model, checked);
                events.push(ControlEvent::ParametersChanged);
            }
        }

        ui.add_space(6.0);
        let mut map_model_changed = false;
        egui::ComboBox::from_label("Map model")
            .selected_text(self.params.map_model.label())
            .show_ui(ui, |ui| {
                for model in ModelId::ALL {
                    map_model_changed |= ui
                        .selectable_value(&mut self.params.map_model, model, model.label())
                        .changed();
                }
            });
        if map_model_changed {
            events.push(ControlEvent::ParametersChanged);
        }

        ui.add_space(6.0);
        let response = ui.add(
            egui::Slider::new(&mut self.params.hour, 0..=self.max_hour)
                .text("Hour")
                .integer(),
        );
        if self.settle_hour(response.changed(), response.dragged()) {
            events.push(ControlEvent::ParametersChanged);
        }

        ui.add_space(6.0);
        if ui.button("Reset zoom").on_hover_text("Restore the full chart range").clicked() {
            events.push(ControlEvent::ResetZoom);
        }

        ui.separator();
        let mut style = self.map_style;
        egui::ComboBox::from_label("Basemap")
            .selected_text(format!("{style:?}"))
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut style, MapStyle::Dark, "Dark");
                ui.selectable_value(&mut style, MapStyle::Light, "Light");
            });
        if style != self.map_style {
            self.map_style = style;
            events.push(ControlEvent::MapStyleChanged(style));
        }

        events
    }

    /// Commit hour changes only once the slider is released, so a drag
    /// fires a single rerun.
    fn settle_hour(&mut self, changed: bool, dragging: bool) -> bool {
        self.hour_pending |= changed;
        if self.hour_pending && !dragging {
            self.hour_pending = false;
            return true;
        }
        false
    }
}

/// Check or uncheck `model`, keeping the list in display order.
fn set_model(models: &mut Vec<ModelId>, model: ModelId, checked: bool) {
    models.retain(|m| *m != model);
    if checked {
        models.push(model);
        models.sort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel() -> ControlPanel {
        ControlPanel::new(
            Parameters {
                variable: Variable::default(),
                models: vec![ModelId::Gfs, ModelId::Ecmwf],
                map_model: ModelId::Gfs,
                hour: 0,
            },
            167,
            MapStyle::Dark,
        )
    }

    #[test]
    fn test_set_model_keeps_order() {
        let mut models = vec![ModelId::Ecmwf];
        set_model(&mut models, ModelId::Gfs, true);
        assert_eq!(models, vec![ModelId::Gfs, ModelId::Ecmwf]);

        set_model(&mut models, ModelId::Gfs, true);
        assert_eq!(models.len(), 2);

        set_model(&mut models, ModelId::Ecmwf, false);
        set_model(&mut models, ModelId::Gfs, false);
        assert!(models.is_empty());
    }

    #[test]
    fn test_drag_commits_once_on_release() {
        let mut panel = panel();
        assert!(!panel.settle_hour(true, true));
        assert!(!panel.settle_hour(true, true));
        assert!(!panel.settle_hour(false, true));
        assert!(panel.settle_hour(false, false));
        assert!(!panel.settle_hour(false, false));
    }

    #[test]
    fn test_click_commits_immediately() {
        let mut panel = panel();
        assert!(panel.settle_hour(true, false));
        assert!(!panel.settle_hour(false, false));
    }
}
