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

//! Map plugins: click capture, field points and the selection marker.

use egui::{Color32, Stroke, Ui};
use forecast_client::{GeoPoint, PointLayer};
use walkers::{lon_lat, MapMemory, Plugin, Position, Projector};

/// Walkers positions are (x = longitude, y = latitude).
pub fn to_position(point: GeoPoint) -> Position {
    lon_lat(point.longitude, point.latitude)
}

pub fn to_geo_point(position: Position) -> GeoPoint {
    GeoPoint::new(position.y(), position.x())
}

fn screen_pos(projector: &Projector, point: GeoPoint) -> egui::Pos2 {
    let projected = projector.project(to_position(point));
    egui::pos2(projected.x, projected.y)
}

/// Records the coordinate of a click (not a drag) on the map.
#[derive(Debug)]
pub struct ClickCapture<'a> {
    pub clicked: &'a mut Option<GeoPoint>,
}

impl Plugin for ClickCapture<'_> {
    fn run(self: Box<Self>, _ui: &mut Ui, response: &egui::Response, projector: &Projector, _memory: &MapMemory) {
        let ClickCapture { clicked } = *self;
        if !response.clicked() {
            return;
        }
        if let Some(pointer) = response.interact_pointer_pos() {
            let position = projector.unproject(pointer - response.rect.center());
            *clicked = Some(to_geo_point(position));
        }
    }
}

/// Draws the field layer as ramp-colored circles.
#[derive(Debug)]
pub struct FieldPoints<'a> {
    pub layer: &'a PointLayer,
}

impl Plugin for FieldPoints<'_> {
    fn run(self: Box<Self>, ui: &mut Ui, _response: &egui::Response, projector: &Projector, _memory: &MapMemory) {
        let marker = self.layer.style().marker;
        let painter = ui.painter();
        for (sample, color) in self.layer.colored_samples() {
            let pos = screen_pos(projector, GeoPoint::new(sample.latitude, sample.longitude));
            painter.circle_filled(pos, marker.radius, super::color32_with_opacity(color, marker.opacity));
        }
    }
}

/// Crosshair ring at the selected point.
#[derive(Debug)]
pub struct SelectionMarker {
    pub point: GeoPoint,
    pub color: Color32,
}

impl Plugin for SelectionMarker {
    fn run(self: Box<Self>, ui: &mut Ui, _response: &egui::Response, projector: &Projector, _memory: &MapMemory) {
        let pos = screen_pos(projector, self.point);
        let painter = ui.painter();
        let stroke = Stroke::new(2.0, self.color);

        painter.circle_stroke(pos, 8.0, stroke);
        let arm = 12.0;
        painter.line_segment([pos + egui::vec2(-arm, 0.0), pos + egui::vec2(arm, 0.0)], stroke);
        painter.line_segment([pos + egui::vec2(0.0, -arm), pos + egui::vec2(0.0, arm)], stroke);
    }
}
