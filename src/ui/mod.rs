//! UI components for MeteoField Desktop.
//!
//! This module contains the control panel, chart panel, map plugins and
//! overlay windows.

pub mod chart_panel;
pub mod controls;
pub mod field_plugin;
pub mod overlays;

pub use chart_panel::ChartPanel;
pub use controls::{ControlEvent, ControlPanel};
pub use field_plugin::{ClickCapture, FieldPoints, SelectionMarker};
pub use overlays::Overlays;

use forecast_client::Rgb;

/// Opaque egui color for a ramp or trace color
pub fn color32(rgb: Rgb) -> egui::Color32 {
    egui::Color32::from_rgb(rgb.r, rgb.g, rgb.b)
}

/// Ramp color with a fill opacity in 0.0 - 1.0
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, reason = "clamped to 0..=255")]
pub fn color32_with_opacity(rgb: Rgb, opacity: f32) -> egui::Color32 {
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    egui::Color32::from_rgba_unmultiplied(rgb.r, rgb.g, rgb.b, alpha)
}
