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

//! Render targets: the time-series chart and the map point layer.
//!
//! These hold exactly what the UI draws. The GUI reads them every frame;
//! only the session mutates them, and only through the replace operations
//! below.

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::api::{ModelId, ModelSeries, Variable};
use crate::ramp::{ColorRamp, Rgb};

/// One line trace of the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub model: ModelId,
    pub label: String,
    pub color: Rgb,
    /// Indexed by position on the hour axis.
    pub values: Vec<Option<f64>>,
}

impl Trace {
    /// Contiguous runs of `(index, value)`, split at gaps.
    #[must_use]
    #[allow(clippy::cast_precision_loss, reason = "hour indices are small")]
    pub fn segments(&self) -> Vec<Vec<[f64; 2]>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();
        for (i, value) in self.values.iter().enumerate() {
            match value {
                Some(v) => current.push([i as f64, *v]),
                None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
                None => {}
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }
}

/// A live chart. Each series render builds a new one.
#[derive(Debug, Clone)]
pub struct ChartInstance {
    id: u64,
    variable: Variable,
    axis: Vec<DateTime<Utc>>,
    traces: Vec<Trace>,
    zoom_reset_pending: bool,
}

impl ChartInstance {
    /// Unique per instance; used as the plot id so no view state carries
    /// over from the previous chart.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    /// Hour axis, taken from the first series.
    #[must_use]
    pub fn axis(&self) -> &[DateTime<Utc>] {
        &self.axis
    }

    #[must_use]
    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    /// Returns and clears a pending zoom reset.
    pub fn take_zoom_reset(&mut self) -> bool {
        std::mem::take(&mut self.zoom_reset_pending)
    }
}

/// Holds at most one [`ChartInstance`].
#[derive(Debug, Default)]
pub struct ChartSlot {
    active: Option<ChartInstance>,
    next_id: u64,
    destroyed: u64,
}

impl ChartSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Destroy the current chart and build a new one from `series`.
    ///
    /// Returns `false` and leaves the current chart untouched when `series`
    /// is empty.
    pub fn replace(&mut self, variable: &Variable, series: &[ModelSeries]) -> bool {
        let Some(first) = series.first() else {
            return false;
        };

        if let Some(old) = self.active.take() {
            debug!("Destroying chart #{}", old.id);
            self.destroyed += 1;
        }

        self.next_id += 1;
        let traces = series
            .iter()
            .map(|s| Trace {
                model: s.model,
                label: s.model.label().to_string(),
                color: s.model.color(),
                values: s.values.clone(),
            })
            .collect();

        self.active = Some(ChartInstance {
            id: self.next_id,
            variable: variable.clone(),
            axis: first.times.clone(),
            traces,
            zoom_reset_pending: false,
        });
        debug!("Created chart #{} with {} traces", self.next_id, series.len());
        true
    }

    /// Request a pan/zoom reset on the active chart. No-op without one.
    pub fn reset_zoom(&mut self) -> bool {
        match self.active.as_mut() {
            Some(chart) => {
                chart.zoom_reset_pending = true;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn active(&self) -> Option<&ChartInstance> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut ChartInstance> {
        self.active.as_mut()
    }

    /// Number of live chart instances, either 0 or 1.
    #[must_use]
    pub fn live_instances(&self) -> usize {
        usize::from(self.active.is_some())
    }

    /// Total charts destroyed so far.
    #[must_use]
    pub fn destroyed_count(&self) -> u64 {
        self.destroyed
    }
}

/// A sampled value at one grid point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldSample {
    pub longitude: f64,
    pub latitude: f64,
    pub value: f64,
}

/// Marker geometry for field points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldStyle {
    /// Circle radius in screen points.
    pub radius: f32,
    /// Fill opacity, 0.0 - 1.0.
    pub opacity: f32,
}

impl Default for FieldStyle {
    fn default() -> Self {
        Self {
            radius: 6.0,
            opacity: 0.7,
        }
    }
}

/// Full styling of the point layer, fixed at creation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayerStyle {
    pub ramp: ColorRamp,
    pub marker: FieldStyle,
}

/// The map's field layer.
#[derive(Debug, Clone)]
pub struct PointLayer {
    style: LayerStyle,
    samples: Vec<FieldSample>,
}

impl PointLayer {
    #[must_use]
    pub fn style(&self) -> &LayerStyle {
        &self.style
    }

    #[must_use]
    pub fn samples(&self) -> &[FieldSample] {
        &self.samples
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples paired with their ramp color.
    pub fn colored_samples(&self) -> impl Iterator<Item = (&FieldSample, Rgb)> + '_ {
        self.samples
            .iter()
            .map(|s| (s, self.style.ramp.color_at(s.value)))
    }
}

/// Point source backing the field layer.
///
/// The layer and its style are created on the first `set_data`; later calls
/// replace the data only.
#[derive(Debug, Default)]
pub struct PointSource {
    layer: Option<PointLayer>,
}

impl PointSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole dataset, creating the layer with `style` if it
    /// does not exist yet.
    pub fn set_data(&mut self, samples: Vec<FieldSample>, style: &LayerStyle) {
        match self.layer.as_mut() {
            Some(layer) => layer.samples = samples,
            None => {
                debug!("Creating field layer");
                self.layer = Some(PointLayer {
                    style: style.clone(),
                    samples,
                });
            }
        }
    }

    #[must_use]
    pub fn layer(&self) -> Option<&PointLayer> {
        self.layer.as_ref()
    }
}
