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

//! Session state shared by both pipelines.
//!
//! Owns the selected point, the render targets, and one generation counter
//! per pipeline. A pipeline result is applied only if its generation is
//! still the latest one issued for that pipeline.

use log::debug;

use crate::api::GeoPoint;
use crate::pipeline::{FailureReport, FieldOutcome, Pipeline, SeriesOutcome};
use crate::render::{ChartSlot, LayerStyle, PointSource};

/// Result of handing a pipeline outcome to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Render targets were updated.
    Rendered(Pipeline),
    /// Nothing to render; previous output left in place.
    Unchanged(Pipeline),
    /// A newer invocation exists; outcome discarded.
    Stale(Pipeline),
}

#[derive(Debug, Default)]
pub struct Session {
    selected: Option<GeoPoint>,
    chart: ChartSlot,
    field: PointSource,
    series_generation: u64,
    field_generation: u64,
    series_report: Option<FailureReport>,
    field_report: Option<FailureReport>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a map click, replacing any previous selection.
    pub fn select(&mut self, point: GeoPoint) {
        self.selected = Some(point);
    }

    #[must_use]
    pub fn selected(&self) -> Option<GeoPoint> {
        self.selected
    }

    /// Start a new invocation of `pipeline` and return its generation.
    /// Every earlier generation of that pipeline becomes stale.
    pub fn begin(&mut self, pipeline: Pipeline) -> u64 {
        let generation = match pipeline {
            Pipeline::Series => &mut self.series_generation,
            Pipeline::Field => &mut self.field_generation,
        };
        *generation += 1;
        *generation
    }

    #[must_use]
    pub fn is_current(&self, pipeline: Pipeline, generation: u64) -> bool {
        let latest = match pipeline {
            Pipeline::Series => self.series_generation,
            Pipeline::Field => self.field_generation,
        };
        generation == latest
    }

    /// Apply a series outcome: replace the chart when at least one series
    /// succeeded, otherwise keep the current chart.
    pub fn apply_series(&mut self, generation: u64, outcome: &SeriesOutcome) -> Applied {
        if !self.is_current(Pipeline::Series, generation) {
            debug!("Discarding stale series result (generation {})", generation);
            return Applied::Stale(Pipeline::Series);
        }

        self.series_report = Some(outcome.report());
        if self.chart.replace(&outcome.request.variable, &outcome.series) {
            Applied::Rendered(Pipeline::Series)
        } else {
            debug!("No series succeeded; chart left unchanged");
            Applied::Unchanged(Pipeline::Series)
        }
    }

    /// Apply a field outcome: the point dataset is always replaced, even by
    /// an empty one.
    pub fn apply_field(&mut self, generation: u64, outcome: FieldOutcome, style: &LayerStyle) -> Applied {
        if !self.is_current(Pipeline::Field, generation) {
            debug!("Discarding stale field result (generation {})", generation);
            return Applied::Stale(Pipeline::Field);
        }

        self.field_report = Some(outcome.report());
        self.field.set_data(outcome.samples, style);
        Applied::Rendered(Pipeline::Field)
    }

    pub fn reset_zoom(&mut self) -> bool {
        self.chart.reset_zoom()
    }

    #[must_use]
    pub fn chart(&self) -> &ChartSlot {
        &self.chart
    }

    pub fn chart_mut(&mut self) -> &mut ChartSlot {
        &mut self.chart
    }

    #[must_use]
    pub fn field(&self) -> &PointSource {
        &self.field
    }

    /// Failures of the latest applied run of `pipeline`.
    #[must_use]
    pub fn report(&self, pipeline: Pipeline) -> Option<FailureReport> {
        match pipeline {
            Pipeline::Series => self.series_report,
            Pipeline::Field => self.field_report,
        }
    }
}
