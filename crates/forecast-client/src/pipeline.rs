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

//! Fan-out/fan-in fetch pipelines.
//!
//! Both pipelines issue every request at once, wait for all of them to
//! settle, and keep whichever succeeded. Failures are collected rather than
//! propagated; what to do with them is decided by the [`FailurePolicy`].

use std::fmt;

use futures::future::join_all;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::api::{FetchError, ForecastSource, GeoPoint, ModelId, ModelSeries, Variable};
use crate::grid::{build_grid, GridConfig};
use crate::render::FieldSample;

/// Which of the two pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pipeline {
    Series,
    Field,
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Series => f.write_str("series"),
            Self::Field => f.write_str("field"),
        }
    }
}

/// What to do with failed requests once a pipeline finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Drop failures without telling the user.
    #[default]
    SilentDrop,
    /// Keep a [`FailureReport`] for display alongside partial data.
    ReportPartial,
}

/// Summary of the failures of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureReport {
    pub pipeline: Pipeline,
    pub failed: usize,
    pub requested: usize,
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} of {} requests failed",
            self.pipeline, self.failed, self.requested
        )
    }
}

/// The subject of a failed request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FailureTarget {
    Model(ModelId),
    Point(GeoPoint),
}

impl fmt::Display for FailureTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model(model) => write!(f, "model {model}"),
            Self::Point(point) => write!(f, "point {point}"),
        }
    }
}

#[derive(Debug)]
pub struct RequestFailure {
    pub target: FailureTarget,
    pub error: FetchError,
}

/// Parameters of one series run, captured at invocation time.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRequest {
    pub point: GeoPoint,
    pub variable: Variable,
    pub models: Vec<ModelId>,
}

/// Parameters of one field run, captured at invocation time.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRequest {
    pub center: GeoPoint,
    pub variable: Variable,
    pub model: ModelId,
    pub hour: usize,
    pub grid: GridConfig,
}

#[derive(Debug)]
pub struct SeriesOutcome {
    pub request: SeriesRequest,
    /// Successful series, in the order the models were requested.
    pub series: Vec<ModelSeries>,
    pub failures: Vec<RequestFailure>,
}

impl SeriesOutcome {
    #[must_use]
    pub fn report(&self) -> FailureReport {
        FailureReport {
            pipeline: Pipeline::Series,
            failed: self.failures.len(),
            requested: self.request.models.len(),
        }
    }
}

#[derive(Debug)]
pub struct FieldOutcome {
    pub request: FieldRequest,
    pub samples: Vec<FieldSample>,
    pub failures: Vec<RequestFailure>,
    /// Number of grid points requested.
    pub requested: usize,
}

impl FieldOutcome {
    #[must_use]
    pub fn report(&self) -> FailureReport {
        FailureReport {
            pipeline: Pipeline::Field,
            failed: self.failures.len(),
            requested: self.requested,
        }
    }
}

/// Fetch one series per model at the selected point.
pub async fn run_series(source: &dyn ForecastSource, request: SeriesRequest) -> SeriesOutcome {
    info!(
        "Fetching {} for {} model(s) at {}",
        request.variable,
        request.models.len(),
        request.point
    );

    let results = join_all(request.models.iter().map(|&model| {
        let (point, variable) = (request.point, &request.variable);
        async move { (model, source.fetch_hourly(point, model, variable).await) }
    }))
    .await;

    let mut series = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for (model, result) in results {
        match result {
            Ok(s) => series.push(s),
            Err(error) => {
                warn!("Series request for {} failed: {}", model, error);
                failures.push(RequestFailure {
                    target: FailureTarget::Model(model),
                    error,
                });
            }
        }
    }

    SeriesOutcome {
        request,
        series,
        failures,
    }
}

/// Sample one hour of the variable on the grid around the selected point.
pub async fn run_field(source: &dyn ForecastSource, request: FieldRequest) -> FieldOutcome {
    let points = build_grid(request.center, &request.grid);
    info!(
        "Fetching {} field from {} at hour {} over {} points around {}",
        request.variable,
        request.model,
        request.hour,
        points.len(),
        request.center
    );

    let results = join_all(points.iter().map(|&point| {
        let variable = &request.variable;
        let (model, hour) = (request.model, request.hour);
        async move {
            let value = source
                .fetch_hourly(point, model, variable)
                .await
                .and_then(|series| series.value_at(hour));
            (point, value)
        }
    }))
    .await;

    let mut samples = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for (point, result) in results {
        match result {
            Ok(value) => samples.push(FieldSample {
                longitude: point.longitude,
                latitude: point.latitude,
                value,
            }),
            Err(error) => {
                warn!("Field request at {} failed: {}", point, error);
                failures.push(RequestFailure {
                    target: FailureTarget::Point(point),
                    error,
                });
            }
        }
    }

    if !failures.is_empty() {
        info!("Field: {} of {} points failed", failures.len(), points.len());
    }

    FieldOutcome {
        request,
        samples,
        failures,
        requested: points.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSource;

    fn series_request(models: Vec<ModelId>) -> SeriesRequest {
        SeriesRequest {
            point: GeoPoint::new(50.0, 12.0),
            variable: Variable::new("temperature_2m"),
            models,
        }
    }

    fn field_request(hour: usize) -> FieldRequest {
        FieldRequest {
            center: GeoPoint::new(50.0, 12.0),
            variable: Variable::new("temperature_2m"),
            model: ModelId::Gfs,
            hour,
            grid: GridConfig::default(),
        }
    }

    #[tokio::test]
    async fn test_series_all_models_succeed() {
        let source = FakeSource::new(48);
        let outcome = run_series(&source, series_request(vec![ModelId::Gfs, ModelId::Ecmwf])).await;

        assert_eq!(outcome.series.len(), 2);
        assert_eq!(outcome.series[0].model, ModelId::Gfs);
        assert_eq!(outcome.series[1].model, ModelId::Ecmwf);
        assert!(outcome.series.iter().all(|s| s.len() == 48));
        assert!(outcome.failures.is_empty());
    }

    #[tokio::test]
    async fn test_series_failed_model_is_dropped() {
        let source = FakeSource::new(24).failing_model(ModelId::Gfs);
        let outcome = run_series(&source, series_request(vec![ModelId::Gfs, ModelId::Ecmwf])).await;

        assert_eq!(outcome.series.len(), 1);
        assert_eq!(outcome.series[0].model, ModelId::Ecmwf);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].target, FailureTarget::Model(ModelId::Gfs));
        assert!(matches!(outcome.failures[0].error, FetchError::Status(500)));
        assert_eq!(
            outcome.report(),
            FailureReport {
                pipeline: Pipeline::Series,
                failed: 1,
                requested: 2
            }
        );
    }

    #[tokio::test]
    async fn test_series_without_models_makes_no_requests() {
        let source = FakeSource::new(24);
        let outcome = run_series(&source, series_request(Vec::new())).await;

        assert!(outcome.series.is_empty());
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_field_extracts_requested_hour() {
        let source = FakeSource::new(24);
        let outcome = run_field(&source, field_request(5)).await;

        assert_eq!(outcome.requested, 81);
        assert_eq!(outcome.samples.len(), 81);
        assert_eq!(source.calls(), 81);
        // Values are latitude + hour
        let sw = outcome.samples[0];
        assert_eq!((sw.latitude, sw.longitude), (48.0, 10.0));
        assert_eq!(sw.value, 53.0);
    }

    #[tokio::test]
    async fn test_field_drops_failed_point() {
        let source = FakeSource::new(24).failing_point(GeoPoint::new(49.0, 11.5));
        let outcome = run_field(&source, field_request(5)).await;

        assert_eq!(outcome.samples.len(), 80);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.report().to_string(), "field: 1 of 81 requests failed");
    }

    #[tokio::test]
    async fn test_field_hour_past_end_drops_every_point() {
        let source = FakeSource::new(4);
        let outcome = run_field(&source, field_request(10)).await;

        assert!(outcome.samples.is_empty());
        assert_eq!(outcome.failures.len(), 81);
        assert!(matches!(
            outcome.failures[0].error,
            FetchError::HourOutOfRange { hour: 10, len: 4 }
        ));
    }
}
