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

//! Forecast client library for point time series and nearby value fields.
//!
//! A selected coordinate drives two independent pipelines:
//!
//! - **Series pipeline**: one hourly series per chosen model at the point,
//!   rendered as overlaid chart traces.
//! - **Field pipeline**: one request per point of a square grid around the
//!   selection, reduced to a single hour and rendered as colored map points.
//!
//! The layers can be used on their own or through [`Client`], which runs the
//! pipelines on a tokio runtime and applies their results to a [`Session`].
//!
//! # Quick Start
//!
//! ```no_run
//! use forecast_client::{Client, ClientConfig, GeoPoint, ModelId, Parameters, Variable};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut client = Client::open_meteo(
//!         tokio::runtime::Handle::current(),
//!         ClientConfig::default(),
//!     )
//!     .expect("HTTP client");
//!
//!     let params = Parameters {
//!         variable: Variable::new("temperature_2m"),
//!         models: vec![ModelId::Gfs, ModelId::Ecmwf],
//!         map_model: ModelId::Gfs,
//!         hour: 0,
//!     };
//!     client.select_point(GeoPoint::new(50.0, 12.0), &params);
//!
//!     // One event per pipeline
//!     client.process_next().await;
//!     client.process_next().await;
//!
//!     if let Some(chart) = client.session().chart().active() {
//!         println!("{} traces", chart.traces().len());
//!     }
//! }
//! ```
//!
//! # Using Individual Layers
//!
//! ```
//! use forecast_client::grid::{build_grid, GridConfig};
//! use forecast_client::ramp::ColorRamp;
//! use forecast_client::GeoPoint;
//!
//! let points = build_grid(GeoPoint::new(50.0, 12.0), &GridConfig::default());
//! assert_eq!(points.len(), 81);
//!
//! let color = ColorRamp::default().color_at(12.5);
//! println!("12.5 maps to {color}");
//! ```

pub mod api;
pub mod grid;
pub mod pipeline;
pub mod ramp;
pub mod render;
pub mod session;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use log::{debug, info};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub use api::{
    FetchError, ForecastSource, GeoPoint, ModelId, ModelSeries, OpenMeteoSource, SourceConfig,
    Variable,
};
pub use grid::{GridConfig, GridError, MAX_POINTS_PER_AXIS};
pub use pipeline::{
    FailurePolicy, FailureReport, FieldOutcome, FieldRequest, Pipeline, SeriesOutcome,
    SeriesRequest,
};
pub use ramp::{ColorRamp, Rgb};
pub use render::{ChartInstance, ChartSlot, FieldSample, FieldStyle, LayerStyle, PointLayer, Trace};
pub use session::{Applied, Session};

/// Configuration for the full-stack client.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// HTTP source configuration.
    pub source: SourceConfig,
    /// Field grid extent and spacing.
    pub grid: GridConfig,
    /// Styling used when the field layer is first created.
    pub layer_style: LayerStyle,
    /// Whether partial failures are reported.
    pub failure_policy: FailurePolicy,
}

/// Control values read when a pipeline is invoked.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub variable: Variable,
    /// Models for the chart.
    pub models: Vec<ModelId>,
    /// Model for the map field.
    pub map_model: ModelId,
    /// Hour index for the map field.
    pub hour: usize,
}

/// Completed pipeline run, tagged with its generation.
#[derive(Debug)]
pub enum PipelineEvent {
    Series { generation: u64, outcome: SeriesOutcome },
    Field { generation: u64, outcome: FieldOutcome },
}

type Notifier = Arc<dyn Fn() + Send + Sync>;

/// Full-stack client that wires the selection, both pipelines and the
/// session together.
///
/// Pipeline runs execute on the given runtime; their results come back over
/// a channel and are applied on the caller's thread by [`Client::poll`] or
/// [`Client::process_next`]. Starting a pipeline cancels its previous run.
pub struct Client {
    source: Arc<dyn ForecastSource>,
    runtime: Handle,
    config: ClientConfig,
    session: Session,
    event_tx: mpsc::UnboundedSender<PipelineEvent>,
    event_rx: mpsc::UnboundedReceiver<PipelineEvent>,
    series_cancel: Option<CancellationToken>,
    field_cancel: Option<CancellationToken>,
    notifier: Option<Notifier>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl Client {
    #[must_use]
    pub fn new(source: Arc<dyn ForecastSource>, runtime: Handle, mut config: ClientConfig) -> Self {
        config.grid = config.grid.validated();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            source,
            runtime,
            config,
            session: Session::new(),
            event_tx,
            event_rx,
            series_cancel: None,
            field_cancel: None,
            notifier: None,
        }
    }

    /// Client backed by the Open-Meteo API described by `config.source`.
    pub fn open_meteo(runtime: Handle, config: ClientConfig) -> Result<Self, FetchError> {
        let source = OpenMeteoSource::new(config.source.clone())?;
        Ok(Self::new(Arc::new(source), runtime, config))
    }

    /// Callback run from the runtime whenever a result is ready, typically
    /// a repaint request.
    pub fn set_notifier(&mut self, notifier: impl Fn() + Send + Sync + 'static) {
        self.notifier = Some(Arc::new(notifier));
    }

    /// Map click: store the point and run both pipelines.
    pub fn select_point(&mut self, point: GeoPoint, params: &Parameters) {
        info!("Selected {}", point);
        self.session.select(point);
        self.invoke_series(point, params);
        self.invoke_field(point, params);
    }

    /// Control change: rerun both pipelines at the existing selection.
    /// Returns `false` when nothing has been selected yet.
    pub fn parameters_changed(&mut self, params: &Parameters) -> bool {
        let Some(point) = self.session.selected() else {
            return false;
        };
        self.invoke_series(point, params);
        self.invoke_field(point, params);
        true
    }

    fn invoke_series(&mut self, point: GeoPoint, params: &Parameters) {
        let generation = self.session.begin(Pipeline::Series);
        let token = self.replace_token(Pipeline::Series);

        if params.models.is_empty() {
            debug!("No models selected; series pipeline skipped");
            return;
        }

        let request = SeriesRequest {
            point,
            variable: params.variable.clone(),
            models: params.models.clone(),
        };
        let source = Arc::clone(&self.source);
        let event_tx = self.event_tx.clone();
        let notifier = self.notifier.clone();

        self.runtime.spawn(async move {
            tokio::select! {
                outcome = pipeline::run_series(source.as_ref(), request) => {
                    if event_tx.send(PipelineEvent::Series { generation, outcome }).is_ok() {
                        if let Some(notify) = notifier {
                            notify();
                        }
                    }
                }
                () = token.cancelled() => {
                    debug!("Series run {} cancelled", generation);
                }
            }
        });
    }

    fn invoke_field(&mut self, point: GeoPoint, params: &Parameters) {
        let generation = self.session.begin(Pipeline::Field);
        let token = self.replace_token(Pipeline::Field);

        let request = FieldRequest {
            center: point,
            variable: params.variable.clone(),
            model: params.map_model,
            hour: params.hour,
            grid: self.config.grid,
        };
        let source = Arc::clone(&self.source);
        let event_tx = self.event_tx.clone();
        let notifier = self.notifier.clone();

        self.runtime.spawn(async move {
            tokio::select! {
                outcome = pipeline::run_field(source.as_ref(), request) => {
                    if event_tx.send(PipelineEvent::Field { generation, outcome }).is_ok() {
                        if let Some(notify) = notifier {
                            notify();
                        }
                    }
                }
                () = token.cancelled() => {
                    debug!("Field run {} cancelled", generation);
                }
            }
        });
    }

    fn replace_token(&mut self, pipeline: Pipeline) -> CancellationToken {
        let slot = match pipeline {
            Pipeline::Series => &mut self.series_cancel,
            Pipeline::Field => &mut self.field_cancel,
        };
        if let Some(previous) = slot.take() {
            previous.cancel();
        }
        let token = CancellationToken::new();
        *slot = Some(token.clone());
        token
    }

    /// Apply every result that has arrived, without blocking.
    pub fn poll(&mut self) -> Vec<Applied> {
        let mut applied = Vec::new();
        while let Ok(event) = self.event_rx.try_recv() {
            applied.push(self.apply(event));
        }
        applied
    }

    /// Wait for the next result and apply it.
    pub async fn process_next(&mut self) -> Option<Applied> {
        let event = self.event_rx.recv().await?;
        Some(self.apply(event))
    }

    fn apply(&mut self, event: PipelineEvent) -> Applied {
        match event {
            PipelineEvent::Series { generation, outcome } => {
                self.session.apply_series(generation, &outcome)
            }
            PipelineEvent::Field { generation, outcome } => {
                self.session
                    .apply_field(generation, outcome, &self.config.layer_style)
            }
        }
    }

    /// Reset the chart's pan/zoom. No-op without a chart.
    pub fn reset_zoom(&mut self) -> bool {
        self.session.reset_zoom()
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Mutable chart access for the renderer, which consumes zoom resets.
    pub fn chart_mut(&mut self) -> &mut ChartSlot {
        self.session.chart_mut()
    }

    /// Failures of the latest applied run of each pipeline, series first.
    /// Empty under `SilentDrop` or when every request succeeded.
    #[must_use]
    pub fn failure_reports(&self) -> Vec<FailureReport> {
        match self.config.failure_policy {
            FailurePolicy::SilentDrop => Vec::new(),
            FailurePolicy::ReportPartial => [Pipeline::Series, Pipeline::Field]
                .into_iter()
                .filter_map(|pipeline| self.session.report(pipeline))
                .filter(|report| report.failed > 0)
                .collect(),
        }
    }

    /// Cancel any in-flight pipeline runs.
    pub fn shutdown(&mut self) {
        for token in [self.series_cancel.take(), self.field_cancel.take()].into_iter().flatten() {
            token.cancel();
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::testing::FakeSource;

    fn params(variable: &str, models: &[ModelId]) -> Parameters {
        Parameters {
            variable: Variable::new(variable),
            models: models.to_vec(),
            map_model: ModelId::Gfs,
            hour: 5,
        }
    }

    fn client(source: Arc<FakeSource>, policy: FailurePolicy) -> Client {
        Client::new(
            source,
            Handle::current(),
            ClientConfig {
                failure_policy: policy,
                ..ClientConfig::default()
            },
        )
    }

    /// Wait for `n` events, failing if they do not arrive.
    async fn drain(client: &mut Client, n: usize) -> Vec<Applied> {
        let mut applied = Vec::new();
        for _ in 0..n {
            let next = tokio::time::timeout(Duration::from_secs(5), client.process_next())
                .await
                .expect("pipeline result")
                .expect("channel open");
            applied.push(next);
        }
        applied
    }

    async fn assert_quiet(client: &mut Client, wait: Duration) {
        let next = tokio::time::timeout(wait, client.process_next()).await;
        assert!(next.is_err(), "unexpected pipeline result: {next:?}");
    }

    #[tokio::test]
    async fn test_click_renders_two_models() {
        let source = Arc::new(FakeSource::new(48));
        let mut client = client(Arc::clone(&source), FailurePolicy::SilentDrop);

        client.select_point(
            GeoPoint::new(50.0, 12.0),
            &params("temperature_2m", &[ModelId::Gfs, ModelId::Ecmwf]),
        );
        let applied = drain(&mut client, 2).await;
        assert!(applied.contains(&Applied::Rendered(Pipeline::Series)));
        assert!(applied.contains(&Applied::Rendered(Pipeline::Field)));

        let chart = client.session().chart().active().unwrap();
        assert_eq!(chart.variable().as_str(), "temperature_2m");
        assert_eq!(chart.axis().len(), 48);
        let traces = chart.traces();
        assert_eq!(traces.len(), 2);
        assert_eq!((traces[0].label.as_str(), traces[0].color), ("GFS", Rgb::new(0xff, 0x6b, 0x6b)));
        assert_eq!((traces[1].label.as_str(), traces[1].color), ("ECMWF", Rgb::new(0x4d, 0xab, 0xf7)));
        assert!(traces.iter().all(|t| t.values.len() == 48));

        // 2 series requests plus 81 grid requests
        assert_eq!(source.calls(), 83);
    }

    #[tokio::test]
    async fn test_no_models_leaves_chart_untouched() {
        let source = Arc::new(FakeSource::new(24));
        let mut client = client(Arc::clone(&source), FailurePolicy::SilentDrop);

        client.select_point(GeoPoint::new(50.0, 12.0), &params("temperature_2m", &[]));
        let applied = drain(&mut client, 1).await;
        assert_eq!(applied, vec![Applied::Rendered(Pipeline::Field)]);
        assert_quiet(&mut client, Duration::from_millis(100)).await;

        assert!(client.session().chart().active().is_none());
        assert_eq!(source.calls(), 81);
    }

    #[tokio::test]
    async fn test_failed_model_is_excluded() {
        let source = Arc::new(FakeSource::new(24).failing_model(ModelId::Ecmwf));
        let mut client = client(source, FailurePolicy::SilentDrop);

        client.select_point(
            GeoPoint::new(50.0, 12.0),
            &params("temperature_2m", &[ModelId::Gfs, ModelId::Ecmwf]),
        );
        drain(&mut client, 2).await;

        let chart = client.session().chart().active().unwrap();
        assert_eq!(chart.traces().len(), 1);
        assert_eq!(chart.traces()[0].model, ModelId::Gfs);
        assert!(client.failure_reports().is_empty());
    }

    #[tokio::test]
    async fn test_series_failure_survives_field_run() {
        let source = Arc::new(FakeSource::new(24).failing_model(ModelId::Ecmwf));
        let mut client = client(source, FailurePolicy::ReportPartial);

        client.select_point(
            GeoPoint::new(50.0, 12.0),
            &params("temperature_2m", &[ModelId::Gfs, ModelId::Ecmwf]),
        );
        let applied = drain(&mut client, 2).await;
        assert!(applied.contains(&Applied::Rendered(Pipeline::Series)));
        assert!(applied.contains(&Applied::Rendered(Pipeline::Field)));

        let reports = client.failure_reports();
        assert_eq!(reports.len(), 1);
        assert_eq!((reports[0].pipeline, reports[0].failed, reports[0].requested), (Pipeline::Series, 1, 2));
        assert_eq!(reports[0].to_string(), "series: 1 of 2 requests failed");
    }

    #[tokio::test]
    async fn test_all_models_failing_keeps_previous_chart() {
        let source = Arc::new(FakeSource::new(24).failing_model(ModelId::Ecmwf));
        let mut client = client(source, FailurePolicy::SilentDrop);
        let point = GeoPoint::new(50.0, 12.0);

        client.select_point(point, &params("temperature_2m", &[ModelId::Gfs]));
        drain(&mut client, 2).await;
        let id = client.session().chart().active().unwrap().id();

        assert!(client.parameters_changed(&params("temperature_2m", &[ModelId::Ecmwf])));
        let applied = drain(&mut client, 2).await;
        assert!(applied.contains(&Applied::Unchanged(Pipeline::Series)));
        assert_eq!(client.session().chart().active().unwrap().id(), id);
    }

    #[tokio::test]
    async fn test_field_with_one_failed_point() {
        let source = Arc::new(FakeSource::new(24).failing_point(GeoPoint::new(52.0, 14.0)));
        let mut client = client(source, FailurePolicy::ReportPartial);

        client.select_point(GeoPoint::new(50.0, 12.0), &params("temperature_2m", &[]));
        drain(&mut client, 1).await;

        let layer = client.session().field().layer().unwrap();
        assert_eq!(layer.len(), 80);
        assert!(layer.samples().iter().all(|s| s.value == s.latitude + 5.0));

        let reports = client.failure_reports();
        assert_eq!(reports.len(), 1);
        let report = reports[0];
        assert_eq!((report.pipeline, report.failed, report.requested), (Pipeline::Field, 1, 81));
    }

    #[tokio::test]
    async fn test_oversized_grid_falls_back_to_default() {
        let source = Arc::new(FakeSource::new(24));
        let config = ClientConfig {
            grid: GridConfig {
                half_width_deg: 2.0,
                step_deg: 0.0001,
            },
            ..ClientConfig::default()
        };
        let mut client = Client::new(Arc::<FakeSource>::clone(&source), Handle::current(), config);

        client.select_point(GeoPoint::new(50.0, 12.0), &params("temperature_2m", &[]));
        drain(&mut client, 1).await;

        assert_eq!(client.session().field().layer().unwrap().len(), 81);
        assert_eq!(source.calls(), 81);
    }

    #[tokio::test]
    async fn test_change_before_selection_does_nothing() {
        let source = Arc::new(FakeSource::new(24));
        let mut client = client(Arc::clone(&source), FailurePolicy::SilentDrop);

        assert!(!client.parameters_changed(&params("temperature_2m", &[ModelId::Gfs])));
        assert_quiet(&mut client, Duration::from_millis(50)).await;
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_newer_invocation_cancels_older() {
        let source = Arc::new(FakeSource::new(24).slow_variable("precipitation", Duration::from_millis(300)));
        let mut client = client(source, FailurePolicy::SilentDrop);

        client.select_point(GeoPoint::new(50.0, 12.0), &params("precipitation", &[ModelId::Gfs]));
        assert!(client.parameters_changed(&params("temperature_2m", &[ModelId::Gfs])));

        drain(&mut client, 2).await;
        assert_quiet(&mut client, Duration::from_millis(600)).await;

        let chart = client.session().chart().active().unwrap();
        assert_eq!(chart.variable().as_str(), "temperature_2m");
        assert_eq!(client.session().chart().destroyed_count(), 0);
    }

    #[tokio::test]
    async fn test_reselect_replaces_field() {
        let source = Arc::new(FakeSource::new(24));
        let mut client = client(source, FailurePolicy::SilentDrop);
        let p = params("temperature_2m", &[]);

        client.select_point(GeoPoint::new(10.0, 10.0), &p);
        drain(&mut client, 1).await;
        client.select_point(GeoPoint::new(-30.0, 100.0), &p);
        drain(&mut client, 1).await;

        let layer = client.session().field().layer().unwrap();
        assert_eq!(layer.len(), 81);
        assert!(layer.samples().iter().all(|s| s.latitude < 0.0));
    }

    #[tokio::test]
    async fn test_series_twice_keeps_one_chart() {
        let source = Arc::new(FakeSource::new(12));
        let mut client = client(source, FailurePolicy::SilentDrop);
        let p = params("temperature_2m", &[ModelId::Gfs]);

        client.select_point(GeoPoint::new(50.0, 12.0), &p);
        drain(&mut client, 2).await;
        client.parameters_changed(&p);
        drain(&mut client, 2).await;

        assert_eq!(client.session().chart().live_instances(), 1);
        assert_eq!(client.session().chart().destroyed_count(), 1);
    }

    #[tokio::test]
    async fn test_reset_zoom_without_chart() {
        let mut client = client(Arc::new(FakeSource::new(1)), FailurePolicy::SilentDrop);
        assert!(!client.reset_zoom());
    }
}
