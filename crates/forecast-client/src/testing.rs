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

//! In-memory forecast source shared by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::api::{FetchError, ForecastSource, GeoPoint, ModelId, ModelSeries, Variable};

/// Hourly series starting 2025-01-01T00:00Z with values `base + hour`.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap, reason = "test data")]
pub(crate) fn series(model: ModelId, len: usize, base: f64) -> ModelSeries {
    let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    ModelSeries {
        model,
        times: (0..len)
            .map(|h| start + chrono::Duration::hours(h as i64))
            .collect(),
        values: (0..len).map(|h| Some(base + h as f64)).collect(),
    }
}

/// Answers every request from memory. Values are `latitude + hour`.
#[derive(Debug, Default)]
pub(crate) struct FakeSource {
    hours: usize,
    failing_models: HashSet<ModelId>,
    failing_points: Vec<GeoPoint>,
    delays: HashMap<String, Duration>,
    calls: AtomicUsize,
}

impl FakeSource {
    pub(crate) fn new(hours: usize) -> Self {
        Self {
            hours,
            ..Self::default()
        }
    }

    pub(crate) fn failing_model(mut self, model: ModelId) -> Self {
        self.failing_models.insert(model);
        self
    }

    pub(crate) fn failing_point(mut self, point: GeoPoint) -> Self {
        self.failing_points.push(point);
        self
    }

    /// Delay every response for `variable`.
    pub(crate) fn slow_variable(mut self, variable: &str, delay: Duration) -> Self {
        self.delays.insert(variable.to_string(), delay);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ForecastSource for FakeSource {
    async fn fetch_hourly(
        &self,
        point: GeoPoint,
        model: ModelId,
        variable: &Variable,
    ) -> Result<ModelSeries, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(variable.as_str()) {
            tokio::time::sleep(*delay).await;
        }

        if self.failing_models.contains(&model) || self.failing_points.contains(&point) {
            return Err(FetchError::Status(500));
        }

        Ok(series(model, self.hours, point.latitude))
    }
}
