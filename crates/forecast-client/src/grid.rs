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

//! Square sampling grid around a selected point.

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::GeoPoint;

// Absorbs float error when the step divides the width exactly
const STEP_EPSILON: f64 = 1e-9;

/// Largest accepted number of samples along one grid axis. Each sample is
/// one request, so this also caps the field fan-out.
pub const MAX_POINTS_PER_AXIS: usize = 41;

#[allow(clippy::cast_precision_loss, reason = "small constant")]
const MAX_AXIS_POINTS: f64 = MAX_POINTS_PER_AXIS as f64;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum GridError {
    #[error("grid step must be positive and finite, got {0}")]
    InvalidStep(f64),

    #[error("grid half width must be finite and non-negative, got {0}")]
    InvalidHalfWidth(f64),

    #[error("grid needs {0} points per axis, at most {max} are allowed", max = MAX_POINTS_PER_AXIS)]
    TooDense(f64),
}

/// Extent and spacing of the field grid, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Distance from the center to the grid edge on each axis.
    pub half_width_deg: f64,
    /// Spacing between neighbouring samples.
    pub step_deg: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            half_width_deg: 2.0,
            step_deg: 0.5,
        }
    }
}

impl GridConfig {
    // Uncapped samples per axis, computed in floating point so huge extents
    // cannot overflow. `None` for a step that yields no grid.
    fn axis_points(&self) -> Option<f64> {
        let width = 2.0 * self.half_width_deg.max(0.0);
        if !width.is_finite() || !self.step_deg.is_finite() || self.step_deg <= 0.0 {
            return None;
        }
        Some((width / self.step_deg + STEP_EPSILON).floor() + 1.0)
    }

    /// Samples along one axis: every step from `-half_width` up to and
    /// including `+half_width`, capped at [`MAX_POINTS_PER_AXIS`].
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, reason = "value is in 1..=MAX_POINTS_PER_AXIS")]
    pub fn points_per_axis(&self) -> usize {
        self.axis_points().map_or(1, |n| n.min(MAX_AXIS_POINTS) as usize)
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        let n = self.points_per_axis();
        n.checked_mul(n).unwrap_or(usize::MAX)
    }

    /// Check that the grid is well formed and within [`MAX_POINTS_PER_AXIS`].
    pub fn validate(&self) -> Result<(), GridError> {
        if !self.half_width_deg.is_finite() || self.half_width_deg < 0.0 {
            return Err(GridError::InvalidHalfWidth(self.half_width_deg));
        }
        let n = self.axis_points().ok_or(GridError::InvalidStep(self.step_deg))?;
        if n > MAX_AXIS_POINTS {
            return Err(GridError::TooDense(n));
        }
        Ok(())
    }

    /// This grid if it validates, otherwise the default one.
    #[must_use]
    pub fn validated(self) -> Self {
        match self.validate() {
            Ok(()) => self,
            Err(e) => {
                warn!("Invalid field grid ({}), using the default", e);
                Self::default()
            }
        }
    }
}

/// Build the grid centered on `center`.
///
/// Latitude is the outer loop and longitude the inner, so the first point is
/// the south-west corner. Points are not clamped to valid coordinate ranges.
/// An oversized grid is cut off at [`MAX_POINTS_PER_AXIS`] from that corner;
/// use [`GridConfig::validated`] to avoid that.
#[must_use]
#[allow(clippy::cast_precision_loss, reason = "grid axes are tiny")]
pub fn build_grid(center: GeoPoint, config: &GridConfig) -> Vec<GeoPoint> {
    let n = config.points_per_axis();
    let offset = if n > 1 { config.half_width_deg } else { 0.0 };
    let start_lat = center.latitude - offset;
    let start_lon = center.longitude - offset;

    let mut points = Vec::with_capacity(config.point_count());
    for i in 0..n {
        let latitude = start_lat + i as f64 * config.step_deg;
        for j in 0..n {
            let longitude = start_lon + j as f64 * config.step_deg;
            points.push(GeoPoint::new(latitude, longitude));
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grid_is_9_by_9() {
        let config = GridConfig::default();
        assert_eq!(config.points_per_axis(), 9);

        let points = build_grid(GeoPoint::new(50.0, 12.0), &config);
        assert_eq!(points.len(), 81);
        assert_eq!(points.len(), config.point_count());
    }

    #[test]
    fn test_grid_layout() {
        let points = build_grid(GeoPoint::new(50.0, 12.0), &GridConfig::default());

        assert_eq!(points[0], GeoPoint::new(48.0, 10.0));
        assert_eq!(points[1], GeoPoint::new(48.0, 10.5));
        assert_eq!(points[9], GeoPoint::new(48.5, 10.0));
        assert_eq!(points[40], GeoPoint::new(50.0, 12.0));
        assert_eq!(points[80], GeoPoint::new(52.0, 14.0));
    }

    #[test]
    fn test_grid_is_deterministic() {
        let center = GeoPoint::new(-33.87, 151.21);
        let config = GridConfig::default();
        assert_eq!(build_grid(center, &config), build_grid(center, &config));
    }

    #[test]
    fn test_no_clamping_near_pole() {
        let points = build_grid(GeoPoint::new(89.0, 179.0), &GridConfig::default());
        assert_eq!(points.len(), 81);
        assert!(points.iter().any(|p| p.latitude > 90.0));
        assert!(points.iter().any(|p| p.longitude > 180.0));
    }

    #[test]
    fn test_uneven_step_stops_inside_the_edge() {
        let config = GridConfig {
            half_width_deg: 1.0,
            step_deg: 0.3,
        };
        // -1.0, -0.7, -0.4, -0.1, 0.2, 0.5, 0.8
        assert_eq!(config.points_per_axis(), 7);
    }

    #[test]
    fn test_degenerate_configs_yield_center_only() {
        let zero_width = GridConfig {
            half_width_deg: 0.0,
            step_deg: 0.5,
        };
        assert_eq!(zero_width.point_count(), 1);

        let bad_step = GridConfig {
            half_width_deg: 2.0,
            step_deg: 0.0,
        };
        assert_eq!(bad_step.point_count(), 1);

        for config in [zero_width, bad_step] {
            let points = build_grid(GeoPoint::new(10.0, 20.0), &config);
            assert_eq!(points, vec![GeoPoint::new(10.0, 20.0)]);
        }
    }

    #[test]
    fn test_default_grid_validates() {
        assert_eq!(GridConfig::default().validate(), Ok(()));

        let widest = GridConfig {
            half_width_deg: 2.5,
            step_deg: 0.125,
        };
        assert_eq!(widest.validate(), Ok(()));
        assert_eq!(widest.points_per_axis(), MAX_POINTS_PER_AXIS);
    }

    #[test]
    fn test_tiny_step_is_rejected() {
        let config = GridConfig {
            half_width_deg: 2.0,
            step_deg: 0.0001,
        };
        assert!(matches!(config.validate(), Err(GridError::TooDense(_))));
        assert_eq!(config.points_per_axis(), MAX_POINTS_PER_AXIS);
        assert_eq!(config.point_count(), MAX_POINTS_PER_AXIS * MAX_POINTS_PER_AXIS);
        assert_eq!(config.validated(), GridConfig::default());
        assert_eq!(build_grid(GeoPoint::new(0.0, 0.0), &config.validated()).len(), 81);
    }

    #[test]
    fn test_huge_width_does_not_overflow() {
        let config = GridConfig {
            half_width_deg: 1e20,
            step_deg: 0.5,
        };
        assert!(matches!(config.validate(), Err(GridError::TooDense(_))));
        assert_eq!(config.point_count(), MAX_POINTS_PER_AXIS * MAX_POINTS_PER_AXIS);
        assert_eq!(config.validated().point_count(), 81);
    }

    #[test]
    fn test_malformed_values_are_rejected() {
        let bad_step = GridConfig {
            half_width_deg: 2.0,
            step_deg: -0.5,
        };
        assert_eq!(bad_step.validate(), Err(GridError::InvalidStep(-0.5)));

        let bad_width = GridConfig {
            half_width_deg: f64::INFINITY,
            step_deg: 0.5,
        };
        assert_eq!(bad_width.validate(), Err(GridError::InvalidHalfWidth(f64::INFINITY)));
        assert_eq!(bad_width.validated(), GridConfig::default());
    }
}
