//! Tabulated tide model
//!
//! Heights are pre-modelled at fixed anchors and stored in
//! `{directory}/{model_id}.json`:
//!
//! ```json
//! { "times": ["2000-01-01T00:00:00Z", ...],
//!   "anchors": [ { "lon": 153.1, "lat": -27.5, "heights": [0.42, ...] } ] }
//! ```
//!
//! Predictions interpolate linearly in time and are NaN outside the series
//! or away from a tabulated anchor.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use coastlines_algorithms::tide::{TideAnchor, TideModel};
use coastlines_core::Error;
use ndarray::Array2;
use serde::Deserialize;
use tracing::debug;

use crate::error::{PipelineError, Result};

/// Anchors closer than this (degrees) are the same location
const LOCATION_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Deserialize)]
struct TabulatedAnchor {
    lon: f64,
    lat: f64,
    heights: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct TideTable {
    times: Vec<DateTime<Utc>>,
    anchors: Vec<TabulatedAnchor>,
}

/// [`TideModel`] over a table of anchor height series
#[derive(Debug, Clone)]
pub struct TabulatedTideModel {
    model_id: String,
    times: Vec<DateTime<Utc>>,
    anchors: Vec<TabulatedAnchor>,
}

impl TabulatedTideModel {
    /// Load `{directory}/{model_id}.json`
    ///
    /// # Errors
    /// [`PipelineError::TideFilesMissing`] when the directory or file is absent.
    pub fn open<P: AsRef<Path>>(directory: P, model_id: &str) -> Result<Self> {
        let directory = directory.as_ref();
        let path = directory.join(format!("{}.json", model_id));
        if !directory.is_dir() || !path.is_file() {
            return Err(PipelineError::TideFilesMissing(path));
        }
        let table: TideTable = serde_json::from_str(&fs::read_to_string(&path)?)?;

        if table.times.windows(2).any(|w| w[0] >= w[1]) {
            return Err(PipelineError::Config(format!("{}: tide times must be strictly ascending", path.display())));
        }
        if let Some(a) = table.anchors.iter().find(|a| a.heights.len() != table.times.len()) {
            return Err(PipelineError::Config(format!(
                "{}: anchor ({}, {}) has {} heights for {} times",
                path.display(),
                a.lon,
                a.lat,
                a.heights.len(),
                table.times.len()
            )));
        }
        debug!("Tide model {}: {} anchors, {} times", model_id, table.anchors.len(), table.times.len());

        Ok(Self {
            model_id: model_id.to_string(),
            times: table.times,
            anchors: table.anchors,
        })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Tabulated anchor locations
    pub fn anchors(&self) -> Vec<TideAnchor> {
        self.anchors.iter().map(|a| TideAnchor::new(a.lon, a.lat)).collect()
    }

    fn find(&self, lon: f64, lat: f64) -> Option<&TabulatedAnchor> {
        self.anchors
            .iter()
            .find(|a| (a.lon - lon).abs() < LOCATION_TOLERANCE && (a.lat - lat).abs() < LOCATION_TOLERANCE)
    }

    /// Height at `time`, linear between the bracketing samples
    fn height_at(&self, heights: &[f64], time: DateTime<Utc>) -> f64 {
        let i = self.times.partition_point(|t| *t < time);
        if i < self.times.len() && self.times[i] == time {
            return heights[i];
        }
        if i == 0 || i == self.times.len() {
            return f64::NAN;
        }
        let (t0, t1) = (self.times[i - 1], self.times[i]);
        let span = (t1 - t0).num_milliseconds() as f64;
        let w = (time - t0).num_milliseconds() as f64 / span;
        heights[i - 1] * (1.0 - w) + heights[i] * w
    }
}

impl TideModel for TabulatedTideModel {
    fn predict(&self, lons: &[f64], lats: &[f64], times: &[DateTime<Utc>]) -> coastlines_core::Result<Array2<f64>> {
        if lons.len() != lats.len() {
            return Err(Error::InvalidParameter {
                name: "lats",
                value: lats.len().to_string(),
                reason: format!("expected {} latitudes to match longitudes", lons.len()),
            });
        }
        let mut out = Array2::from_elem((lons.len(), times.len()), f64::NAN);
        for (i, (&lon, &lat)) in lons.iter().zip(lats).enumerate() {
            if let Some(anchor) = self.find(lon, lat) {
                for (j, &t) in times.iter().enumerate() {
                    out[(i, j)] = self.height_at(&anchor.heights, t);
                }
            }
        }
        Ok(out)
    }
}
