//! Streaming annual and gapfill compositor

use coastlines_core::{Error, Result};
use tracing::{debug, warn};

use super::{reduce, Composite, SelectedObservation, WindowState, YearBatch, YearWindow};

/// Composites emitted for one year
#[derive(Debug, Clone)]
pub struct YearComposites {
    pub year: i32,
    pub annual: Composite,
    /// Three-year composite; absent when either neighbouring year was
    /// never supplied
    pub gapfill: Option<Composite>,
}

/// Consumes consecutive years of selected observations and emits composites
/// for the years in `[start_year, end_year]`, holding at most three years.
///
/// Feed `start_year − 1` through `end_year + 1` so every output year gets a
/// gapfill composite. A series that starts at an in-range year emits that
/// year's annual composite straight away, without gapfill.
#[derive(Debug)]
pub struct StreamingCompositor {
    shape: (usize, usize),
    start_year: i32,
    end_year: i32,
    window: YearWindow<SelectedObservation>,
    last_emitted: Option<i32>,
}

impl StreamingCompositor {
    pub fn new(shape: (usize, usize), start_year: i32, end_year: i32) -> Result<Self> {
        if start_year > end_year {
            return Err(Error::InvalidParameter {
                name: "start_year",
                value: start_year.to_string(),
                reason: format!("must not be after end_year {}", end_year),
            });
        }
        Ok(Self {
            shape,
            start_year,
            end_year,
            window: YearWindow::Empty,
            last_emitted: None,
        })
    }

    pub fn state(&self) -> WindowState {
        self.window.state()
    }

    fn in_range(&self, year: i32) -> bool {
        (self.start_year..=self.end_year).contains(&year)
    }

    /// Add the next year's observations (possibly none).
    ///
    /// Returns the composites of the window's middle year once three years
    /// are held, or of the first year pushed when it lies in range.
    pub fn push(&mut self, batch: YearBatch<SelectedObservation>) -> Result<Option<YearComposites>> {
        if let Some(expected) = self.window.expected_year() {
            if batch.year != expected {
                return Err(Error::Algorithm(format!(
                    "compositor expected year {}, got {}",
                    expected, batch.year
                )));
            }
        }
        debug!(year = batch.year, observations = batch.items.len(), "compositor advance");

        let window = std::mem::take(&mut self.window);
        self.window = window.advance(batch);

        match (self.window.state(), self.window.current().map(|b| b.year)) {
            (WindowState::HavePrevCurrNext, Some(year)) if self.in_range(year) => self.emit(year, true),
            // No earlier year will arrive to put it in the middle
            (WindowState::HaveCurrent, Some(year)) if self.in_range(year) => self.emit(year, false),
            _ => Ok(None),
        }
    }

    /// Emit annual composites for in-range years still held that never
    /// reached the middle of the window. These have no gapfill.
    pub fn finish(mut self) -> Result<Vec<YearComposites>> {
        let pending: Vec<i32> = self
            .window
            .batches()
            .iter()
            .map(|b| b.year)
            .filter(|&y| self.in_range(y) && self.last_emitted.map_or(true, |last| y > last))
            .collect();

        let mut out = Vec::new();
        for year in pending {
            if let Some(c) = self.emit(year, false)? {
                out.push(c);
            }
        }
        Ok(out)
    }

    fn emit(&mut self, year: i32, with_gapfill: bool) -> Result<Option<YearComposites>> {
        self.last_emitted = Some(year);
        let batches = self.window.batches();
        let Some(batch) = batches.iter().find(|b| b.year == year) else {
            return Ok(None);
        };
        if batch.is_empty() {
            warn!(year, "no observations within the tide band, skipping year");
            return Ok(None);
        }

        let annual_obs: Vec<&SelectedObservation> = batch.items.iter().collect();
        let annual = reduce(&annual_obs, self.shape)?;

        let gapfill = match (with_gapfill, self.window.gapfill()) {
            (true, Some(three)) => {
                let obs: Vec<&SelectedObservation> = three.iter().flat_map(|b| b.items.iter()).collect();
                Some(reduce(&obs, self.shape)?)
            }
            _ => None,
        };

        Ok(Some(YearComposites { year, annual, gapfill }))
    }
}
