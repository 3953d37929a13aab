//! Three-year sliding window over yearly observation batches

/// Observations of one calendar year
#[derive(Debug, Clone)]
pub struct YearBatch<T> {
    pub year: i32,
    pub items: Vec<T>,
}

impl<T> YearBatch<T> {
    pub fn new(year: i32, items: Vec<T>) -> Self {
        Self { year, items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Occupancy of a [`YearWindow`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WindowState {
    Empty,
    HaveCurrent,
    HavePrevCurrent,
    HavePrevCurrNext,
}

/// Holds at most three consecutive years.
///
/// Advancing always appends the next calendar year; once full, the oldest
/// year is dropped. An annual composite can be built from `current` in any
/// state past `Empty`; a gapfill composite needs all three years.
#[derive(Debug, Clone, Default)]
pub enum YearWindow<T> {
    #[default]
    Empty,
    HaveCurrent {
        current: YearBatch<T>,
    },
    HavePrevCurrent {
        prev: YearBatch<T>,
        current: YearBatch<T>,
    },
    HavePrevCurrNext {
        prev: YearBatch<T>,
        current: YearBatch<T>,
        next: YearBatch<T>,
    },
}

impl<T> YearWindow<T> {
    pub fn state(&self) -> WindowState {
        match self {
            YearWindow::Empty => WindowState::Empty,
            YearWindow::HaveCurrent { .. } => WindowState::HaveCurrent,
            YearWindow::HavePrevCurrent { .. } => WindowState::HavePrevCurrent,
            YearWindow::HavePrevCurrNext { .. } => WindowState::HavePrevCurrNext,
        }
    }

    /// Year that the next batch must carry
    pub fn expected_year(&self) -> Option<i32> {
        self.newest().map(|b| b.year + 1)
    }

    /// Append a batch. The caller guarantees `batch.year` follows the
    /// newest held year (see [`YearWindow::expected_year`]).
    pub fn advance(self, batch: YearBatch<T>) -> Self {
        match self {
            YearWindow::Empty => YearWindow::HaveCurrent { current: batch },
            YearWindow::HaveCurrent { current } => YearWindow::HavePrevCurrent {
                prev: current,
                current: batch,
            },
            YearWindow::HavePrevCurrent { prev, current } => YearWindow::HavePrevCurrNext {
                prev,
                current,
                next: batch,
            },
            YearWindow::HavePrevCurrNext { current, next, .. } => YearWindow::HavePrevCurrNext {
                prev: current,
                current: next,
                next: batch,
            },
        }
    }

    /// The year an annual composite would be emitted for
    pub fn current(&self) -> Option<&YearBatch<T>> {
        match self {
            YearWindow::Empty => None,
            YearWindow::HaveCurrent { current }
            | YearWindow::HavePrevCurrent { current, .. }
            | YearWindow::HavePrevCurrNext { current, .. } => Some(current),
        }
    }

    /// Previous, current and next years, only when all three are held
    pub fn gapfill(&self) -> Option<[&YearBatch<T>; 3]> {
        match self {
            YearWindow::HavePrevCurrNext { prev, current, next } => Some([prev, current, next]),
            _ => None,
        }
    }

    pub fn newest(&self) -> Option<&YearBatch<T>> {
        match self {
            YearWindow::Empty => None,
            YearWindow::HaveCurrent { current } | YearWindow::HavePrevCurrent { current, .. } => Some(current),
            YearWindow::HavePrevCurrNext { next, .. } => Some(next),
        }
    }

    /// Held batches, oldest first
    pub fn batches(&self) -> Vec<&YearBatch<T>> {
        match self {
            YearWindow::Empty => Vec::new(),
            YearWindow::HaveCurrent { current } => vec![current],
            YearWindow::HavePrevCurrent { prev, current } => vec![prev, current],
            YearWindow::HavePrevCurrNext { prev, current, next } => vec![prev, current, next],
        }
    }
}
