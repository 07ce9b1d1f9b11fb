use std::fmt::{self, Display};

///
/// One scored input record in base-pair coordinates, `[start, stop)`.
///
/// A window with `start == stop` is a point feature (a single position).
/// Construction does not validate `stop >= start`; callers that feed windows
/// into the binning engine check [`ScoredWindow::is_valid`] first.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredWindow {
    pub start: u32,
    pub stop: u32,
    pub score: f64,
}

impl ScoredWindow {
    pub const fn new(start: u32, stop: u32, score: f64) -> Self {
        ScoredWindow { start, stop, score }
    }

    /// A point feature at `position`.
    pub const fn point(position: u32, score: f64) -> Self {
        ScoredWindow {
            start: position,
            stop: position,
            score,
        }
    }

    pub fn width(&self) -> u32 {
        self.stop.saturating_sub(self.start)
    }

    pub fn is_valid(&self) -> bool {
        self.stop >= self.start
    }
}

impl Display for ScoredWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.start, self.stop, self.score)
    }
}
