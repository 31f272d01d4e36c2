/// Default points awarded for an instant correct answer.
pub const DEFAULT_BASE_POINTS: u64 = 1000;

/// Maps correctness and answer speed to points.
///
/// A correct answer is worth `base_points` when instant and decays linearly to
/// half of that at the deadline; anything else is worth nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scorer {
    base_points: u64,
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_POINTS)
    }
}

impl Scorer {
    /// Build a scorer awarding at most `base_points` per question.
    pub fn new(base_points: u64) -> Self {
        Self { base_points }
    }

    /// Points for one answer.
    pub fn score(&self, is_correct: bool, elapsed_ms: u64, limit_ms: u64) -> u64 {
        if !is_correct {
            return 0;
        }
        if limit_ms == 0 {
            return self.base_points;
        }

        let elapsed = elapsed_ms.min(limit_ms) as f64;
        let fraction = elapsed / limit_ms as f64;
        let points = (self.base_points as f64 * (1.0 - 0.5 * fraction)).round() as u64;
        let floor = self.base_points.div_ceil(2);

        points.max(floor)
    }
}
