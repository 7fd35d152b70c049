//! Pipeline stages and weighted progress aggregation.
//!
//! Five heterogeneous phases (setup checks, five polled generation tasks,
//! one polled render job) are folded into a single normalized [0, 1]
//! figure. Weights: initialization 0.05, generation 0.75, stitching 0.20.

use serde::{Deserialize, Serialize};

/// Stage weight for the initialization checks.
pub const INIT_WEIGHT: f64 = 0.05;
/// Stage weight for clip generation.
pub const GENERATION_WEIGHT: f64 = 0.75;
/// Stage weight for stitching.
pub const STITCHING_WEIGHT: f64 = 0.20;

/// Pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Initializing,
    Generating,
    Stitching,
    Complete,
    Error,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Initializing => "initializing",
            Stage::Generating => "generating",
            Stage::Stitching => "stitching",
            Stage::Complete => "complete",
            Stage::Error => "error",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One progress snapshot emitted to observers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressState {
    pub stage: Stage,
    /// 1-based index of the clip currently generating, when applicable
    pub current_clip: Option<u32>,
    pub total_clips: u32,
    /// Normalized [0, 1], non-decreasing within a run
    pub overall_progress: f64,
    pub message: String,
}

/// Folds (stage, sub-progress) updates into one monotonic overall value.
///
/// The overall figure never regresses within a run: a computed value below
/// the current one is clamped up, and the `Error` stage freezes at the last
/// value. Only an explicit [`reset`](ProgressAggregator::reset) (at run
/// start) may move it back to zero.
#[derive(Debug, Clone, Default)]
pub struct ProgressAggregator {
    current: f64,
}

impl ProgressAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current overall progress in [0, 1].
    pub fn value(&self) -> f64 {
        self.current
    }

    /// Reset to zero at the start of a new run.
    pub fn reset(&mut self) {
        self.current = 0.0;
    }

    /// Apply one update and produce the snapshot to emit.
    ///
    /// `sub_progress` is clamped to [0, 1]. `current_clip` is 1-based and
    /// only meaningful for [`Stage::Generating`]; a missing index during
    /// generation holds the current value.
    pub fn update(
        &mut self,
        stage: Stage,
        current_clip: Option<u32>,
        total_clips: u32,
        sub_progress: f64,
        message: impl Into<String>,
    ) -> ProgressState {
        let sub = sub_progress.clamp(0.0, 1.0);

        let computed = match stage {
            Stage::Initializing => sub * INIT_WEIGHT,
            Stage::Generating => match current_clip {
                Some(clip) if total_clips > 0 => {
                    let total = f64::from(total_clips);
                    let completed = f64::from(clip.saturating_sub(1)) / total;
                    INIT_WEIGHT + (completed + sub / total) * GENERATION_WEIGHT
                }
                _ => self.current,
            },
            Stage::Stitching => INIT_WEIGHT + GENERATION_WEIGHT + sub * STITCHING_WEIGHT,
            Stage::Complete => 1.0,
            Stage::Error => self.current,
        };

        // Monotonic within a run
        self.current = computed.clamp(self.current, 1.0);

        ProgressState {
            stage,
            current_clip,
            total_clips,
            overall_progress: self.current,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_initializing_scales_by_init_weight() {
        let mut agg = ProgressAggregator::new();
        let state = agg.update(Stage::Initializing, None, 5, 0.5, "setup");
        assert!((state.overall_progress - 0.025).abs() < EPS);
    }

    #[test]
    fn test_generating_formula() {
        let mut agg = ProgressAggregator::new();
        // Clip 1 at sub 0: exactly the init share
        let state = agg.update(Stage::Generating, Some(1), 5, 0.0, "clip 1");
        assert!((state.overall_progress - 0.05).abs() < EPS);

        // Clip 3 halfway: 0.05 + (2/5 + 0.5/5) * 0.75 = 0.425
        let state = agg.update(Stage::Generating, Some(3), 5, 0.5, "clip 3");
        assert!((state.overall_progress - 0.425).abs() < EPS);

        // Clip 5 complete: 0.05 + 0.75 = 0.80
        let state = agg.update(Stage::Generating, Some(5), 5, 1.0, "clip 5");
        assert!((state.overall_progress - 0.80).abs() < EPS);
    }

    #[test]
    fn test_stitching_starts_at_eighty_percent() {
        let mut agg = ProgressAggregator::new();
        let state = agg.update(Stage::Stitching, None, 5, 0.0, "stitch");
        assert!((state.overall_progress - 0.80).abs() < EPS);

        let state = agg.update(Stage::Stitching, None, 5, 1.0, "stitch done");
        assert!((state.overall_progress - 1.0).abs() < EPS);
    }

    #[test]
    fn test_complete_is_one() {
        let mut agg = ProgressAggregator::new();
        let state = agg.update(Stage::Complete, None, 5, 0.0, "done");
        assert_eq!(state.overall_progress, 1.0);
    }

    #[test]
    fn test_error_freezes_last_value() {
        let mut agg = ProgressAggregator::new();
        agg.update(Stage::Generating, Some(2), 5, 0.5, "clip 2");
        let before = agg.value();
        let state = agg.update(Stage::Error, None, 5, 1.0, "boom");
        assert_eq!(state.overall_progress, before);
    }

    #[test]
    fn test_never_regresses_without_reset() {
        let mut agg = ProgressAggregator::new();
        agg.update(Stage::Generating, Some(4), 5, 0.9, "clip 4");
        let high = agg.value();

        // A late, lower update must not move the needle backwards
        let state = agg.update(Stage::Initializing, None, 5, 0.1, "stale");
        assert_eq!(state.overall_progress, high);

        agg.reset();
        assert_eq!(agg.value(), 0.0);
    }

    #[test]
    fn test_sub_progress_clamped() {
        let mut agg = ProgressAggregator::new();
        let state = agg.update(Stage::Initializing, None, 5, 7.0, "over");
        assert!((state.overall_progress - INIT_WEIGHT).abs() < EPS);
    }
}
