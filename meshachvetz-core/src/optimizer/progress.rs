//! Progress reporting during an optimization run.
//!
//! Every strategy drives the same [`ProgressTracker`], which emits through
//! the `log` crate rather than a callback — the CLI configures a logger
//! (`env_logger`) and this crate stays decoupled from any particular
//! frontend. Emission is gated by [`crate::config::LogLevel`] per the
//! table below:
//!
//! | level    | start | per-iteration  | improvement      | finish |
//! |----------|-------|----------------|------------------|--------|
//! | Minimal  |       |                |                  | ✓      |
//! | Normal   | ✓     | every 10%      | ✓                | ✓      |
//! | Detailed | ✓     | every 10%      | ✓ (with Δ)       | ✓      |
//! | Debug    | ✓     | every iteration| ✓ (with state)   | ✓      |

use crate::config::LogLevel;
use std::time::Instant;

/// One improvement event, handed to callers that want more than a log
/// line (e.g. a future UI). The CLI only consumes the log output today,
/// but keeping this struct separate from the logging call lets a future
/// caller observe progress without scraping log lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    pub iteration: u64,
    pub max_iterations: u64,
    pub best_score: f64,
    pub elapsed_seconds: f64,
    pub eta_seconds: Option<f64>,
    pub stagnation: u64,
}

pub struct ProgressTracker {
    log_level: LogLevel,
    max_iterations: u64,
    start: Instant,
    last_improvement_iteration: u64,
    last_improvement_best: Option<f64>,
    last_reported_decile: u64,
}

impl ProgressTracker {
    pub fn new(log_level: LogLevel, max_iterations: u64) -> Self {
        ProgressTracker {
            log_level,
            max_iterations,
            start: Instant::now(),
            last_improvement_iteration: 0,
            last_improvement_best: None,
            last_reported_decile: 0,
        }
    }

    /// Emits the run's opening line. Gated at `Normal` and above — a
    /// `Minimal` run stays silent until [`Self::finish`].
    pub fn start(&self, algorithm_name: &str) {
        if self.log_level < LogLevel::Normal {
            return;
        }
        log::info!(
            "{algorithm_name}: starting (max_iterations={}, log_level={:?})",
            self.max_iterations,
            self.log_level
        );
    }

    /// Call once per iteration regardless of whether it improved the best
    /// score. `Debug` logs every call; `Normal`/`Detailed` log only when
    /// the iteration crosses into a new 10% decile of `max_iterations`;
    /// `Minimal` never logs here.
    pub fn record_iteration(&mut self, iteration: u64, current_score: f64) {
        if self.log_level == LogLevel::Debug {
            let update = self.snapshot(iteration, current_score);
            log::debug!(
                "iteration {}/{}: score={:.2} elapsed={} stagnation={}",
                update.iteration,
                update.max_iterations,
                update.best_score,
                format_duration(update.elapsed_seconds),
                update.stagnation,
            );
            return;
        }

        if self.log_level < LogLevel::Normal || self.max_iterations == 0 {
            return;
        }

        let decile = (iteration.saturating_mul(10) / self.max_iterations).min(10);
        if decile <= self.last_reported_decile {
            return;
        }
        self.last_reported_decile = decile;

        let update = self.snapshot(iteration, current_score);
        match update.eta_seconds {
            Some(eta) => log::info!(
                "iteration {}/{}: score={:.2} elapsed={} eta={}",
                update.iteration,
                update.max_iterations,
                update.best_score,
                format_duration(update.elapsed_seconds),
                format_duration(eta),
            ),
            None => log::info!(
                "iteration {}/{}: score={:.2} elapsed={}",
                update.iteration,
                update.max_iterations,
                update.best_score,
                format_duration(update.elapsed_seconds),
            ),
        }
    }

    /// Call when an improving move was accepted at `iteration`. Gated at
    /// `Normal` and above; `Detailed` additionally logs the delta from the
    /// previous best, `Debug` additionally logs the full state snapshot.
    pub fn record_improvement(&mut self, iteration: u64, best_score: f64) {
        let previous_best = self.last_improvement_best;
        self.last_improvement_iteration = iteration;
        self.last_improvement_best = Some(best_score);

        if self.log_level < LogLevel::Normal {
            return;
        }
        let update = self.snapshot(iteration, best_score);
        let elapsed = format_duration(update.elapsed_seconds);

        match self.log_level {
            LogLevel::Normal => log::info!(
                "iteration {}/{}: improved to {:.2} (elapsed={elapsed})",
                update.iteration,
                update.max_iterations,
                update.best_score,
            ),
            LogLevel::Detailed => {
                let delta = previous_best.map(|prev| best_score - prev).unwrap_or(0.0);
                log::info!(
                    "iteration {}/{}: improved to {:.2} (Δ={:+.2}, elapsed={elapsed})",
                    update.iteration,
                    update.max_iterations,
                    update.best_score,
                    delta,
                );
            }
            LogLevel::Debug => {
                let delta = previous_best.map(|prev| best_score - prev).unwrap_or(0.0);
                log::debug!(
                    "iteration {}/{}: improved to {:.2} (Δ={:+.2}, elapsed={elapsed}, stagnation_reset_at={})",
                    update.iteration,
                    update.max_iterations,
                    update.best_score,
                    delta,
                    iteration,
                );
            }
            LogLevel::Minimal => {}
        }
    }

    /// Call when a search round sampled no improving move — the signal
    /// each strategy uses to stop. Only surfaced at `Debug`; stagnation is
    /// an expected end state, not something lower levels need to see.
    pub fn record_stagnation(&self, iteration: u64) {
        if self.log_level < LogLevel::Debug {
            return;
        }
        log::debug!(
            "iteration {}: no improving move found ({} iterations since last improvement)",
            iteration,
            iteration.saturating_sub(self.last_improvement_iteration)
        );
    }

    /// Emits the run's closing line. Unlike every other emission, this one
    /// fires at every log level, including `Minimal` — a caller always
    /// learns how a run ended.
    pub fn finish(&self, algorithm_name: &str, final_score: f64, stop_reason: &str) {
        let elapsed = format_duration(self.start.elapsed().as_secs_f64());
        log::info!(
            "{algorithm_name}: finished with score={final_score:.2} ({stop_reason}, elapsed={elapsed})"
        );
    }

    fn snapshot(&self, iteration: u64, best_score: f64) -> ProgressUpdate {
        let elapsed_seconds = self.start.elapsed().as_secs_f64();
        let eta_seconds = if iteration > 0 {
            let per_iteration = elapsed_seconds / iteration as f64;
            Some(per_iteration * (self.max_iterations.saturating_sub(iteration)) as f64)
        } else {
            None
        };
        ProgressUpdate {
            iteration,
            max_iterations: self.max_iterations,
            best_score,
            elapsed_seconds,
            eta_seconds,
            stagnation: iteration.saturating_sub(self.last_improvement_iteration),
        }
    }
}

/// `<60s` in seconds, `<60min` in minutes, else hours — per spec.md §4.9.
fn format_duration(seconds: f64) -> String {
    if seconds < 60.0 {
        format!("{seconds:.1}s")
    } else if seconds < 3600.0 {
        format!("{:.1}min", seconds / 60.0)
    } else {
        format!("{:.1}h", seconds / 3600.0)
    }
}
