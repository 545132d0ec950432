//! Optimization: searching the space of class assignments for one that
//! scores well under `crate::scorer`.
//!
//! Three interchangeable strategies share this module's `Assignment`
//! representation and constraint checker: [`local_search`], [`genetic`],
//! and [`cp`]. All three respect the same two hard constraints —
//! `force_class` pinning and `force_friend` atomic grouping — and none of
//! them ever produce an assignment that violates either; see
//! [`ConstraintChecker`].

mod assignment;
pub mod cp;
pub mod genetic;
pub mod local_search;
pub mod moves;
pub mod progress;

pub use assignment::{Assignment, ConstraintChecker, Violation, ViolationKind};
pub use progress::{ProgressTracker, ProgressUpdate};

use crate::config::{Algorithm, Config};
use crate::domain::SchoolData;
use crate::error::Result;
use crate::scorer::ScoringResult;

/// The result of an optimization run: the best assignment found, its full
/// score breakdown, and bookkeeping about the search itself.
///
/// `local_search` and `genetic` only ever produce assignments
/// [`ConstraintChecker`] accepts by construction, so `violations` is always
/// empty and `constraints_satisfied` always true for those two. `cp` is the
/// exception: an infeasible model returns the unmodified initial
/// assignment with `constraints_satisfied=false` and an explanatory
/// violation list (see `crate::optimizer::cp`).
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Which strategy produced this result: `"local-search"`, `"genetic"`,
    /// or `"or-tools"`.
    pub algorithm_name: String,
    /// `final_score` of the roster exactly as loaded, before any move was
    /// applied. Lets a caller report `improvement` without re-scoring.
    pub initial_score: f64,
    pub school: SchoolData,
    pub score: ScoringResult,
    /// `score.final_score - initial_score`. Non-negative for
    /// `local_search`/`genetic` by construction (§8 property 5); `cp` can
    /// occasionally be negative since its surrogate objective is not the
    /// true one (spec.md §9, open question (b)).
    pub improvement: f64,
    pub iterations_run: u64,
    pub improving_moves_accepted: u64,
    pub elapsed_seconds: f64,
    pub stopped_reason: StopReason,
    /// The algorithm-specific parameters this run used, echoed for
    /// reproducibility — `config.optimizer` plus whichever of
    /// `config.genetic`/`config.or_tools` applies to `algorithm_name`.
    pub parameters: serde_json::Value,
    pub constraints_satisfied: bool,
    pub violations: Vec<Violation>,
}

/// Why the search loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    MaxIterationsReached,
    TimeLimitReached,
    Converged,
}

impl StopReason {
    /// Human-readable label shared by the progress tracker's finish line
    /// and the text report writer, so the wording never drifts between
    /// the two.
    pub fn label(&self) -> &'static str {
        match self {
            StopReason::MaxIterationsReached => "max iterations reached",
            StopReason::TimeLimitReached => "time limit reached",
            StopReason::Converged => "converged",
        }
    }

    /// Machine-readable `snake_case` token for JSON output.
    pub fn as_token(&self) -> &'static str {
        match self {
            StopReason::MaxIterationsReached => "max_iterations_reached",
            StopReason::TimeLimitReached => "time_limit_reached",
            StopReason::Converged => "converged",
        }
    }
}

/// Runs whichever algorithm `config.optimizer.algorithm` selects and
/// returns its result. This is the single entry point the CLI's `optimize`
/// subcommand calls; it never needs to know which strategy ran.
pub fn optimize(school: &SchoolData, config: &Config) -> Result<OptimizationResult> {
    match config.optimizer.algorithm {
        Algorithm::LocalSearch => local_search::run(school, config),
        Algorithm::Genetic => genetic::run(school, config),
        Algorithm::OrTools => cp::run(school, config),
    }
}

/// Name reported in `OptimizationResult.algorithm_name` and passed to
/// [`ProgressTracker`] start/finish lines — the same spelling `Algorithm`
/// parses from on the CLI.
pub(crate) fn algorithm_name(algorithm: Algorithm) -> &'static str {
    match algorithm {
        Algorithm::LocalSearch => "local-search",
        Algorithm::Genetic => "genetic",
        Algorithm::OrTools => "or-tools",
    }
}

/// The algorithm-specific parameter echo for `OptimizationResult.parameters`:
/// the shared `optimizer` stop conditions plus whichever per-algorithm
/// struct applies.
pub(crate) fn parameters_json(config: &Config) -> serde_json::Value {
    let mut value = serde_json::json!({
        "max_iterations": config.optimizer.max_iterations,
        "time_limit_seconds": config.optimizer.time_limit_seconds,
        "seed": config.optimizer.seed,
    });
    let extra = match config.optimizer.algorithm {
        Algorithm::LocalSearch => serde_json::Value::Null,
        Algorithm::Genetic => serde_json::json!({
            "population_size": config.genetic.population_size,
            "mutation_rate": config.genetic.mutation_rate,
            "tournament_size": config.genetic.tournament_size,
            "elitism": config.genetic.elitism,
        }),
        Algorithm::OrTools => serde_json::json!({
            "target_class_size": config.or_tools.target_class_size,
            "class_size_tolerance": config.or_tools.class_size_tolerance,
            "friend_weight": config.or_tools.friend_weight,
            "conflict_penalty": config.or_tools.conflict_penalty,
            "balance_weight": config.or_tools.balance_weight,
        }),
    };
    if let (Some(base), Some(extra)) = (value.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            base.insert(k.clone(), v.clone());
        }
    }
    value
}
