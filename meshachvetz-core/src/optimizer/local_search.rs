//! Hill-climbing local search: repeatedly sample a batch of transfer and
//! swap moves, apply the best improving one, stop when a batch yields
//! nothing better than the current assignment.

use super::assignment::{Assignment, ConstraintChecker};
use super::moves::{self, Move};
use super::progress::ProgressTracker;
use super::{OptimizationResult, StopReason};
use crate::config::Config;
use crate::domain::SchoolData;
use crate::error::Result;
use crate::scorer;
use rand::SeedableRng;
use std::time::Instant;

/// How many candidate moves to sample per iteration before giving up and
/// declaring convergence. Not exposed in `Config` — it's an implementation
/// detail of this strategy, not a tuning knob the other two share.
const CANDIDATES_PER_ITERATION: usize = 40;

pub fn run(school: &SchoolData, config: &Config) -> Result<OptimizationResult> {
    let start = Instant::now();
    let checker = ConstraintChecker::new(school);
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(config.optimizer.seed);
    let algorithm_name = super::algorithm_name(config.optimizer.algorithm);

    let mut assignment = Assignment::new(school.clone());
    let initial_score = scorer::score(&assignment.school, config).final_score;
    let mut best_score = initial_score;

    let mut tracker = ProgressTracker::new(config.log_level, config.optimizer.max_iterations);
    tracker.start(algorithm_name);
    let mut iterations_run = 0u64;
    let mut accepted = 0u64;
    let mut stopped_reason = StopReason::MaxIterationsReached;

    for iteration in 0..config.optimizer.max_iterations {
        iterations_run = iteration + 1;

        if start.elapsed().as_secs() >= config.optimizer.time_limit_seconds {
            stopped_reason = StopReason::TimeLimitReached;
            break;
        }

        let best_candidate = sample_best_candidate(&assignment, &checker, &mut rng, config, best_score);

        match best_candidate {
            Some((mv, candidate_score)) => {
                moves::apply(&mut assignment, &mv);
                best_score = candidate_score;
                accepted += 1;
                tracker.record_improvement(iteration, best_score);
            }
            None => {
                stopped_reason = StopReason::Converged;
                tracker.record_stagnation(iteration);
                break;
            }
        }
        tracker.record_iteration(iteration, best_score);
    }

    let violations = checker.violations(&assignment.school);
    let constraints_satisfied = violations.is_empty();
    let score = scorer::score(&assignment.school, config);
    tracker.finish(algorithm_name, score.final_score, stopped_reason.label());
    Ok(OptimizationResult {
        algorithm_name: algorithm_name.to_string(),
        initial_score,
        improvement: score.final_score - initial_score,
        school: assignment.school,
        score,
        iterations_run,
        improving_moves_accepted: accepted,
        elapsed_seconds: start.elapsed().as_secs_f64(),
        stopped_reason,
        parameters: super::parameters_json(config),
        constraints_satisfied,
        violations,
    })
}

/// Samples `CANDIDATES_PER_ITERATION` moves (split evenly between transfers
/// and swaps), scores each, and returns the most-improving one that beats
/// `current_score`. Ties among equally-improving candidates are broken by
/// preferring the move that touches the student with the lowest current
/// individual score, and further ties by the lexicographically lowest
/// touched student ID — both computed from a single per-iteration scoring
/// pass over `assignment` rather than re-scored per candidate.
fn sample_best_candidate(
    assignment: &Assignment,
    checker: &ConstraintChecker,
    rng: &mut impl rand::Rng,
    config: &Config,
    current_score: f64,
) -> Option<(Move, f64)> {
    const EPS: f64 = 1e-9;

    let current_student_scores = scorer::score_students(&assignment.school, config);
    let tie_break_key = |mv: &Move| -> (f64, String) {
        let touched = touched_ids(mv);
        let min_score = touched
            .iter()
            .filter_map(|id| current_student_scores.get(*id))
            .map(|s| s.total)
            .fold(f64::INFINITY, f64::min);
        let min_id = touched.into_iter().min().cloned().unwrap_or_default();
        (min_score, min_id)
    };

    let mut best: Option<(Move, f64, f64, String)> = None;

    for i in 0..CANDIDATES_PER_ITERATION {
        let mv = if i % 2 == 0 {
            moves::random_transfer(assignment, checker, rng, 10)
        } else {
            moves::random_swap(assignment, checker, rng, 10)
        };
        let Some(mv) = mv else { continue };

        let mut candidate = assignment.clone();
        moves::apply(&mut candidate, &mv);
        let candidate_score = scorer::score(&candidate.school, config).final_score;

        if candidate_score <= current_score {
            continue;
        }

        let (min_score, min_id) = tie_break_key(&mv);
        let better = match &best {
            None => true,
            Some((_, best_score, best_min_score, best_min_id)) => {
                if candidate_score > *best_score + EPS {
                    true
                } else if candidate_score < *best_score - EPS {
                    false
                } else if min_score < *best_min_score - EPS {
                    true
                } else if min_score > *best_min_score + EPS {
                    false
                } else {
                    min_id < *best_min_id
                }
            }
        };
        if better {
            best = Some((mv, candidate_score, min_score, min_id));
        }
    }

    best.map(|(mv, score, _, _)| (mv, score))
}

/// The student IDs a move would directly reassign: the transferred unit, or
/// both units in a swap.
fn touched_ids(mv: &Move) -> Vec<&String> {
    match mv {
        Move::Transfer { unit, .. } => unit.iter().collect(),
        Move::Swap { unit_a, unit_b } => unit_a.iter().chain(unit_b.iter()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Gender, Rank, Student};

    fn student(id: &str, class_id: &str, friends: &[&str]) -> Student {
        Student {
            id: id.to_string(),
            first_name: "X".to_string(),
            last_name: "Y".to_string(),
            gender: Gender::Male,
            class_id: class_id.to_string(),
            academic_score: 70.0,
            behavior_rank: Rank::B,
            studentiality_rank: Rank::B,
            assistance_package: false,
            preferred_friends: friends.iter().map(|s| s.to_string()).collect(),
            disliked_peers: vec![],
            force_class: None,
            force_friend: None,
        }
    }

    #[test]
    fn never_worsens_the_starting_score() {
        let school = SchoolData::from_students(vec![
            student("100000001", "A", &["100000002"]),
            student("100000002", "B", &[]),
            student("100000003", "B", &[]),
            student("100000004", "A", &[]),
        ]);
        let mut config = Config::default();
        config.optimizer.max_iterations = 200;
        config.optimizer.time_limit_seconds = 5;

        let starting_score = scorer::score(&school, &config).final_score;
        let result = run(&school, &config).unwrap();
        assert!(result.score.final_score >= starting_score);
    }

    #[test]
    fn is_deterministic_for_a_fixed_seed() {
        let school = SchoolData::from_students(vec![
            student("100000001", "A", &["100000003"]),
            student("100000002", "B", &[]),
            student("100000003", "B", &[]),
            student("100000004", "A", &[]),
        ]);
        let mut config = Config::default();
        config.optimizer.max_iterations = 100;
        config.optimizer.seed = 7;

        let a = run(&school, &config).unwrap();
        let b = run(&school, &config).unwrap();
        assert_eq!(a.score.final_score, b.score.final_score);
    }
}
