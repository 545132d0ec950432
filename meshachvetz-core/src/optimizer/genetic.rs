//! Genetic search: a population of candidate assignments evolved by
//! tournament selection, class-preserving crossover with repair, and
//! mutation, with elitism carrying the best individuals forward unchanged.

use super::assignment::{Assignment, ConstraintChecker};
use super::moves;
use super::progress::ProgressTracker;
use super::{OptimizationResult, StopReason};
use crate::config::Config;
use crate::domain::SchoolData;
use crate::error::Result;
use crate::scorer;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::collections::HashMap;
use std::time::Instant;

struct Individual {
    assignment: Assignment,
    fingerprint: u64,
    score: f64,
}

pub fn run(school: &SchoolData, config: &Config) -> Result<OptimizationResult> {
    let start = Instant::now();
    let checker = ConstraintChecker::new(school);
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(config.optimizer.seed);
    let algorithm_name = super::algorithm_name(config.optimizer.algorithm);
    let mut tracker = ProgressTracker::new(config.log_level, config.optimizer.max_iterations);
    tracker.start(algorithm_name);
    let initial_score = scorer::score(school, config).final_score;

    let mut population = initial_population(school, &checker, config, &mut rng);
    let mut score_cache: HashMap<u64, f64> = HashMap::new();
    score_population(&mut population, config, &mut score_cache);

    let mut best = fittest(&population).clone_individual();
    let mut iterations_run = 0u64;
    let mut stopped_reason = StopReason::MaxIterationsReached;
    let mut generations_without_improvement = 0u64;

    for generation in 0..config.optimizer.max_iterations {
        iterations_run = generation + 1;

        if start.elapsed().as_secs() >= config.optimizer.time_limit_seconds {
            stopped_reason = StopReason::TimeLimitReached;
            break;
        }

        population = next_generation(&population, &checker, config, &mut rng);
        score_population(&mut population, config, &mut score_cache);

        let generation_best = fittest(&population);
        if generation_best.score > best.score {
            best = generation_best.clone_individual();
            generations_without_improvement = 0;
            tracker.record_improvement(generation, best.score);
        } else {
            generations_without_improvement += 1;
            tracker.record_stagnation(generation);
        }

        if generations_without_improvement as usize >= 50 {
            stopped_reason = StopReason::Converged;
            break;
        }
        tracker.record_iteration(generation, best.score);
    }

    let violations = checker.violations(&best.assignment.school);
    let constraints_satisfied = violations.is_empty();
    let score = scorer::score(&best.assignment.school, config);
    tracker.finish(algorithm_name, score.final_score, stopped_reason.label());
    Ok(OptimizationResult {
        algorithm_name: algorithm_name.to_string(),
        initial_score,
        improvement: score.final_score - initial_score,
        school: best.assignment.school,
        score,
        iterations_run,
        improving_moves_accepted: iterations_run.saturating_sub(generations_without_improvement),
        elapsed_seconds: start.elapsed().as_secs_f64(),
        stopped_reason,
        parameters: super::parameters_json(config),
        constraints_satisfied,
        violations,
    })
}

impl Individual {
    fn clone_individual(&self) -> Individual {
        Individual {
            assignment: self.assignment.clone(),
            fingerprint: self.fingerprint,
            score: self.score,
        }
    }
}

fn initial_population(
    school: &SchoolData,
    checker: &ConstraintChecker,
    config: &Config,
    rng: &mut impl Rng,
) -> Vec<Individual> {
    (0..config.genetic.population_size)
        .map(|i| {
            let mut assignment = Assignment::new(school.clone());
            if i > 0 {
                // individual 0 is the roster as loaded; the rest start from
                // a handful of random mutations so the population isn't
                // degenerate at generation zero.
                for _ in 0..5 {
                    if let Some(mv) = moves::random_transfer(&assignment, checker, rng, 10) {
                        moves::apply(&mut assignment, &mv);
                    }
                }
            }
            let fingerprint = fingerprint(&assignment);
            Individual {
                assignment,
                fingerprint,
                score: 0.0,
            }
        })
        .collect()
}

/// A canonical, order-independent fingerprint of an assignment: the sorted
/// `(student_id, class_id)` pairs hashed together. Two assignments that are
/// the same roster partition (even if built by different move sequences)
/// hash identically, so [`score_population`] can skip re-scoring an
/// individual the cache has already seen this run.
fn fingerprint(assignment: &Assignment) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut pairs: Vec<(&String, &String)> = assignment
        .assignment_school_pairs()
        .collect();
    pairs.sort();
    let mut hasher = DefaultHasher::new();
    pairs.hash(&mut hasher);
    hasher.finish()
}

impl Assignment {
    fn assignment_school_pairs(&self) -> impl Iterator<Item = (&String, &String)> {
        self.school.students.values().map(|s| (&s.id, &s.class_id))
    }
}

/// Scores every individual in parallel via `rayon`, then writes the
/// results back in index order — `par_iter().map(...).collect()` preserves
/// the source order, so this stays deterministic regardless of which
/// thread finishes first. An individual whose fingerprint the cache has
/// already seen this run (e.g. an elite carried over unchanged, or a
/// repair that collapsed back onto a previously-seen partition) is read
/// from `cache` instead of re-scored; the cache itself is only written
/// after the parallel pass, so concurrent lookups never race a write.
fn score_population(population: &mut [Individual], config: &Config, cache: &mut HashMap<u64, f64>) {
    let scores: Vec<f64> = population
        .par_iter()
        .map(|individual| {
            cache
                .get(&individual.fingerprint)
                .copied()
                .unwrap_or_else(|| scorer::score(&individual.assignment.school, config).final_score)
        })
        .collect();

    for (individual, score) in population.iter_mut().zip(scores) {
        individual.score = score;
        cache.entry(individual.fingerprint).or_insert(score);
    }
}

fn fittest(population: &[Individual]) -> &Individual {
    population
        .iter()
        .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap())
        .expect("population is never empty")
}

fn next_generation(
    population: &[Individual],
    checker: &ConstraintChecker,
    config: &Config,
    rng: &mut impl Rng,
) -> Vec<Individual> {
    let mut ranked: Vec<&Individual> = population.iter().collect();
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());

    let mut next: Vec<Individual> = ranked
        .iter()
        .take(config.genetic.elitism)
        .map(|i| i.clone_individual())
        .collect();

    while next.len() < config.genetic.population_size {
        let parent_a = tournament_select(population, config.genetic.tournament_size, rng);
        let parent_b = tournament_select(population, config.genetic.tournament_size, rng);
        let mut child = crossover(parent_a, parent_b, rng);
        repair(&mut child, checker);
        mutate(&mut child, checker, config.genetic.mutation_rate, rng);

        let fingerprint = fingerprint(&child);
        next.push(Individual {
            assignment: child,
            fingerprint,
            score: 0.0,
        });
    }

    next
}

/// Mutates `child` by rolling independently, per student, with probability
/// `mutation_rate`: on a hit, either reassigns that student's movable unit to
/// a random legal class or swaps it with a random peer's unit, with equal
/// odds between the two. A `force_class`/`force_friend` student that rolls a
/// hit simply produces no legal move and is left untouched.
fn mutate(child: &mut Assignment, checker: &ConstraintChecker, mutation_rate: f64, rng: &mut impl Rng) {
    for student_id in child.student_ids() {
        if rng.random_range(0.0..1.0) >= mutation_rate {
            continue;
        }
        let mv = if rng.random_bool(0.5) {
            moves::random_transfer_for(child, checker, &student_id, rng, 10)
        } else {
            moves::random_swap_for(child, checker, &student_id, rng, 10)
        };
        if let Some(mv) = mv {
            moves::apply(child, &mv);
        }
    }
}

fn tournament_select<'a>(population: &'a [Individual], tournament_size: usize, rng: &mut impl Rng) -> &'a Individual {
    population
        .choose_multiple(rng, tournament_size.max(1))
        .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap())
        .expect("tournament_size is at least 1 and population is never empty")
}

/// Uniform class-assignment crossover: every student independently
/// inherits its class from one parent or the other. This can break
/// `force_friend` groups apart (each member drawing from a different
/// parent) — [`repair`] restores the invariant afterward.
fn crossover(parent_a: &Individual, parent_b: &Individual, rng: &mut impl Rng) -> Assignment {
    let mut child = parent_a.assignment.clone();
    for id in child.student_ids() {
        if rng.random_bool(0.5) {
            if let Some(class_id) = parent_b.assignment.school.get_student(&id).map(|s| s.class_id.clone()) {
                child.school.reassign(&id, &class_id);
            }
        }
    }
    child
}

/// Restores the two hard constraints after crossover: every `force_class`
/// student is moved back to its required class, and every `force_friend`
/// group is collapsed onto its first member's class.
fn repair(assignment: &mut Assignment, checker: &ConstraintChecker) {
    let ids = assignment.student_ids();
    for id in &ids {
        if let Some(forced) = checker.forced_class(id) {
            let forced = forced.to_string();
            let unit = checker.movable_unit(id);
            for member in &unit {
                assignment.school.reassign(member, &forced);
            }
        }
    }

    let mut seen = std::collections::HashSet::new();
    for id in &ids {
        if seen.contains(id) {
            continue;
        }
        let unit = checker.movable_unit(id);
        seen.extend(unit.iter().cloned());
        if unit.len() > 1 {
            if let Some(target_class) = assignment.school.get_student(&unit[0]).map(|s| s.class_id.clone()) {
                for member in &unit[1..] {
                    assignment.school.reassign(member, &target_class);
                }
            }
        }
    }
}
