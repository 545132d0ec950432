//! CP/MILP search: models the assignment as a binary integer program and
//! solves it with `good_lp`'s HiGHS backend under a wall-clock budget.
//!
//! The true school-balance term (`crate::scorer::school`) is a non-linear
//! function of a population standard deviation, which a MILP objective
//! cannot express. This strategy instead maximizes a *linear surrogate* —
//! friend/dislike pair togetherness plus a class-size deviation penalty —
//! and the caller always re-scores the materialized result via
//! [`scorer::score`] rather than trusting the surrogate value.

use super::assignment::ConstraintChecker;
use super::{OptimizationResult, StopReason};
use crate::config::Config;
use crate::domain::SchoolData;
use crate::error::Result;
use crate::scorer;
use good_lp::{constraint, variable, variables, Expression, Solution, SolverModel, Variable};
use std::collections::HashMap;
use std::time::Instant;

/// A force-friend group collapses to one movable unit; a lone student is a
/// unit of one. CP decision variables are created per (unit, class) pair,
/// not per (student, class) — this is what keeps a force-friend group
/// atomic without an extra equality constraint.
struct Unit {
    members: Vec<String>,
}

pub fn run(school: &SchoolData, config: &Config) -> Result<OptimizationResult> {
    let start = Instant::now();
    let checker = ConstraintChecker::new(school);
    let units = movable_units(school, &checker);
    let class_ids: Vec<String> = school.classes.keys().cloned().collect();

    if units.is_empty() || class_ids.is_empty() {
        return Ok(infeasible_result(
            school,
            config,
            start,
            "roster has no students or no classes to assign into".to_string(),
        ));
    }

    let unit_of_student: HashMap<&str, usize> = units
        .iter()
        .enumerate()
        .flat_map(|(ui, u)| u.members.iter().map(move |m| (m.as_str(), ui)))
        .collect();

    let mut vars = variables!();

    // x[(unit, class)]: 1 if `unit` is assigned to `class`. Only legal pairs
    // (respecting force_class) get a variable at all, so an illegal
    // placement is inexpressible rather than merely discouraged.
    let mut x: HashMap<(usize, usize), Variable> = HashMap::new();
    for (ui, unit) in units.iter().enumerate() {
        for (ci, class_id) in class_ids.iter().enumerate() {
            if checker.can_move_to(&unit.members, class_id) {
                x.insert((ui, ci), vars.add(variable().binary()));
            }
        }
    }
    for (ui, unit) in units.iter().enumerate() {
        if !(0..class_ids.len()).any(|ci| x.contains_key(&(ui, ci))) {
            return Ok(infeasible_result(
                school,
                config,
                start,
                format!(
                    "unit {:?} has no class consistent with its force_class constraint",
                    unit.members
                ),
            ));
        }
    }

    // Pairwise "together" indicators. For friend pairs we only need an
    // upper bound (y <= x_a, y <= x_b) since the maximizing objective
    // pushes y up to min(x_a, x_b) on its own. For dislike pairs we need a
    // lower bound (y >= x_a + x_b - 1) since the objective wants y down to
    // zero and something must force it up when both land in the same
    // class.
    let mut friend_terms: Vec<(Variable, Variable, Variable)> = Vec::new(); // (y, x_a, x_b)
    let mut dislike_terms: Vec<(Variable, Variable, Variable)> = Vec::new();
    let mut objective = Expression::default();

    for student in school.students.values() {
        let Some(&ui_a) = unit_of_student.get(student.id.as_str()) else {
            continue;
        };
        for peer_id in &student.preferred_friends {
            let Some(&ui_b) = unit_of_student.get(peer_id.as_str()) else {
                continue;
            };
            if ui_a == ui_b {
                continue; // already co-assigned by construction
            }
            for ci in 0..class_ids.len() {
                if let (Some(&xa), Some(&xb)) = (x.get(&(ui_a, ci)), x.get(&(ui_b, ci))) {
                    let y = vars.add(variable().min(0.0).max(1.0));
                    objective += config.or_tools.friend_weight * y;
                    friend_terms.push((y, xa, xb));
                }
            }
        }
        for peer_id in &student.disliked_peers {
            let Some(&ui_b) = unit_of_student.get(peer_id.as_str()) else {
                continue;
            };
            if ui_a == ui_b {
                continue;
            }
            for ci in 0..class_ids.len() {
                if let (Some(&xa), Some(&xb)) = (x.get(&(ui_a, ci)), x.get(&(ui_b, ci))) {
                    let y = vars.add(variable().min(0.0).max(1.0));
                    objective -= config.or_tools.conflict_penalty * y;
                    dislike_terms.push((y, xa, xb));
                }
            }
        }
    }

    // Class-size deviation: d_c >= |count_c - target|, penalized linearly.
    let target = config.or_tools.target_class_size as f64;
    let mut deviation_vars: Vec<(Variable, usize)> = Vec::new();
    for ci in 0..class_ids.len() {
        let d = vars.add(variable().min(0.0));
        objective -= config.or_tools.balance_weight * d;
        deviation_vars.push((d, ci));
    }

    let mut problem = vars.maximise(objective).using(good_lp::solvers::highs::highs);
    problem.set_time_limit(config.optimizer.time_limit_seconds.max(1) as f64);

    // Each unit is assigned to exactly one legal class.
    for (ui, _unit) in units.iter().enumerate() {
        let sum: Expression = (0..class_ids.len())
            .filter_map(|ci| x.get(&(ui, ci)))
            .map(|&v| Expression::from(v))
            .sum();
        problem = problem.with(constraint!(sum == 1));
    }

    for (y, xa, xb) in &friend_terms {
        problem = problem.with(constraint!(*y <= *xa));
        problem = problem.with(constraint!(*y <= *xb));
    }
    for (y, xa, xb) in &dislike_terms {
        problem = problem.with(constraint!(*y >= *xa + *xb - 1));
    }

    // Hard size bounds plus the linked deviation variable for the
    // objective's soft balance term — both apply to the same `target`.
    let tolerance = config.or_tools.class_size_tolerance as f64;
    for &(d, ci) in &deviation_vars {
        let unit_sizes: Vec<(f64, Variable)> = units
            .iter()
            .enumerate()
            .filter_map(|(ui, u)| x.get(&(ui, ci)).map(|&v| (u.members.len() as f64, v)))
            .collect();
        let count: Expression = unit_sizes.iter().map(|&(size, v)| size * v).sum();
        problem = problem.with(constraint!(count.clone() >= target - tolerance));
        problem = problem.with(constraint!(count.clone() <= target + tolerance));
        problem = problem.with(constraint!(d >= count.clone() - target));
        problem = problem.with(constraint!(d >= target - count));
    }

    let solution = match problem.solve() {
        Ok(solution) => solution,
        Err(e) => {
            return Ok(infeasible_result(
                school,
                config,
                start,
                format!("HiGHS could not satisfy the model: {e:?}"),
            ))
        }
    };

    let mut result_school = school.clone();
    for (ui, unit) in units.iter().enumerate() {
        for (ci, class_id) in class_ids.iter().enumerate() {
            if let Some(&v) = x.get(&(ui, ci)) {
                if solution.value(v) > 0.5 {
                    for member in &unit.members {
                        result_school.reassign(member, class_id);
                    }
                }
            }
        }
    }

    let mut violations = checker.violations(&result_school);
    violations.extend(checker.size_violations(
        &result_school,
        config.or_tools.target_class_size,
        config.or_tools.class_size_tolerance,
    ));
    let constraints_satisfied = violations.is_empty();
    let score = scorer::score(&result_school, config);
    let initial_score = scorer::score(school, config).final_score;
    log::info!(
        "{}: finished with score={:.2} (solved, elapsed={:.1}s)",
        super::algorithm_name(config.optimizer.algorithm),
        score.final_score,
        start.elapsed().as_secs_f64(),
    );
    Ok(OptimizationResult {
        algorithm_name: super::algorithm_name(config.optimizer.algorithm).to_string(),
        initial_score,
        improvement: score.final_score - initial_score,
        school: result_school,
        score,
        iterations_run: 1,
        improving_moves_accepted: 1,
        elapsed_seconds: start.elapsed().as_secs_f64(),
        stopped_reason: StopReason::Converged,
        parameters: super::parameters_json(config),
        constraints_satisfied,
        violations,
    })
}

fn movable_units(school: &SchoolData, checker: &ConstraintChecker) -> Vec<Unit> {
    let mut seen = std::collections::HashSet::new();
    let mut units = Vec::new();
    let mut ids: Vec<&String> = school.students.keys().collect();
    ids.sort();
    for id in ids {
        if seen.contains(id.as_str()) {
            continue;
        }
        let members = checker.movable_unit(id);
        seen.extend(members.iter().cloned());
        units.push(Unit { members });
    }
    units
}

/// Builds the "no change" result envelope for an infeasible model:
/// the original assignment, scored as-is, `constraints_satisfied=false`,
/// and a single violation whose `offending_ids` is empty but whose
/// presence signals infeasibility — the explanatory `reason` itself is
/// only available via the `log::warn!` this function also emits, since
/// [`crate::optimizer::ViolationKind`] has no free-text variant.
fn infeasible_result(
    school: &SchoolData,
    config: &Config,
    start: Instant,
    reason: String,
) -> OptimizationResult {
    log::warn!("CP search returned the initial assignment unchanged: {reason}");
    let score = scorer::score(school, config);
    OptimizationResult {
        algorithm_name: super::algorithm_name(config.optimizer.algorithm).to_string(),
        initial_score: score.final_score,
        improvement: 0.0,
        school: school.clone(),
        score,
        iterations_run: 0,
        improving_moves_accepted: 0,
        elapsed_seconds: start.elapsed().as_secs_f64(),
        stopped_reason: StopReason::Converged,
        parameters: super::parameters_json(config),
        constraints_satisfied: false,
        violations: vec![super::Violation {
            kind: super::ViolationKind::Infeasible,
            offending_ids: Vec::new(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Gender, Rank, Student};

    fn student(
        id: &str,
        class_id: &str,
        friends: &[&str],
        dislikes: &[&str],
        force_class: Option<&str>,
        force_friend: Option<&str>,
    ) -> Student {
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
            disliked_peers: dislikes.iter().map(|s| s.to_string()).collect(),
            force_class: force_class.map(str::to_string),
            force_friend: force_friend.map(str::to_string),
        }
    }

    #[test]
    fn respects_force_class_pin() {
        let school = SchoolData::from_students(vec![
            student("100000001", "A", &[], &[], Some("B"), None),
            student("100000002", "B", &[], &[], None, None),
            student("100000003", "A", &[], &[], None, None),
            student("100000004", "B", &[], &[], None, None),
        ]);
        let mut config = Config::default();
        config.or_tools.target_class_size = 2;
        config.or_tools.class_size_tolerance = 2;
        config.optimizer.time_limit_seconds = 5;

        let result = run(&school, &config).unwrap();
        assert_eq!(result.school.get_student("100000001").unwrap().class_id, "B");
    }

    #[test]
    fn keeps_force_friend_group_together() {
        let school = SchoolData::from_students(vec![
            student("100000001", "A", &[], &[], None, Some("g1")),
            student("100000002", "B", &[], &[], None, Some("g1")),
            student("100000003", "A", &[], &[], None, None),
            student("100000004", "B", &[], &[], None, None),
        ]);
        let mut config = Config::default();
        config.or_tools.target_class_size = 2;
        config.or_tools.class_size_tolerance = 2;
        config.optimizer.time_limit_seconds = 5;

        let result = run(&school, &config).unwrap();
        let class_a = result.school.get_student("100000001").unwrap().class_id.clone();
        let class_b = result.school.get_student("100000002").unwrap().class_id.clone();
        assert_eq!(class_a, class_b);
    }

    #[test]
    fn empty_roster_is_reported_infeasible_not_panicked() {
        let school = SchoolData::new();
        let config = Config::default();
        let result = run(&school, &config).unwrap();
        assert_eq!(result.school.total_students(), 0);
    }
}
