//! Plain-text renderings, colored for a terminal: pass/fail banners and
//! score bands get a color, everything else stays plain.

use crate::config::Config;
use crate::domain::SchoolData;
use crate::optimizer::{OptimizationResult, ViolationKind};
use crate::scorer::ScoringResult;
use colored::Colorize;

/// Final score, the three layer scores and their weights, and roster totals.
pub fn summary_text(school: &SchoolData, result: &ScoringResult) -> String {
    let mut lines = Vec::new();
    lines.push("=".repeat(60));
    lines.push("MESHACHVETZ SCORING SUMMARY".to_string());
    lines.push("=".repeat(60));
    lines.push(String::new());
    lines.push(format!("Students:     {}", school.total_students()));
    lines.push(format!("Classes:      {}", school.total_classes()));
    lines.push(String::new());
    lines.push(format!("Final score:  {}", score_colored(result.final_score)));
    lines.push("-".repeat(40));
    lines.push(format!("Student layer:  {:>6.2}", result.student_layer_score));
    lines.push(format!("Class layer:    {:>6.2}", result.class_layer_score));
    lines.push(format!("School layer:   {:>6.2}", result.school_layer_score));
    lines.push("=".repeat(60));
    lines.join("\n")
}

/// One row per student: total score, friends placed/requested, conflicts
/// present/total, current class. Friend/conflict counts are recomputed here
/// from `school` rather than carried in [`crate::scorer::StudentScore`],
/// which only keeps the derived percentages the aggregator needs.
pub fn student_text(school: &SchoolData, result: &ScoringResult) -> String {
    let mut lines = Vec::new();
    lines.push("PER-STUDENT REPORT".to_string());
    lines.push("-".repeat(78));
    lines.push(format!(
        "{:<10} {:<20} {:<6} {:>7} {:>12} {:>12}",
        "ID", "Name", "Class", "Score", "Friends", "Conflicts"
    ));
    lines.push("-".repeat(78));

    let mut ids: Vec<&String> = school.students.keys().collect();
    ids.sort();
    for id in ids {
        let student = &school.students[id];
        let Some(score) = result.students.get(id) else {
            continue;
        };
        let placed = count_in_class(school, &student.preferred_friends, &student.class_id);
        let conflicts = count_in_class(school, &student.disliked_peers, &student.class_id);
        lines.push(format!(
            "{:<10} {:<20} {:<6} {:>7.2} {:>8}/{:<3} {:>8}/{:<3}",
            student.id,
            format!("{} {}", student.first_name, student.last_name),
            student.class_id,
            score.total,
            placed,
            student.preferred_friends.len(),
            conflicts,
            student.disliked_peers.len(),
        ));
    }
    lines.join("\n")
}

fn count_in_class(school: &SchoolData, peers: &[String], class_id: &str) -> usize {
    peers
        .iter()
        .filter_map(|id| school.get_student(id))
        .filter(|peer| peer.class_id == class_id)
        .count()
}

/// One row per class: gender balance score, male/female counts, mean
/// academic score, mean behavior rank.
pub fn class_text(school: &SchoolData, result: &ScoringResult) -> String {
    let mut lines = Vec::new();
    lines.push("PER-CLASS REPORT".to_string());
    lines.push("-".repeat(68));
    lines.push(format!(
        "{:<10} {:>10} {:>6} {:>6} {:>10} {:>10}",
        "Class", "Gender", "Male", "Female", "Academic", "Behavior"
    ));
    lines.push("-".repeat(68));

    let mut class_ids: Vec<&String> = school.classes.keys().collect();
    class_ids.sort();
    for class_id in class_ids {
        let class = &school.classes[class_id];
        if class.is_empty() {
            continue;
        }
        let Some(score) = result.classes.get(class_id) else {
            continue;
        };
        let (male, female) = class.gender_counts(&school.students);
        lines.push(format!(
            "{:<10} {:>10.2} {:>6} {:>6} {:>10.2} {:>10.2}",
            class_id,
            score.gender_balance_score,
            male,
            female,
            class.mean_academic_score(&school.students),
            class.mean_behavior_rank(&school.students),
        ));
    }
    lines.join("\n")
}

/// The four school-wide balance sub-scores and their combined total.
pub fn school_text(result: &ScoringResult) -> String {
    let s = &result.school;
    let mut lines = Vec::new();
    lines.push("PER-SCHOOL REPORT".to_string());
    lines.push("-".repeat(40));
    lines.push(format!(
        "Academic balance:    {:>6.2}  (σ={:.2})",
        s.academic_score, s.academic_stddev
    ));
    lines.push(format!(
        "Behavior balance:    {:>6.2}  (σ={:.2})",
        s.behavior_score, s.behavior_stddev
    ));
    lines.push(format!("Size balance:        {:>6.2}  (σ={:.2})", s.size_score, s.size_stddev));
    lines.push(format!(
        "Assistance balance:  {:>6.2}  (σ={:.2})",
        s.assistance_score, s.assistance_stddev
    ));
    lines.push("-".repeat(40));
    lines.push(format!("School layer total:  {:>6.2}", s.total));
    lines.join("\n")
}

/// Pretty-prints the effective configuration for reproducibility.
pub fn config_text(config: &Config) -> String {
    let mut lines = Vec::new();
    lines.push("EFFECTIVE CONFIGURATION".to_string());
    lines.push("-".repeat(40));
    lines.push(format!(
        "layer_weights:    student={:.2} class={:.2} school={:.2}",
        config.layer_weights.student, config.layer_weights.class, config.layer_weights.school
    ));
    lines.push(format!(
        "student_weights:  friends={:.2} dislikes={:.2}",
        config.student_weights.friends, config.student_weights.dislikes
    ));
    lines.push(format!(
        "school_weights:   academic={:.2} behavior={:.2} size={:.2} assistance={:.2}",
        config.school_weights.academic,
        config.school_weights.behavior,
        config.school_weights.size,
        config.school_weights.assistance
    ));
    lines.push(format!(
        "normalization:    academic={:.2} behavior={:.2} size={:.2} assistance={:.2}",
        config.normalization.academic_factor,
        config.normalization.behavior_factor,
        config.normalization.size_factor,
        config.normalization.assistance_factor,
    ));
    lines.push(format!(
        "conflict_penalty_multiplier: {:.2}",
        config.conflict_penalty_multiplier
    ));
    lines.push(format!(
        "optimizer: algorithm={:?} max_iterations={} time_limit_seconds={} seed={}",
        config.optimizer.algorithm,
        config.optimizer.max_iterations,
        config.optimizer.time_limit_seconds,
        config.optimizer.seed,
    ));
    lines.push(format!(
        "genetic:   population_size={} mutation_rate={:.2} tournament_size={} elitism={}",
        config.genetic.population_size, config.genetic.mutation_rate, config.genetic.tournament_size, config.genetic.elitism
    ));
    lines.push(format!(
        "or_tools:  target_class_size={} class_size_tolerance={} friend_weight={:.2} conflict_penalty={:.2} balance_weight={:.2}",
        config.or_tools.target_class_size,
        config.or_tools.class_size_tolerance,
        config.or_tools.friend_weight,
        config.or_tools.conflict_penalty,
        config.or_tools.balance_weight,
    ));
    lines.push(format!("log_level: {:?}", config.log_level));
    lines.join("\n")
}

/// Concatenates all five reports: summary, student, class, school, config.
pub fn all_text(school: &SchoolData, result: &ScoringResult, config: &Config) -> String {
    [
        summary_text(school, result),
        student_text(school, result),
        class_text(school, result),
        school_text(result),
        config_text(config),
    ]
    .join("\n\n")
}

/// Renders an optimization run: the summary of its final score plus search
/// bookkeeping (iterations, elapsed time, stop reason) and any hard-
/// constraint violations.
pub fn optimization_text(result: &OptimizationResult) -> String {
    let mut lines = Vec::new();
    lines.push(summary_text(&result.school, &result.score));
    lines.push(String::new());
    lines.push("OPTIMIZATION RUN".to_string());
    lines.push("-".repeat(40));
    lines.push(format!("Iterations run:      {}", result.iterations_run));
    lines.push(format!("Improving moves:     {}", result.improving_moves_accepted));
    lines.push(format!("Elapsed:             {:.2}s", result.elapsed_seconds));
    lines.push(format!("Algorithm:           {}", result.algorithm_name));
    lines.push(format!("Initial score:       {:.2}", result.initial_score));
    lines.push(format!("Improvement:         {:+.2}", result.improvement));
    lines.push(format!("Stop reason:         {}", result.stopped_reason.label()));
    lines.push(String::new());

    if result.constraints_satisfied {
        lines.push("Constraints:         SATISFIED".green().to_string());
    } else {
        lines.push("Constraints:         VIOLATED".red().to_string());
        for v in &result.violations {
            lines.push(format!(
                "  ! {} {:?}",
                violation_kind_str(v.kind),
                v.offending_ids
            ));
        }
    }
    lines.join("\n")
}

fn violation_kind_str(kind: ViolationKind) -> &'static str {
    match kind {
        ViolationKind::ForceClassViolation => "force_class violation",
        ViolationKind::ForceFriendSplit => "force_friend group split",
        ViolationKind::ClassSizeOutOfRange => "class size out of range",
        ViolationKind::DanglingReference => "dangling reference",
        ViolationKind::Infeasible => "model infeasible",
    }
}

fn score_colored(score: f64) -> String {
    let text = format!("{score:.2}");
    if score >= 80.0 {
        text.green().bold().to_string()
    } else if score >= 50.0 {
        text.yellow().bold().to_string()
    } else {
        text.red().bold().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Gender, Rank, Student};

    fn student(id: &str, class_id: &str) -> Student {
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
            preferred_friends: vec![],
            disliked_peers: vec![],
            force_class: None,
            force_friend: None,
        }
    }

    #[test]
    fn summary_text_includes_final_score_and_totals() {
        let school = SchoolData::from_students(vec![student("100000001", "A"), student("100000002", "A")]);
        let result = crate::scorer::score(&school, &Config::default());
        let text = summary_text(&school, &result);
        assert!(text.contains("Students:     2"));
        assert!(text.contains("Student layer:"));
    }

    #[test]
    fn student_text_lists_every_student_id() {
        let school = SchoolData::from_students(vec![student("100000001", "A"), student("100000002", "A")]);
        let result = crate::scorer::score(&school, &Config::default());
        let text = student_text(&school, &result);
        assert!(text.contains("100000001"));
        assert!(text.contains("100000002"));
    }
}
