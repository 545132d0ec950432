//! JSON renderings, one `#[derive(Serialize)]` struct per report.

use crate::config::Config;
use crate::domain::SchoolData;
use crate::error::Result;
use crate::optimizer::OptimizationResult;
use crate::scorer::ScoringResult;
use serde::Serialize;

#[derive(Serialize)]
pub struct SummaryJson {
    pub final_score: f64,
    pub student_layer_score: f64,
    pub class_layer_score: f64,
    pub school_layer_score: f64,
    pub total_students: usize,
    pub total_classes: usize,
}

pub fn summary_json(school: &SchoolData, result: &ScoringResult) -> Result<String> {
    let summary = SummaryJson {
        final_score: result.final_score,
        student_layer_score: result.student_layer_score,
        class_layer_score: result.class_layer_score,
        school_layer_score: result.school_layer_score,
        total_students: school.total_students(),
        total_classes: school.total_classes(),
    };
    Ok(serde_json::to_string_pretty(&summary)?)
}

#[derive(Serialize)]
pub struct StudentRowJson {
    pub id: String,
    pub name: String,
    pub class_id: String,
    pub score: f64,
    pub friends_placed: usize,
    pub friends_requested: usize,
    pub conflicts_present: usize,
    pub conflicts_total: usize,
}

pub fn student_json(school: &SchoolData, result: &ScoringResult) -> Result<String> {
    let mut rows: Vec<StudentRowJson> = school
        .students
        .values()
        .filter_map(|student| {
            let score = result.students.get(&student.id)?;
            Some(StudentRowJson {
                id: student.id.clone(),
                name: format!("{} {}", student.first_name, student.last_name),
                class_id: student.class_id.clone(),
                score: score.total,
                friends_placed: count_in_class(school, &student.preferred_friends, &student.class_id),
                friends_requested: student.preferred_friends.len(),
                conflicts_present: count_in_class(school, &student.disliked_peers, &student.class_id),
                conflicts_total: student.disliked_peers.len(),
            })
        })
        .collect();
    rows.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(serde_json::to_string_pretty(&rows)?)
}

fn count_in_class(school: &SchoolData, peers: &[String], class_id: &str) -> usize {
    peers
        .iter()
        .filter_map(|id| school.get_student(id))
        .filter(|peer| peer.class_id == class_id)
        .count()
}

#[derive(Serialize)]
pub struct ClassRowJson {
    pub class_id: String,
    pub gender_balance_score: f64,
    pub male: usize,
    pub female: usize,
    pub mean_academic_score: f64,
    pub mean_behavior_rank: f64,
}

pub fn class_json(school: &SchoolData, result: &ScoringResult) -> Result<String> {
    let mut rows: Vec<ClassRowJson> = school
        .classes
        .values()
        .filter(|c| !c.is_empty())
        .filter_map(|class| {
            let score = result.classes.get(&class.class_id)?;
            let (male, female) = class.gender_counts(&school.students);
            Some(ClassRowJson {
                class_id: class.class_id.clone(),
                gender_balance_score: score.gender_balance_score,
                male,
                female,
                mean_academic_score: class.mean_academic_score(&school.students),
                mean_behavior_rank: class.mean_behavior_rank(&school.students),
            })
        })
        .collect();
    rows.sort_by(|a, b| a.class_id.cmp(&b.class_id));
    Ok(serde_json::to_string_pretty(&rows)?)
}

#[derive(Serialize)]
pub struct SchoolJson {
    pub academic_score: f64,
    pub behavior_score: f64,
    pub size_score: f64,
    pub assistance_score: f64,
    pub total: f64,
    pub academic_stddev: f64,
    pub behavior_stddev: f64,
    pub size_stddev: f64,
    pub assistance_stddev: f64,
}

pub fn school_json(result: &ScoringResult) -> Result<String> {
    let s = &result.school;
    let school_json = SchoolJson {
        academic_score: s.academic_score,
        behavior_score: s.behavior_score,
        size_score: s.size_score,
        assistance_score: s.assistance_score,
        total: s.total,
        academic_stddev: s.academic_stddev,
        behavior_stddev: s.behavior_stddev,
        size_stddev: s.size_stddev,
        assistance_stddev: s.assistance_stddev,
    };
    Ok(serde_json::to_string_pretty(&school_json)?)
}

pub fn config_json(config: &Config) -> Result<String> {
    Ok(serde_json::to_string_pretty(config)?)
}

#[derive(Serialize)]
struct AllJson {
    summary: serde_json::Value,
    students: serde_json::Value,
    classes: serde_json::Value,
    school: serde_json::Value,
    config: serde_json::Value,
}

pub fn all_json(school: &SchoolData, result: &ScoringResult, config: &Config) -> Result<String> {
    let all = AllJson {
        summary: serde_json::from_str(&summary_json(school, result)?)?,
        students: serde_json::from_str(&student_json(school, result)?)?,
        classes: serde_json::from_str(&class_json(school, result)?)?,
        school: serde_json::from_str(&school_json(result)?)?,
        config: serde_json::from_str(&config_json(config)?)?,
    };
    Ok(serde_json::to_string_pretty(&all)?)
}

#[derive(Serialize)]
struct OptimizationJson {
    algorithm_name: String,
    initial_score: f64,
    improvement: f64,
    parameters: serde_json::Value,
    summary: serde_json::Value,
    iterations_run: u64,
    improving_moves_accepted: u64,
    elapsed_seconds: f64,
    stopped_reason: String,
    constraints_satisfied: bool,
    violations: Vec<ViolationJson>,
}

#[derive(Serialize)]
struct ViolationJson {
    kind: String,
    offending_ids: Vec<String>,
}

pub fn optimization_json(result: &OptimizationResult) -> Result<String> {
    use crate::optimizer::ViolationKind;

    let stopped_reason = result.stopped_reason.as_token().to_string();

    let violations = result
        .violations
        .iter()
        .map(|v| ViolationJson {
            kind: match v.kind {
                ViolationKind::ForceClassViolation => "force_class_violation",
                ViolationKind::ForceFriendSplit => "force_friend_split",
                ViolationKind::ClassSizeOutOfRange => "class_size_out_of_range",
                ViolationKind::DanglingReference => "dangling_reference",
                ViolationKind::Infeasible => "infeasible",
            }
            .to_string(),
            offending_ids: v.offending_ids.clone(),
        })
        .collect();

    let json = OptimizationJson {
        algorithm_name: result.algorithm_name.clone(),
        initial_score: result.initial_score,
        improvement: result.improvement,
        parameters: result.parameters.clone(),
        summary: serde_json::from_str(&summary_json(&result.school, &result.score)?)?,
        iterations_run: result.iterations_run,
        improving_moves_accepted: result.improving_moves_accepted,
        elapsed_seconds: result.elapsed_seconds,
        stopped_reason,
        constraints_satisfied: result.constraints_satisfied,
        violations,
    };
    Ok(serde_json::to_string_pretty(&json)?)
}
