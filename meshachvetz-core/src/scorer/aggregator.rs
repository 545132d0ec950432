//! Combines the three scoring layers into one [`super::ScoringResult`].

use super::class::score_classes;
use super::school::score_school;
use super::student::score_students;
use super::ScoringResult;
use crate::config::Config;
use crate::domain::SchoolData;

/// Scores `school` under `config`. The three layer scores are each the mean
/// of their respective per-entity scores, weighted by `config.layer_weights`
/// into `final_score`. A roster with no students at all is a caller error —
/// the loader (`crate::data::load_csv`) already rejects that shape.
pub fn score(school: &SchoolData, config: &Config) -> ScoringResult {
    let students = score_students(school, config);
    let classes = score_classes(school, config);
    let school_score = score_school(school, config);

    let student_layer_score = mean(students.values().map(|s| s.total));
    let class_layer_score = mean(classes.values().map(|c| c.gender_balance_score));
    let school_layer_score = school_score.total;

    let weights = &config.layer_weights;
    let final_score = student_layer_score * weights.student
        + class_layer_score * weights.class
        + school_layer_score * weights.school;

    ScoringResult {
        final_score,
        student_layer_score,
        class_layer_score,
        school_layer_score,
        students,
        classes,
        school: school_score,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        100.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Gender, Rank, Student};

    fn student(id: &str, class_id: &str, gender: Gender) -> Student {
        Student {
            id: id.to_string(),
            first_name: "X".to_string(),
            last_name: "Y".to_string(),
            gender,
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
    fn balanced_roster_with_no_preferences_scores_one_hundred() {
        let school = SchoolData::from_students(vec![
            student("100000001", "A", Gender::Male),
            student("100000002", "A", Gender::Female),
        ]);
        let result = score(&school, &Config::default());
        assert_eq!(result.final_score, 100.0);
    }
}
