//! Student-layer scoring: how well each student's social preferences were
//! honored.

use crate::config::{Config, StudentWeights};
use crate::domain::SchoolData;

/// One student's friend-satisfaction and conflict-avoidance sub-scores,
/// each on a 0-100 scale, plus their weighted total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StudentScore {
    pub friends_score: f64,
    pub dislikes_score: f64,
    pub total: f64,
}

/// Scores every student in `school` against their own preference lists.
/// A student with an empty `preferred_friends` or `disliked_peers` list
/// scores 100 on that sub-metric — there is nothing to satisfy or avoid.
pub fn score_students(school: &SchoolData, config: &Config) -> std::collections::HashMap<String, StudentScore> {
    school
        .students
        .values()
        .map(|student| {
            let friends_score = match_ratio(school, student, &student.preferred_friends)
                .unwrap_or(1.0)
                * 100.0;
            let conflict_ratio = match_ratio(school, student, &student.disliked_peers).unwrap_or(0.0);
            let dislikes_score =
                (100.0 - conflict_ratio * 100.0 * config.conflict_penalty_multiplier).max(0.0);
            let total = weighted_total(friends_score, dislikes_score, &config.student_weights);
            (
                student.id.clone(),
                StudentScore {
                    friends_score,
                    dislikes_score,
                    total,
                },
            )
        })
        .collect()
}

/// Fraction of `peers` who share `student`'s class. `None` for an empty
/// list, leaving the caller to pick the empty-list default for whichever
/// sub-metric it's computing (1.0 for friend satisfaction, 0.0 for
/// conflict ratio — both read as "nothing to hold against this student").
fn match_ratio(school: &SchoolData, student: &crate::domain::Student, peers: &[String]) -> Option<f64> {
    if peers.is_empty() {
        return None;
    }
    let matched = peers
        .iter()
        .filter_map(|id| school.get_student(id))
        .filter(|peer| peer.class_id == student.class_id)
        .count();
    Some(matched as f64 / peers.len() as f64)
}

fn weighted_total(friends_score: f64, dislikes_score: f64, weights: &StudentWeights) -> f64 {
    friends_score * weights.friends + dislikes_score * weights.dislikes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Gender, Rank, Student};

    fn student(id: &str, class_id: &str, friends: &[&str], dislikes: &[&str]) -> Student {
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
            force_class: None,
            force_friend: None,
        }
    }

    #[test]
    fn fully_satisfied_friend_preference_scores_one_hundred() {
        let school = SchoolData::from_students(vec![
            student("100000001", "A", &["100000002"], &[]),
            student("100000002", "A", &[], &[]),
        ]);
        let config = Config::default();
        let scores = score_students(&school, &config);
        assert_eq!(scores["100000001"].friends_score, 100.0);
        assert_eq!(scores["100000001"].dislikes_score, 100.0);
    }

    #[test]
    fn unsatisfied_friend_preference_scores_zero_on_that_submetric() {
        let school = SchoolData::from_students(vec![
            student("100000001", "A", &["100000002"], &[]),
            student("100000002", "B", &[], &[]),
        ]);
        let config = Config::default();
        let scores = score_students(&school, &config);
        assert_eq!(scores["100000001"].friends_score, 0.0);
    }

    #[test]
    fn disliked_peer_in_same_class_lowers_dislikes_score() {
        let school = SchoolData::from_students(vec![
            student("100000001", "A", &[], &["100000002"]),
            student("100000002", "A", &[], &[]),
        ]);
        let config = Config::default();
        let scores = score_students(&school, &config);
        assert_eq!(scores["100000001"].dislikes_score, 0.0);
    }

    #[test]
    fn conflict_penalty_multiplier_scales_the_dislikes_penalty() {
        let school = SchoolData::from_students(vec![
            student("100000001", "A", &[], &["100000002", "100000003"]),
            student("100000002", "A", &[], &[]),
            student("100000003", "B", &[], &[]),
        ]);
        let mut config = Config::default();
        config.conflict_penalty_multiplier = 2.0;
        let scores = score_students(&school, &config);
        // one of two disliked peers shares the class: ratio 0.5, penalty doubled to 100 -> floor at 0
        assert_eq!(scores["100000001"].dislikes_score, 0.0);
    }
}
