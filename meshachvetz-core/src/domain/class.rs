//! A class's derived attributes, recomputed on demand from its students.

use super::student::{Gender, Student};
use std::collections::HashSet;

/// The set of students assigned to one class, plus helpers for the
/// attributes the scorer needs. `ClassData` never caches size, gender
/// counts, or means across a mutation — callers always recompute from the
/// current student set, matching spec.md's "derived attributes ... are
/// recomputed on demand" invariant.
#[derive(Debug, Clone, Default)]
pub struct ClassData {
    pub class_id: String,
    pub student_ids: HashSet<String>,
}

impl ClassData {
    pub fn new(class_id: impl Into<String>) -> Self {
        ClassData {
            class_id: class_id.into(),
            student_ids: HashSet::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.student_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.student_ids.is_empty()
    }

    /// Counts male/female students in this class by looking each ID up in
    /// `roster`. Missing IDs are skipped rather than panicking — the class
    /// and roster are kept in sync by the school, but this keeps the method
    /// defensible on its own.
    pub fn gender_counts(&self, roster: &std::collections::HashMap<String, Student>) -> (usize, usize) {
        let mut male = 0;
        let mut female = 0;
        for id in &self.student_ids {
            if let Some(s) = roster.get(id) {
                match s.gender {
                    Gender::Male => male += 1,
                    Gender::Female => female += 1,
                }
            }
        }
        (male, female)
    }

    pub fn mean_academic_score(&self, roster: &std::collections::HashMap<String, Student>) -> f64 {
        mean(self.student_ids.iter().filter_map(|id| roster.get(id)).map(|s| s.academic_score))
    }

    /// Mean of `behavior_rank` mapped to its numeric scale (`A`=1 .. `D`=4),
    /// the aggregate the school scorer takes σ of for behavior balance.
    pub fn mean_behavior_rank(&self, roster: &std::collections::HashMap<String, Student>) -> f64 {
        mean(
            self.student_ids
                .iter()
                .filter_map(|id| roster.get(id))
                .map(|s| s.behavior_rank.as_numeric() as f64),
        )
    }

    pub fn assistance_count(&self, roster: &std::collections::HashMap<String, Student>) -> usize {
        self.student_ids
            .iter()
            .filter_map(|id| roster.get(id))
            .filter(|s| s.assistance_package)
            .count()
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::student::Rank;
    use std::collections::HashMap;

    fn student(id: &str, gender: Gender, academic: f64, behavior: Rank, assistance: bool) -> Student {
        Student {
            id: id.to_string(),
            first_name: "X".to_string(),
            last_name: "Y".to_string(),
            gender,
            class_id: "A".to_string(),
            academic_score: academic,
            behavior_rank: behavior,
            studentiality_rank: behavior,
            assistance_package: assistance,
            preferred_friends: vec![],
            disliked_peers: vec![],
            force_class: None,
            force_friend: None,
        }
    }

    #[test]
    fn derived_attributes_recompute_from_current_members() {
        let mut roster = HashMap::new();
        roster.insert(
            "100000001".to_string(),
            student("100000001", Gender::Male, 80.0, Rank::A, false),
        );
        roster.insert(
            "100000002".to_string(),
            student("100000002", Gender::Female, 90.0, Rank::B, true),
        );

        let mut class = ClassData::new("A");
        class.student_ids.insert("100000001".to_string());
        class.student_ids.insert("100000002".to_string());

        assert_eq!(class.size(), 2);
        let (m, f) = class.gender_counts(&roster);
        assert_eq!((m, f), (1, 1));
        assert_eq!(class.mean_academic_score(&roster), 85.0);
        assert_eq!(class.assistance_count(&roster), 1);
    }

    #[test]
    fn empty_class_has_zero_means_not_nan() {
        let roster = HashMap::new();
        let class = ClassData::new("Z");
        assert_eq!(class.mean_academic_score(&roster), 0.0);
        assert_eq!(class.mean_behavior_rank(&roster), 0.0);
    }
}
