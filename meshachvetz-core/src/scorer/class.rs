//! Class-layer scoring: gender balance within each class.

use crate::config::Config;
use crate::domain::SchoolData;
use std::collections::HashMap;

/// A single class's gender-balance sub-score, 0-100. 100 means an even
/// split (or a class with only one student); it falls toward 0 as the
/// male/female counts diverge relative to the class size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassScore {
    pub gender_balance_score: f64,
}

/// Scores every non-empty class in `school`. Empty classes are excluded —
/// there's no balance to measure with zero students.
pub fn score_classes(school: &SchoolData, _config: &Config) -> HashMap<String, ClassScore> {
    school
        .non_empty_classes()
        .map(|class| {
            let (male, female) = class.gender_counts(&school.students);
            let size = male + female;
            let gender_balance_score = if size == 0 {
                100.0
            } else {
                100.0 * (1.0 - (male as f64 - female as f64).abs() / size as f64)
            };
            (class.class_id.clone(), ClassScore { gender_balance_score })
        })
        .collect()
}
