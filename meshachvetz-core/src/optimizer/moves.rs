//! Neighborhood operators shared by every optimizer strategy: transfer one
//! movable unit to a different class, or swap two units between classes.
//! A "unit" is a single student, or — when the student carries a
//! `force_friend` token — the whole group that token names; see
//! [`super::ConstraintChecker::movable_unit`].

use super::assignment::{Assignment, ConstraintChecker};
use rand::Rng;

#[derive(Debug, Clone)]
pub enum Move {
    Transfer { unit: Vec<String>, to_class: String },
    Swap { unit_a: Vec<String>, unit_b: Vec<String> },
}

/// Applies `mv` to `assignment` in place. Callers are responsible for
/// having already checked the move against a [`ConstraintChecker`] — this
/// function performs no validation of its own.
pub fn apply(assignment: &mut Assignment, mv: &Move) {
    match mv {
        Move::Transfer { unit, to_class } => {
            for id in unit {
                assignment.school.reassign(id, to_class);
            }
        }
        Move::Swap { unit_a, unit_b } => {
            let class_a = assignment.school.get_student(&unit_a[0]).map(|s| s.class_id.clone());
            let class_b = assignment.school.get_student(&unit_b[0]).map(|s| s.class_id.clone());
            if let (Some(class_a), Some(class_b)) = (class_a, class_b) {
                for id in unit_a {
                    assignment.school.reassign(id, &class_b);
                }
                for id in unit_b {
                    assignment.school.reassign(id, &class_a);
                }
            }
        }
    }
}

/// Draws a transfer move for a random movable unit into a random different
/// class, respecting `checker`. Returns `None` if no legal move could be
/// found in `max_attempts` tries — typical when every student is
/// `force_class`-pinned.
pub fn random_transfer(
    assignment: &Assignment,
    checker: &ConstraintChecker,
    rng: &mut impl Rng,
    max_attempts: usize,
) -> Option<Move> {
    let student_ids = assignment.student_ids();
    let class_ids = assignment.class_ids();
    if student_ids.is_empty() || class_ids.len() < 2 {
        return None;
    }

    for _ in 0..max_attempts {
        let student_id = &student_ids[rng.random_range(0..student_ids.len())];
        let unit = checker.movable_unit(student_id);
        let current_class = assignment
            .school
            .get_student(&unit[0])
            .map(|s| s.class_id.clone())
            .unwrap_or_default();
        let to_class = &class_ids[rng.random_range(0..class_ids.len())];
        if *to_class == current_class {
            continue;
        }
        if checker.can_move_to(&unit, to_class) {
            return Some(Move::Transfer {
                unit,
                to_class: to_class.clone(),
            });
        }
    }
    None
}

/// Draws a swap move between two random movable units currently in
/// different classes, respecting `checker` on both sides.
pub fn random_swap(
    assignment: &Assignment,
    checker: &ConstraintChecker,
    rng: &mut impl Rng,
    max_attempts: usize,
) -> Option<Move> {
    let student_ids = assignment.student_ids();
    if student_ids.len() < 2 {
        return None;
    }

    for _ in 0..max_attempts {
        let a = &student_ids[rng.random_range(0..student_ids.len())];
        let b = &student_ids[rng.random_range(0..student_ids.len())];
        if a == b {
            continue;
        }
        let unit_a = checker.movable_unit(a);
        let unit_b = checker.movable_unit(b);
        if unit_a.iter().any(|id| unit_b.contains(id)) {
            continue;
        }
        let class_a = assignment.school.get_student(&unit_a[0]).map(|s| s.class_id.clone());
        let class_b = assignment.school.get_student(&unit_b[0]).map(|s| s.class_id.clone());
        let (Some(class_a), Some(class_b)) = (class_a, class_b) else {
            continue;
        };
        if class_a == class_b {
            continue;
        }
        if checker.can_move_to(&unit_a, &class_b) && checker.can_move_to(&unit_b, &class_a) {
            return Some(Move::Swap { unit_a, unit_b });
        }
    }
    None
}

/// Like [`random_transfer`], but for the movable unit containing a specific
/// `student_id` rather than a randomly drawn one — used by mutation, which
/// rolls independently per student.
pub fn random_transfer_for(
    assignment: &Assignment,
    checker: &ConstraintChecker,
    student_id: &str,
    rng: &mut impl Rng,
    max_attempts: usize,
) -> Option<Move> {
    let class_ids = assignment.class_ids();
    if class_ids.len() < 2 {
        return None;
    }
    let unit = checker.movable_unit(student_id);
    let current_class = assignment
        .school
        .get_student(&unit[0])
        .map(|s| s.class_id.clone())
        .unwrap_or_default();

    for _ in 0..max_attempts {
        let to_class = &class_ids[rng.random_range(0..class_ids.len())];
        if *to_class == current_class {
            continue;
        }
        if checker.can_move_to(&unit, to_class) {
            return Some(Move::Transfer {
                unit,
                to_class: to_class.clone(),
            });
        }
    }
    None
}

/// Like [`random_swap`], but pairs the movable unit containing a specific
/// `student_id` with a randomly drawn peer in a different class — used by
/// mutation's "swap with a random peer" alternative.
pub fn random_swap_for(
    assignment: &Assignment,
    checker: &ConstraintChecker,
    student_id: &str,
    rng: &mut impl Rng,
    max_attempts: usize,
) -> Option<Move> {
    let student_ids = assignment.student_ids();
    if student_ids.len() < 2 {
        return None;
    }
    let unit_a = checker.movable_unit(student_id);
    let class_a = assignment.school.get_student(&unit_a[0]).map(|s| s.class_id.clone())?;

    for _ in 0..max_attempts {
        let b = &student_ids[rng.random_range(0..student_ids.len())];
        if unit_a.iter().any(|id| id == b) {
            continue;
        }
        let unit_b = checker.movable_unit(b);
        if unit_a.iter().any(|id| unit_b.contains(id)) {
            continue;
        }
        let Some(class_b) = assignment.school.get_student(&unit_b[0]).map(|s| s.class_id.clone()) else {
            continue;
        };
        if class_a == class_b {
            continue;
        }
        if checker.can_move_to(&unit_a, &class_b) && checker.can_move_to(&unit_b, &class_a) {
            return Some(Move::Swap { unit_a, unit_b });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Gender, Rank, SchoolData, Student};
    use rand::SeedableRng;

    fn student(id: &str, class_id: &str, force_class: Option<&str>) -> Student {
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
            force_class: force_class.map(str::to_string),
            force_friend: None,
        }
    }

    #[test]
    fn transfer_respects_force_class() {
        let school = SchoolData::from_students(vec![
            student("100000001", "A", Some("A")),
            student("100000002", "A", None),
        ]);
        let assignment = Assignment::new(school);
        let checker = ConstraintChecker::new(&assignment.school);
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(1);

        for _ in 0..50 {
            if let Some(Move::Transfer { unit, to_class }) =
                random_transfer(&assignment, &checker, &mut rng, 20)
            {
                if unit.contains(&"100000001".to_string()) {
                    assert_eq!(to_class, "A");
                }
            }
        }
    }

    #[test]
    fn apply_transfer_moves_the_whole_unit() {
        let school = SchoolData::from_students(vec![student("100000001", "A", None)]);
        let mut assignment = Assignment::new(school);
        apply(
            &mut assignment,
            &Move::Transfer {
                unit: vec!["100000001".to_string()],
                to_class: "B".to_string(),
            },
        );
        assert_eq!(assignment.school.get_student("100000001").unwrap().class_id, "B");
    }

    #[test]
    fn apply_swap_exchanges_classes() {
        let school = SchoolData::from_students(vec![
            student("100000001", "A", None),
            student("100000002", "B", None),
        ]);
        let mut assignment = Assignment::new(school);
        apply(
            &mut assignment,
            &Move::Swap {
                unit_a: vec!["100000001".to_string()],
                unit_b: vec!["100000002".to_string()],
            },
        );
        assert_eq!(assignment.school.get_student("100000001").unwrap().class_id, "B");
        assert_eq!(assignment.school.get_student("100000002").unwrap().class_id, "A");
    }
}
