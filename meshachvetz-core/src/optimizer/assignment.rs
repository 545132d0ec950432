//! The mutable working copy of a roster the search loops operate on, and
//! the hard-constraint checker every move goes through first.

use crate::domain::SchoolData;
use std::collections::HashMap;

/// A candidate class assignment. Thin wrapper around [`SchoolData`] — the
/// search strategies clone this freely (genetic search keeps a whole
/// population of them), so it carries no extra bookkeeping beyond the
/// roster itself.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub school: SchoolData,
}

impl Assignment {
    pub fn new(school: SchoolData) -> Self {
        Assignment { school }
    }

    pub fn student_ids(&self) -> Vec<String> {
        self.school.students.keys().cloned().collect()
    }

    pub fn class_ids(&self) -> Vec<String> {
        self.school.classes.keys().cloned().collect()
    }
}

/// One kind of hard-constraint breach a [`ConstraintChecker`] can report.
/// Mirrors spec.md's four violation kinds; `DanglingReference` is reported
/// here only for completeness of the taxonomy — the loader
/// (`crate::data::loader`) already drops dangling peer references before
/// the core ever sees a roster, so this checker never actually emits one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    ForceClassViolation,
    ForceFriendSplit,
    ClassSizeOutOfRange,
    DanglingReference,
    /// CP-only: the solver reported the model itself has no feasible
    /// solution (see `crate::optimizer::cp`), as opposed to a constraint
    /// breach found in an already-materialized assignment.
    Infeasible,
}

/// One instance of a violated hard constraint: which kind, and which
/// student IDs are involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub offending_ids: Vec<String>,
}

/// Enforces the two hard constraints every move must respect:
/// `force_class` pins a student to one class, `force_friend` requires
/// every student sharing a token to share a class. Built once from the
/// roster's `force_class`/`force_friend` fields, which never change for
/// the duration of a run.
#[derive(Debug, Clone)]
pub struct ConstraintChecker {
    forced_class: HashMap<String, String>,
    friend_groups: HashMap<String, Vec<String>>,
}

impl ConstraintChecker {
    pub fn new(school: &SchoolData) -> Self {
        let mut forced_class = HashMap::new();
        let mut friend_groups: HashMap<String, Vec<String>> = HashMap::new();

        for student in school.students.values() {
            if let Some(class_id) = &student.force_class {
                forced_class.insert(student.id.clone(), class_id.clone());
            }
            if let Some(token) = &student.force_friend {
                friend_groups.entry(token.clone()).or_default().push(student.id.clone());
            }
        }
        for group in friend_groups.values_mut() {
            group.sort();
        }

        ConstraintChecker {
            forced_class,
            friend_groups,
        }
    }

    /// The set of students that must move together with `student_id` — the
    /// whole `force_friend` group if it has one, otherwise just the student
    /// itself. Every move operator moves a unit, never a lone member of a
    /// multi-student group.
    pub fn movable_unit(&self, student_id: &str) -> Vec<String> {
        for group in self.friend_groups.values() {
            if group.iter().any(|id| id == student_id) {
                return group.clone();
            }
        }
        vec![student_id.to_string()]
    }

    /// Whether `unit` (as returned by [`Self::movable_unit`]) may be placed
    /// in `target_class`. False if any member is `force_class`-pinned to a
    /// different class.
    pub fn can_move_to(&self, unit: &[String], target_class: &str) -> bool {
        unit.iter()
            .all(|id| self.forced_class.get(id).map_or(true, |c| c == target_class))
    }

    pub fn has_force_class(&self, student_id: &str) -> bool {
        self.forced_class.contains_key(student_id)
    }

    pub fn forced_class(&self, student_id: &str) -> Option<&str> {
        self.forced_class.get(student_id).map(String::as_str)
    }

    /// Checks `school` against both hard constraints and returns every
    /// breach found. Called once on the initial state and once on the
    /// final state of an optimization run (see `crate::optimizer::OptimizationResult`);
    /// an empty result means `constraints_satisfied` holds.
    pub fn violations(&self, school: &SchoolData) -> Vec<Violation> {
        let mut violations = Vec::new();

        for (student_id, required_class) in &self.forced_class {
            if let Some(student) = school.get_student(student_id) {
                if &student.class_id != required_class {
                    violations.push(Violation {
                        kind: ViolationKind::ForceClassViolation,
                        offending_ids: vec![student_id.clone()],
                    });
                }
            }
        }

        for group in self.friend_groups.values() {
            let classes: std::collections::HashSet<&str> = group
                .iter()
                .filter_map(|id| school.get_student(id))
                .map(|s| s.class_id.as_str())
                .collect();
            if classes.len() > 1 {
                violations.push(Violation {
                    kind: ViolationKind::ForceFriendSplit,
                    offending_ids: group.clone(),
                });
            }
        }

        violations
    }

    /// Checks every class's size against `target ± tolerance`, the hard
    /// bound CP search (`crate::optimizer::cp`) imposes but the other two
    /// strategies do not.
    pub fn size_violations(&self, school: &SchoolData, target: usize, tolerance: usize) -> Vec<Violation> {
        let mut violations = Vec::new();
        for class in school.non_empty_classes() {
            let size = class.size();
            let (lo, hi) = (target.saturating_sub(tolerance), target + tolerance);
            if size < lo || size > hi {
                let mut ids: Vec<String> = class.student_ids.iter().cloned().collect();
                ids.sort();
                violations.push(Violation {
                    kind: ViolationKind::ClassSizeOutOfRange,
                    offending_ids: ids,
                });
            }
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Gender, Rank, Student};

    fn student(id: &str, class_id: &str, force_class: Option<&str>, force_friend: Option<&str>) -> Student {
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
            force_friend: force_friend.map(str::to_string),
        }
    }

    #[test]
    fn movable_unit_is_the_whole_friend_group() {
        let school = SchoolData::from_students(vec![
            student("100000001", "A", None, Some("g1")),
            student("100000002", "A", None, Some("g1")),
            student("100000003", "B", None, None),
        ]);
        let checker = ConstraintChecker::new(&school);
        let mut unit = checker.movable_unit("100000001");
        unit.sort();
        assert_eq!(unit, vec!["100000001".to_string(), "100000002".to_string()]);
        assert_eq!(checker.movable_unit("100000003"), vec!["100000003".to_string()]);
    }

    #[test]
    fn force_class_blocks_moves_to_other_classes() {
        let school = SchoolData::from_students(vec![student("100000001", "A", Some("A"), None)]);
        let checker = ConstraintChecker::new(&school);
        assert!(checker.can_move_to(&["100000001".to_string()], "A"));
        assert!(!checker.can_move_to(&["100000001".to_string()], "B"));
    }

    #[test]
    fn violations_empty_for_a_satisfied_assignment() {
        let school = SchoolData::from_students(vec![
            student("100000001", "A", Some("A"), Some("g1")),
            student("100000002", "A", None, Some("g1")),
        ]);
        let checker = ConstraintChecker::new(&school);
        assert!(checker.violations(&school).is_empty());
    }

    #[test]
    fn detects_force_class_violation() {
        let mut school = SchoolData::from_students(vec![student("100000001", "A", Some("B"), None)]);
        school.reassign("100000001", "A");
        let checker = ConstraintChecker::new(&school);
        let violations = checker.violations(&school);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::ForceClassViolation);
    }

    #[test]
    fn detects_force_friend_split() {
        let school = SchoolData::from_students(vec![
            student("100000001", "A", None, Some("g1")),
            student("100000002", "B", None, Some("g1")),
        ]);
        let checker = ConstraintChecker::new(&school);
        let violations = checker.violations(&school);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::ForceFriendSplit);
    }

    #[test]
    fn detects_class_size_out_of_range() {
        let school = SchoolData::from_students(vec![
            student("100000001", "A", None, None),
            student("100000002", "A", None, None),
            student("100000003", "A", None, None),
        ]);
        let checker = ConstraintChecker::new(&school);
        let violations = checker.size_violations(&school, 1, 0);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::ClassSizeOutOfRange);
    }
}
