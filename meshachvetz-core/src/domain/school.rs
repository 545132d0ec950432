//! The roster-wide view: every student and every class, kept in sync.

use super::class::ClassData;
use super::student::Student;
use std::collections::HashMap;

/// The complete state of one roster: every student by ID, every class by
/// ID. `SchoolData` is the value the scorer (`crate::scorer`) reads and the
/// optimizer (`crate::optimizer`) produces a new snapshot of per accepted
/// move.
#[derive(Debug, Clone, Default)]
pub struct SchoolData {
    pub students: HashMap<String, Student>,
    pub classes: HashMap<String, ClassData>,
}

impl SchoolData {
    pub fn new() -> Self {
        SchoolData::default()
    }

    /// Builds a `SchoolData` from a flat student list, deriving the class
    /// membership sets from each student's `class_id`. This is the shape
    /// the CSV loader (`crate::data::loader`) hands off after imputation.
    pub fn from_students(students: Vec<Student>) -> Self {
        let mut school = SchoolData::new();
        for student in students {
            school
                .classes
                .entry(student.class_id.clone())
                .or_insert_with(|| ClassData::new(student.class_id.clone()))
                .student_ids
                .insert(student.id.clone());
            school.students.insert(student.id.clone(), student);
        }
        school
    }

    pub fn get_student(&self, id: &str) -> Option<&Student> {
        self.students.get(id)
    }

    pub fn get_class(&self, class_id: &str) -> Option<&ClassData> {
        self.classes.get(class_id)
    }

    /// All non-empty classes, the population the class and school scorers
    /// iterate over (an empty class contributes nothing to either layer).
    pub fn non_empty_classes(&self) -> impl Iterator<Item = &ClassData> {
        self.classes.values().filter(|c| !c.is_empty())
    }

    pub fn total_students(&self) -> usize {
        self.students.len()
    }

    pub fn total_classes(&self) -> usize {
        self.classes.values().filter(|c| !c.is_empty()).count()
    }

    /// Moves a student to a different class, updating both the student's
    /// `class_id` and the two classes' membership sets. This is the only
    /// way a `class_id` should ever change outside of initial construction;
    /// the optimizer's move operators (`crate::optimizer::moves`) call
    /// through this rather than mutating fields directly, so the two
    /// representations (per-student and per-class) never drift apart.
    pub fn reassign(&mut self, student_id: &str, new_class_id: &str) -> bool {
        let Some(student) = self.students.get_mut(student_id) else {
            return false;
        };
        let old_class_id = student.class_id.clone();
        if old_class_id == new_class_id {
            return true;
        }
        student.class_id = new_class_id.to_string();

        if let Some(old_class) = self.classes.get_mut(&old_class_id) {
            old_class.student_ids.remove(student_id);
        }
        self.classes
            .entry(new_class_id.to_string())
            .or_insert_with(|| ClassData::new(new_class_id))
            .student_ids
            .insert(student_id.to_string());
        true
    }
}
