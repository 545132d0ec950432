//! The roster data model: students, classes, and the school-wide view that
//! ties them together. These types carry no scoring or optimization logic
//! of their own — they are the shared representation every other module
//! (`crate::data`, `crate::scorer`, `crate::optimizer`) reads and writes.

mod class;
mod school;
mod student;

pub use class::ClassData;
pub use school::SchoolData;
pub use student::{is_valid_id, Gender, Rank, Student};
