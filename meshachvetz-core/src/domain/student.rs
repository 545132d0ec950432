//! Student identity and the two ordinal ranks used by the scorer.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A student's gender, as used by the class-balance scorer.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "M" | "m" => Ok(Gender::Male),
            "F" | "f" => Ok(Gender::Female),
            other => Err(format!("invalid gender '{other}', expected 'M' or 'F'")),
        }
    }
}

/// An ordinal rank on the four-letter scale used for both `behavior_rank`
/// and `studentiality_rank`. `A` is best, `D` is worst.
///
/// # Example
///
/// ```
/// use meshachvetz_core::domain::Rank;
///
/// assert_eq!(Rank::A.as_numeric(), 1);
/// assert_eq!(Rank::D.as_numeric(), 4);
/// assert!(Rank::A < Rank::D);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    A,
    B,
    C,
    D,
}

impl Rank {
    /// Maps the ordinal letter to the numeric scale `{A=1, B=2, C=3, D=4}`
    /// used when computing behavior/studentiality variance for the school
    /// balance sub-metrics.
    pub fn as_numeric(self) -> u8 {
        match self {
            Rank::A => 1,
            Rank::B => 2,
            Rank::C => 3,
            Rank::D => 4,
        }
    }

    /// All four ranks in best-to-worst order, used for deterministic mode
    /// tie-breaking during missing-value imputation.
    pub fn all() -> [Rank; 4] {
        [Rank::A, Rank::B, Rank::C, Rank::D]
    }
}

impl std::str::FromStr for Rank {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(Rank::A),
            "B" | "b" => Ok(Rank::B),
            "C" | "c" => Ok(Rank::C),
            "D" | "d" => Ok(Rank::D),
            other => Err(format!("invalid rank '{other}', expected one of A, B, C, D")),
        }
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = match self {
            Rank::A => 'A',
            Rank::B => 'B',
            Rank::C => 'C',
            Rank::D => 'D',
        };
        write!(f, "{c}")
    }
}

/// A student's fixed identity plus the one mutable field, `class_id`.
///
/// Every field but `class_id` is set once by the loader and never changes
/// for the duration of a run; only the optimizer mutates `class_id`, and
/// always through `optimizer::Assignment`, never by touching a `Student`
/// directly.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Student {
    /// Nine-digit unique identifier.
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    /// Current class assignment. Mutated only by the optimizer.
    pub class_id: String,
    pub academic_score: f64,
    pub behavior_rank: Rank,
    pub studentiality_rank: Rank,
    pub assistance_package: bool,
    /// Up to 3 peer IDs, order-preserved, duplicates removed.
    pub preferred_friends: Vec<String>,
    /// Up to 5 peer IDs, order-preserved, duplicates removed.
    pub disliked_peers: Vec<String>,
    /// If set, the student must be assigned to this class in any valid
    /// assignment.
    pub force_class: Option<String>,
    /// If set, all students sharing this token must share a class.
    pub force_friend: Option<String>,
}

impl Student {
    /// Removes duplicate IDs from `preferred_friends`/`disliked_peers` while
    /// preserving the first occurrence's order. Called once by the loader;
    /// never needed again since the roster is fixed for the run.
    pub fn dedupe_peer_lists(&mut self) {
        dedupe_preserve_order(&mut self.preferred_friends);
        dedupe_preserve_order(&mut self.disliked_peers);
    }
}

fn dedupe_preserve_order(ids: &mut Vec<String>) {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.retain(|id| seen.insert(id.clone()));
}

/// Returns `true` if `id` is exactly 9 ASCII digits, per the roster's ID
/// format (student IDs and every peer reference).
pub fn is_valid_id(id: &str) -> bool {
    id.len() == 9 && id.bytes().all(|b| b.is_ascii_digit())
}
