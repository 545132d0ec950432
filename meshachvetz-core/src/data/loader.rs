//! CSV roster ingestion.
//!
//! Deserializes one row per student into a [`RawRow`] of plain strings (the
//! same shape-first-parse-after approach as the csv crate's other common
//! callers), validates and type-converts each field, imputes the two kinds
//! of missing value the format allows (`academic_score` by column mean,
//! `behavior_rank`/`studentiality_rank` by column mode), and drops any peer
//! reference that doesn't resolve to a student in the same file.

use crate::domain::{is_valid_id, Gender, Rank, SchoolData, Student};
use crate::error::{MeshachvetzError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RawRow {
    student_id: String,
    first_name: String,
    last_name: String,
    gender: String,
    class_id: String,
    academic_score: String,
    behavior_rank: String,
    studentiality_rank: String,
    assistance_package: String,
    preferred_friends: String,
    disliked_peers: String,
    force_class: String,
    force_friend: String,
}

/// Counts (and, where anything was imputed, the value used) of every value
/// this loader changed or dropped on the way in. Surfaced to the caller so
/// `meshachvetz validate`/`score` can report it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImputationSummary {
    pub academic_score_imputed: usize,
    /// The column mean used to fill missing `academic_score` values.
    /// `None` when nothing was imputed.
    pub academic_score_imputed_value: Option<f64>,
    pub behavior_rank_imputed: usize,
    /// The column mode used to fill missing `behavior_rank` values.
    pub behavior_rank_imputed_value: Option<Rank>,
    pub studentiality_rank_imputed: usize,
    /// The column mode used to fill missing `studentiality_rank` values.
    pub studentiality_rank_imputed_value: Option<Rank>,
    pub dangling_references_dropped: usize,
}

/// The result of a successful load: the roster plus a record of anything
/// the loader had to fix up.
#[derive(Debug, Clone)]
pub struct LoadedRoster {
    pub school: SchoolData,
    pub summary: ImputationSummary,
}

struct PartialStudent {
    id: String,
    first_name: String,
    last_name: String,
    gender: Gender,
    class_id: String,
    academic_score: Option<f64>,
    behavior_rank: Option<Rank>,
    studentiality_rank: Option<Rank>,
    assistance_package: bool,
    preferred_friends: Vec<String>,
    disliked_peers: Vec<String>,
    force_class: Option<String>,
    force_friend: Option<String>,
}

/// Loads a roster from a CSV file at `path`. See the module documentation
/// for the imputation and reference-dropping rules applied.
pub fn load_csv(path: impl AsRef<Path>) -> Result<LoadedRoster> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut partials = Vec::new();
    for result in reader.deserialize() {
        let raw: RawRow = result?;
        partials.push(parse_row(raw)?);
    }

    if partials.is_empty() {
        return Err(MeshachvetzError::Validation(
            "roster is empty: no student rows found".to_string(),
        ));
    }

    let mut seen_ids: HashMap<String, ()> = HashMap::with_capacity(partials.len());
    for p in &partials {
        if seen_ids.insert(p.id.clone(), ()).is_some() {
            return Err(MeshachvetzError::Validation(format!(
                "duplicate student id {}",
                p.id
            )));
        }
    }

    let mut summary = ImputationSummary::default();
    impute_academic_score(&mut partials, &mut summary);
    impute_rank(&mut partials, &mut summary, true);
    impute_rank(&mut partials, &mut summary, false);

    let valid_ids: std::collections::HashSet<String> = partials.iter().map(|p| p.id.clone()).collect();
    let mut students: Vec<Student> = partials
        .into_iter()
        .map(|p| finish_student(p, &valid_ids, &mut summary))
        .collect();
    students.iter_mut().for_each(Student::dedupe_peer_lists);

    if summary.dangling_references_dropped > 0 {
        log::warn!(
            "dropped {} dangling peer reference(s) while loading {}",
            summary.dangling_references_dropped,
            path.display()
        );
    }

    Ok(LoadedRoster {
        school: SchoolData::from_students(students),
        summary,
    })
}

fn parse_row(raw: RawRow) -> Result<PartialStudent> {
    if !is_valid_id(raw.student_id.trim()) {
        return Err(MeshachvetzError::Validation(format!(
            "student_id '{}' must be exactly 9 digits",
            raw.student_id
        )));
    }
    if raw.first_name.trim().is_empty() || raw.last_name.trim().is_empty() {
        return Err(MeshachvetzError::Validation(format!(
            "student {} is missing a first or last name",
            raw.student_id
        )));
    }
    if raw.class_id.trim().is_empty() {
        return Err(MeshachvetzError::Validation(format!(
            "student {} is missing a class_id",
            raw.student_id
        )));
    }
    let gender = raw
        .gender
        .trim()
        .parse::<Gender>()
        .map_err(|e| MeshachvetzError::Validation(format!("student {}: {e}", raw.student_id)))?;

    let academic_score = parse_optional(&raw.academic_score, |s| {
        s.parse::<f64>()
            .map_err(|_| format!("academic_score '{s}' is not a number"))
    })
    .map_err(|e| MeshachvetzError::Validation(format!("student {}: {e}", raw.student_id)))?;

    let behavior_rank = parse_optional(&raw.behavior_rank, |s| s.parse::<Rank>())
        .map_err(|e| MeshachvetzError::Validation(format!("student {}: {e}", raw.student_id)))?;
    let studentiality_rank = parse_optional(&raw.studentiality_rank, |s| s.parse::<Rank>())
        .map_err(|e| MeshachvetzError::Validation(format!("student {}: {e}", raw.student_id)))?;

    let assistance_package = parse_bool(&raw.assistance_package);

    Ok(PartialStudent {
        id: raw.student_id.trim().to_string(),
        first_name: raw.first_name.trim().to_string(),
        last_name: raw.last_name.trim().to_string(),
        gender,
        class_id: raw.class_id.trim().to_string(),
        academic_score,
        behavior_rank,
        studentiality_rank,
        assistance_package,
        preferred_friends: split_ids(&raw.preferred_friends),
        disliked_peers: split_ids(&raw.disliked_peers),
        force_class: non_empty(&raw.force_class),
        force_friend: non_empty(&raw.force_friend),
    })
}

fn parse_optional<T>(raw: &str, parse: impl FnOnce(&str) -> std::result::Result<T, String>) -> std::result::Result<Option<T>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        parse(trimmed).map(Some)
    }
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn split_ids(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Fills every missing `academic_score` with the mean of the present
/// values in the same file. A roster with no present values at all leaves
/// every missing score at 0.0 — there is nothing to average.
fn impute_academic_score(partials: &mut [PartialStudent], summary: &mut ImputationSummary) {
    let (sum, count) = partials
        .iter()
        .filter_map(|p| p.academic_score)
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    let mean = if count == 0 { 0.0 } else { sum / count as f64 };

    for p in partials.iter_mut() {
        if p.academic_score.is_none() {
            p.academic_score = Some(mean);
            summary.academic_score_imputed += 1;
        }
    }
    if summary.academic_score_imputed > 0 {
        summary.academic_score_imputed_value = Some(mean);
    }
}

/// Fills every missing rank with the column's modal value. Ties are broken
/// toward the alphabetically-earlier (and so numerically better) rank:
/// `A` beats `B` beats `C` beats `D` when counts are equal.
fn impute_rank(partials: &mut [PartialStudent], summary: &mut ImputationSummary, behavior: bool) {
    let mut counts: HashMap<Rank, usize> = HashMap::new();
    for p in partials.iter() {
        let value = if behavior { p.behavior_rank } else { p.studentiality_rank };
        if let Some(rank) = value {
            *counts.entry(rank).or_insert(0) += 1;
        }
    }

    let mode = Rank::all()
        .into_iter()
        .max_by_key(|r| (counts.get(r).copied().unwrap_or(0), std::cmp::Reverse(*r)))
        .filter(|r| counts.get(r).copied().unwrap_or(0) > 0)
        .unwrap_or(Rank::B);

    let mut imputed_any = false;
    for p in partials.iter_mut() {
        let slot = if behavior { &mut p.behavior_rank } else { &mut p.studentiality_rank };
        if slot.is_none() {
            *slot = Some(mode);
            imputed_any = true;
            if behavior {
                summary.behavior_rank_imputed += 1;
            } else {
                summary.studentiality_rank_imputed += 1;
            }
        }
    }
    if imputed_any {
        if behavior {
            summary.behavior_rank_imputed_value = Some(mode);
        } else {
            summary.studentiality_rank_imputed_value = Some(mode);
        }
    }
}

fn finish_student(p: PartialStudent, valid_ids: &std::collections::HashSet<String>, summary: &mut ImputationSummary) -> Student {
    let drop_dangling = |ids: Vec<String>, summary: &mut ImputationSummary| -> Vec<String> {
        ids.into_iter()
            .filter(|id| {
                let keep = valid_ids.contains(id);
                if !keep {
                    summary.dangling_references_dropped += 1;
                }
                keep
            })
            .collect()
    };

    let preferred_friends = drop_dangling(p.preferred_friends, summary);
    let disliked_peers = drop_dangling(p.disliked_peers, summary);

    Student {
        id: p.id,
        first_name: p.first_name,
        last_name: p.last_name,
        gender: p.gender,
        class_id: p.class_id,
        academic_score: p.academic_score.unwrap_or(0.0),
        behavior_rank: p.behavior_rank.unwrap_or(Rank::B),
        studentiality_rank: p.studentiality_rank.unwrap_or(Rank::B),
        assistance_package: p.assistance_package,
        preferred_friends,
        disliked_peers,
        force_class: p.force_class,
        force_friend: p.force_friend,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const HEADER: &str = "student_id,first_name,last_name,gender,class_id,academic_score,behavior_rank,studentiality_rank,assistance_package,preferred_friends,disliked_peers,force_class,force_friend\n";

    #[test]
    fn loads_a_minimal_roster() {
        let file = write_csv(&format!(
            "{HEADER}100000001,Alice,Smith,F,A,90,A,A,false,,,, \n100000002,Bob,Jones,M,A,80,B,B,false,,,,\n"
        ));
        let loaded = load_csv(file.path()).unwrap();
        assert_eq!(loaded.school.total_students(), 2);
        assert_eq!(loaded.summary.academic_score_imputed, 0);
    }

    #[test]
    fn imputes_missing_academic_score_with_column_mean() {
        let file = write_csv(&format!(
            "{HEADER}100000001,Alice,Smith,F,A,80,A,A,false,,,,\n100000002,Bob,Jones,M,A,,A,A,false,,,,\n100000003,Carl,King,M,A,100,A,A,false,,,,\n"
        ));
        let loaded = load_csv(file.path()).unwrap();
        assert_eq!(loaded.summary.academic_score_imputed, 1);
        assert_eq!(loaded.summary.academic_score_imputed_value, Some(90.0));
        let bob = loaded.school.get_student("100000002").unwrap();
        assert_eq!(bob.academic_score, 90.0);
    }

    #[test]
    fn imputes_missing_rank_with_alphabetically_earlier_mode_on_tie() {
        let file = write_csv(&format!(
            "{HEADER}100000001,Alice,Smith,F,A,80,A,A,false,,,,\n100000002,Bob,Jones,M,A,80,B,A,false,,,,\n100000003,Carl,King,M,A,80,,A,false,,,,\n"
        ));
        let loaded = load_csv(file.path()).unwrap();
        assert_eq!(loaded.summary.behavior_rank_imputed, 1);
        assert_eq!(loaded.summary.behavior_rank_imputed_value, Some(Rank::A));
        assert_eq!(
            loaded.school.get_student("100000003").unwrap().behavior_rank,
            Rank::A
        );
    }

    #[test]
    fn drops_dangling_peer_references() {
        let file = write_csv(&format!(
            "{HEADER}100000001,Alice,Smith,F,A,80,A,A,false,999999999,,,\n"
        ));
        let loaded = load_csv(file.path()).unwrap();
        assert_eq!(loaded.summary.dangling_references_dropped, 1);
        assert!(loaded
            .school
            .get_student("100000001")
            .unwrap()
            .preferred_friends
            .is_empty());
    }

    #[test]
    fn rejects_duplicate_student_ids() {
        let file = write_csv(&format!(
            "{HEADER}100000001,Alice,Smith,F,A,80,A,A,false,,,,\n100000001,Bob,Jones,M,A,80,A,A,false,,,,\n"
        ));
        assert!(load_csv(file.path()).is_err());
    }

    #[test]
    fn rejects_malformed_student_id() {
        let file = write_csv(&format!("{HEADER}12,Alice,Smith,F,A,80,A,A,false,,,,\n"));
        assert!(load_csv(file.path()).is_err());
    }
}
