//! Crate-level invariants and literal end-to-end scenarios.
//!
//! The universally-quantified properties (determinism, purity, the [0,100]
//! range, non-regression) are checked with `proptest` over randomly
//! generated small rosters; properties that are easier to pin down with one
//! well-chosen example (weight monotonicity, constraint preservation, CSV
//! round-trip) are plain `#[test]`s, alongside the six literal end-to-end
//! scenarios.

use meshachvetz_core::config::{Algorithm, Config};
use meshachvetz_core::data::load_csv;
use meshachvetz_core::domain::{Gender, Rank, SchoolData, Student};
use meshachvetz_core::{optimizer, scorer};
use proptest::prelude::*;
use std::io::Write;

fn student_id(i: u32) -> String {
    format!("{:09}", 100_000_000 + i)
}

fn make_student(i: u32, class_id: &str, friends: &[u32], dislikes: &[u32]) -> Student {
    Student {
        id: student_id(i),
        first_name: "Student".to_string(),
        last_name: format!("{i}"),
        gender: if i % 2 == 0 { Gender::Male } else { Gender::Female },
        class_id: class_id.to_string(),
        academic_score: 50.0 + (i % 50) as f64,
        behavior_rank: Rank::all()[(i % 4) as usize],
        studentiality_rank: Rank::all()[(i % 4) as usize],
        assistance_package: i % 5 == 0,
        preferred_friends: friends.iter().map(|f| student_id(*f)).collect(),
        disliked_peers: dislikes.iter().map(|d| student_id(*d)).collect(),
        force_class: None,
        force_friend: None,
    }
}

/// A small strategy for generating a roster: 2-16 students, each randomly
/// placed in one of up to 4 classes, with small friend/dislike lists drawn
/// from the same pool of IDs.
fn roster_strategy() -> impl Strategy<Value = SchoolData> {
    (2usize..16).prop_flat_map(|n| {
        let class_choices = proptest::collection::vec(0u32..4, n);
        class_choices.prop_map(move |classes| {
            let students: Vec<Student> = (0..n as u32)
                .map(|i| {
                    let class = format!("C{}", classes[i as usize]);
                    let friend = (i + 1) % n as u32;
                    let dislike = (i + 2) % n as u32;
                    make_student(i, &class, &[friend], &[dislike])
                })
                .collect();
            SchoolData::from_students(students)
        })
    })
}

proptest! {
    /// Determinism: scoring the same roster against the same config twice
    /// yields bit-identical results.
    #[test]
    fn scoring_is_deterministic(school in roster_strategy()) {
        let config = Config::default();
        let a = scorer::score(&school, &config);
        let b = scorer::score(&school, &config);
        prop_assert_eq!(a.final_score, b.final_score);
        prop_assert_eq!(a.student_layer_score, b.student_layer_score);
        prop_assert_eq!(a.class_layer_score, b.class_layer_score);
        prop_assert_eq!(a.school_layer_score, b.school_layer_score);
    }

    /// Purity: scoring never mutates the roster it's given.
    #[test]
    fn scoring_does_not_mutate_its_input(school in roster_strategy()) {
        let before = school.clone();
        let config = Config::default();
        let _ = scorer::score(&school, &config);
        prop_assert_eq!(school.total_students(), before.total_students());
        for (id, student) in &before.students {
            prop_assert_eq!(&school.students[id].class_id, &student.class_id);
        }
    }

    /// Every score component stays within [0, 100].
    #[test]
    fn every_score_component_is_in_range(school in roster_strategy()) {
        let config = Config::default();
        let result = scorer::score(&school, &config);
        prop_assert!((0.0..=100.0).contains(&result.final_score));
        prop_assert!((0.0..=100.0).contains(&result.student_layer_score));
        prop_assert!((0.0..=100.0).contains(&result.class_layer_score));
        prop_assert!((0.0..=100.0).contains(&result.school_layer_score));
        for score in result.students.values() {
            prop_assert!((0.0..=100.0).contains(&score.total));
        }
    }

    /// Local search never returns a final score worse than the starting one.
    #[test]
    fn local_search_never_regresses(school in roster_strategy()) {
        let mut config = Config::default();
        config.optimizer.max_iterations = 50;
        config.optimizer.time_limit_seconds = 5;
        let starting = scorer::score(&school, &config).final_score;
        let result = optimizer::local_search::run(&school, &config).unwrap();
        prop_assert!(result.score.final_score >= starting - 1e-9);
    }
}

#[test]
fn increasing_a_layer_weight_toward_its_strongest_layer_raises_the_final_score() {
    // A roster where the student layer scores perfectly (every friend
    // preference satisfied) but the school layer is maximally imbalanced
    // (one huge class, one tiny one, wildly different academic means).
    let students = vec![
        make_student(0, "A", &[1], &[]),
        make_student(1, "A", &[0], &[]),
        make_student(2, "A", &[3], &[]),
        make_student(3, "A", &[2], &[]),
        Student {
            academic_score: 0.0,
            ..make_student(4, "B", &[], &[])
        },
    ];
    let school = SchoolData::from_students(students);

    let mut weighted_to_student = Config::default();
    weighted_to_student.layer_weights.student = 0.9;
    weighted_to_student.layer_weights.class = 0.05;
    weighted_to_student.layer_weights.school = 0.05;

    let mut weighted_to_school = Config::default();
    weighted_to_school.layer_weights.student = 0.05;
    weighted_to_school.layer_weights.class = 0.05;
    weighted_to_school.layer_weights.school = 0.9;

    let a = scorer::score(&school, &weighted_to_student).final_score;
    let b = scorer::score(&school, &weighted_to_school).final_score;
    assert!(a > b, "expected {a} > {b}: weighting toward the stronger layer should score higher");
}

#[test]
fn optimizer_never_violates_force_class_or_force_friend() {
    // Both constraints already hold in the starting assignment: local search
    // never proactively repairs a violation, it only ever refuses moves that
    // would *introduce* one (`ConstraintChecker::can_move_to`/`movable_unit`).
    // So the scenario worth guaranteeing is preservation, not correction.
    let students = vec![
        Student {
            force_class: Some("B".to_string()),
            ..make_student(0, "B", &[], &[])
        },
        Student {
            force_friend: Some("pair".to_string()),
            ..make_student(1, "A", &[], &[])
        },
        Student {
            force_friend: Some("pair".to_string()),
            ..make_student(2, "A", &[], &[])
        },
        make_student(3, "A", &[], &[]),
        make_student(4, "B", &[], &[]),
    ];
    let school = SchoolData::from_students(students);

    for algorithm in [Algorithm::LocalSearch, Algorithm::Genetic] {
        let mut config = Config::default();
        config.optimizer.algorithm = algorithm;
        config.optimizer.max_iterations = 30;
        config.optimizer.time_limit_seconds = 5;
        config.genetic.population_size = 10;
        config.genetic.elitism = 2;

        let result = optimizer::optimize(&school, &config).unwrap();
        assert!(result.constraints_satisfied, "{algorithm:?} produced a violation");
        assert_eq!(result.school.get_student(&student_id(0)).unwrap().class_id, "B");
        let class_1 = result.school.get_student(&student_id(1)).unwrap().class_id.clone();
        let class_2 = result.school.get_student(&student_id(2)).unwrap().class_id.clone();
        assert_eq!(class_1, class_2, "{algorithm:?} split a force_friend group");
    }
}

#[test]
fn csv_round_trips_a_roster_through_load_and_score() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(
        file,
        "student_id,first_name,last_name,gender,class_id,academic_score,behavior_rank,studentiality_rank,assistance_package,preferred_friends,disliked_peers,force_class,force_friend"
    )
    .unwrap();
    writeln!(file, "100000001,Alice,Smith,F,A,90,A,A,false,100000002,,,").unwrap();
    writeln!(file, "100000002,Bob,Jones,M,A,80,B,B,false,100000001,,,").unwrap();

    let loaded = load_csv(file.path()).unwrap();
    assert_eq!(loaded.school.total_students(), 2);
    assert_eq!(loaded.summary.academic_score_imputed, 0);

    let result = scorer::score(&loaded.school, &Config::default());
    assert_eq!(result.students[&student_id(1)].friends_score, 100.0);
}

#[test]
fn perfect_score_roster_scores_at_least_ninety_five() {
    // Two classes with matching gender split, academic mean, behavior mean,
    // studentiality mean, and assistance load, so every school sub-metric's
    // cross-class stddev is zero; every friend preference is mutual and
    // satisfied, and nobody dislikes anybody.
    fn student(i: u32, class_id: &str, gender: Gender, academic: f64, rank: Rank, friend: u32) -> Student {
        Student {
            gender,
            academic_score: academic,
            behavior_rank: rank,
            studentiality_rank: rank,
            ..make_student(i, class_id, &[friend], &[])
        }
    }

    let students = vec![
        student(0, "A", Gender::Male, 70.0, Rank::A, 1),
        student(1, "A", Gender::Female, 80.0, Rank::B, 0),
        student(2, "B", Gender::Male, 70.0, Rank::A, 3),
        student(3, "B", Gender::Female, 80.0, Rank::B, 2),
    ];
    let school = SchoolData::from_students(students);
    let result = scorer::score(&school, &Config::default());
    assert!(result.final_score >= 95.0, "expected >= 95, got {}", result.final_score);
}

#[test]
fn adversarial_roster_scores_at_most_twenty() {
    // Two classes of two, all-male (zero gender balance in both), each pair
    // mutually disliking their only classmate (zero dislikes score) and
    // wanting a friend who isn't on the roster (zero friends score), with
    // academic score, behavior, and assistance load maximally split across
    // the two classes.
    fn student(i: u32, class_id: &str, dislike: u32, academic: f64, rank: Rank, assistance: bool) -> Student {
        Student {
            gender: Gender::Male,
            academic_score: academic,
            behavior_rank: rank,
            studentiality_rank: rank,
            assistance_package: assistance,
            ..make_student(i, class_id, &[99], &[dislike])
        }
    }

    let students = vec![
        student(0, "A", 1, 100.0, Rank::D, true),
        student(1, "A", 0, 100.0, Rank::D, true),
        student(2, "B", 3, 0.0, Rank::A, false),
        student(3, "B", 2, 0.0, Rank::A, false),
    ];
    let school = SchoolData::from_students(students);
    let mut config = Config::default();
    config.conflict_penalty_multiplier = 1.0;
    let result = scorer::score(&school, &config);
    assert!(result.final_score <= 20.0, "expected <= 20, got {}", result.final_score);
}

#[test]
fn missing_values_are_imputed_with_an_exact_summary() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(
        file,
        "student_id,first_name,last_name,gender,class_id,academic_score,behavior_rank,studentiality_rank,assistance_package,preferred_friends,disliked_peers,force_class,force_friend"
    )
    .unwrap();
    writeln!(file, "100000001,Alice,Smith,F,A,80,A,A,false,,,,").unwrap();
    writeln!(file, "100000002,Bob,Jones,M,A,,B,,false,,,,").unwrap();
    writeln!(file, "100000003,Carl,King,M,A,100,,B,false,,,,").unwrap();

    let loaded = load_csv(file.path()).unwrap();
    assert_eq!(loaded.summary.academic_score_imputed, 1);
    assert_eq!(loaded.summary.behavior_rank_imputed, 1);
    assert_eq!(loaded.summary.studentiality_rank_imputed, 1);

    let bob = loaded.school.get_student("100000002").unwrap();
    assert_eq!(bob.academic_score, 90.0);
}

#[test]
fn local_search_is_deterministic_under_a_fixed_seed() {
    let students = vec![
        make_student(0, "A", &[2], &[]),
        make_student(1, "B", &[], &[]),
        make_student(2, "B", &[], &[]),
        make_student(3, "A", &[], &[]),
        make_student(4, "A", &[], &[]),
        make_student(5, "B", &[], &[]),
    ];
    let school = SchoolData::from_students(students);
    let mut config = Config::default();
    config.optimizer.seed = 42;
    config.optimizer.max_iterations = 100;

    let a = optimizer::local_search::run(&school, &config).unwrap();
    let b = optimizer::local_search::run(&school, &config).unwrap();
    assert_eq!(a.score.final_score, b.score.final_score);
    assert_eq!(a.iterations_run, b.iterations_run);
    assert_eq!(assignment_map(&a.school), assignment_map(&b.school));
}

#[test]
fn genetic_search_is_deterministic_under_a_fixed_seed() {
    let students = vec![
        make_student(0, "A", &[2], &[]),
        make_student(1, "B", &[], &[]),
        make_student(2, "B", &[], &[]),
        make_student(3, "A", &[], &[]),
        make_student(4, "A", &[], &[]),
        make_student(5, "B", &[], &[]),
    ];
    let school = SchoolData::from_students(students);
    let mut config = Config::default();
    config.optimizer.seed = 42;
    config.optimizer.max_iterations = 40;
    config.genetic.population_size = 12;

    let a = optimizer::genetic::run(&school, &config).unwrap();
    let b = optimizer::genetic::run(&school, &config).unwrap();
    assert_eq!(a.score.final_score, b.score.final_score);
    assert_eq!(assignment_map(&a.school), assignment_map(&b.school));
}

/// Sorted `student_id -> class_id` snapshot, for asserting two optimization
/// runs landed on the same partition rather than merely the same score.
fn assignment_map(school: &SchoolData) -> std::collections::BTreeMap<String, String> {
    school.students.values().map(|s| (s.id.clone(), s.class_id.clone())).collect()
}
