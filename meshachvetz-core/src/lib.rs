//! # meshachvetz-core: Scoring and Optimization Engine for Classroom Assignment
//!
//! This crate assigns students to classrooms so as to maximize a
//! configurable, multi-layer quality score subject to hard placement
//! constraints (`force_class`, `force_friend`). It provides:
//!
//! - [`domain`]: the roster data model (`Student`, `ClassData`, `SchoolData`).
//! - [`config`]: typed, validated weights and algorithm parameters.
//! - [`scorer`]: the three-layer weighted scoring kernel — pure, deterministic.
//! - [`optimizer`]: three interchangeable search strategies (local search,
//!   genetic, CP/MILP) sharing one assignment representation and
//!   constraint checker.
//! - [`data`]: CSV roster ingestion with missing-value imputation.
//! - [`reports`]: text/JSON report writers over a `ScoringResult`/`OptimizationResult`.
//! - [`error`]: the crate's error taxonomy.
//!
//! ## Quick example
//!
//! ```no_run
//! use meshachvetz_core::config::Config;
//! use meshachvetz_core::data::load_csv;
//! use meshachvetz_core::{optimizer, scorer};
//!
//! let loaded = load_csv("roster.csv")?;
//! let config = Config::default();
//!
//! let initial = scorer::score(&loaded.school, &config);
//! println!("initial score: {:.2}", initial.final_score);
//!
//! let result = optimizer::optimize(&loaded.school, &config)?;
//! println!("optimized score: {:.2}", result.score.final_score);
//! # Ok::<(), meshachvetz_core::error::MeshachvetzError>(())
//! ```

pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod optimizer;
pub mod reports;
pub mod scorer;
