//! Scoring and optimization configuration.
//!
//! One top-level, serde-serializable struct nesting the weight tables, the
//! optimizer's stop conditions and per-algorithm parameters, and a logging
//! verbosity knob. A `Config` is validated once at load time and then
//! shared behind an immutable reference for the rest of the run — nothing
//! downstream mutates it.

use crate::error::{MeshachvetzError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Relative weight of each of the three scoring layers. Must sum to 1.0
/// (within floating-point epsilon) — `Config::validate` enforces this.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct LayerWeights {
    pub student: f64,
    pub class: f64,
    pub school: f64,
}

impl Default for LayerWeights {
    fn default() -> Self {
        LayerWeights {
            student: 0.5,
            class: 0.2,
            school: 0.3,
        }
    }
}

/// Relative weight of the two student-layer sub-scores. Must sum to 1.0.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct StudentWeights {
    pub friends: f64,
    pub dislikes: f64,
}

impl Default for StudentWeights {
    fn default() -> Self {
        StudentWeights {
            friends: 0.7,
            dislikes: 0.3,
        }
    }
}

/// Relative weight of the four school-layer balance sub-metrics. Must sum
/// to 1.0.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct SchoolWeights {
    pub academic: f64,
    pub behavior: f64,
    pub size: f64,
    pub assistance: f64,
}

impl Default for SchoolWeights {
    fn default() -> Self {
        SchoolWeights {
            academic: 0.3,
            behavior: 0.3,
            size: 0.2,
            assistance: 0.2,
        }
    }
}

/// σ-to-penalty multipliers that turn each school sub-metric's raw standard
/// deviation into a 0-100 sub-score: `max(0, 100 - stddev * factor)`. Tune
/// these to the scale of the underlying quantity (a score stddev of 15 barely
/// dents a 0-100 academic scale at a small factor, but the same stddev on a
/// class-size scale needs a much larger factor to register as "bad").
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct NormalizationFactors {
    pub academic_factor: f64,
    pub behavior_factor: f64,
    pub size_factor: f64,
    pub assistance_factor: f64,
}

impl Default for NormalizationFactors {
    fn default() -> Self {
        // Each factor is a σ-to-penalty multiplier: score = max(0, 100 - σ * factor).
        NormalizationFactors {
            academic_factor: 100.0 / 15.0,
            behavior_factor: 100.0 / 1.0,
            size_factor: 100.0 / 3.0,
            assistance_factor: 100.0 / 2.0,
        }
    }
}

/// Which optimizer strategy to run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    LocalSearch,
    Genetic,
    OrTools,
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::LocalSearch
    }
}

impl std::str::FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "local-search" => Ok(Algorithm::LocalSearch),
            "genetic" => Ok(Algorithm::Genetic),
            "or-tools" => Ok(Algorithm::OrTools),
            other => Err(format!(
                "unknown algorithm '{other}', expected one of local-search, genetic, or-tools"
            )),
        }
    }
}

/// Stop conditions and the seed shared by every optimizer strategy.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct OptimizerConfig {
    pub algorithm: Algorithm,
    pub max_iterations: u64,
    pub time_limit_seconds: u64,
    pub seed: u64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig {
            algorithm: Algorithm::default(),
            max_iterations: 10_000,
            time_limit_seconds: 60,
            seed: 42,
        }
    }
}

/// Parameters specific to the genetic algorithm strategy.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct GeneticParams {
    pub population_size: usize,
    pub mutation_rate: f64,
    pub tournament_size: usize,
    pub elitism: usize,
}

impl Default for GeneticParams {
    fn default() -> Self {
        GeneticParams {
            population_size: 100,
            mutation_rate: 0.05,
            tournament_size: 3,
            elitism: 2,
        }
    }
}

/// Parameters specific to the CP/MILP strategy: the surrogate linear
/// objective's coefficients, plus the target class size the balance term
/// is measured against.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct CpParams {
    pub target_class_size: usize,
    pub class_size_tolerance: usize,
    pub friend_weight: f64,
    pub conflict_penalty: f64,
    pub balance_weight: f64,
}

impl Default for CpParams {
    fn default() -> Self {
        CpParams {
            target_class_size: 25,
            class_size_tolerance: 2,
            friend_weight: 1.0,
            conflict_penalty: 2.0,
            balance_weight: 1.0,
        }
    }
}

/// Progress-logging verbosity. See `crate::optimizer::progress` for the
/// emission table each level gates.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Minimal,
    Normal,
    Detailed,
    Debug,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Normal
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "minimal" => Ok(LogLevel::Minimal),
            "normal" => Ok(LogLevel::Normal),
            "detailed" => Ok(LogLevel::Detailed),
            "debug" => Ok(LogLevel::Debug),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

/// The complete, validated configuration for one scoring or optimization
/// run. Constructed via [`Config::from_file`] or [`Config::default`], then
/// checked with [`Config::validate`] before use; nothing past that point
/// holds a `&mut Config`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub layer_weights: LayerWeights,
    pub student_weights: StudentWeights,
    pub school_weights: SchoolWeights,
    pub normalization: NormalizationFactors,
    pub conflict_penalty_multiplier: f64,
    pub optimizer: OptimizerConfig,
    pub genetic: GeneticParams,
    pub or_tools: CpParams,
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            layer_weights: LayerWeights::default(),
            student_weights: StudentWeights::default(),
            school_weights: SchoolWeights::default(),
            normalization: NormalizationFactors::default(),
            conflict_penalty_multiplier: 1.0,
            optimizer: OptimizerConfig::default(),
            genetic: GeneticParams::default(),
            or_tools: CpParams::default(),
            log_level: LogLevel::default(),
        }
    }
}

const WEIGHT_SUM_EPSILON: f64 = 1e-6;

impl Config {
    /// Loads a `Config` from a file, dispatching on extension: `.json`,
    /// `.yaml`/`.yml`, or `.toml`. Runs [`Config::validate`] before
    /// returning so callers never observe an un-validated configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&contents)?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)
                .map_err(|e| MeshachvetzError::Validation(format!("invalid YAML config: {e}")))?,
            Some("toml") => toml::from_str(&contents)
                .map_err(|e| MeshachvetzError::Validation(format!("invalid TOML config: {e}")))?,
            other => {
                return Err(MeshachvetzError::Config(format!(
                    "unrecognized config extension {other:?}, expected json, yaml, or toml"
                )))
            }
        };
        let config: Config = config;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every weight table sums to 1.0 (within epsilon) and that
    /// every numeric parameter is in range. Called by `from_file`; callers
    /// constructing a `Config` by hand (e.g. tests) should call this too
    /// before passing it to the scorer or optimizer.
    pub fn validate(&self) -> Result<()> {
        check_weight_sum(
            "layer_weights",
            &[
                self.layer_weights.student,
                self.layer_weights.class,
                self.layer_weights.school,
            ],
        )?;
        check_weight_sum(
            "student_weights",
            &[self.student_weights.friends, self.student_weights.dislikes],
        )?;
        check_weight_sum(
            "school_weights",
            &[
                self.school_weights.academic,
                self.school_weights.behavior,
                self.school_weights.size,
                self.school_weights.assistance,
            ],
        )?;

        if self.conflict_penalty_multiplier < 0.0 {
            return Err(MeshachvetzError::Config(
                "conflict_penalty_multiplier must be non-negative".to_string(),
            ));
        }
        if self.optimizer.max_iterations == 0 {
            return Err(MeshachvetzError::Config(
                "optimizer.max_iterations must be greater than zero".to_string(),
            ));
        }
        if self.genetic.population_size < 2 {
            return Err(MeshachvetzError::Config(
                "genetic.population_size must be at least 2".to_string(),
            ));
        }
        if self.genetic.elitism >= self.genetic.population_size {
            return Err(MeshachvetzError::Config(
                "genetic.elitism must be smaller than genetic.population_size".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.genetic.mutation_rate) {
            return Err(MeshachvetzError::Config(
                "genetic.mutation_rate must be between 0.0 and 1.0".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_weight_sum(name: &str, weights: &[f64]) -> Result<()> {
    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
        return Err(MeshachvetzError::Config(format!(
            "{name} must sum to 1.0, got {sum}"
        )));
    }
    Ok(())
}
