//! School-layer scoring: how evenly academic ability, behavior, size, and
//! assistance-package load are spread across classes.
//!
//! Each sub-metric is the population standard deviation of a per-class
//! aggregate, turned into a 0-100 score by
//! `max(0, 100 - stddev * normalization_factor)` — the normalization
//! factor is a σ-to-penalty multiplier, not a divisor. A school with a
//! single class (stddev always 0) scores 100 on every sub-metric — there's
//! nothing left to balance.

use crate::config::{Config, SchoolWeights};
use crate::domain::SchoolData;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchoolScore {
    pub academic_score: f64,
    pub behavior_score: f64,
    pub size_score: f64,
    pub assistance_score: f64,
    pub total: f64,
    /// The raw population standard deviations each sub-score above was
    /// normalized from, kept for report writers (`crate::reports`) that
    /// want to show the underlying spread, not just its 0-100 score.
    pub academic_stddev: f64,
    pub behavior_stddev: f64,
    pub size_stddev: f64,
    pub assistance_stddev: f64,
}

pub fn score_school(school: &SchoolData, config: &Config) -> SchoolScore {
    let classes: Vec<_> = school.non_empty_classes().collect();

    let academic_means: Vec<f64> = classes
        .iter()
        .map(|c| c.mean_academic_score(&school.students))
        .collect();
    let behavior_means: Vec<f64> = classes
        .iter()
        .map(|c| c.mean_behavior_rank(&school.students))
        .collect();
    let sizes: Vec<f64> = classes.iter().map(|c| c.size() as f64).collect();
    let assistance_counts: Vec<f64> = classes
        .iter()
        .map(|c| c.assistance_count(&school.students) as f64)
        .collect();

    let norm = &config.normalization;
    let academic_stddev = population_stddev(&academic_means);
    let behavior_stddev = population_stddev(&behavior_means);
    let size_stddev = population_stddev(&sizes);
    let assistance_stddev = population_stddev(&assistance_counts);

    let academic_score = normalize(academic_stddev, norm.academic_factor);
    let behavior_score = normalize(behavior_stddev, norm.behavior_factor);
    let size_score = normalize(size_stddev, norm.size_factor);
    let assistance_score = normalize(assistance_stddev, norm.assistance_factor);

    let total = weighted_total(
        academic_score,
        behavior_score,
        size_score,
        assistance_score,
        &config.school_weights,
    );

    SchoolScore {
        academic_score,
        behavior_score,
        size_score,
        assistance_score,
        total,
        academic_stddev,
        behavior_stddev,
        size_stddev,
        assistance_stddev,
    }
}

fn normalize(stddev: f64, factor: f64) -> f64 {
    (100.0 - stddev * factor).max(0.0)
}

fn weighted_total(academic: f64, behavior: f64, size: f64, assistance: f64, weights: &SchoolWeights) -> f64 {
    academic * weights.academic + behavior * weights.behavior + size * weights.size + assistance * weights.assistance
}

/// Population (not sample) standard deviation — divides by `n`, not `n-1`.
/// A single-class school has `n=1`, stddev 0, and scores 100 on every
/// sub-metric rather than being undefined.
fn population_stddev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
