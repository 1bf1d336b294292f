use std::collections::BTreeMap;

use crate::constants::{COVERAGE_THRESHOLDS, GEOM_ERROR_SCALE};
use crate::error::{AnalyzerError, Result};
use crate::keys::RunKey;
use crate::scan::{HittingSetLogs, Iteration, WspdLogs};

/// Mean geometric error per `(d, ε)`, in percent of the covered point pairs.
///
/// The sampled per-depth error weights are scaled to an expected
/// full-population count first (only 1% of cell pairs were checked), then
/// normalized by the run's point-pair count and averaged over the depths that
/// reported errors.
pub fn mean_geom_error_percent(logs: &WspdLogs) -> Result<BTreeMap<RunKey, f64>> {
    let mut out = BTreeMap::new();
    for (key, hist) in &logs.geom_errors_by_depth {
        if hist.is_empty() {
            continue;
        }
        let &pairs = logs.point_pairs.get(key).ok_or_else(|| AnalyzerError::MissingKey {
            key: key.to_string(),
            context: "point pair count",
        })?;
        let mean = hist
            .values()
            .map(|&count| count as f64 * GEOM_ERROR_SCALE / pairs as f64 * 100.0)
            .sum::<f64>()
            / hist.len() as f64;
        out.insert(*key, mean);
    }
    Ok(out)
}

/// Cumulative share of the total path weight hit after each iteration, in
/// percent. Non-decreasing and within `[0, 100]` for well-formed input.
pub fn coverage_curve(iterations: &[Iteration], sum_path_weights: u64) -> Vec<f64> {
    let mut hit = 0u64;
    iterations
        .iter()
        .map(|it| {
            hit += it.weighted_hit_pairs;
            hit as f64 / sum_path_weights as f64 * 100.0
        })
        .collect()
}

/// One coverage curve per `(d, ε)`.
pub fn coverage_curves(logs: &HittingSetLogs) -> Result<BTreeMap<RunKey, Vec<f64>>> {
    let mut out = BTreeMap::new();
    for (key, iterations) in &logs.iterations {
        let &weights = logs
            .sum_path_weights
            .get(key)
            .ok_or_else(|| AnalyzerError::MissingKey {
                key: key.to_string(),
                context: "sum of path weights",
            })?;
        out.insert(*key, coverage_curve(iterations, weights));
    }
    Ok(out)
}

/// For each coverage threshold, the number of iterations whose cumulative
/// coverage stays strictly below it. Approximates the hitting-set size needed
/// to reach the threshold, minus one.
pub fn crossing_counts(curve: &[f64]) -> [usize; COVERAGE_THRESHOLDS.len()] {
    let mut counts = [0usize; COVERAGE_THRESHOLDS.len()];
    for (slot, threshold) in counts.iter_mut().zip(COVERAGE_THRESHOLDS) {
        *slot = curve.iter().filter(|&&c| c < threshold).count();
    }
    counts
}
