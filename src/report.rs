use std::collections::BTreeMap;
use std::io::{self, Write};
use std::time::Duration;

use crate::error::{AnalyzerError, Result};
use crate::keys::RunKey;
use crate::metrics;
use crate::scan::{HittingSetLogs, ScanData, WspdLogs};

/// Writes the percentile-crossing table: for every run, how many hitters were
/// picked while coverage was still below each threshold.
pub fn write_percentile_table(
    out: &mut impl Write,
    hs: &HittingSetLogs,
    curves: &BTreeMap<RunKey, Vec<f64>>,
) -> Result<()> {
    writeln!(out, "%hitter:")?;
    writeln!(out, r"d & $\epsilon$ & 90\% & 95\% & 99\% & 99.9\% & 99.99\% & 99.999\% \\")?;
    writeln!(out, r"\hline")?;
    for key in hs.num_paths.keys() {
        let curve = curves.get(key).ok_or_else(|| AnalyzerError::MissingKey {
            key: key.to_string(),
            context: "coverage curve",
        })?;
        write!(out, "{} & {}", key.d, key.eps)?;
        for count in metrics::crossing_counts(curve) {
            write!(out, " & {count}")?;
        }
        writeln!(out, r" \\")?;
    }
    Ok(())
}

/// Writes the combined results table: path count, hitting-set size, lower
/// bound, total runtime (WSPD build plus solve, in minutes) and covering
/// error, one row per run with hitting-set data.
pub fn write_results_table(
    out: &mut impl Write,
    wspd: &WspdLogs,
    hs: &HittingSetLogs,
) -> Result<()> {
    writeln!(out, "hittingset results.")?;
    writeln!(
        out,
        r"d & $\epsilon$ & Paths & Hitting Set & Lower Bound & Runtime & Covering Error \\"
    )?;
    writeln!(out, r"\hline")?;

    for (key, &paths) in &hs.num_paths {
        let hs_size = lookup(hs.hs_size.get(key), key, "hs size")?;
        let lower_bound = lookup(hs.lower_bound.get(key), key, "lower bound")?;
        let solve = lookup(hs.solve_time.get(key), key, "hitting-set duration")?;
        let covering = lookup(wspd.covering_error.get(key), key, "covering error")?;
        // a run may have no recorded build time at all; that counts as zero
        let build = wspd.build_time.get(key).copied().unwrap_or(Duration::ZERO);
        let minutes = ((build + solve).as_secs_f64() / 60.0).round() as u64;

        writeln!(
            out,
            r"{} & {} & ${:.0} * 10^6$ & {} & {} & {} min & {} \\",
            key.d,
            key.eps,
            paths as f64 / 1e6,
            hs_size,
            lower_bound,
            minutes,
            covering,
        )?;
    }
    Ok(())
}

/// Prints both tables to stdout.
pub fn print_reports(data: &ScanData, curves: &BTreeMap<RunKey, Vec<f64>>) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_percentile_table(&mut out, &data.hitting_set, curves)?;
    writeln!(out)?;
    write_results_table(&mut out, &data.wspd, &data.hitting_set)?;
    Ok(())
}

fn lookup<T: Copy>(value: Option<&T>, key: &RunKey, context: &'static str) -> Result<T> {
    value.copied().ok_or_else(|| AnalyzerError::MissingKey {
        key: key.to_string(),
        context,
    })
}
