pub mod hitting_set;
pub mod wspd;

use std::fs;
use std::path::Path;
use std::time::Duration;

use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AnalyzerError, Result};
use crate::keys::{Epsilon, RunKey};

pub use hitting_set::{HittingSetLogs, Iteration};
pub use wspd::WspdLogs;

/// Everything extracted from one directory of experiment logs. Built once by
/// [`scan_directory`] and read-only afterwards.
#[derive(Debug, Default)]
pub struct ScanData {
    pub wspd: WspdLogs,
    pub hitting_set: HittingSetLogs,
}

/// Scans `dir` for log files of the dataset `name` and parses every match.
///
/// WSPD runs are named `{name}_d<digits>_e<digits>.txt`, hitting-set runs
/// `{name}_hs_d<digits>_e<digits>.txt`. Files matching neither pattern are
/// silently skipped; a matching file that fails to parse aborts the scan.
pub fn scan_directory(dir: &Path, name: &str) -> Result<ScanData> {
    let wspd_file = Regex::new(&format!(r"^{}_d\d+_e\d+\.txt$", regex::escape(name)))?;
    let hs_file = Regex::new(&format!(r"^{}_hs_d(\d+)_e(\d+)\.txt$", regex::escape(name)))?;

    let mut data = ScanData::default();
    let mut matched = 0usize;

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        if let Some(caps) = hs_file.captures(file_name) {
            let d: u32 = caps[1]
                .parse()
                .map_err(|_| AnalyzerError::BadFileName(file_name.to_string()))?;
            let eps = Epsilon::from_suffix(&caps[2])?;
            debug!("hitting-set log: {}", path.display());
            hitting_set::parse_file(&path, RunKey::new(d, eps), &mut data.hitting_set)?;
            matched += 1;
        } else if wspd_file.is_match(file_name) {
            debug!("wspd log: {}", path.display());
            wspd::parse_file(&path, &mut data.wspd)?;
            matched += 1;
        }
    }

    info!(
        "scanned {} log files: {} wspd runs, {} hitting-set runs",
        matched,
        data.wspd.sizes.len(),
        data.hitting_set.num_paths.len()
    );
    Ok(data)
}

static DURATION_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*(ns|µs|us|ms|s)").unwrap());

/// Parses a `Duration` debug token such as `348.1683ms` or `2.5s`.
pub(crate) fn parse_duration(text: &str) -> Option<Duration> {
    let caps = DURATION_TOKEN.captures(text)?;
    let value: f64 = caps[1].parse().ok()?;
    let secs = match &caps[2] {
        "s" => value,
        "ms" => value / 1e3,
        "us" | "µs" => value / 1e6,
        "ns" => value / 1e9,
        _ => return None,
    };
    Some(Duration::from_secs_f64(secs))
}

pub(crate) fn parse_error(path: &Path, line: usize, reason: impl Into<String>) -> AnalyzerError {
    AnalyzerError::Parse {
        file: path.to_path_buf(),
        line,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("90.0s"), Some(Duration::from_secs(90)));
        assert_eq!(parse_duration("1.5ms"), Some(Duration::from_micros(1500)));
        assert_eq!(parse_duration("2µs"), Some(Duration::from_micros(2)));
        assert_eq!(parse_duration("250ns"), Some(Duration::from_nanos(250)));
        assert_eq!(parse_duration("no digits here"), None);
    }

    #[test]
    fn test_parse_duration_inside_log_line() {
        assert_eq!(
            parse_duration("wspd done. duration: 348.16ms"),
            Some(Duration::from_secs_f64(0.34816))
        );
    }

    #[test]
    fn test_scan_skips_foreign_file_names() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "germany_d5_e45.bak",
            "stgtregbz_d5_e45.txt",
            "notes.txt",
            "germany_d5e45.txt",
        ] {
            let mut f = fs::File::create(dir.path().join(name)).unwrap();
            writeln!(f, "this is not a log").unwrap();
        }

        let data = scan_directory(dir.path(), "germany").unwrap();
        assert!(data.wspd.sizes.is_empty());
        assert!(data.hitting_set.num_paths.is_empty());
    }

    #[test]
    fn test_scan_separates_wspd_and_hitting_set_runs() {
        let dir = tempfile::tempdir().unwrap();

        let mut f = fs::File::create(dir.path().join("germany_d5_e45.txt")).unwrap();
        writeln!(f, "running with d=5 and e=0.45").unwrap();
        writeln!(f, "wspd size: 77").unwrap();

        let mut f = fs::File::create(dir.path().join("germany_hs_d5_e10.txt")).unwrap();
        writeln!(f, "number of paths: 11").unwrap();

        let data = scan_directory(dir.path(), "germany").unwrap();
        let wspd_key = RunKey::new(5, Epsilon::from_suffix("45").unwrap());
        let hs_key = RunKey::new(5, Epsilon::from_suffix("10").unwrap());
        assert_eq!(data.wspd.sizes.get(&wspd_key), Some(&77));
        assert_eq!(data.hitting_set.num_paths.get(&hs_key), Some(&11));
    }

    #[test]
    fn test_hs_file_name_maps_e10_to_one() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = fs::File::create(dir.path().join("germany_hs_d9_e45.txt")).unwrap();
        writeln!(f, "number of paths: 3").unwrap();
        let mut f = fs::File::create(dir.path().join("germany_hs_d5_e10.txt")).unwrap();
        writeln!(f, "number of paths: 4").unwrap();

        let data = scan_directory(dir.path(), "germany").unwrap();
        let keys: Vec<RunKey> = data.hitting_set.num_paths.keys().copied().collect();
        assert_eq!(
            keys,
            vec![
                RunKey::new(5, Epsilon::from_thousandths(1000)),
                RunKey::new(9, Epsilon::from_thousandths(450)),
            ]
        );
    }
}
