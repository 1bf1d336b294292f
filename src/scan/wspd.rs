use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{parse_duration, parse_error};
use crate::error::Result;
use crate::keys::{Epsilon, RunKey};

/// Everything extracted from the WSPD run logs, keyed by `(d, ε)`.
///
/// When several files report the same key, scalar fields take the last value
/// read; only `build_time` accumulates across files (reruns add time, the
/// counts are assumed identical).
#[derive(Debug, Default)]
pub struct WspdLogs {
    /// number of cell pairs in the decomposition
    pub sizes: BTreeMap<RunKey, u64>,
    /// number of point pairs covered by the decomposition
    pub point_pairs: BTreeMap<RunKey, u64>,
    /// covering error in percent
    pub covering_error: BTreeMap<RunKey, f64>,
    /// covered point pairs per quadtree depth
    pub point_pairs_by_depth: BTreeMap<RunKey, BTreeMap<u32, u64>>,
    /// sampled geometric-error weights per depth
    pub geom_errors_by_depth: BTreeMap<RunKey, BTreeMap<u32, u64>>,
    /// cell pairs per depth, index 0..=d
    pub cell_pairs_by_depth: BTreeMap<RunKey, Vec<u64>>,
    /// build time, summed over all `duration:` lines of all files for this key
    pub build_time: BTreeMap<RunKey, Duration>,
}

static RUNNING_WITH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^running with d=(\d+) and e=(\S+)").unwrap());
static WSPD_SIZE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^wspd size: (\d+)").unwrap());
static PAIR_COVERAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#pairs/#potential pairs: (\d+)/(\d+) \(Covering Error: (\d+(?:\.\d+)?)%\)")
        .unwrap()
});
static HIST_ENTRY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d+): (\d+),?\s*$").unwrap());
static LIST_ENTRY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d+),?\s*$").unwrap());

const POINT_PAIR_HIST_OPEN: &str = "#pairs per depth: {";
const GEOM_ERROR_HIST_OPEN: &str = "geometric error hist: {";
const CELL_HIST_OPEN: &str = "pair depth histogram: [";

/// Multi-line block the parser is currently inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    InPointPairHist,
    InGeomErrorHist,
    InCellHist,
}

/// Parses one WSPD analysis log into `logs`. The `(d, ε)` key comes from the
/// `running with` line inside the file.
pub(crate) fn parse_file(path: &Path, logs: &mut WspdLogs) -> Result<()> {
    let text = fs::read_to_string(path)?;
    parse_str(path, &text, logs)
}

fn parse_str(path: &Path, text: &str, logs: &mut WspdLogs) -> Result<()> {
    let mut parser = Parser {
        logs,
        path,
        key: None,
        state: State::Idle,
        cell_buf: Vec::new(),
    };
    for (idx, line) in text.lines().enumerate() {
        if !parser.line(idx + 1, line)? {
            // zero covered pairs: the depth histograms of this file would be
            // empty, skip the rest and move on to the next file
            break;
        }
    }
    Ok(())
}

struct Parser<'a> {
    logs: &'a mut WspdLogs,
    path: &'a Path,
    key: Option<RunKey>,
    state: State,
    cell_buf: Vec<u64>,
}

impl Parser<'_> {
    /// One transition per line. Returns `false` to stop reading this file.
    fn line(&mut self, no: usize, line: &str) -> Result<bool> {
        match self.state {
            State::Idle => self.idle_line(no, line),
            State::InPointPairHist | State::InGeomErrorHist => {
                self.hist_line(no, line)?;
                Ok(true)
            }
            State::InCellHist => {
                self.cell_line(no, line)?;
                Ok(true)
            }
        }
    }

    fn idle_line(&mut self, no: usize, line: &str) -> Result<bool> {
        if let Some(caps) = RUNNING_WITH.captures(line) {
            let d: u32 = caps[1]
                .parse()
                .map_err(|_| parse_error(self.path, no, format!("bad depth bound: {}", &caps[1])))?;
            let eps = Epsilon::parse(&caps[2])
                .ok_or_else(|| parse_error(self.path, no, format!("bad epsilon: {}", &caps[2])))?;
            self.key = Some(RunKey::new(d, eps));
            return Ok(true);
        }

        if line.contains("duration:") {
            let dur = parse_duration(line)
                .ok_or_else(|| parse_error(self.path, no, "malformed duration"))?;
            let key = self.key(no)?;
            *self.logs.build_time.entry(key).or_insert(Duration::ZERO) += dur;
            return Ok(true);
        }

        if let Some(caps) = WSPD_SIZE.captures(line) {
            let size = self.number(no, &caps[1])?;
            let key = self.key(no)?;
            self.logs.sizes.insert(key, size);
            return Ok(true);
        }

        if let Some(caps) = PAIR_COVERAGE.captures(line) {
            let pairs = self.number(no, &caps[1])?;
            let percent: f64 = caps[3]
                .parse()
                .map_err(|_| parse_error(self.path, no, "malformed covering error"))?;
            let key = self.key(no)?;
            self.logs.covering_error.insert(key, percent);
            self.logs.point_pairs.insert(key, pairs);
            return Ok(pairs != 0);
        }

        if let Some(rest) = line.strip_prefix(POINT_PAIR_HIST_OPEN) {
            if !is_closed(rest, '}') {
                self.state = State::InPointPairHist;
            }
            return Ok(true);
        }
        if let Some(rest) = line.strip_prefix(GEOM_ERROR_HIST_OPEN) {
            if !is_closed(rest, '}') {
                self.state = State::InGeomErrorHist;
            }
            return Ok(true);
        }
        if let Some(rest) = line.strip_prefix(CELL_HIST_OPEN) {
            if is_closed(rest, ']') {
                let key = self.key(no)?;
                self.logs.cell_pairs_by_depth.insert(key, Vec::new());
            } else {
                self.state = State::InCellHist;
                self.cell_buf.clear();
            }
            return Ok(true);
        }

        // anything else is progress output we do not care about
        Ok(true)
    }

    /// Body line of one of the `{ depth: count, }` histogram blocks.
    fn hist_line(&mut self, no: usize, line: &str) -> Result<()> {
        if line.starts_with('}') {
            self.state = State::Idle;
            return Ok(());
        }
        let caps = HIST_ENTRY
            .captures(line)
            .ok_or_else(|| parse_error(self.path, no, "malformed histogram entry"))?;
        let depth: u32 = caps[1]
            .parse()
            .map_err(|_| parse_error(self.path, no, "histogram depth out of range"))?;
        let count = self.number(no, &caps[2])?;
        let key = self.key(no)?;
        let hist = match self.state {
            State::InPointPairHist => self.logs.point_pairs_by_depth.entry(key).or_default(),
            State::InGeomErrorHist => self.logs.geom_errors_by_depth.entry(key).or_default(),
            _ => unreachable!("hist_line outside histogram block"),
        };
        hist.insert(depth, count);
        Ok(())
    }

    /// Body line of the `[ count, ]` block; depth is the running position.
    fn cell_line(&mut self, no: usize, line: &str) -> Result<()> {
        if line.starts_with(']') {
            let key = self.key(no)?;
            self.logs
                .cell_pairs_by_depth
                .insert(key, std::mem::take(&mut self.cell_buf));
            self.state = State::Idle;
            return Ok(());
        }
        let caps = LIST_ENTRY
            .captures(line)
            .ok_or_else(|| parse_error(self.path, no, "malformed histogram entry"))?;
        self.cell_buf.push(self.number(no, &caps[1])?);
        Ok(())
    }

    fn key(&self, no: usize) -> Result<RunKey> {
        self.key
            .ok_or_else(|| parse_error(self.path, no, "data line before run parameters"))
    }

    fn number(&self, no: usize, text: &str) -> Result<u64> {
        text.parse()
            .map_err(|_| parse_error(self.path, no, format!("count out of range: {text}")))
    }
}

fn is_closed(rest: &str, close: char) -> bool {
    // `{:#?}` puts an empty map or list on the header line itself
    rest.trim_end().ends_with(close)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> WspdLogs {
        let mut logs = WspdLogs::default();
        parse_str(Path::new("test.txt"), text, &mut logs).unwrap();
        logs
    }

    fn key() -> RunKey {
        RunKey::new(5, Epsilon::from_thousandths(450))
    }

    const FULL_LOG: &str = "\
running with d=5 and e=0.45
tree constructed. duration: 30.0s
wspd done. duration: 90.0s
wspd size: 12345
#pairs/#potential pairs: 2000000/4000000 (Covering Error: 50.000%)
#pairs per depth: {
    0: 1500000,
    1: 500000,
}
geometric error hist: {
    0: 100,
    1: 300,
}
verification time: 5.0s
pair depth histogram: [
    10000,
    2345,
]
";

    #[test]
    fn test_scalar_fields_round_trip() {
        let logs = parse(FULL_LOG);
        assert_eq!(logs.sizes.get(&key()), Some(&12345));
        assert_eq!(logs.point_pairs.get(&key()), Some(&2_000_000));
        assert_eq!(logs.covering_error.get(&key()), Some(&50.0));
    }

    #[test]
    fn test_durations_are_summed_and_verification_time_is_not() {
        let logs = parse(FULL_LOG);
        assert_eq!(logs.build_time.get(&key()), Some(&Duration::from_secs(120)));
    }

    #[test]
    fn test_histogram_blocks() {
        let logs = parse(FULL_LOG);
        let ppd = logs.point_pairs_by_depth.get(&key()).unwrap();
        assert_eq!(ppd.get(&0), Some(&1_500_000));
        assert_eq!(ppd.get(&1), Some(&500_000));
        let geom = logs.geom_errors_by_depth.get(&key()).unwrap();
        assert_eq!(geom.get(&0), Some(&100));
        assert_eq!(geom.get(&1), Some(&300));
        assert_eq!(logs.cell_pairs_by_depth.get(&key()), Some(&vec![10000, 2345]));
    }

    #[test]
    fn test_zero_point_pairs_stops_the_file() {
        let text = "\
running with d=5 and e=0.45
wspd size: 7
#pairs/#potential pairs: 0/4000000 (Covering Error: 100.000%)
#pairs per depth: {
    0: 999,
}
";
        let logs = parse(text);
        assert_eq!(logs.point_pairs.get(&key()), Some(&0));
        assert_eq!(logs.covering_error.get(&key()), Some(&100.0));
        // everything after the zero-pair line is ignored
        assert!(logs.point_pairs_by_depth.is_empty());
    }

    #[test]
    fn test_empty_histogram_on_header_line() {
        let text = "\
running with d=5 and e=0.45
#pairs per depth: {}
pair depth histogram: []
wspd size: 3
";
        let logs = parse(text);
        // the one-line `{}` opens no block, so later lines still parse
        assert_eq!(logs.sizes.get(&key()), Some(&3));
        assert_eq!(logs.cell_pairs_by_depth.get(&key()), Some(&Vec::new()));
    }

    #[test]
    fn test_duplicate_file_overwrites_counts_but_adds_durations() {
        let mut logs = WspdLogs::default();
        let first = "running with d=5 and e=0.45\nwspd done. duration: 10.0s\nwspd size: 100\n";
        let second = "running with d=5 and e=0.45\nwspd done. duration: 5.0s\nwspd size: 200\n";
        parse_str(Path::new("a.txt"), first, &mut logs).unwrap();
        parse_str(Path::new("b.txt"), second, &mut logs).unwrap();
        assert_eq!(logs.sizes.get(&key()), Some(&200));
        assert_eq!(logs.build_time.get(&key()), Some(&Duration::from_secs(15)));
    }

    #[test]
    fn test_malformed_histogram_entry_is_fatal() {
        let text = "\
running with d=5 and e=0.45
#pairs per depth: {
    not a number,
}
";
        let mut logs = WspdLogs::default();
        let err = parse_str(Path::new("test.txt"), text, &mut logs).unwrap_err();
        assert!(err.to_string().contains("test.txt:3"));
    }

    #[test]
    fn test_data_before_run_parameters_is_fatal() {
        let mut logs = WspdLogs::default();
        assert!(parse_str(Path::new("test.txt"), "wspd size: 3\n", &mut logs).is_err());
    }
}
