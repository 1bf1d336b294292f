use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use csv::{ReaderBuilder, Trim};
use once_cell::sync::Lazy;
use regex::Regex;

use super::{parse_duration, parse_error};
use crate::error::Result;
use crate::keys::RunKey;

/// Everything extracted from the hitting-set solver logs, keyed by `(d, ε)`.
#[derive(Debug, Default)]
pub struct HittingSetLogs {
    pub num_paths: BTreeMap<RunKey, u64>,
    pub sum_path_weights: BTreeMap<RunKey, u64>,
    pub lower_bound: BTreeMap<RunKey, u64>,
    pub hs_size: BTreeMap<RunKey, u64>,
    pub solve_time: BTreeMap<RunKey, Duration>,
    /// per-iteration solver statistics, in iteration order
    pub iterations: BTreeMap<RunKey, Vec<Iteration>>,
}

/// One row of the solver's per-iteration statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Iteration {
    pub index: u64,
    pub time: Duration,
    pub hit_paths: u64,
    pub paths_left: u64,
    pub weighted_hit_pairs: u64,
}

static NUM_PATHS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^number of paths: (\d+)").unwrap());
static SUM_WEIGHTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^sum of path weights: (\d+)").unwrap());
static LOWER_BOUND: Lazy<Regex> = Lazy::new(|| Regex::new(r"^lower bound: (\d+)").unwrap());
static HS_SIZE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^hs size: (\d+)").unwrap());

const ITER_HEADER: &str = "iteration, iteration time, #hit paths, #paths left, weighted #hit paths";
const FOUND_PREFIX: &str = "hitting set found.";

/// Parses one hitting-set log into `logs`. The key comes from the file name.
pub(crate) fn parse_file(path: &Path, key: RunKey, logs: &mut HittingSetLogs) -> Result<()> {
    let text = fs::read_to_string(path)?;
    parse_str(path, key, &text, logs)
}

fn parse_str(path: &Path, key: RunKey, text: &str, logs: &mut HittingSetLogs) -> Result<()> {
    let mut parser = Parser {
        logs,
        path,
        key,
        in_iter_stats: false,
        iter_buf: String::new(),
        block_start: 0,
    };
    for (idx, line) in text.lines().enumerate() {
        parser.line(idx + 1, line)?;
    }
    parser.finish()
}

struct Parser<'a> {
    logs: &'a mut HittingSetLogs,
    path: &'a Path,
    key: RunKey,
    in_iter_stats: bool,
    /// raw body of the iteration block, parsed as CSV once it closes
    iter_buf: String,
    block_start: usize,
}

impl Parser<'_> {
    fn line(&mut self, no: usize, line: &str) -> Result<()> {
        if self.in_iter_stats && !line.starts_with(FOUND_PREFIX) {
            self.iter_buf.push_str(line);
            self.iter_buf.push('\n');
            return Ok(());
        }

        if line.starts_with(FOUND_PREFIX) {
            if self.in_iter_stats {
                self.flush_iterations()?;
            }
            if line.contains("duration:") {
                let dur = parse_duration(line)
                    .ok_or_else(|| parse_error(self.path, no, "malformed duration"))?;
                self.logs.solve_time.insert(self.key, dur);
            }
            return Ok(());
        }

        if let Some(caps) = NUM_PATHS.captures(line) {
            self.logs.num_paths.insert(self.key, self.number(no, &caps[1])?);
        } else if let Some(caps) = SUM_WEIGHTS.captures(line) {
            self.logs
                .sum_path_weights
                .insert(self.key, self.number(no, &caps[1])?);
        } else if let Some(caps) = LOWER_BOUND.captures(line) {
            self.logs.lower_bound.insert(self.key, self.number(no, &caps[1])?);
        } else if let Some(caps) = HS_SIZE.captures(line) {
            self.logs.hs_size.insert(self.key, self.number(no, &caps[1])?);
        } else if line.starts_with(ITER_HEADER) {
            self.in_iter_stats = true;
            self.iter_buf.clear();
            self.block_start = no;
        }
        Ok(())
    }

    /// A crashed run may end mid-block; keep what was recorded so far.
    fn finish(&mut self) -> Result<()> {
        if self.in_iter_stats { self.flush_iterations() } else { Ok(()) }
    }

    fn flush_iterations(&mut self) -> Result<()> {
        self.in_iter_stats = false;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .trim(Trim::All)
            .from_reader(self.iter_buf.as_bytes());

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let no = self.block_start + rows.len() + 1;
            if record.len() != 5 {
                return Err(parse_error(
                    self.path,
                    no,
                    format!("expected 5 iteration fields, got {}", record.len()),
                ));
            }
            rows.push(Iteration {
                index: self.number(no, &record[0])?,
                time: parse_duration(&record[1])
                    .ok_or_else(|| parse_error(self.path, no, "malformed iteration time"))?,
                hit_paths: self.number(no, &record[2])?,
                paths_left: self.number(no, &record[3])?,
                weighted_hit_pairs: self.number(no, &record[4])?,
            });
        }
        self.iter_buf.clear();
        self.logs.iterations.insert(self.key, rows);
        Ok(())
    }

    fn number(&self, no: usize, text: &str) -> Result<u64> {
        text.parse()
            .map_err(|_| parse_error(self.path, no, format!("count out of range: {text}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Epsilon;

    fn key() -> RunKey {
        RunKey::new(5, Epsilon::from_thousandths(1000))
    }

    fn parse(text: &str) -> HittingSetLogs {
        let mut logs = HittingSetLogs::default();
        parse_str(Path::new("test.txt"), key(), text, &mut logs).unwrap();
        logs
    }

    const FULL_LOG: &str = "\
loading path files
number of paths: 3000000
sum of path weights: 2000000
loading graph
calculating hitting set
iteration, iteration time, #hit paths, #paths left, weighted #hit paths
1, 1.5s, 100, 2900, 1000000
2, 1.0s, 50, 2850, 600000
hitting set found. duration: 180.0s
hs size: 2
lower bound: 42
";

    #[test]
    fn test_scalar_fields_round_trip() {
        let logs = parse(FULL_LOG);
        assert_eq!(logs.num_paths.get(&key()), Some(&3_000_000));
        assert_eq!(logs.sum_path_weights.get(&key()), Some(&2_000_000));
        assert_eq!(logs.hs_size.get(&key()), Some(&2));
        assert_eq!(logs.lower_bound.get(&key()), Some(&42));
        assert_eq!(logs.solve_time.get(&key()), Some(&Duration::from_secs(180)));
    }

    #[test]
    fn test_iteration_block() {
        let logs = parse(FULL_LOG);
        let iters = logs.iterations.get(&key()).unwrap();
        assert_eq!(iters.len(), 2);
        assert_eq!(
            iters[0],
            Iteration {
                index: 1,
                time: Duration::from_millis(1500),
                hit_paths: 100,
                paths_left: 2900,
                weighted_hit_pairs: 1_000_000,
            }
        );
        assert_eq!(iters[1].weighted_hit_pairs, 600_000);
    }

    #[test]
    fn test_truncated_block_keeps_rows_read_so_far() {
        let text = "\
iteration, iteration time, #hit paths, #paths left, weighted #hit paths
1, 1.5s, 100, 2900, 1000000
";
        let logs = parse(text);
        assert_eq!(logs.iterations.get(&key()).unwrap().len(), 1);
        assert!(logs.solve_time.is_empty());
    }

    #[test]
    fn test_short_iteration_record_is_fatal() {
        let text = "\
iteration, iteration time, #hit paths, #paths left, weighted #hit paths
1, 1.5s, 100
hitting set found. duration: 1.0s
";
        let mut logs = HittingSetLogs::default();
        let err = parse_str(Path::new("test.txt"), key(), text, &mut logs).unwrap_err();
        assert!(err.to_string().contains("iteration fields"));
    }
}
