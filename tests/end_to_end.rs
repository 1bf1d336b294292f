use std::fs;
use std::time::Duration;

use wspd_analyzer::keys::{Epsilon, RunKey};
use wspd_analyzer::{metrics, report, scan};

const WSPD_LOG: &str = "\
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

const HS_LOG: &str = "\
loading path files
number of paths: 3000000
sum of path weights: 2000000
loading graph
calculating hitting set
iteration, iteration time, #hit paths, #paths left, weighted #hit paths
1, 1.5s, 100, 2900, 1000000
2, 1.0s, 50, 2850, 600000
3, 0.5s, 25, 2825, 300000
4, 0.5s, 10, 2815, 100000
hitting set found. duration: 180.0s
hs size: 4
lower bound: 42
";

fn key() -> RunKey {
    RunKey::new(5, Epsilon::from_thousandths(450))
}

#[test]
fn test_two_file_dataset_produces_exact_report_rows() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("germany_d5_e45.txt"), WSPD_LOG).unwrap();
    fs::write(dir.path().join("germany_hs_d5_e45.txt"), HS_LOG).unwrap();
    // a file of another dataset must not contribute
    fs::write(dir.path().join("stgtregbz_d5_e45.txt"), WSPD_LOG).unwrap();

    let data = scan::scan_directory(dir.path(), "germany").unwrap();

    // extraction round-trips the literal input values
    assert_eq!(data.wspd.sizes.get(&key()), Some(&12345));
    assert_eq!(data.wspd.point_pairs.get(&key()), Some(&2_000_000));
    assert_eq!(data.wspd.covering_error.get(&key()), Some(&50.0));
    assert_eq!(data.wspd.build_time.get(&key()), Some(&Duration::from_secs(120)));
    assert_eq!(data.wspd.cell_pairs_by_depth.get(&key()), Some(&vec![10000, 2345]));
    assert_eq!(data.hitting_set.num_paths.get(&key()), Some(&3_000_000));
    assert_eq!(data.hitting_set.solve_time.get(&key()), Some(&Duration::from_secs(180)));
    assert_eq!(data.hitting_set.iterations.get(&key()).unwrap().len(), 4);

    // derived metrics
    let geom = metrics::mean_geom_error_percent(&data.wspd).unwrap();
    assert!((geom[&key()] - 1.0).abs() < 1e-12);

    let curves = metrics::coverage_curves(&data.hitting_set).unwrap();
    assert_eq!(curves[&key()], vec![50.0, 80.0, 95.0, 100.0]);

    // report rows match the literal input values
    let mut buf = Vec::new();
    report::write_percentile_table(&mut buf, &data.hitting_set, &curves).unwrap();
    let percentile = String::from_utf8(buf).unwrap();
    assert!(percentile.contains(r"5 & 0.45 & 2 & 2 & 3 & 3 & 3 & 3 \\"));

    let mut buf = Vec::new();
    report::write_results_table(&mut buf, &data.wspd, &data.hitting_set).unwrap();
    let results = String::from_utf8(buf).unwrap();
    // 30s + 90s build, 180s solve: 5 minutes of runtime
    assert!(results.contains(r"5 & 0.45 & $3 * 10^6$ & 4 & 42 & 5 min & 50 \\"));
}

#[test]
fn test_zero_pair_run_contributes_no_histograms() {
    let dir = tempfile::tempdir().unwrap();
    let zero_log = "\
running with d=3 and e=0.2
wspd size: 1
#pairs/#potential pairs: 0/4000000 (Covering Error: 100.000%)
#pairs per depth: {
    0: 999,
}
";
    fs::write(dir.path().join("germany_d3_e20.txt"), zero_log).unwrap();
    fs::write(dir.path().join("germany_d5_e45.txt"), WSPD_LOG).unwrap();

    let data = scan::scan_directory(dir.path(), "germany").unwrap();
    let zero_key = RunKey::new(3, Epsilon::from_thousandths(200));

    // scalars up to the zero-pair line are kept, the histograms are not
    assert_eq!(data.wspd.point_pairs.get(&zero_key), Some(&0));
    assert!(!data.wspd.point_pairs_by_depth.contains_key(&zero_key));
    // the scan still picks up the other file
    assert_eq!(data.wspd.sizes.get(&key()), Some(&12345));
}
