use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;

use wspd_analyzer::config::Config;
use wspd_analyzer::table::{Table, depth_tables};
use wspd_analyzer::{charts, metrics, report, scan};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Summary tables and charts from WSPD and hitting-set experiment logs",
    long_about = None
)]
struct Args {
    /// Settings file; flags given on the command line take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory containing the experiment log files
    #[arg(long)]
    analysis_dir: Option<PathBuf>,

    /// Dataset name prefix of the log files
    #[arg(short, long)]
    name: Option<String>,

    /// Chart output directory (default: <analysis-dir>/img)
    #[arg(long)]
    img_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    if let Some(dir) = args.analysis_dir {
        config.analysis_dir = dir;
    }
    if let Some(name) = args.name {
        config.name = name;
    }
    if let Some(dir) = args.img_dir {
        config.img_dir = Some(dir);
    }

    info!(
        "analyzing dataset '{}' in {}",
        config.name,
        config.analysis_dir.display()
    );
    let data = scan::scan_directory(&config.analysis_dir, &config.name)?;

    let wspd_sizes = Table::from_runs("d", data.wspd.sizes.iter().map(|(&k, &v)| (k, v as f64)));
    let covering_error = Table::from_runs("d", data.wspd.covering_error.iter().map(|(&k, &v)| (k, v)));
    let point_pair_hists = depth_tables(&data.wspd.point_pairs_by_depth);
    let geom_error = Table::from_runs("d", metrics::mean_geom_error_percent(&data.wspd)?);
    let curves = metrics::coverage_curves(&data.hitting_set)?;

    charts::render_all(
        &config.img_dir(),
        &wspd_sizes,
        &covering_error,
        &point_pair_hists,
        &geom_error,
        &curves,
    )?;

    report::print_reports(&data, &curves)?;
    Ok(())
}
