use clap::Parser;
use log::debug;

mod app;
mod process;

use crate::{
    app::{App, ReportConfig, Unit},
    process::{SmapsReport, memory::RegionParser, summary::{LibraryFilter, Summary}},
};

/// Utility to aid in determining memory usage from /proc/$PID/smaps.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Display values for regions / libraries.
    #[arg(long)]
    verbose: bool,

    /// Library list will include only library names that match this text.
    /// Applied before filter (if applicable).
    #[arg(long = "match", value_name = "TEXT")]
    match_text: Option<String>,

    /// Library list will filter all library names that match this text.
    /// Applied after match (if applicable).
    #[arg(long = "filter", value_name = "TEXT")]
    filter_text: Option<String>,

    /// Output using this unit.
    #[arg(long, value_enum, default_value_t = Unit::Kb)]
    units: Unit,

    /// Drop regions that cannot be parsed instead of failing.
    #[arg(long)]
    skip_malformed: bool,

    /// Local file copy of smaps, or PID.
    smap: String,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let report = SmapsReport::try_from(args.smap.as_str())?;

    let parser = RegionParser::new()?;
    let regions = if args.skip_malformed {
        parser.parse_lenient(&report.content).0
    } else {
        parser.parse(&report.content)?
    };

    let filter = LibraryFilter::new(args.match_text, args.filter_text);
    let config = ReportConfig {
        verbose: args.verbose,
        unit: args.units,
    };
    debug!("{filter:?}, units {}", config.unit);

    let summary = Summary::aggregate(&regions, &filter);
    let app = App::new(config, summary).with_origin(&report.origin);
    print!("{app}");
    Ok(())
}
