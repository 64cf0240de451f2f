use std::io;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use simviz::{boxplot, metrics, summary, FigureLayout, RunConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Charts for estimator simulation summaries", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 2x2 metric grid per treatment against one control group
    Summary(SummaryArgs),
    /// One figure per metric across sample sizes
    Metrics(MetricsArgs),
    /// Box plots of ATET minus the true effect, faceted by bandwidth factor
    Boxplot(BoxplotArgs),
    /// Run all plotters with the default invocation or a JSON run file
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Directory receiving the PNG files (created if missing)
    #[arg(short, long, default_value = "./visualization/png", value_hint = ValueHint::DirPath)]
    output_dir: PathBuf,

    /// Export pixel scale
    #[arg(long, default_value_t = 2)]
    scale: u32,

    /// Verbose logging
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

impl CommonArgs {
    fn layout(&self) -> FigureLayout {
        FigureLayout {
            scale: self.scale,
            ..FigureLayout::default()
        }
    }
}

#[derive(Parser, Debug)]
struct SummaryArgs {
    /// Summary CSV (treatment, control, N, bwfactor, bias, se, rmse, coverage_rate)
    #[arg(long, default_value = "./visualization/csv/summary.csv", value_hint = ValueHint::FilePath)]
    csv: PathBuf,

    /// Treatments to plot (comma separated)
    #[arg(long, value_delimiter = ',', default_value = "3,4,5,6,7")]
    treatments: Vec<i64>,

    /// Control group shared by every figure
    #[arg(long, default_value_t = 2)]
    control: i64,

    #[arg(long, default_value_t = summary::DEFAULT_WIDTH)]
    width: u32,

    #[arg(long, default_value_t = summary::DEFAULT_HEIGHT)]
    height: u32,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser, Debug)]
struct MetricsArgs {
    /// Summary CSV (treatment, N, bwfactor, bias, se, rmse, coverage_rate)
    #[arg(long, default_value = "./visualization/csv/summary.csv", value_hint = ValueHint::FilePath)]
    csv: PathBuf,

    #[arg(long, default_value_t = metrics::DEFAULT_WIDTH)]
    width: u32,

    #[arg(long, default_value_t = metrics::DEFAULT_HEIGHT)]
    height: u32,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser, Debug)]
struct BoxplotArgs {
    /// Replication-level CSV (treatment, N, bwfactor, atet, true_effect)
    #[arg(
        long,
        default_value = "./visualization/csv/non_null_simulation_results.csv",
        value_hint = ValueHint::FilePath
    )]
    csv: PathBuf,

    #[arg(long, default_value_t = boxplot::DEFAULT_WIDTH)]
    width: u32,

    #[arg(long, default_value_t = boxplot::DEFAULT_HEIGHT)]
    height: u32,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// JSON run file; omitted fields keep the default invocation
    #[arg(long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Override the run file's output directory
    #[arg(short, long, value_hint = ValueHint::DirPath)]
    output_dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbose = match &cli.command {
        Command::Summary(args) => args.common.verbose,
        Command::Metrics(args) => args.common.verbose,
        Command::Boxplot(args) => args.common.verbose,
        Command::Run(args) => args.verbose,
    };
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let started = Instant::now();
    let written = match cli.command {
        Command::Summary(args) => handle_summary(args)?,
        Command::Metrics(args) => handle_metrics(args)?,
        Command::Boxplot(args) => handle_boxplot(args)?,
        Command::Run(args) => handle_run(args)?,
    };
    info!(
        "Done: {} figure(s) in {:.1} ms",
        written.len(),
        started.elapsed().as_secs_f64() * 1000.0
    );
    Ok(())
}

fn handle_summary(args: SummaryArgs) -> Result<Vec<PathBuf>> {
    if args.treatments.is_empty() {
        return Err(anyhow!("no treatments supplied"));
    }
    summary::plot_summary_with_layout(
        &args.csv,
        &args.common.output_dir,
        &args.treatments,
        args.control,
        args.width,
        args.height,
        &args.common.layout(),
    )
    .with_context(|| format!("summary plots from {}", args.csv.display()))
}

fn handle_metrics(args: MetricsArgs) -> Result<Vec<PathBuf>> {
    metrics::plot_metrics_with_layout(
        &args.csv,
        &args.common.output_dir,
        args.width,
        args.height,
        &args.common.layout(),
    )
    .with_context(|| format!("metric plots from {}", args.csv.display()))
}

fn handle_boxplot(args: BoxplotArgs) -> Result<Vec<PathBuf>> {
    let path = boxplot::boxplot_centered_atet_with_layout(
        &args.csv,
        &args.common.output_dir,
        args.width,
        args.height,
        &args.common.layout(),
    )
    .with_context(|| format!("box plot from {}", args.csv.display()))?;
    Ok(vec![path])
}

fn handle_run(args: RunArgs) -> Result<Vec<PathBuf>> {
    let mut config = match args.config.as_ref() {
        Some(path) => RunConfig::from_json_file(path)
            .with_context(|| format!("failed to load run file {}", path.display()))?,
        None => RunConfig::default(),
    };
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    simviz::run_all(&config).context("rendering run")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn treatments_parse_comma_separated() {
        let cli = Cli::try_parse_from([
            "simviz",
            "summary",
            "--treatments",
            "3,5",
            "--control",
            "1",
        ])
        .unwrap();
        match cli.command {
            Command::Summary(args) => {
                assert_eq!(args.treatments, vec![3, 5]);
                assert_eq!(args.control, 1);
                assert_eq!(args.width, 850);
                assert_eq!(args.common.scale, 2);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn run_accepts_output_override() {
        let cli = Cli::try_parse_from(["simviz", "run", "-o", "out"]).unwrap();
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.output_dir, Some(PathBuf::from("out")));
                assert!(args.config.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
