#![forbid(unsafe_code)]

mod output;

use std::collections::HashSet;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use cdindex_core::config::{self, ConfigSource};
use cdindex_core::dataset::{self, ArtistDataset, Category};
use cdindex_core::disruption::{ReportSummary, compute};
use cdindex_core::graph::{AdjacencyIndex, Edge, GraphStats, load_edge_file};
use cdindex_core::table::{ResultTable, TableFormat};
use cdindex_core::timing;
use clap::{Parser, ValueEnum};
use output::{CliError, OutputMode};
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "cdindex: disruption (CD) index of every node in an influence graph",
    long_about = None,
    after_help = "EXAMPLES:\n    # Directed citation graph to CSV\n    cdindex cites.txt scores.csv --directed\n\n    # Jazz artists only, keeping edges inside the genre\n    cdindex artists.json jazz.json --input-format artists --genre Jazz --restrictive --directed"
)]
struct Cli {
    /// Edge list (one `SOURCE TARGET` pair per line) or artist dataset (JSON, optionally gzipped).
    input: PathBuf,

    /// Output table path. The format follows the extension unless --format is given.
    output: PathBuf,

    /// Keep edge direction. Without it every pair is stored both ways.
    #[arg(long)]
    directed: bool,

    /// Minimum in-degree for a node to be scored.
    #[arg(long, value_name = "N")]
    min_in: Option<usize>,

    /// Minimum out-degree for a node to be scored.
    #[arg(long, value_name = "N")]
    min_out: Option<usize>,

    /// Output format: csv, tsv or json.
    #[arg(long)]
    format: Option<TableFormat>,

    /// Token written for undefined values in csv/tsv output.
    #[arg(long, value_name = "TOKEN")]
    nan_token: Option<String>,

    /// Score nodes on the rayon thread pool.
    #[arg(long)]
    parallel: bool,

    /// Stop scoring after this many seconds and mark the rest as skipped.
    #[arg(long, value_name = "SECS")]
    deadline_secs: Option<u64>,

    /// How to read INPUT.
    #[arg(long, value_enum, default_value_t = InputFormat::Edges)]
    input_format: InputFormat,

    /// Only artists whose primary genre is GENRE (artists input).
    #[arg(long, conflicts_with_all = ["style", "decade"])]
    genre: Option<String>,

    /// Only artists whose primary style is STYLE (artists input).
    #[arg(long, conflicts_with = "decade")]
    style: Option<String>,

    /// Only artists whose primary decade is DECADE (artists input).
    #[arg(long)]
    decade: Option<String>,

    /// Drop influencers outside the selected category (or outside the dataset).
    #[arg(long)]
    restrictive: bool,

    /// Configuration file (defaults to ./cdindex.toml, then the user config).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the run summary (and errors) as JSON.
    #[arg(long)]
    json: bool,

    /// Emit a per-stage timing report to stderr.
    #[arg(long)]
    timing: bool,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress the human-readable summary.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    /// Whitespace-separated edge list.
    Edges,
    /// JSON artist dataset; edges run artist → influencer.
    Artists,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }

    /// The reverse-index category selected on the command line, if any.
    fn category(&self) -> Option<(Category, &str)> {
        self.genre
            .as_deref()
            .map(|name| (Category::Genre, name))
            .or_else(|| self.style.as_deref().map(|name| (Category::Style, name)))
            .or_else(|| self.decade.as_deref().map(|name| (Category::Decade, name)))
    }
}

/// What a successful run reports on stdout.
#[derive(Debug, Serialize)]
struct RunSummary {
    input: PathBuf,
    output: PathBuf,
    format: TableFormat,
    directed: bool,
    config: Option<PathBuf>,
    graph: GraphStats,
    nodes: ReportSummary,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("CDINDEX_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "cdindex=debug,info"
        } else {
            "cdindex=info,warn"
        })
    });

    let format = env::var("CDINDEX_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let timing_enabled = cli.timing || timing::timing_enabled_from_env();
    timing::set_timing_enabled(timing_enabled);
    timing::clear_timings();

    let mode = cli.output_mode();
    let result = run(&cli).and_then(|summary| {
        if cli.quiet && mode == OutputMode::Human {
            return Ok(());
        }
        output::render(mode, &summary, print_summary)
    });

    if timing_enabled {
        report_timing();
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let cli_error = CliError::from_anyhow(&err);
            if output::render_error(mode, &cli_error).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<RunSummary> {
    let working_dir = env::current_dir().context("Failed to determine working directory")?;
    let (config, source) = config::resolve_config(cli.config.as_deref(), &working_dir)?;
    let config_path = match source {
        ConfigSource::File(path) => {
            debug!(path = %path.display(), "using configuration file");
            Some(path)
        }
        ConfigSource::Defaults => None,
    };

    let mut options = config.compute_options();
    if let Some(min_in) = cli.min_in {
        options.min_in = min_in;
    }
    if let Some(min_out) = cli.min_out {
        options.min_out = min_out;
    }
    options.parallel |= cli.parallel;
    if let Some(secs) = cli.deadline_secs {
        options.deadline = Some(Duration::from_secs(secs));
    }

    let format = cli
        .format
        .or(config.output.format)
        .unwrap_or_else(|| TableFormat::from_path(&cli.output));
    let nan_token = cli.nan_token.as_deref().unwrap_or(&config.output.nan_token);
    // Reject a bad token before doing any work.
    ResultTable::from_records(Vec::new()).with_nan_token(nan_token)?;

    let edges = timing::timed("load", || load_input(cli))?;

    let index = timing::timed("index", || {
        if cli.directed {
            AdjacencyIndex::build(edges)
        } else {
            AdjacencyIndex::build_undirected(edges)
        }
    });

    let stats = timing::timed("stats", || GraphStats::from_index(&index));
    info!(
        nodes = stats.node_count,
        edges = stats.edge_count,
        self_loops = stats.self_loop_count,
        components = stats.weakly_connected_component_count,
        hash = %stats.content_hash,
        "graph indexed"
    );

    let report = timing::timed("compute", || compute(&index, &options));
    let summary = report.summary();

    let table = ResultTable::from_report(report).with_nan_token(nan_token)?;
    timing::timed("write", || table.write_file(&cli.output, format))
        .with_context(|| format!("Failed to write results to {}", cli.output.display()))?;

    Ok(RunSummary {
        input: cli.input.clone(),
        output: cli.output.clone(),
        format,
        directed: cli.directed,
        config: config_path,
        graph: stats,
        nodes: summary,
    })
}

fn load_input(cli: &Cli) -> anyhow::Result<Vec<Edge>> {
    match cli.input_format {
        InputFormat::Edges => {
            if cli.category().is_some() || cli.restrictive {
                warn!("category filters only apply to --input-format artists");
            }
            load_edge_file(&cli.input)
                .with_context(|| format!("Failed to load edge list {}", cli.input.display()))
        }
        InputFormat::Artists => load_artist_edges(&cli.input, cli.category(), cli.restrictive),
    }
}

fn load_artist_edges(
    path: &Path,
    category: Option<(Category, &str)>,
    restrictive: bool,
) -> anyhow::Result<Vec<Edge>> {
    let artists = ArtistDataset::load(path)
        .with_context(|| format!("Failed to load artist dataset {}", path.display()))?;

    let reverse = dataset::build_reverse_index(&artists);
    let subset: Option<HashSet<&str>> = category.map(|(category, name)| {
        let members = reverse.members(category, name);
        if members.is_empty() {
            warn!(?category, name, "no artists in selected category");
        }
        members
    });

    Ok(dataset::influence_edges(&artists, subset.as_ref(), restrictive))
}

fn print_summary(summary: &RunSummary, w: &mut dyn Write) -> std::io::Result<()> {
    let nodes = &summary.nodes;
    writeln!(
        w,
        "{}: {} nodes ({} scored, {} filtered, {} undefined cd) -> {}",
        summary.input.display(),
        nodes.nodes,
        nodes.scored,
        nodes.filtered,
        nodes.undefined_cd,
        summary.output.display()
    )?;
    if nodes.partial {
        writeln!(
            w,
            "deadline reached: {} nodes skipped, table is partial",
            nodes.skipped
        )?;
    }
    Ok(())
}

fn report_timing() {
    let report = timing::collect_report();
    if report.is_empty() {
        eprintln!("timing report: no samples recorded");
        return;
    }
    eprintln!("timing report:");
    eprintln!("{}", report.display_table());
    eprintln!("timing report (json):");
    match serde_json::to_string_pretty(&report.to_json()) {
        Ok(json) => eprintln!("{json}"),
        Err(err) => eprintln!("failed to render timing json: {err}"),
    }
}
