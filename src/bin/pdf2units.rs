use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use gcacw_tables_to_json::{
    ConfigFile, ExtractionReport, PageWindow, ParsedScenario, RawScenarioTables,
    extract_pdf_to_raw_tables, parse_raw_tables_file, write_parsed_scenarios, write_raw_tables,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "pdf2units",
    version,
    about = "Extract scenario setup tables from wargame rulebook PDFs into structured JSON"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scan a rulebook PDF and write the raw-tables artifact.
    Extract(ExtractArgs),
    /// Convert raw-tables artifacts into parsed unit data.
    Parse(ParseArgs),
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Input rulebook PDF path.
    #[arg(short, long)]
    input: PathBuf,

    /// Game id as configured (e.g. otr2, gtc2, hcr).
    #[arg(short, long)]
    game: String,

    /// Configuration file path.
    #[arg(short, long, default_value = "config/game_configs.json")]
    config: PathBuf,

    /// Output JSON path. Defaults to raw/<game>_raw_tables.json.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Page window like 45-95, overriding the configured range.
    #[arg(long)]
    pages: Option<String>,

    /// Print individual warnings, not just counts.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Game id to parse. Omit with --all to parse every configured game.
    #[arg(short, long, conflicts_with = "all")]
    game: Option<String>,

    /// Parse every game that has a raw-tables artifact.
    #[arg(long)]
    all: bool,

    /// Configuration file path.
    #[arg(short, long, default_value = "config/game_configs.json")]
    config: PathBuf,

    /// Directory holding raw-tables artifacts.
    #[arg(long, default_value = "raw")]
    raw_dir: PathBuf,

    /// Directory receiving parsed artifacts.
    #[arg(long, default_value = "parsed")]
    out_dir: PathBuf,

    /// Print individual warnings, not just counts.
    #[arg(short, long)]
    verbose: bool,
}

fn log_report(report: &ExtractionReport, verbose: bool) {
    if report.warnings.is_empty() {
        return;
    }
    eprintln!("warning: {} issue(s) detected", report.warnings.len());
    if verbose {
        for warning in &report.warnings {
            eprintln!(
                "  - {:?} page={:?} scenario={:?} table={:?}: {}",
                warning.code, warning.page, warning.scenario, warning.table, warning.message
            );
        }
    }
}

fn print_raw_details(scenarios: &[RawScenarioTables]) {
    for scenario in scenarios {
        println!(
            "Scenario {}: {} (pages {}-{})",
            scenario.scenario_number, scenario.scenario_name, scenario.start_page, scenario.end_page
        );
        if let Some(page) = scenario.advanced_game_rules_page {
            println!("  Advanced game rules start: page {page}");
        }
        for (label, tables) in [
            ("Confederate", &scenario.confederate_tables),
            ("Union", &scenario.union_tables),
        ] {
            println!("  {label} tables: {}", tables.len());
            for table in tables {
                let pages = table
                    .page_numbers
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                println!("    - {} ({} rows, pages: {pages})", table.name, table.rows.len());
            }
        }
    }
}

fn print_parsed_details(scenarios: &[ParsedScenario]) {
    for scenario in scenarios {
        println!("Scenario {}: {}", scenario.number, scenario.name);
        println!(
            "  Confederate: {} units, {} footnotes",
            scenario.confederate_units.len(),
            scenario.confederate_footnotes.len()
        );
        println!(
            "  Union: {} units, {} footnotes",
            scenario.union_units.len(),
            scenario.union_footnotes.len()
        );
    }
}

fn load_config(path: &Path) -> Result<ConfigFile> {
    ConfigFile::load(path)
        .with_context(|| format!("failed to load configuration '{}'", path.display()))
}

fn run_extract(args: &ExtractArgs) -> Result<ExtractionReport> {
    let config_file = load_config(&args.config)?;
    let game = config_file
        .resolve(&args.game)
        .with_context(|| format!("failed to resolve game '{}'", args.game))?;

    let window = args
        .pages
        .as_deref()
        .map(PageWindow::from_str)
        .transpose()
        .map_err(|error| anyhow!("invalid page window: {error}"))
        .context("failed to parse --pages")?;

    let (scenarios, report) = extract_pdf_to_raw_tables(&args.input, window, &game)
        .with_context(|| format!("failed to extract tables from '{}'", args.input.display()))?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from("raw").join(format!("{}_raw_tables.json", args.game)));
    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create '{}'", parent.display()))?;
    }
    write_raw_tables(&output, &scenarios)
        .with_context(|| format!("failed to write '{}'", output.display()))?;

    print_raw_details(&scenarios);
    println!("{}", report.summary());
    println!("wrote {}", output.display());
    Ok(report)
}

fn parse_one_game(args: &ParseArgs, config_file: &ConfigFile, game_id: &str) -> Result<usize> {
    let game = config_file
        .resolve(game_id)
        .with_context(|| format!("failed to resolve game '{game_id}'"))?;

    let input = args.raw_dir.join(format!("{game_id}_raw_tables.json"));
    let output = args.out_dir.join(format!("{game_id}_parsed.json"));

    let (scenarios, report) = parse_raw_tables_file(&input, &game)
        .with_context(|| format!("failed to parse '{}'", input.display()))?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("failed to create '{}'", args.out_dir.display()))?;
    write_parsed_scenarios(&output, &scenarios)
        .with_context(|| format!("failed to write '{}'", output.display()))?;

    println!("[{game_id}]");
    print_parsed_details(&scenarios);
    println!("{}", report.summary());
    println!("wrote {}", output.display());
    log_report(&report, args.verbose);
    Ok(report.unit_count())
}

fn run_parse(args: &ParseArgs) -> Result<usize> {
    let config_file = load_config(&args.config)?;

    let games = if args.all {
        config_file.game_ids()
    } else {
        let game = args
            .game
            .clone()
            .ok_or_else(|| anyhow!("pass --game <id> or --all"))?;
        vec![game]
    };

    // Each game's run is independent; one failure must not stop the batch.
    let mut total_units = 0;
    let mut failures = 0;
    for game_id in &games {
        match parse_one_game(args, &config_file, game_id) {
            Ok(units) => total_units += units,
            Err(error) => {
                failures += 1;
                eprintln!("error: [{game_id}] {error:#}");
            }
        }
    }

    if failures == games.len() {
        anyhow::bail!("all {failures} game(s) failed to parse");
    }
    Ok(total_units)
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gcacw_tables_to_json=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract(args) => match run_extract(&args) {
            Ok(report) => {
                log_report(&report, args.verbose);
                if report.row_count > 0 {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::from(2)
                }
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::from(1)
            }
        },
        Commands::Parse(args) => match run_parse(&args) {
            Ok(total_units) => {
                if total_units > 0 {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::from(2)
                }
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::from(1)
            }
        },
    }
}
