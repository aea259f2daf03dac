mod logic;
mod util;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use logic::{
    CampaignRecord, LogicTester, ScenarioResult, TesterAssets, get_scenario, list_scenarios,
    resolve_seed_inputs, scenario_keys,
};
use util::split_csv;

#[derive(Debug, Parser)]
#[command(name = "warbook-tester", version)]
#[command(about = "Headless campaign simulator and balance checks for Warbook")]
struct Args {
    /// Scenarios to run (comma-separated, or `all`)
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated integers or 0x hex)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let scenarios = expand_scenarios(&args.scenarios);
    let seed_infos = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let seeds: Vec<u64> = seed_infos.iter().map(|s| s.seed).collect();
    let assets = Arc::new(TesterAssets::load_default()?);
    let tester = LogicTester::new(assets, args.verbose);

    let (results, records) = run_logic_scenarios(&args, &scenarios, &seeds, &tester);
    write_reports(&args, &results, &records, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut sink = ReportSink::open(args.output.as_deref())?;
    writeln!(sink, "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(sink, "  {key:25} - {description}")?;
    }
    sink.flush()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "⚔️  Warbook Automated Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s.eq_ignore_ascii_case("all")) {
        scenarios.retain(|s| !s.eq_ignore_ascii_case("all"));
        for key in scenario_keys() {
            if !scenarios.contains(&key) {
                scenarios.push(key);
            }
        }
    }
    scenarios
}

fn run_logic_scenarios(
    args: &Args,
    scenarios: &[String],
    seeds: &[u64],
    tester: &LogicTester,
) -> (Vec<ScenarioResult>, Vec<CampaignRecord>) {
    let mut results = Vec::new();
    let mut records = Vec::new();

    println!("{}", "🧠 Running Logic Tests".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    for scenario_name in scenarios {
        let Some(scenario) = get_scenario(scenario_name) else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
            continue;
        };
        let (scenario_results, mut scenario_records) =
            tester.run_scenario(&scenario, seeds, args.iterations);
        results.extend(scenario_results);
        records.append(&mut scenario_records);
    }

    (results, records)
}

fn write_reports(
    args: &Args,
    results: &[ScenarioResult],
    records: &[CampaignRecord],
    start_time: Instant,
) -> Result<()> {
    let mut sink = ReportSink::open(args.output.as_deref())?;
    let format = args.report.as_str();

    match (format, results.is_empty()) {
        ("csv", _) => logic::reports::generate_csv_report(&mut sink, records)?,
        ("json", true) => writeln!(sink, "[]")?,
        ("json", false) => logic::reports::generate_json_report(&mut sink, results)?,
        ("markdown", true) => writeln!(
            sink,
            "# Warbook Logic Test Results\n\n_No scenarios executed._"
        )?,
        ("markdown", false) => logic::reports::generate_markdown_report(&mut sink, results)?,
        (_, true) => writeln!(sink, "No logic scenarios executed.")?,
        (_, false) => logic::reports::generate_console_report(
            &mut sink,
            results,
            records,
            start_time.elapsed(),
        )?,
    }

    // Machine-readable formats stay parseable.
    if matches!(format, "console" | "markdown") {
        writeln!(sink)?;
        writeln!(sink, "🏁 Total time: {:?}", start_time.elapsed())?;
    }
    sink.flush()?;
    Ok(())
}

/// Buffered report destination: stdout, or a file when `--output` is given.
struct ReportSink {
    inner: BufWriter<Box<dyn Write>>,
}

impl ReportSink {
    fn open(path: Option<&Path>) -> Result<Self> {
        let target: Box<dyn Write> = match path {
            Some(path) => Box::new(
                File::create(path)
                    .with_context(|| format!("failed to create {}", path.display()))?,
            ),
            None => Box::new(stdout()),
        };
        Ok(Self {
            inner: BufWriter::new(target),
        })
    }
}

impl Write for ReportSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
