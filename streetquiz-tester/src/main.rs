mod logic;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use logic::reports::{ReportContext, write_console_report, write_json_report, write_markdown_report};
use logic::{
    PolicyKind, RunRecord, SimulationConfig, StrategySummary, load_file_pool, resolve_seed_inputs,
    run_simulation, summarize_runs, synthetic_pool,
};
use streetquiz_game::{
    BoundaryRegion, GameConfig, LonLat, RoundLength, SamplePool, SamplingStrategy,
    difficulty_levels, from_lon_lat,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "streetquiz-tester", version = "0.1.0")]
#[command(about = "Simulated StreetQuiz rounds that check sampling, weighting and scoring")]
struct Args {
    /// Saved Overpass response to load streets from (synthetic grid when omitted)
    #[arg(long)]
    data: Option<PathBuf>,

    /// Number of synthetic streets when no data file is given
    #[arg(long, default_value_t = 24)]
    grid: usize,

    /// Boundary circle center as LON,LAT
    #[arg(long, default_value = "12.5610324,55.7100802", value_parser = parse_lon_lat)]
    center: LonLat,

    /// Boundary circle radius in projected metres
    #[arg(long, default_value_t = 2000.0)]
    radius: f64,

    /// Optional pin as LON,LAT for the pin strategies
    #[arg(long, value_parser = parse_lon_lat)]
    pin: Option<LonLat>,

    /// Sampling strategies to run (comma-separated, or `all`)
    #[arg(long, default_value = "all")]
    strategies: String,

    /// Round length: a street count or `unlimited`
    #[arg(long, default_value = "5")]
    length: RoundLength,

    /// Guesses per free-play round
    #[arg(long, default_value_t = 25)]
    max_guesses: usize,

    /// Seeds to run (comma-separated; ranges like 10..20 allowed)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Rounds per seed and strategy
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Automated guessing policy
    #[arg(long, value_enum, default_value_t = PolicyKind::Random)]
    policy: PolicyKind,

    /// Probability that the policy guesses the asked street
    #[arg(long, default_value_t = 0.6)]
    accuracy: f64,

    /// Optional JSON game config overriding the built-in tuning
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the difficulty levels for the loaded pool and exit
    #[arg(long)]
    list_levels: bool,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

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

    if !(0.0..=1.0).contains(&args.accuracy) {
        bail!("--accuracy must be between 0 and 1 (got {})", args.accuracy);
    }

    let base_config = load_game_config(&args)?;
    let boundary = build_boundary(&args);
    let pool = load_pool(&args, &boundary)?;
    let levels = difficulty_levels(pool.len(), base_config.base_round_length);

    if maybe_list_levels(&args, &levels)? {
        return Ok(());
    }

    announce_banner(&args);

    let start_time = Instant::now();
    let strategies = expand_strategies(&args.strategies);
    let seed_tokens = split_csv(&args.seeds);
    let seeds = resolve_seed_inputs(&seed_tokens)?;

    let records = run_rounds(&args, &pool, &boundary, &base_config, &strategies, &seeds)?;
    let summaries = summarize_runs(&records);

    let context = ReportContext::new(pool.len(), args.length, args.policy.label(), &levels);
    write_reports(&args, &context, &summaries, &records, start_time)?;

    if summaries.iter().any(|s| !s.passed()) {
        std::process::exit(1);
    }

    Ok(())
}

fn parse_lon_lat(value: &str) -> Result<LonLat, String> {
    let (lon, lat) = value
        .split_once(',')
        .ok_or_else(|| format!("expected LON,LAT but got `{value}`"))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude `{lon}`"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude `{lat}`"))?;
    if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
        return Err(format!("coordinate out of range: {lon},{lat}"));
    }
    Ok(LonLat::new(lon, lat))
}

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

fn load_game_config(args: &Args) -> Result<GameConfig> {
    let Some(path) = &args.config else {
        return Ok(GameConfig::default_config());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    GameConfig::from_json(&json).with_context(|| format!("invalid game config {}", path.display()))
}

fn build_boundary(args: &Args) -> BoundaryRegion {
    let boundary = BoundaryRegion::circle(from_lon_lat(args.center), args.radius);
    match args.pin {
        Some(pin) => boundary.with_pin(from_lon_lat(pin)),
        None => boundary,
    }
}

fn load_pool(args: &Args, boundary: &BoundaryRegion) -> Result<SamplePool> {
    let pool = match &args.data {
        Some(path) => load_file_pool(path, boundary)?,
        None => synthetic_pool(boundary, args.grid),
    };
    if pool.is_empty() {
        bail!("no streets inside the boundary");
    }
    log::info!("loaded {} streets", pool.len());
    Ok(pool)
}

fn maybe_list_levels(args: &Args, levels: &[RoundLength]) -> Result<bool> {
    if !args.list_levels {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Difficulty levels:")?;
    for level in levels {
        writeln!(output_target.writer(), "  {level}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner(args: &Args) {
    if args.output.is_some() || args.report != ReportFormat::Console {
        return;
    }
    println!("{}", "🗺️ StreetQuiz Automated Tester".bright_cyan().bold());
    println!("{}", "==============================".cyan());
}

/// Strategies named on the command line. Unknown names fall back to equal
/// chance with a warning, the same way a stale UI selection does.
fn expand_strategies(arg: &str) -> Vec<SamplingStrategy> {
    let mut strategies = Vec::new();
    for token in split_csv(arg) {
        if token.eq_ignore_ascii_case("all") {
            for strategy in SamplingStrategy::ALL {
                if !strategies.contains(&strategy) {
                    strategies.push(strategy);
                }
            }
            continue;
        }
        let (strategy, warning) = SamplingStrategy::resolve(Some(&token));
        if let Some(warning) = warning {
            log::warn!("{warning}");
        }
        if !strategies.contains(&strategy) {
            strategies.push(strategy);
        }
    }
    if strategies.is_empty() {
        strategies.push(SamplingStrategy::default());
    }
    strategies
}

fn run_rounds(
    args: &Args,
    pool: &SamplePool,
    boundary: &BoundaryRegion,
    base_config: &GameConfig,
    strategies: &[SamplingStrategy],
    seeds: &[u64],
) -> Result<Vec<RunRecord>> {
    let mut records = Vec::new();
    for &strategy in strategies {
        if args.verbose {
            println!("🧪 Running {}", strategy.to_string().bold());
        }
        for &seed in seeds {
            for iteration in 0..args.iterations {
                let iteration_seed = seed.wrapping_add(iteration as u64);
                let config = SimulationConfig::new(strategy, args.length, iteration_seed)
                    .with_policy(args.policy, args.accuracy)
                    .with_max_guesses(args.max_guesses);
                let record = run_simulation(pool, boundary, base_config, &config)?;
                if args.verbose && !record.passed() {
                    println!("   seed {iteration_seed}: {}", record.failures.join("; ").red());
                }
                records.push(record);
            }
        }
    }
    Ok(records)
}

fn write_reports(
    args: &Args,
    context: &ReportContext,
    summaries: &[StrategySummary],
    records: &[RunRecord],
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report {
        ReportFormat::Console => write_console_report(
            output_target.writer(),
            context,
            summaries,
            start_time.elapsed(),
        )?,
        ReportFormat::Json => {
            write_json_report(output_target.writer(), context, summaries, records)?;
        }
        ReportFormat::Markdown => {
            write_markdown_report(output_target.writer(), context, summaries)?;
        }
    }
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}
