use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use ge_core::{
    config::SolverConfig,
    data,
    geometry::GeometryModel,
    solvers::{self, SolveReport},
    store::CandidateStore,
    translator::Translator,
};
use globle_entropy_core as ge_core;
use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};
use tracing_subscriber::EnvFilter;

const CLOSEST_ON_DEAD_END: usize = 10;

/// Entropy-guided solver for guess-the-country games
#[derive(Parser, Debug)]
#[command(name = "globle-entropy")]
#[command(about = "Ranks guesses by expected information and narrows down the answer", long_about = None)]
struct Args {
    /// Countries CSV with a header row: name first, latitude and longitude last
    #[arg(short, long, default_value = "data/country-coord.csv")]
    data: PathBuf,

    /// JSON file with solver settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of nearest countries treated as adjacent
    #[arg(long)]
    neighbors: Option<usize>,

    /// Half-width of the accepted band around a new best distance (miles)
    #[arg(long)]
    tolerance_miles: Option<f64>,

    /// Decay constant of the closeness score (km)
    #[arg(long)]
    lambda_km: Option<f64>,

    /// Suggestions shown per turn
    #[arg(long)]
    top: Option<usize>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive session, feedback typed in by hand (default)
    Play,
    /// Let the solver play against known targets
    Simulate {
        /// Target country; random targets are drawn when omitted
        #[arg(short, long)]
        target: Option<String>,

        /// Number of random targets
        #[arg(short, long, default_value_t = 20)]
        count: usize,

        /// Print the reports as JSON
        #[arg(long)]
        json: bool,
    },
}

fn resolve_config(args: &Args) -> Result<SolverConfig> {
    let mut config = match &args.config {
        Some(path) => SolverConfig::load(path)
            .with_context(|| format!("Unable to load config from {}", path.display()))?,
        None => SolverConfig::default(),
    };

    if let Some(neighbors) = args.neighbors {
        config.neighbor_count = neighbors;
    }
    if let Some(tolerance_miles) = args.tolerance_miles {
        config.tolerance_miles = tolerance_miles;
    }
    if let Some(lambda_km) = args.lambda_km {
        config.lambda_km = lambda_km;
    }
    if let Some(top) = args.top {
        config.top = top;
    }
    config.validate()?;

    Ok(config)
}

fn prompt<B: BufRead>(lines: &mut io::Lines<B>, text: &str) -> Result<Option<String>> {
    print!("{text}");
    io::stdout().flush()?;
    Ok(lines.next().transpose()?.map(|l| l.trim().to_string()))
}

fn parse_miles(input: &str) -> Option<f64> {
    input
        .parse::<f64>()
        .ok()
        .filter(|m| m.is_finite() && *m >= 0.)
}

fn name(translator: &Translator, id: usize) -> &str {
    translator.to_name(id).unwrap_or("?")
}

fn play(model: &GeometryModel, translator: &Translator, config: &SolverConfig) -> Result<()> {
    let mut store = CandidateStore::new(model, config.tolerance_miles);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    while !store.is_solved() {
        if store.candidates().is_empty() {
            println!("{}", "No consistent candidate left.".red());
            return Ok(());
        }

        let ranked = store.rank(config.lambda_km);
        println!("\nTop {} suggestions:", config.top.min(ranked.len()));
        for (i, r) in ranked.iter().take(config.top).enumerate() {
            println!(
                "{}. {} ({:.4} bits)",
                i + 1,
                name(translator, r.id).bold(),
                r.entropy
            );
        }

        let Some(input) = prompt(&mut lines, "\nEnter your guess: ")? else {
            return Ok(());
        };
        let guess = match translator
            .to_id(&input)
            .and_then(|id| store.validate_guess(id).map(|_| id))
        {
            Ok(guess) => guess,
            Err(err) => {
                println!("{err}; try again.");
                continue;
            }
        };

        store.snapshot();

        let Some(answer) = prompt(&mut lines, "Is it adjacent? (y/n): ")? else {
            return Ok(());
        };
        let is_adjacent = answer.eq_ignore_ascii_case("y");

        let miles = if is_adjacent {
            0.
        } else {
            let Some(input) = prompt(&mut lines, "Enter approximate distance (miles): ")? else {
                return Ok(());
            };
            match parse_miles(&input) {
                Some(miles) => miles,
                None => {
                    println!("Bad number; reverting guess.");
                    store.restore()?;
                    store.mark_impossible(guess)?;
                    continue;
                }
            }
        };

        if store.apply_feedback(guess, is_adjacent, miles)? {
            println!("Remaining candidates: {}", store.candidates().len());
            continue;
        }

        store.restore()?;
        if is_adjacent {
            println!("{}", "No remaining candidate is adjacent to that guess.".yellow());
        } else {
            println!(
                "No exact matches, showing the {CLOSEST_ON_DEAD_END} closest by error:"
            );
            for (id, error) in store.closest_by_error(guess, miles, CLOSEST_ON_DEAD_END) {
                println!(" • {} (off by {error:.0} mi)", name(translator, id));
            }
        }
        store.mark_impossible(guess)?;
    }

    let solution = store.solution()?;
    println!(
        "\n{} The country is: {}",
        "Solved!".green().bold(),
        name(translator, solution).bold()
    );

    Ok(())
}

fn print_report(report: &SolveReport, translator: &Translator) {
    println!("target: {}", name(translator, report.target).bold());
    for turn in &report.turns {
        let feedback = match turn.feedback {
            Some(feedback) => feedback.to_string(),
            None => "correct".green().to_string(),
        };
        let dead_end = if turn.dead_end { " (dead end)" } else { "" };
        println!(
            "  {} [{:.3} bits]: {feedback}, {} left{dead_end}",
            name(translator, turn.guess),
            turn.entropy,
            turn.remaining
        );
    }
    if report.solution.is_none() {
        println!("  {}", "unsolved".red());
    }
}

fn simulate(
    model: &GeometryModel,
    translator: &Translator,
    config: &SolverConfig,
    target: Option<String>,
    count: usize,
    json: bool,
) -> Result<()> {
    let reports = match target {
        Some(target) => vec![solvers::solve(model, config, translator.to_id(&target)?)?],
        None => solvers::solve_random(model, config, count, &mut rand::thread_rng())?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        print_report(report, translator);
    }
    if let Some(mean) = solvers::mean_guesses(&reports) {
        println!("\nmean guesses over {} targets: {mean:.2}", reports.len());
    }

    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = resolve_config(&args)?;

    let entities = data::load_entities(&args.data)
        .with_context(|| format!("Unable to load countries from {}", args.data.display()))?;
    let model = GeometryModel::build(&entities, config.neighbor_count);
    let translator = Translator::generate(&entities);

    match args.command.unwrap_or(Command::Play) {
        Command::Play => play(&model, &translator, &config),
        Command::Simulate {
            target,
            count,
            json,
        } => simulate(&model, &translator, &config, target, count, json),
    }
}
