use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use portfolio_game::{
    DecisionRecord, GameConfig, GameSession, Instrument, InvestorProfile, Policy, ScoreReport,
    SessionSummary,
};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// RNG seed (random if omitted)
    #[arg(long, global = true, env = "GAME_SEED")]
    seed: Option<u64>,

    /// Number of monthly rounds
    #[arg(long, global = true, env = "GAME_ROUNDS")]
    rounds: Option<usize>,

    /// Starting capital
    #[arg(long, global = true, env = "GAME_CAPITAL")]
    capital: Option<f64>,

    /// JSON file with game settings (flags override it)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a game interactively on the terminal
    Play,

    /// Play a full game with a scripted policy
    Auto {
        /// Decision policy
        #[arg(short, long, value_enum, default_value = "trend-chaser")]
        policy: Policy,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Write the decision ledger to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

/// Everything shown at the end of a game
#[derive(Serialize)]
struct GameReport<'a> {
    config: &'a GameConfig,
    summary: SessionSummary,
    decisions: &'a [DecisionRecord],
    score: ScoreReport,
    profile: String,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let directive = if args.verbose {
        "portfolio_game=debug"
    } else {
        "portfolio_game=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse()?),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&args)?;
    let mut session = GameSession::new(config)?;

    match args.command {
        Commands::Play => {
            play_interactive(&mut session)?;
            print_report(&session);
        }
        Commands::Auto { policy, json, csv } => {
            info!("Autoplay with policy {}", policy);
            policy.play_out(&mut session)?;

            if let Some(path) = csv {
                let file = std::fs::File::create(&path)
                    .with_context(|| format!("Failed to create {:?}", path))?;
                session.ledger().write_csv(file)?;
                info!("Decisions written to {:?}", path);
            }

            if json {
                let score = session.score();
                let report = GameReport {
                    config: session.config(),
                    summary: session.summary(),
                    decisions: session.ledger().records(),
                    profile: InvestorProfile::from_report(&score).to_string(),
                    score,
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&session);
            }
        }
    }

    Ok(())
}

fn build_config(args: &Args) -> Result<GameConfig> {
    let mut config = match &args.config {
        Some(path) => GameConfig::from_json_file(path)?,
        None => GameConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(rounds) = args.rounds {
        config.total_rounds = rounds;
    }
    if let Some(capital) = args.capital {
        config.initial_capital = capital;
    }
    config.validate()?;
    Ok(config)
}

/// Parse "btc", "gold x2", "SP500 lev" into a choice and leverage flag
fn parse_choice(line: &str) -> Result<(Instrument, bool)> {
    let mut tokens = line.split_whitespace();
    let Some(first) = tokens.next() else {
        bail!("Enter an instrument: sp500, gold, btc or cash");
    };
    let instrument: Instrument = first.parse()?;

    let leverage = match tokens.next() {
        None => false,
        Some(t) if t.eq_ignore_ascii_case("x2") || t.eq_ignore_ascii_case("lev") => true,
        Some(t) => bail!("Unexpected input: {}", t),
    };
    if let Some(extra) = tokens.next() {
        bail!("Unexpected input: {}", extra);
    }

    Ok((instrument, leverage))
}

fn play_interactive(session: &mut GameSession) -> Result<()> {
    let config = session.config().clone();
    println!("Investment game");
    println!(
        "You have {} rounds and start with {}.",
        config.total_rounds,
        fmt_money(config.initial_capital)
    );
    println!("Each round pick where to invest for the next month:");
    for inst in Instrument::ALL {
        println!("  {:6} {}", inst.key().to_lowercase(), inst.label());
    }
    println!("Leverage (x2) unlocks in round {}.", config.leverage_unlock_round);
    println!("Returns are random, with a slight trend memory and rare jumps.");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    while !session.is_finished() {
        let round = session.current_round() + 1;
        println!();
        println!(
            "Round {} / {} ({})",
            round,
            config.total_rounds,
            session.next_round_label()
        );
        println!(
            "Your capital: {} ({})",
            fmt_money(session.capital()),
            fmt_pct(session.player().last_change() * 100.0)
        );
        for inst in Instrument::RISKY {
            if let Some(series) = session.paths().benchmark(inst) {
                println!("  {:8} {}", inst.label(), fmt_money(series.last()));
            }
        }
        if session.leverage_available() {
            println!("LEVERAGE UNLOCKED: add 'x2' to your choice to double gains and losses");
        }

        print!("Invest in: ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            println!("Input closed after {} rounds", session.current_round());
            break;
        };
        let line = line?;

        match parse_choice(&line).and_then(|(inst, lev)| session.play_round(inst, lev)) {
            Ok(record) => println!(
                "{} returned {} -> {}",
                record.choice,
                fmt_pct(record.realized_return * 100.0),
                fmt_money(record.capital)
            ),
            Err(e) => println!("{}", e),
        }
    }

    Ok(())
}

fn print_report(session: &GameSession) {
    let summary = session.summary();

    println!("\n{}", "=".repeat(60));
    println!("GAME SUMMARY ({} rounds)", summary.rounds_played);
    println!("{}", "=".repeat(60));
    for track in std::iter::once(&summary.player).chain(summary.benchmarks.iter()) {
        println!(
            "  {:12} {:>14} {:>10}",
            track.name,
            fmt_money(track.final_capital),
            fmt_pct(track.total_return * 100.0)
        );
    }

    if !session.ledger().is_empty() {
        println!("\n{}", "-".repeat(60));
        println!(
            "  {:>5} {:10} {:>8} {:>10} {:>14}",
            "Round", "Instrument", "Leverage", "Return", "Capital"
        );
        for record in session.ledger() {
            println!(
                "  {:>5} {:10} {:>8} {:>10} {:>14}",
                record.round,
                record.choice.label(),
                if record.leverage { "yes" } else { "no" },
                fmt_pct(record.realized_return * 100.0),
                format!("{:.2}", record.capital)
            );
        }
    }

    let score = session.score();
    println!("\n{}", "-".repeat(60));
    println!("INVESTOR ASSESSMENT");
    println!("  {}", InvestorProfile::from_report(&score));
    println!("  Rationality (0-100):   {}", score.rationality);
    println!("  Risk appetite (0-100): {}", score.risk);
    for note in &score.notes {
        println!("  - {}", note);
    }
    println!("{}", "-".repeat(60));
}

/// Whole currency units with space-separated thousands
fn fmt_money(x: f64) -> String {
    let digits = format!("{:.0}", x.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    if x < 0.0 && digits != "0" {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Percentage with an explicit plus sign for non-negative values
fn fmt_pct(x: f64) -> String {
    let sign = if x >= 0.0 { "+" } else { "" };
    format!("{}{:.2}%", sign, x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice("btc").unwrap(), (Instrument::Btc, false));
        assert_eq!(parse_choice("  Gold x2 ").unwrap(), (Instrument::Gold, true));
        assert_eq!(parse_choice("sp500 LEV").unwrap(), (Instrument::Sp500, true));
        assert!(parse_choice("").is_err());
        assert!(parse_choice("bonds").is_err());
        assert!(parse_choice("cash x3").is_err());
        assert!(parse_choice("cash x2 now").is_err());
    }

    #[test]
    fn test_fmt_money() {
        assert_eq!(fmt_money(10_000.0), "10 000");
        assert_eq!(fmt_money(999.4), "999");
        assert_eq!(fmt_money(1_234_567.0), "1 234 567");
        assert_eq!(fmt_money(-25_000.0), "-25 000");
    }

    #[test]
    fn test_fmt_pct() {
        assert_eq!(fmt_pct(12.345), "+12.35%");
        assert_eq!(fmt_pct(0.0), "+0.00%");
        assert_eq!(fmt_pct(-3.5), "-3.50%");
    }

    #[test]
    fn test_build_config_overrides() {
        let args = Args::parse_from(["portfolio-game", "--seed", "5", "--rounds", "12", "auto"]);
        let config = build_config(&args).unwrap();
        assert_eq!(config.seed, Some(5));
        assert_eq!(config.total_rounds, 12);
        assert_eq!(config.initial_capital, 10_000.0);
    }
}
