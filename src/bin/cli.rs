use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use hoops_confidence::data::{load_from_cache, save_to_cache};
use hoops_confidence::odds_api::{parse_games, OddsApiClient};
use hoops_confidence::prediction_log::PredictionLog;
use hoops_confidence::props::{rank_props, PropLine};
use hoops_confidence::sampler::ConfidenceSampler;
use hoops_confidence::{
    moneyline_value, predict_games, AppPaths, EngineConfig, GameOdds, GameOutcome,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cli", about = "NBA Monte Carlo confidence engine")]
struct Cli {
    /// Monte Carlo draws per estimate (overrides MC_SAMPLES)
    #[arg(long, global = true)]
    samples: Option<usize>,

    /// Seed for reproducible runs (overrides MC_SEED)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Prediction log CSV (overrides PREDICTIONS_CSV)
    #[arg(long, global = true)]
    log: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Predict today's slate and append the picks to the log
    Predict {
        /// Reuse the cached odds instead of calling the API
        #[arg(long)]
        use_cache: bool,
        /// Read a raw Odds API response from a file
        #[arg(long)]
        odds_file: Option<PathBuf>,
    },
    /// Grade a logged prediction with the final score
    Grade {
        #[arg(long)]
        id: usize,
        #[arg(long)]
        home_score: u32,
        #[arg(long)]
        away_score: u32,
    },
    /// Show accuracy per market over graded predictions
    Stats,
    /// Show the most recent predictions
    Recent {
        #[arg(short, default_value_t = 10)]
        n: usize,
    },
    /// Show predictions made today
    Today,
    /// Show predictions still waiting on a result
    Ungraded,
    /// Rank player props by edge from a JSON file
    Props {
        #[arg(long)]
        file: PathBuf,
    },
    /// Simulate a scoring distribution against a line
    Project {
        #[arg(long)]
        mean: f64,
        #[arg(long)]
        std_dev: f64,
        #[arg(long)]
        line: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    // Only the sampling commands read MC_SAMPLES and MC_SEED
    let (samples, seed) = (cli.samples, cli.seed);

    let mut paths = AppPaths::from_env();
    if let Some(log) = cli.log {
        paths.predictions_csv = log;
    }

    match cli.command {
        Command::Predict {
            use_cache,
            odds_file,
        } => {
            let use_cache = use_cache || std::env::var("USE_CACHE").unwrap_or_default() == "1";
            let sampler = ConfidenceSampler::new(EngineConfig::from_env_with(samples, seed)?)?;
            predict(sampler, &paths, use_cache, odds_file).await
        }
        Command::Grade {
            id,
            home_score,
            away_score,
        } => {
            let mut log = PredictionLog::open(&paths.predictions_csv)?;
            let outcome = GameOutcome::from_scores(home_score, away_score);
            let record = log.grade(id, &outcome)?.clone();
            log.save()?;
            println!("Graded #{}: {}", id, record.format());
            Ok(())
        }
        Command::Stats => {
            let log = PredictionLog::open(&paths.predictions_csv)?;
            println!("ACCURACY ({} predictions)\n", log.len());
            for market in log.accuracy_summary() {
                println!("{}", market.format());
            }
            Ok(())
        }
        Command::Recent { n } => {
            let log = PredictionLog::open(&paths.predictions_csv)?;
            print_records("RECENT PREDICTIONS", log.recent(n));
            Ok(())
        }
        Command::Today => {
            let log = PredictionLog::open(&paths.predictions_csv)?;
            print_records("TODAY'S PREDICTIONS", log.today());
            Ok(())
        }
        Command::Ungraded => {
            let log = PredictionLog::open(&paths.predictions_csv)?;
            print_records("UNGRADED PREDICTIONS", log.ungraded());
            Ok(())
        }
        Command::Props { file } => {
            let props: Vec<PropLine> = load_from_cache(&file)?;
            let ranked = rank_props(&props)?;
            println!("PLAYER PROPS\n");
            for (i, edge) in ranked.iter().enumerate() {
                println!("{}. {}", i + 1, edge.format());
            }
            Ok(())
        }
        Command::Project {
            mean,
            std_dev,
            line,
        } => {
            let sampler = ConfidenceSampler::new(EngineConfig::from_env_with(samples, seed)?)?;
            let projection =
                sampler.points_projection(mean, std_dev, line, &mut sampler.config().rng())?;
            println!(
                "Predicted points: {:.2} | P(Over {:.1}): {:.1}%",
                projection.mean,
                line,
                projection.over_probability * 100.0
            );
            Ok(())
        }
    }
}

async fn predict(
    sampler: ConfidenceSampler,
    paths: &AppPaths,
    use_cache: bool,
    odds_file: Option<PathBuf>,
) -> Result<()> {
    println!("NBA Monte Carlo Confidence Engine\n");
    println!("Running {} simulations per market...\n", sampler.config().samples);

    let games: Vec<GameOdds> = if let Some(file) = odds_file {
        let raw = std::fs::read_to_string(&file)
            .with_context(|| format!("Failed to read odds file {}", file.display()))?;
        parse_games(&raw)?
    } else if use_cache && paths.odds_cache.exists() {
        println!(
            "Loading odds from cache file: {}\n",
            paths.odds_cache.display()
        );
        load_from_cache(&paths.odds_cache)?
    } else {
        let api_key =
            std::env::var("ODDS_API_KEY").context("ODDS_API_KEY not set in .env file")?;
        let odds_client = OddsApiClient::new(api_key);
        let games = odds_client
            .fetch_games()
            .await
            .context("Failed to fetch NBA odds")?;
        save_to_cache(&games, &paths.odds_cache)?;
        println!("Saved odds to cache file: {}\n", paths.odds_cache.display());
        games
    };

    if games.is_empty() {
        println!("No NBA games found for today.");
        return Ok(());
    }

    let today = Local::now().date_naive();
    let report = predict_games(&sampler, &games, today);

    let mut log = PredictionLog::open(&paths.predictions_csv)?;
    for record in report.records {
        let value = games
            .iter()
            .find(|g| g.home_team == record.home_team && g.away_team == record.away_team)
            .map(|g| moneyline_value(&record, g));

        let id = log.append(record);
        if let Some(record) = log.get(id) {
            println!("{}. {}", id, record.format());
        }
        match value {
            Some(Ok(value)) => println!("   {}", value.format()),
            Some(Err(e)) => println!("   Moneyline value unavailable: {}", e),
            None => {}
        }
    }

    if !report.skipped.is_empty() {
        println!("\nSKIPPED GAMES\n");
        for skipped in &report.skipped {
            println!(
                "{} @ {}: {}",
                skipped.away_team, skipped.home_team, skipped.reason
            );
        }
    }

    log.save()?;
    println!(
        "\nSaved predictions to {}",
        paths.predictions_csv.display()
    );

    Ok(())
}

fn print_records(title: &str, records: Vec<(usize, &hoops_confidence::PredictionRecord)>) {
    println!("{}\n", title);
    if records.is_empty() {
        println!("No predictions found.");
        return;
    }
    for (id, record) in records {
        println!("{}. {}", id, record.format());
    }
}
