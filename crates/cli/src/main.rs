use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::types::columns;
use data_loader::{ImdbFiles, Table};
use model::{MODEL_FILE, Verdict, train_from_store};
use pipeline::{
    Artifact, ArtifactStore, PipelineConfig, ScoreMap, StageContext, aggregate_mean, standard_pipeline,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use server::{PredictionRequest, PredictionResponse, PredictionService};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

/// Marquee - box office verdicts for Indian regional cinema
#[derive(Parser)]
#[command(name = "marquee")]
#[command(about = "Predict movie ratings from IMDb data", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the IMDb .tsv/.tsv.gz dumps
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Directory for intermediate tables and the model
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Raw rows per chunk when streaming dump files
    #[arg(long)]
    chunk_rows: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Join, filter and score the raw dumps into movie tables
    Prepare,

    /// Fit the rating model on the prepared movie table
    Train,

    /// Predict the rating and verdict of an upcoming movie
    Predict {
        /// Release year
        #[arg(long)]
        year: i64,

        /// Runtime in minutes
        #[arg(long)]
        runtime: i64,

        /// Genre, or a comma-separated combination such as "Action,Drama"
        #[arg(long)]
        genre: String,

        /// Language code such as hi, ta, te
        #[arg(long)]
        language: String,

        /// Expected number of IMDb votes
        #[arg(long, default_value = "1000")]
        votes: i64,

        #[arg(long)]
        director: Option<String>,

        #[arg(long)]
        actor: Option<String>,
    },

    /// Summarize the prepared movie table
    Insights {
        /// Number of top rated movies to list
        #[arg(long, default_value = "10")]
        top: usize,
    },

    /// Run benchmark to test prediction latency
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "1000")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "16")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Prepare => handle_prepare(config)?,
        Commands::Train => handle_train(&config)?,
        Commands::Predict {
            year,
            runtime,
            genre,
            language,
            votes,
            director,
            actor,
        } => {
            let request = PredictionRequest {
                release_year: year,
                runtime_minutes: runtime,
                genre,
                language,
                expected_votes: votes,
                director,
                actor,
            };
            handle_predict(&config, request).await?
        }
        Commands::Insights { top } => handle_insights(&config, top)?,
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(&config, requests, concurrent).await?,
    }

    Ok(())
}

/// Defaults, then the TOML file, then command-line flags
fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(dir) = &cli.out_dir {
        config.out_dir = dir.clone();
    }
    if let Some(rows) = cli.chunk_rows {
        config.chunk_rows = rows;
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Handle the 'prepare' command
fn handle_prepare(config: PipelineConfig) -> Result<()> {
    println!("Preparing movie tables from {}...", config.data_dir.display());
    let start = Instant::now();

    let files = ImdbFiles::locate(&config.data_dir).context("Failed to locate IMDb dumps")?;
    let mut store = ArtifactStore::new(&config.out_dir);
    let ctx = StageContext::new(config, files);
    let runs = standard_pipeline(&ctx).run(&mut store)?;

    for run in &runs {
        println!("{} {} in {:.2?}", "✓".green(), run.stage.bold(), run.elapsed);
        for (artifact, rows) in &run.outputs {
            println!("    {} ({} rows)", artifact, rows);
        }
    }
    println!("{} Prepared in {:.2?}", "✓".green(), start.elapsed());
    Ok(())
}

/// Handle the 'train' command
fn handle_train(config: &PipelineConfig) -> Result<()> {
    let mut store = ArtifactStore::new(&config.out_dir);
    println!("Training on {}...", Artifact::MoviesWithDirectorActorScores);
    let artifact = train_from_store(&mut store, config).context("Training failed")?;
    info!("Trained on {} rows", artifact.trained_rows);
    let path = config.out_dir.join(MODEL_FILE);
    artifact.save(&path)?;

    println!("{} Model saved to {}", "✓".green(), path.display());
    match &artifact.evaluation {
        Some(e) => {
            println!("{}R²: {:.4}", "• ".cyan(), e.r2);
            println!("{}MAE: {:.4}", "• ".cyan(), e.mae);
            println!("{}Test rows: {}", "• ".cyan(), e.rows);
        }
        None => println!("{}No held-out rows; evaluation skipped", "• ".yellow()),
    }
    Ok(())
}

fn colored_verdict(verdict: Verdict) -> colored::ColoredString {
    let label = verdict.label().bold();
    match verdict {
        Verdict::Blockbuster => label.bright_green(),
        Verdict::SuperHit => label.green(),
        Verdict::Hit => label.cyan(),
        Verdict::Average => label.yellow(),
        Verdict::Flop => label.red(),
    }
}

fn print_prediction(response: &PredictionResponse) {
    println!("{}", "Prediction:".bold().blue());
    println!("{}Predicted rating: {:.2}/10", "• ".green(), response.rating);
    println!("{}Verdict: {}", "• ".green(), colored_verdict(response.verdict));
    println!("{}Success rate: {:.1}%", "• ".green(), response.success_rate);
    println!("  {}", response.message().italic());
    for notice in &response.notices {
        println!("{} {}", "note:".yellow(), notice);
    }
}

/// Handle the 'predict' command
async fn handle_predict(config: &PipelineConfig, request: PredictionRequest) -> Result<()> {
    let service = PredictionService::load(config)?;
    match service.predict_blocking(request).await {
        Ok(response) => {
            print_prediction(&response);
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            Err(anyhow!("Invalid value for '{}'", e.field()))
        }
    }
}

fn rating_of(table: &Table, row: usize, column: usize) -> f64 {
    table
        .row(row)
        .and_then(|r| r.at(column))
        .and_then(|v| v.parse().ok())
        .unwrap_or(f64::NEG_INFINITY)
}

fn print_means(title: &str, means: ScoreMap, limit: usize) {
    let mut ranked: Vec<(String, f64)> = means.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    println!("{}", title.bold().blue());
    for (key, mean) in ranked.iter().take(limit) {
        println!("  - {}: {:.2}", key, mean);
    }
}

/// Handle the 'insights' command
fn handle_insights(config: &PipelineConfig, top: usize) -> Result<()> {
    let mut store = ArtifactStore::new(&config.out_dir);
    let movies = store
        .get(Artifact::Movies)
        .context("No prepared movie table; run `marquee prepare` first")?;
    println!("{} {} movies in {}", "✓".green(), movies.len(), Artifact::Movies);

    let rating = movies.require_column(columns::AVERAGE_RATING)?;
    let title = movies.require_column(columns::PRIMARY_TITLE)?;
    let year = movies.require_column(columns::START_YEAR)?;
    let language = movies.require_column(columns::LANGUAGE)?;

    let mut order: Vec<usize> = (0..movies.len()).collect();
    order.sort_by(|&a, &b| rating_of(movies, b, rating).total_cmp(&rating_of(movies, a, rating)));
    println!("{}", format!("Top {} rated movies:", top).bold().blue());
    for (rank, &i) in order.iter().take(top).enumerate() {
        let Some(row) = movies.row(i) else { continue };
        println!(
            "{}. {} ({}) [{}] - {}",
            (rank + 1).to_string().green(),
            row.at(title).unwrap_or("?"),
            row.at(year).unwrap_or("????"),
            row.at(language).unwrap_or("?"),
            row.at(rating).unwrap_or("-")
        );
    }

    print_means(
        "Average rating by language:",
        aggregate_mean(movies, columns::LANGUAGE, columns::AVERAGE_RATING)?,
        usize::MAX,
    );
    print_means(
        "Average rating by genre combination (top 15):",
        aggregate_mean(movies, columns::GENRES, columns::AVERAGE_RATING)?,
        15,
    );
    Ok(())
}

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    let idx = ((sorted.len() as f64 * p) as usize).min(sorted.len() - 1);
    sorted[idx]
}

/// Handle the 'benchmark' command
async fn handle_benchmark(config: &PipelineConfig, requests: usize, concurrent: usize) -> Result<()> {
    if requests == 0 || concurrent == 0 {
        return Err(anyhow!("requests and concurrent must both be at least 1"));
    }
    let service = PredictionService::load(config)?;
    let space = service.predictor().feature_space().clone();

    // Random requests drawn from the training vocabularies
    let mut rng = StdRng::seed_from_u64(config.seed);
    let inputs: Vec<PredictionRequest> = (0..requests)
        .map(|_| PredictionRequest {
            release_year: rng.random_range(i64::from(config.min_year)..=i64::from(config.max_year)),
            runtime_minutes: rng.random_range(i64::from(config.min_runtime)..=i64::from(config.max_runtime)),
            genre: pick(&mut rng, space.genre.values()),
            language: pick(&mut rng, space.language.values()),
            expected_votes: rng.random_range(0..200_000),
            director: None,
            actor: None,
        })
        .collect();

    let start = Instant::now();
    let mut timings = Vec::with_capacity(requests);
    for batch in inputs.chunks(concurrent) {
        let mut handles = Vec::with_capacity(batch.len());
        for request in batch.iter().cloned() {
            let service = service.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                let start = Instant::now();
                service.predict(&request).map(|_| start.elapsed())
            }));
        }
        for handle in handles {
            timings.push(handle.await??);
        }
    }
    let total_time = start.elapsed();

    timings.sort();
    let avg_latency = timings.iter().sum::<Duration>() / timings.len() as u32;
    let throughput = requests as f64 / total_time.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(&timings, 0.50));
    println!("P95 latency: {:?}", percentile(&timings, 0.95));
    println!("P99 latency: {:?}", percentile(&timings, 0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

fn pick(rng: &mut StdRng, values: &[String]) -> String {
    if values.is_empty() {
        return String::new();
    }
    values[rng.random_range(0..values.len())].clone()
}
