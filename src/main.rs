use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use review_pulse::client::{build_client, HttpInsightProvider, HttpReviewSource};
use review_pulse::config::EngineConfig;
use review_pulse::filter::{CitySelector, RatingSelector, ReviewFilter};
use review_pulse::insights::InsightSession;
use review_pulse::models::ReviewRecord;
use review_pulse::normalize::normalize;
use review_pulse::refresh::spawn_refresh;
use review_pulse::seed::{generate_sample, SeedOptions};
use review_pulse::session::{build_snapshot, DashboardSnapshot};
use review_pulse::source::{FileReviewSource, ReviewSource};
use review_pulse::{filter, report};

#[derive(Parser)]
#[command(name = "review-pulse")]
#[command(about = "Customer feedback analytics for the review dashboard", long_about = None)]
struct Cli {
    /// TOML config file (overrides REVIEW_PULSE_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Read reviews from a JSON or CSV export instead of the backend
    #[arg(long, global = true)]
    file: Option<PathBuf>,
    /// Seed for map marker jitter
    #[arg(long, global = true, default_value_t = 0)]
    jitter_seed: u64,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print headline statistics
    Stats {
        /// Print the full dashboard snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        scope: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// List reviews matching the dashboard filters
    Filter {
        #[arg(long)]
        text: Option<String>,
        #[arg(long, default_value = "all")]
        rating: RatingSelector,
        #[arg(long, default_value = "all")]
        city: CitySelector,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Fetch generated action items for one rating bucket
    Insights {
        #[arg(long)]
        rating: u8,
    },
    /// Re-fetch and re-aggregate on an interval until interrupted
    Watch {
        #[arg(long)]
        interval_secs: Option<u64>,
    },
    /// Write a deterministic sample corpus as JSON
    Seed {
        #[arg(long, default_value = "reviews.json")]
        out: PathBuf,
        #[arg(long, default_value_t = 22)]
        count: usize,
        #[arg(long, default_value_t = 10)]
        span_days: i64,
        #[arg(long, default_value_t = 7)]
        seed: u64,
    },
}

fn review_source(cli: &Cli, config: &EngineConfig) -> anyhow::Result<Arc<dyn ReviewSource>> {
    if let Some(path) = &cli.file {
        return Ok(Arc::new(FileReviewSource::new(path)));
    }
    let client = build_client(config.request_timeout()).context("failed to build HTTP client")?;
    Ok(Arc::new(HttpReviewSource::new(client, config.api_base_url.clone())))
}

async fn load_records(source: &dyn ReviewSource) -> anyhow::Result<Vec<ReviewRecord>> {
    let raw = source
        .fetch_reviews()
        .await
        .context("failed to fetch reviews")?;
    let (records, report) = normalize(raw);
    if !report.dropped.is_empty() {
        println!("Skipped {} malformed reviews.", report.dropped.len());
    }
    Ok(records)
}

fn snapshot_now(records: &[ReviewRecord], config: &EngineConfig, seed: u64) -> DashboardSnapshot {
    use rand::SeedableRng;
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    build_snapshot(records, Utc::now(), config, &config.city_coordinates(), &mut rng)
}

fn print_headline(snapshot: &DashboardSnapshot) {
    let stats = &snapshot.statistics;
    println!(
        "{} reviews, avg {:.2} ({}), {:.1}% negative, {} cities, {} in the last window",
        stats.total,
        stats.average_rating,
        snapshot.sentiment.label(),
        stats.negative_percent(),
        stats.distinct_city_count,
        stats.recent_count
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::resolve(cli.config.as_deref()).context("failed to load configuration")?;

    match &cli.command {
        Commands::Stats { json } => {
            let source = review_source(&cli, &config)?;
            let records = load_records(source.as_ref()).await?;
            let snapshot = snapshot_now(&records, &config, cli.jitter_seed);

            if *json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
                return Ok(());
            }

            print_headline(&snapshot);
            println!("Rating mix:");
            for entry in snapshot.histogram.iter().rev() {
                println!("- {}★ {}", entry.rating, entry.count);
            }
            println!("Top cities:");
            for city in snapshot.top_cities.iter() {
                println!("{}. {} ({})", city.rank, city.city, city.count);
            }
        }
        Commands::Report { scope, out } => {
            let source = review_source(&cli, &config)?;
            let records = load_records(source.as_ref()).await?;
            let snapshot = snapshot_now(&records, &config, cli.jitter_seed);
            let report = report::build_report(scope.as_deref(), &snapshot, &records);
            std::fs::write(out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Filter {
            text,
            rating,
            city,
            limit,
        } => {
            let source = review_source(&cli, &config)?;
            let records = load_records(source.as_ref()).await?;
            let active = ReviewFilter {
                text: text.clone(),
                rating: *rating,
                city: city.clone(),
            };
            let matches = filter::filter(&records, &active);

            if matches.is_empty() {
                println!("No reviews match these filters.");
                return Ok(());
            }

            println!("{} matching reviews:", matches.len());
            for record in matches.iter().take(*limit) {
                println!("- {}", report::review_line(record));
            }
        }
        Commands::Insights { rating } => {
            let client =
                build_client(config.request_timeout()).context("failed to build HTTP client")?;
            let provider = HttpInsightProvider::new(client, config.api_base_url.clone());
            let session = InsightSession::new(Arc::new(provider));
            let items = session
                .request(*rating)
                .await
                .with_context(|| format!("could not fetch insights for {rating}-star reviews"))?;

            println!("Action plan for {rating}-star reviews:");
            for (idx, item) in items.iter().enumerate() {
                println!("{}. {}", idx + 1, item);
            }
        }
        Commands::Watch { interval_secs } => {
            let source = review_source(&cli, &config)?;
            let interval = interval_secs
                .map(std::time::Duration::from_secs)
                .unwrap_or_else(|| config.refresh_interval());
            anyhow::ensure!(!interval.is_zero(), "refresh interval must be positive");
            info!("Watching reviews - interval={}s", interval.as_secs());

            let handle = spawn_refresh(source, config.clone(), interval, cli.jitter_seed);
            let mut updates = handle.subscribe();
            loop {
                tokio::select! {
                    changed = updates.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let latest = (*updates.borrow_and_update()).clone();
                        if let Some(update) = latest {
                            print!("[{}] ", update.refreshed_at.format("%H:%M:%S"));
                            print_headline(&update.snapshot);
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        println!("Stopping.");
                        handle.cancel();
                        break;
                    }
                }
            }
        }
        Commands::Seed {
            out,
            count,
            span_days,
            seed,
        } => {
            let records = generate_sample(&SeedOptions {
                count: *count,
                end: Utc::now(),
                span_days: *span_days,
                seed: *seed,
            });
            let body = serde_json::to_string_pretty(&records)?;
            std::fs::write(out, body)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Wrote {} sample reviews to {}.", records.len(), out.display());
        }
    }

    Ok(())
}
