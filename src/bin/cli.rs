use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use nba_props_edge::api::odds_api::OddsApiClient;
use nba_props_edge::config::{parse_list, Settings};
use nba_props_edge::data::{
    load_edge_bets_from_csv, save_edge_bets_to_csv, save_games_to_csv, save_parlays_to_csv,
    save_projections_to_csv, save_prop_lines_to_csv,
};
use nba_props_edge::edge::{best_bets, EdgeBet};
use nba_props_edge::filters::{available_bet_types, default_bet_types, BetFilter, SideFilter};
use nba_props_edge::leaderboard::{create_leaderboards, DEFAULT_LEADERBOARD_CATEGORIES};
use nba_props_edge::parlay::{optimize_parlays, ParlayConfig, ParlayRanking, ParlayStrategy};
use nba_props_edge::{build_edge_bets, fetch_projection_snapshot, fetch_prop_lines};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cli", about = "NBA player-prop edge finder")]
struct Cli {
    /// Slate date (YYYY-MM-DD), defaults to today
    #[arg(long, global = true)]
    date: Option<NaiveDate>,

    /// Reuse cached API responses when present
    #[arg(long, global = true)]
    use_cache: bool,

    /// Write results to CSV files in the cache directory
    #[arg(long, global = true)]
    save_csv: bool,

    /// Overrides CACHE_DIR
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Bet filters shared by `edges` and `parlays`
#[derive(Args, Debug, Clone)]
struct FilterArgs {
    #[arg(long)]
    team: Option<String>,
    /// Comma-separated market keys, or `all`; blocks, steals and threes are left out by default
    #[arg(long)]
    bet_types: Option<String>,
    #[arg(long, default_value = "both")]
    side: SideFilter,
    #[arg(long)]
    min_minutes: Option<f64>,
    #[arg(long)]
    min_edge: Option<f64>,
}

impl FilterArgs {
    fn to_filter(&self, bets: &[EdgeBet]) -> BetFilter {
        BetFilter {
            teams: self.team.iter().cloned().collect(),
            bet_types: match self.bet_types.as_deref() {
                None => default_bet_types(&available_bet_types(bets)),
                Some("all") => Vec::new(),
                Some(list) => parse_list(list),
            },
            side: self.side,
            min_minutes: self.min_minutes,
            min_edge: self.min_edge,
            ..BetFilter::default()
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Fetch slates, games and player projections
    Projections {
        /// Players shown per leaderboard
        #[arg(long, default_value = "10")]
        top: usize,
    },
    /// Fetch player-prop lines from the odds API
    Odds,
    /// Merge projections with prop lines and list bets by edge
    Edges {
        #[command(flatten)]
        filters: FilterArgs,
        /// Only points, rebounds and assists bets with positive edge
        #[arg(long)]
        best: bool,
        #[arg(long, default_value = "30")]
        top: usize,
    },
    /// Build parlays from positive-edge bets
    Parlays {
        /// Maximum legs per parlay
        #[arg(long, default_value = "4")]
        legs: usize,
        /// Minimum legs per parlay, defaults to --legs
        #[arg(long)]
        min_legs: Option<usize>,
        #[arg(long, default_value = "2")]
        count: usize,
        #[arg(long, default_value = "balanced")]
        strategy: ParlayStrategy,
        #[arg(long, default_value = "odds")]
        ranking: ParlayRanking,
        /// Allow a bet to appear in more than one parlay
        #[arg(long)]
        allow_overlap: bool,
        /// Read merged bets from a CSV written by `edges --save-csv`
        #[arg(long)]
        from_csv: Option<PathBuf>,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Show remaining odds API requests
    Usage,
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::from_env()?;
    if let Some(dir) = &cli.cache_dir {
        settings.cache_dir = dir.clone();
    }
    Ok(settings)
}

async fn print_usage(settings: &Settings) -> Result<()> {
    let odds_client = OddsApiClient::new(settings.odds_api_key.clone());
    let usage = odds_client
        .check_usage()
        .await
        .context("Failed to check API usage")?;

    println!("\nAPI USAGE\n");
    match usage.remaining {
        Some(remaining) => println!("Requests remaining: {}", remaining),
        None => println!("Requests remaining: unknown"),
    }
    if let Some(used) = usage.used {
        println!("Requests used: {}", used);
    }
    Ok(())
}

/// Usage is informational after a fetch; a failed check only warns
async fn report_usage(settings: &Settings) {
    if let Err(e) = print_usage(settings).await {
        warn!(error = %format!("{:#}", e), "could not check API usage");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_logging();

    let cli = Cli::parse();
    let date = cli.date.unwrap_or_else(|| Local::now().date_naive());

    println!("NBA Player Prop Edge Finder\n");

    match cli.command.clone() {
        Commands::Projections { top } => {
            let settings = load_settings(&cli)?;
            let snapshot = fetch_projection_snapshot(&settings, date, cli.use_cache).await?;

            println!("SLATES FOR {}\n", date);
            if snapshot.slates.is_empty() {
                println!("No slates found.");
            }
            for slate in &snapshot.slates {
                println!(
                    "- {} ({}){}",
                    slate.id,
                    slate.site,
                    slate
                        .name
                        .as_deref()
                        .map(|n| format!(" {}", n))
                        .unwrap_or_default()
                );
            }

            println!("\nGAMES\n");
            if snapshot.games.is_empty() {
                println!("No games found.");
            }
            for game in &snapshot.games {
                println!("{} | {}", game.matchup(), game.start_time_display());
            }

            println!("\nPROJECTIONS ({} players)\n", snapshot.projections.len());
            for board in create_leaderboards(&snapshot.projections, &DEFAULT_LEADERBOARD_CATEGORIES, top) {
                println!("Top {} {}:", top, board.category);
                for entry in &board.entries {
                    println!(
                        "  {}. {} ({} vs {}) {:.1} | eFG {}",
                        entry.rank,
                        entry.player_name,
                        entry.team,
                        entry.opp,
                        entry.value,
                        entry.efg_display()
                    );
                }
                println!();
            }

            if cli.save_csv {
                let games_csv = settings.cache_file(&format!("games_{}.csv", date));
                let proj_csv = settings.cache_file(&format!("projections_{}.csv", date));
                save_games_to_csv(&snapshot.games, &games_csv)?;
                save_projections_to_csv(&snapshot.projections, &proj_csv)?;
                println!("Saved games to {}", games_csv.display());
                println!("Saved projections to {}", proj_csv.display());
            }
        }

        Commands::Odds => {
            let settings = load_settings(&cli)?;
            let lines = fetch_prop_lines(&settings, date, cli.use_cache).await?;

            println!("PLAYER PROP LINES\n");
            if lines.is_empty() {
                println!("No prop lines found.");
            } else {
                let mut by_market: BTreeMap<&str, usize> = BTreeMap::new();
                for line in &lines {
                    *by_market.entry(line.market.as_str()).or_default() += 1;
                }
                println!("Fetched {} lines:\n", lines.len());
                for (market, count) in by_market {
                    println!("  {:<40} {}", market, count);
                }
            }

            if cli.save_csv && !lines.is_empty() {
                let path = settings.cache_file(&format!("prop_lines_{}.csv", date));
                save_prop_lines_to_csv(&lines, &path)?;
                println!("\nSaved prop lines to {}", path.display());
            }

            report_usage(&settings).await;
        }

        Commands::Edges { filters, best, top } => {
            let settings = load_settings(&cli)?;
            let snapshot = fetch_projection_snapshot(&settings, date, cli.use_cache).await?;
            let lines = fetch_prop_lines(&settings, date, cli.use_cache).await?;
            let bets = build_edge_bets(&snapshot.projections, &lines);

            let mut filtered = filters.to_filter(&bets).apply(&bets);
            if best {
                filtered = best_bets(&filtered);
            }

            println!("PLAYER PROP EDGES\n");
            if filtered.is_empty() {
                println!("No bets found.");
            } else {
                println!("Top {} of {} bets by z-score:\n", top.min(filtered.len()), filtered.len());
                for (i, bet) in filtered.iter().take(top).enumerate() {
                    println!("{}. {}", i + 1, bet.format());
                }
            }

            if cli.save_csv && !bets.is_empty() {
                let path = settings.cache_file(&format!("edges_{}.csv", date));
                save_edge_bets_to_csv(&bets, &path)?;
                println!("\nSaved merged bets to {}", path.display());
            }

            report_usage(&settings).await;
        }

        Commands::Parlays {
            legs,
            min_legs,
            count,
            strategy,
            ranking,
            allow_overlap,
            from_csv,
            filters,
        } => {
            let mut config = ParlayConfig::new(legs, count);
            config.min_legs = min_legs.unwrap_or(legs);
            config.strategy = strategy;
            config.ranking = ranking;
            config.unique_legs = !allow_overlap;

            let (bets, settings) = match &from_csv {
                Some(path) => {
                    println!("Loading bets from {}\n", path.display());
                    (load_edge_bets_from_csv(path)?, None)
                }
                None => {
                    let settings = load_settings(&cli)?;
                    let snapshot =
                        fetch_projection_snapshot(&settings, date, cli.use_cache).await?;
                    let lines = fetch_prop_lines(&settings, date, cli.use_cache).await?;
                    (build_edge_bets(&snapshot.projections, &lines), Some(settings))
                }
            };

            let candidates = filters.to_filter(&bets).apply(&bets);
            let parlays = optimize_parlays(&candidates, &config)?;

            println!(
                "PARLAYS ({} strategy, {} candidate bets)\n",
                config.strategy,
                candidates.len()
            );
            if parlays.is_empty() {
                println!("No parlays found.");
            }
            for (i, parlay) in parlays.iter().enumerate() {
                println!("Parlay {}: {}", i + 1, parlay.format());
                for leg in &parlay.legs {
                    println!("    - {}", leg.format());
                }
                println!();
            }

            if cli.save_csv && !parlays.is_empty() {
                let path = match (&settings, &cli.cache_dir) {
                    (Some(settings), _) => settings.cache_file(&format!("parlays_{}.csv", date)),
                    (None, Some(dir)) => dir.join(format!("parlays_{}.csv", date)),
                    (None, None) => PathBuf::from(format!("parlays_{}.csv", date)),
                };
                save_parlays_to_csv(&parlays, &path)?;
                println!("Saved parlays to {}", path.display());
            }
        }

        Commands::Usage => {
            let settings = load_settings(&cli)?;
            print_usage(&settings).await?;
        }
    }

    Ok(())
}
