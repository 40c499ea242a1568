use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use nba_props_edge::dashboard::build_router;
use nba_props_edge::{fetch_all_props_data, Settings};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "web", about = "NBA player-prop dashboard")]
struct Args {
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: SocketAddr,

    /// Slate date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Reuse cached API responses when present
    #[arg(long)]
    use_cache: bool,

    /// Overrides CACHE_DIR
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    #[arg(long, default_value = "static")]
    static_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args = Args::parse();
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());

    let mut settings = Settings::from_env()?;
    if let Some(dir) = args.cache_dir {
        settings.cache_dir = dir;
    }

    info!(%date, use_cache = args.use_cache, "fetching props data");

    // Fetch data on startup
    let data = match fetch_all_props_data(&settings, date, args.use_cache).await {
        Ok(data) => {
            info!(
                games = data.games.len(),
                projections = data.projections.len(),
                lines = data.prop_lines.len(),
                bets = data.edge_bets.len(),
                "data loaded successfully"
            );
            Arc::new(RwLock::new(Some(data)))
        }
        Err(e) => {
            error!(error = %format!("{:#}", e), "failed to fetch props data");
            warn!("server will start but pages will return 503");
            Arc::new(RwLock::new(None))
        }
    };

    let app = build_router(data, &args.static_dir);

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("Failed to bind {}", args.addr))?;

    info!("dashboard listening on http://{}", args.addr);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
