use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use streamdash::charts::{self, View};
use streamdash::config::AppConfig;
use streamdash::dataset::{self, Dataset, LoadOptions, Source};
use streamdash::model::Track;
use streamdash::selection::{SelectionState, Slice};

#[derive(Parser)]
#[command(name = "streamdash", version, about = "Linked charts over the most streamed songs")]
struct Cli {
    /// CSV source of the song dataset (overrides config)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Download the dataset again even if a cached copy exists
    #[arg(long, global = true)]
    refresh: bool,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the dataset and report what was kept
    Fetch,

    /// Print the streaming ranking for a rank range
    Top {
        /// First rank position (0-based, inclusive)
        #[arg(long)]
        start: Option<usize>,

        /// Last rank position (exclusive, at most 100)
        #[arg(long)]
        end: Option<usize>,
    },

    /// Compose the dashboard and write it as JSON
    Charts {
        #[arg(long)]
        start: Option<usize>,

        #[arg(long)]
        end: Option<usize>,

        /// Scatter x axis column (e.g. energy_%)
        #[arg(long)]
        x: Option<String>,

        /// Scatter y axis column (e.g. danceability_%)
        #[arg(long)]
        y: Option<String>,

        /// Highlight a track by name (repeatable)
        #[arg(long)]
        highlight: Vec<String>,

        /// Brush interval as FIELD=MIN:MAX (repeatable)
        #[arg(long)]
        brush: Vec<String>,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the interactive dashboard in the browser
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Don't open a browser window
        #[arg(long)]
        no_open: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load config file (optional, defaults if missing)
    let config = AppConfig::load();

    let opts = LoadOptions {
        url: cli.url.clone().unwrap_or_else(|| config.dataset_url.clone()),
        cache_path: Some(config.resolve_cache_path()),
        refresh: cli.refresh || config.refresh,
        name_fixes: config.name_fixes.clone(),
    };
    log::info!("Dataset: {}", opts.url);

    let ds = load_with_spinner(&opts)?;
    let ws = &ds.working_set;

    match cli.command {
        Commands::Fetch => {
            let stats = ws.stats();
            let from = match ds.source {
                Source::Network => "downloaded",
                Source::Cache => "cache",
            };
            println!("Source:      {} ({})", opts.url, from);
            if let Some(path) = &opts.cache_path {
                println!("Cache:       {}", path.display());
            }
            println!("Encoding:    {}", ds.encoding.label());
            println!("Raw rows:    {}", stats.raw_rows);
            println!("Dropped:     {} missing values, {} malformed streams",
                stats.dropped_missing, stats.dropped_malformed_streams);
            println!("Valid rows:  {}", stats.valid_rows);
            println!("Working set: {} tracks", ws.len());
        }

        Commands::Top { start, end } => {
            let slice = Slice::new(start.unwrap_or(config.view.start), end.unwrap_or(config.view.end))
                .context("Invalid rank range")?;
            print_ranking_table(ws.slice(slice.range()));
        }

        Commands::Charts { start, end, x, y, highlight, brush, output } => {
            let view = View::parse(
                start.unwrap_or(config.view.start),
                end.unwrap_or(config.view.end),
                x.as_deref().unwrap_or(&config.view.x_axis),
                y.as_deref().unwrap_or(&config.view.y_axis),
            )
            .context("Invalid view")?;

            let mut selection = SelectionState::default();
            for name in &highlight {
                selection.highlight.insert(name);
            }
            for arg in &brush {
                let (field, min, max) = parse_brush(arg)?;
                selection
                    .brush
                    .set_parsed(field, min, max)
                    .with_context(|| format!("Invalid --brush {arg:?}"))?;
            }

            let dashboard = charts::compose(ws, &view, &selection, &config.palette);
            let json = serde_json::to_string_pretty(&dashboard)
                .context("Failed to serialize dashboard")?;

            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Wrote {} charts to {}", dashboard.charts.len(), path.display());
                }
                None => println!("{json}"),
            }
        }

        Commands::Serve { port, no_open } => {
            let default_view = View::parse(
                config.view.start,
                config.view.end,
                &config.view.x_axis,
                &config.view.y_axis,
            )
            .context("Invalid [view] in config")?;
            let app = streamdash::serve::App::new(ws, config.palette.clone(), default_view);
            streamdash::serve::start(
                port.unwrap_or(config.server.port),
                config.server.open_browser && !no_open,
                app,
            )
            .context("Dashboard server failed")?;
        }
    }

    Ok(())
}

/// Load the dataset behind a spinner. The download is the only slow step.
fn load_with_spinner(opts: &LoadOptions) -> Result<&'static Dataset> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("  {spinner} {msg}").unwrap());
    pb.set_message("Loading dataset...");
    pb.enable_steady_tick(Duration::from_millis(100));

    let result = dataset::init(opts);
    pb.finish_and_clear();
    result.context("Failed to load dataset")
}

/// Split `FIELD=MIN:MAX`.
fn parse_brush(arg: &str) -> Result<(&str, f64, f64)> {
    let (field, range) = arg
        .split_once('=')
        .with_context(|| format!("--brush {arg:?}: expected FIELD=MIN:MAX"))?;
    let (min, max) = range
        .split_once(':')
        .with_context(|| format!("--brush {arg:?}: expected FIELD=MIN:MAX"))?;
    let min: f64 = min.trim().parse().with_context(|| format!("--brush {arg:?}: bad minimum"))?;
    let max: f64 = max.trim().parse().with_context(|| format!("--brush {arg:?}: bad maximum"))?;
    Ok((field.trim(), min, max))
}

/// Print the ranking with platform playlist counts and features.
fn print_ranking_table(tracks: &[Track]) {
    println!(
        "{:>4} {:<30} {:<20} {:>13}  {:>6} {:>5} {:>5}  {:>4} {:>4} {:>4}  {:<3} {:<5}",
        "#", "Song", "Artist", "Streams", "Spot", "Appl", "Deez", "Dnc", "Val", "Eng", "Key", "Mode"
    );
    println!("{}", "-".repeat(118));

    for t in tracks {
        println!(
            "{:>4} {:<30} {:<20} {:>13}  {:>6} {:>5} {:>5}  {:>4.0} {:>4.0} {:>4.0}  {:<3} {:<5}",
            t.rank,
            truncate(&t.name, 30),
            truncate(&t.artists, 20),
            t.streams,
            t.spotify_playlists,
            t.apple_playlists,
            t.deezer_playlists,
            t.danceability,
            t.valence,
            t.energy,
            t.key.label(),
            t.mode.label(),
        );
    }

    println!();
    println!("Spot/Appl/Deez=playlist counts  Dnc=Danceability  Val=Valence  Eng=Energy");
}

// Truncate on char boundaries; names are not ASCII.
fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let head: String = s.chars().take(width - 3).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}
