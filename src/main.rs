mod app;
mod cards;
mod celebrate;
mod config;
mod demo;
mod feed;
mod logger;
mod model;
mod notify;
mod pipeline;
mod refresh;
mod rng;
mod theme;
mod timeutil;
mod tui;

use crate::app::AppState;
use crate::cards::{RandomIcons, render_html_page};
use crate::config::{Overrides, Settings, load_config};
use crate::feed::FeedClient;
use crate::model::Theme;
use crate::notify::PingPrefs;
use crate::theme::ThemeStore;
use crate::tui::{TuiContext, run_tui};
use chrono::Utc;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "prparty", version, about = "Celebrate pull requests from a JSON feed")]
struct CliArgs {
    /// Feed location: http(s) URL or local path (default: data/prs.json).
    #[arg(long)]
    feed: Option<String>,

    /// Use generated demo data instead of a feed.
    #[arg(long)]
    demo: bool,

    /// Seconds between automatic refreshes (default: 20).
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    refresh_secs: Option<u64>,

    /// Start with this theme for this session only (dark or light).
    #[arg(long, value_parser = parse_theme_arg)]
    theme: Option<Theme>,

    /// Fetch once, write the board as an HTML page to this file, and exit.
    #[arg(long, value_name = "FILE")]
    snapshot: Option<PathBuf>,

    /// Do not ring the terminal bell on the first celebration.
    #[arg(long)]
    no_bell: bool,

    /// Do not post a desktop notification on the first celebration.
    #[arg(long)]
    no_notifications: bool,
}

fn parse_theme_arg(s: &str) -> Result<Theme, String> {
    Theme::parse(s).ok_or_else(|| format!("unknown theme `{s}` (expected dark or light)"))
}

async fn write_snapshot(
    client: &FeedClient,
    theme: Theme,
    refresh_secs: u64,
    out: &Path,
) -> Result<usize, String> {
    let records = client
        .fetch()
        .await
        .map_err(|e| format!("Failed to load {}: {e}", client.source().describe()))?;
    let view = pipeline::render(&records, "", &mut RandomIcons::from_clock(), Utc::now());
    let page = render_html_page(&view, theme, refresh_secs);
    std::fs::write(out, page).map_err(|e| format!("Failed to write {}: {e}", out.display()))?;
    Ok(view.filtered_len)
}

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let args = CliArgs::parse();
    let config = load_config();
    let settings = Settings::resolve(
        &Overrides {
            feed: args.feed.clone(),
            demo: args.demo,
            refresh_secs: args.refresh_secs,
            no_bell: args.no_bell,
            no_notifications: args.no_notifications,
        },
        &config,
    );

    let log_path = logger::init(settings.log_level.as_deref());
    log::info!(
        "Starting prparty (feed: {}, refresh: {}s)",
        settings.source.describe(),
        settings.refresh_secs
    );

    let client = FeedClient::new(settings.source.clone()).unwrap_or_else(|e| {
        eprintln!("Failed to init HTTP client: {e}");
        std::process::exit(1);
    });

    let theme_store = match ThemeStore::default_path() {
        Ok(path) => ThemeStore::new(path),
        Err(e) => {
            log::warn!("{e}; keeping theme storage in the working directory");
            ThemeStore::new(PathBuf::from(".prparty-storage.toml"))
        }
    };
    log::debug!("Theme storage: {}", theme_store.path().display());
    let theme = args.theme.unwrap_or_else(|| theme_store.load());

    if let Some(out) = &args.snapshot {
        match write_snapshot(&client, theme, settings.refresh_secs, out).await {
            Ok(n) => println!("Wrote {n} cards to {}", out.display()),
            Err(e) => {
                log::error!("{e}");
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
        return;
    }

    let ctx = TuiContext {
        runtime: tokio::runtime::Handle::current(),
        client,
        refresh_period: Duration::from_secs(settings.refresh_secs),
        theme_store,
        ping: PingPrefs {
            bell: settings.bell,
            desktop: settings.desktop_notifications,
        },
    };
    let state = AppState::new(theme, Box::new(RandomIcons::from_clock()));

    // The board loop blocks on terminal input; fetches and the timer run on the runtime.
    let result = tokio::task::block_in_place(|| run_tui(ctx, state));
    if let Err(e) = result {
        log::error!("{e}");
        eprintln!("{e}");
        if let Some(path) = log_path {
            eprintln!("Log: {}", path.display());
        }
        std::process::exit(1);
    }
    log::info!("Exiting prparty");
}
