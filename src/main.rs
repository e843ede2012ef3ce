use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use educompare::backend::with_deadline;
use educompare::config::{ClientConfig, DEFAULT_API_URL};
use educompare::console::{self, ConsoleCommand};
use educompare::favorites::FavoritesStore;
use educompare::filters::ResultFilters;
use educompare::model::TrendingSearch;
use educompare::{CourseBackend, HttpBackend, Operation, Orchestrator, SpellFailurePolicy, ViewState};

#[derive(Parser, Debug)]
#[command(name = "educompare", version, about = "Search and browse online courses")]
struct Args {
    /// Base URL of the course API
    #[arg(long, env = "EDUCOMPARE_API_URL", default_value = DEFAULT_API_URL)]
    base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "EDUCOMPARE_TIMEOUT_SECS", default_value_t = 8)]
    timeout_secs: u64,

    /// Catalog page size
    #[arg(long, env = "EDUCOMPARE_PAGE_SIZE", default_value_t = 12)]
    page_size: u32,

    /// Directory holding favorites (defaults to ~/.educompare)
    #[arg(long, env = "EDUCOMPARE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Refuse to search when the spelling service is unreachable
    #[arg(long, env = "EDUCOMPARE_FAIL_CLOSED")]
    fail_closed: bool,

    /// Print views as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one spell-checked search and print the results
    Search {
        query: String,
        /// Search for the suggested spelling without asking
        #[arg(long)]
        accept_correction: bool,
    },
    /// Print one page of the course catalog
    Browse {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Print the most searched keywords
    Trending {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Manage favorite courses
    Favorite {
        #[command(subcommand)]
        action: FavoriteAction,
    },
}

#[derive(Subcommand, Debug)]
enum FavoriteAction {
    Add { id: String },
    Remove { id: String },
    Toggle { id: String },
    List,
}

impl Args {
    fn client_config(&self) -> ClientConfig {
        let policy = if self.fail_closed {
            SpellFailurePolicy::FailClosed
        } else {
            SpellFailurePolicy::FailOpen
        };
        ClientConfig::default()
            .with_base_url(self.base_url.clone())
            .with_request_timeout(Duration::from_secs(self.timeout_secs.max(1)))
            .with_page_size(self.page_size)
            .with_spell_failure_policy(policy)
    }
}

fn print_view(view: &ViewState, favorites: Option<&FavoritesStore>, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(view).context("Failed to serialize view")?
        );
    } else {
        print!("{}", console::render(view, favorites));
    }
    Ok(())
}

fn is_settled(view: &ViewState) -> bool {
    matches!(
        view,
        ViewState::ResultsReady { .. } | ViewState::CorrectionNeeded { .. } | ViewState::Blocked { .. }
    )
}

async fn run_search(
    config: ClientConfig,
    favorites: &FavoritesStore,
    query: String,
    accept_correction: bool,
    json: bool,
) -> Result<()> {
    // validation, search and one correction round
    let patience = config.request_timeout * 3;
    let backend = HttpBackend::new(&config)?;
    let handle = Orchestrator::spawn(backend, config);

    handle.submit_text(query).await?;
    let mut view = handle.wait_until(patience, is_settled).await?;

    if accept_correction && matches!(view, ViewState::CorrectionNeeded { .. }) {
        handle.accept_correction().await?;
        view = handle
            .wait_until(patience, |v| matches!(v, ViewState::ResultsReady { .. }))
            .await?;
    }

    print_view(&view, Some(favorites), json)?;
    handle.shutdown().await
}

async fn run_browse(
    config: ClientConfig,
    favorites: &FavoritesStore,
    page: u32,
    json: bool,
) -> Result<()> {
    let page = page.max(1);
    let backend = HttpBackend::new(&config)?;
    let items = with_deadline(
        Operation::CatalogPage,
        config.request_timeout,
        backend.catalog_page(page, config.page_size),
    )
    .await
    .with_context(|| format!("Failed to load catalog page {page}"))?;

    print_view(&ViewState::DefaultListing { page, items }, Some(favorites), json)
}

async fn fetch_trending(backend: &HttpBackend, config: &ClientConfig) -> Result<Vec<TrendingSearch>> {
    with_deadline(Operation::Trending, config.request_timeout, backend.trending())
        .await
        .context("Failed to load trending searches")
}

async fn run_trending(config: ClientConfig, limit: usize, json: bool) -> Result<()> {
    let backend = HttpBackend::new(&config)?;
    let mut searches = fetch_trending(&backend, &config).await?;
    searches.truncate(limit);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&searches).context("Failed to serialize trending")?
        );
    } else {
        print!("{}", console::render_trending(&searches, limit));
    }
    Ok(())
}

fn run_favorite(mut favorites: FavoritesStore, action: FavoriteAction, json: bool) -> Result<()> {
    match action {
        FavoriteAction::Add { id } => {
            if favorites.add(&id)? {
                println!("Added {id} to favorites");
            } else {
                println!("{id} is already a favorite");
            }
        }
        FavoriteAction::Remove { id } => {
            if favorites.remove(&id)? {
                println!("Removed {id} from favorites");
            } else {
                println!("{id} was not a favorite");
            }
        }
        FavoriteAction::Toggle { id } => {
            if favorites.toggle(&id)? {
                println!("Added {id} to favorites");
            } else {
                println!("Removed {id} from favorites");
            }
        }
        FavoriteAction::List => {
            let ids: Vec<&str> = favorites.ids().collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&ids)?);
            } else if ids.is_empty() {
                println!("No favorites yet");
            } else {
                for id in ids {
                    println!("{id}");
                }
            }
        }
    }
    Ok(())
}

async fn run_console(config: ClientConfig, favorites: FavoritesStore, json: bool) -> Result<()> {
    let backend = HttpBackend::new(&config)?;
    tracing::info!("Using course API at {}", backend.base_url());
    let handle = Orchestrator::spawn(backend.clone(), config.clone());
    let favorites = Arc::new(Mutex::new(favorites));

    println!("{}", console::HELP);

    let mut views = handle.subscribe();
    let printer_favorites = Arc::clone(&favorites);
    let printer = tokio::spawn(async move {
        loop {
            let view = views.borrow_and_update().clone();
            let printed = match printer_favorites.lock() {
                Ok(store) => print_view(&view, Some(&*store), json),
                Err(poisoned) => print_view(&view, Some(&*poisoned.into_inner()), json),
            };
            if let Err(e) = printed {
                tracing::warn!("Could not print view: {}", e);
            }
            if views.changed().await.is_err() {
                break;
            }
        }
    });

    let mut filters = ResultFilters::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read from stdin")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };

        let command = match console::parse_line(&line) {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{e:#}");
                continue;
            }
        };

        match command {
            ConsoleCommand::Type(text) => handle.set_query(text).await?,
            ConsoleCommand::Submit => handle.submit().await?,
            ConsoleCommand::Pick(index) => handle.accept_suggestion(index).await?,
            ConsoleCommand::AcceptCorrection => handle.accept_correction().await?,
            ConsoleCommand::Hide => handle.dismiss_suggestions().await?,
            ConsoleCommand::Retry => handle.retry().await?,
            ConsoleCommand::Next => handle.next_page().await?,
            ConsoleCommand::Prev => handle.prev_page().await?,
            ConsoleCommand::Page(page) => handle.go_to_page(page).await?,
            ConsoleCommand::ToggleFavorite(id) => {
                let mut store = favorites
                    .lock()
                    .map_err(|_| anyhow!("Favorites store lock poisoned"))?;
                let now = store.toggle(&id)?;
                println!("{id} {}", if now { "added to favorites" } else { "removed from favorites" });
            }
            ConsoleCommand::ListFavorites => {
                let store = favorites
                    .lock()
                    .map_err(|_| anyhow!("Favorites store lock poisoned"))?;
                if store.is_empty() {
                    println!("No favorites yet");
                }
                for id in store.ids() {
                    println!("♥ {id}");
                }
            }
            ConsoleCommand::Trending => match fetch_trending(&backend, &config).await {
                Ok(searches) => print!("{}", console::render_trending(&searches, 10)),
                Err(e) => eprintln!("{e:#}"),
            },
            ConsoleCommand::Help => println!("{}", console::HELP),
            ConsoleCommand::Quit => break,
            filter @ (ConsoleCommand::TogglePlatform(_)
            | ConsoleCommand::Category(_)
            | ConsoleCommand::Price(_)
            | ConsoleCommand::MinRating(_)
            | ConsoleCommand::ClearFilters) => {
                console::apply_filter_command(&mut filters, &filter);
                handle.set_filters(filters.clone()).await?;
            }
        }
    }

    handle.shutdown().await?;
    printer.abort();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries rendered views, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let args = Args::parse();
    let config = args.client_config();
    tracing::debug!(
        "Config: base_url={} timeout={:?} page_size={} spelling={}",
        config.base_url,
        config.request_timeout,
        config.page_size,
        config.spell_failure_policy.as_str()
    );

    let favorites = FavoritesStore::open(args.data_dir.clone())?;

    match args.command {
        Some(Command::Search {
            query,
            accept_correction,
        }) => run_search(config, &favorites, query, accept_correction, args.json).await,
        Some(Command::Browse { page }) => run_browse(config, &favorites, page, args.json).await,
        Some(Command::Trending { limit }) => run_trending(config, limit, args.json).await,
        Some(Command::Favorite { action }) => run_favorite(favorites, action, args.json),
        None => run_console(config, favorites, args.json).await,
    }
}
