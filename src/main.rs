use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Table};

use coinlist::apis::{CoinMarketCapClient, ListingSource};
use coinlist::cache::{open_cached_store, CacheConfig, OpenedStore};
use coinlist::config::{self, Config};
use coinlist::engine::{Engine, EngineSettings, EngineState};
use coinlist::formatters::{format_currency, format_last_updated, format_number, format_percent};
use coinlist::logger::{self, LogTag, LoggerConfig};
use coinlist::paths;
use coinlist::storage::PersistentStore;

#[derive(Parser, Debug)]
#[command(name = "coinlist", version, about = "Cached, paginated cryptocurrency listing")]
struct Cli {
    /// Config file (defaults to the platform data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug output for a log tag (repeatable, or `all`)
    #[arg(long = "debug", value_name = "TAG", global = true)]
    debug: Vec<String>,

    #[arg(long, global = true)]
    verbose: bool,

    /// Only show errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Also write logs to the log file
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show one page of the listing
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        page_size: Option<u32>,
        /// Grow the window this many times before printing
        #[arg(long, default_value_t = 0)]
        show_more: u32,
        #[arg(long)]
        search: Option<String>,
    },
    /// Keep the first page fresh and print it after every refresh tick
    Watch {
        #[arg(long, default_value_t = 3)]
        ticks: u32,
        /// Overrides `refresh.interval_seconds`
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Store and cache statistics
    Status,
}

fn open_store(config: &Config) -> OpenedStore {
    let path = paths::resolve_database_path(&config.storage.database_path);
    open_cached_store(&path, CacheConfig::from_settings(&config.cache))
}

fn build_engine(config: &Config, store: Arc<dyn PersistentStore>) -> anyhow::Result<Arc<Engine>> {
    let client = CoinMarketCapClient::new(&config.api).context("Failed to create API client")?;
    let source: Arc<dyn ListingSource> = Arc::new(client);
    Ok(Engine::new(store, source, EngineSettings::from_config(config)))
}

fn render_listing(state: &EngineState, records: &[coinlist::types::CryptoRecord]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "#", "Name", "Symbol", "Price", "24h %", "7d %", "Market Cap", "Volume (24h)",
            "Circulating",
        ]);

    for record in records {
        let quote = record.usd_quote();
        table.add_row(vec![
            Cell::new(record.cmc_rank).set_alignment(CellAlignment::Right),
            Cell::new(&record.name),
            Cell::new(&record.symbol),
            Cell::new(quote.map(|q| format_currency(q.price)).unwrap_or_default()),
            Cell::new(quote.map(|q| format_percent(q.percent_change24h)).unwrap_or_default()),
            Cell::new(quote.map(|q| format_percent(q.percent_change7d)).unwrap_or_default()),
            Cell::new(quote.map(|q| format_currency(q.market_cap)).unwrap_or_default()),
            Cell::new(quote.map(|q| format_currency(q.volume24h)).unwrap_or_default()),
            Cell::new(format!(
                "{} {}",
                format_number(record.circulating_supply),
                record.symbol
            )),
        ]);
    }

    if records.is_empty() && state.is_searching() {
        table.add_row(vec![Cell::new(format!(
            "No results for '{}'",
            state.search_term
        ))]);
    }
    table
}

fn print_footer(engine: &Engine) {
    let state = engine.state();
    let range = engine.visible_page_range(5);
    println!(
        "Showing {} of {} | page {}/{} (pages {}-{}) | page size {} | updated {}{}",
        engine.showing_count(),
        state.total_items,
        state.current_page,
        engine.total_pages(),
        range.start(),
        range.end(),
        state.page_size,
        format_last_updated(state.last_updated),
        if engine.has_more() { " | more available" } else { "" }
    );
    if let Some(error) = &state.error {
        println!("{}", format!("Error: {}", error).red());
    }
}

async fn run_list(
    config: &Config,
    page: u32,
    page_size: Option<u32>,
    show_more: u32,
    search: Option<String>,
) -> anyhow::Result<()> {
    let handle = open_store(config);
    let engine = build_engine(config, handle.store)?;

    engine.fetch_initial_data().await;
    if let Some(size) = page_size {
        engine.set_page_size(size).await;
    }
    if page > 1 {
        engine.go_to_page(page).await;
    }
    for _ in 0..show_more {
        engine.show_more().await;
    }
    if let Some(term) = search {
        engine.set_search_term(&term);
    }

    let state = engine.state();
    println!("{}", render_listing(&state, &engine.filtered_cryptos()));
    print_footer(&engine);
    Ok(())
}

async fn run_watch(config: &Config, ticks: u32, interval: Option<u64>) -> anyhow::Result<()> {
    let handle = open_store(config);
    let engine = build_engine(config, handle.store)?;
    let interval = Duration::from_secs(interval.unwrap_or(config.refresh.interval_seconds).max(1));

    engine.fetch_initial_data().await;
    println!("{}", render_listing(&engine.state(), &engine.filtered_cryptos()));
    print_footer(&engine);

    engine.start_auto_refresh(interval);
    logger::info(
        LogTag::Refresh,
        &format!("Watching for {} ticks every {:?}", ticks, interval),
    );

    for tick in 1..=ticks {
        tokio::time::sleep(interval).await;
        // Let an in-flight refresh land before printing
        while engine.is_refreshing() {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        println!("{}", format!("Tick {}/{}", tick, ticks).bold());
        println!("{}", render_listing(&engine.state(), &engine.filtered_cryptos()));
        print_footer(&engine);
    }

    engine.stop_auto_refresh();
    Ok(())
}

async fn run_status(config: &Config) -> anyhow::Result<()> {
    let handle = open_store(config);
    let store = handle.store;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Item", "Value"]);
    table.add_row(vec!["Store".to_string(), store.name().to_string()]);
    table.add_row(vec![
        "Database".to_string(),
        paths::resolve_database_path(&config.storage.database_path)
            .display()
            .to_string(),
    ]);

    let stored = match store.count().await {
        Ok(count) => count.to_string(),
        Err(e) => format!("unavailable ({})", e),
    };
    table.add_row(vec!["Stored records".to_string(), stored]);

    let total = match store.get_total_count().await {
        Ok(Some(total)) => total.to_string(),
        Ok(None) => "-".to_string(),
        Err(e) => format!("unavailable ({})", e),
    };
    table.add_row(vec!["Total count".to_string(), total]);

    let updated = match store.get_last_updated().await {
        Ok(ts) => format_last_updated(ts),
        Err(e) => format!("unavailable ({})", e),
    };
    table.add_row(vec!["Last updated".to_string(), updated]);

    if let Some(cached) = &handle.cached {
        let metrics = cached.cache().metrics();
        table.add_row(vec![
            "Cache".to_string(),
            format!(
                "{} entries, {} hits, {} misses ({:.1}% hit rate), {} invalidations",
                cached.cache().len(),
                metrics.hits,
                metrics.misses,
                metrics.hit_rate() * 100.0,
                metrics.invalidations
            ),
        ]);
    }

    println!("{}", table);
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = paths::ensure_all_directories() {
        eprintln!("Failed to create required directories: {}", e);
        std::process::exit(1);
    }

    let mut logger_config = LoggerConfig::from_flags(&cli.debug, cli.verbose, cli.quiet);
    if cli.log_file {
        logger_config.file_path = Some(paths::get_log_file_path());
    }
    if let Err(e) = logger::init(logger_config) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(cli).await {
        logger::error(LogTag::System, &format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.unwrap_or_else(paths::get_config_path);
    config::load_config_from_path(&config_path.to_string_lossy()).map_err(|e| anyhow!(e))?;
    let config = config::get_config_clone();

    logger::info(
        LogTag::System,
        &format!("coinlist v{} starting", env!("CARGO_PKG_VERSION")),
    );

    match cli.command {
        Command::List {
            page,
            page_size,
            show_more,
            search,
        } => run_list(&config, page, page_size, show_more, search).await,
        Command::Watch { ticks, interval } => run_watch(&config, ticks, interval).await,
        Command::Status => run_status(&config).await,
    }
}
