//! Interactive, AI-assisted Raindrop.io bookmark cleanup.
//!
//! Reads the Raindrop token from `RAINDROP_TOKEN` and the OpenRouter key
//! from `OPENROUTER_KEY`. Progress is saved after every batch, so a run can
//! be stopped at any time and resumed later with the same command.
//!
//! # Examples
//!
//! ```sh
//! # Pick a collection and start reviewing
//! tidymark
//!
//! # Smaller batches, nothing changed on the server
//! tidymark --batch-size 5 --dry-run
//!
//! # Show collections and exit
//! tidymark --list-collections
//!
//! # Continue an earlier session
//! tidymark --resume
//! ```

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tidymark::prelude::*;
use tidymark::ui::text::read_line;
use tidymark_cli::config::{OPENROUTER_KEY_ENV, RAINDROP_TOKEN_ENV, require_env};
use tidymark_cli::select::{
    CollectionChoice, SessionChoice, collection_listing, parse_collection_choice,
    parse_session_choice, session_listing,
};
use tidymark_cli::{CleanupConfig, ConsoleHandler, Report, logging};
use tidymark_tui::TuiPresenter;
use tracing::{debug, warn};

const EXIT_OK: i32 = 0;
const EXIT_FAILURE: i32 = 1;
const EXIT_INTERRUPTED: i32 = 130;

/// Interactive Raindrop.io bookmark cleanup with AI recommendations.
#[derive(Parser)]
#[command(name = "tidymark", version)]
struct Cli {
    /// Bookmarks reviewed per batch.
    #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    batch_size: u64,

    /// List all collections and exit.
    #[arg(short, long)]
    list_collections: bool,

    /// Name of the archive collection.
    #[arg(long, default_value = "Archive")]
    archive_name: String,

    /// Show what would be done without making changes.
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Show resumable sessions and choose one to continue.
    #[arg(short, long)]
    resume: bool,

    /// Delete saved session files.
    #[arg(long)]
    clean_state: bool,

    /// Use the line-based interface instead of keyboard navigation.
    #[arg(short, long)]
    text_mode: bool,

    /// Directory for saved sessions.
    #[arg(long, env = "TIDYMARK_STATE_DIR", default_value = ".raindrop_state")]
    state_dir: PathBuf,

    /// Model used for recommendations.
    #[arg(long, env = "TIDYMARK_MODEL", default_value = tidymark::DEFAULT_MODEL)]
    model: String,

    /// Write debug logs to a file.
    #[arg(long)]
    debug: bool,

    /// Directory for the debug log.
    #[arg(long, default_value = ".raindrop_debug")]
    debug_dir: PathBuf,

    /// Verbose terminal logging.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> CleanupConfig {
        CleanupConfig {
            batch_size: self.batch_size as usize,
            archive_name: self.archive_name.clone(),
            dry_run: self.dry_run,
            text_mode: self.text_mode,
            state_dir: self.state_dir.clone(),
            model: self.model.clone(),
            debug: self.debug,
            debug_dir: self.debug_dir.clone(),
            verbose: self.verbose,
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = cli.config();

    if let Err(e) = logging::init(&config) {
        eprintln!("Error: failed to set up logging: {e}");
        process::exit(EXIT_FAILURE);
    }

    println!("🌧️  Interactive Raindrop Bookmark Cleanup Tool");
    println!("============================================");

    let code = run(&cli, &config).await;
    // Pending stdin reads would keep the runtime alive on shutdown.
    process::exit(code);
}

async fn run(cli: &Cli, config: &CleanupConfig) -> i32 {
    let store = match SessionStore::new(&config.state_dir) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: {e}");
            return EXIT_FAILURE;
        }
    };

    if cli.clean_state {
        return clean_state(&store).await;
    }

    let token = match require_env(RAINDROP_TOKEN_ENV) {
        Ok(token) => token,
        Err(e) => {
            eprintln!("Error: {e}");
            return EXIT_FAILURE;
        }
    };
    let source = match RaindropClient::new(token) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: failed to create Raindrop client: {e}");
            return EXIT_FAILURE;
        }
    };

    let collections = match source.list_collections().await {
        Ok(collections) if !collections.is_empty() => collections,
        Ok(_) | Err(_) => {
            println!("❌ No collections found or API error");
            return EXIT_FAILURE;
        }
    };

    if cli.list_collections {
        println!("\n📚 Found {} collections:", collections.len());
        for collection in &collections {
            println!("{}", collection_listing(collection));
        }
        return EXIT_OK;
    }

    let api_key = match require_env(OPENROUTER_KEY_ENV) {
        Ok(key) => key,
        Err(e) => {
            eprintln!("Error: {e}");
            return EXIT_FAILURE;
        }
    };
    let client = match OpenRouterClient::new(api_key) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: failed to create API client: {e}");
            return EXIT_FAILURE;
        }
    };
    let engine = LlmRecommender::new(client, config.model.clone())
        .with_template(PromptTemplate::from_env());

    let archive_collection_id = match find_collection_by_name(&collections, &config.archive_name)
    {
        Some(archive) => {
            println!("📦 Found archive collection: {}", archive.title);
            Some(archive.id)
        }
        None => {
            println!(
                "⚠️  Archive collection '{}' not found; ARCHIVE actions will fail",
                config.archive_name
            );
            None
        }
    };

    let selected = if cli.resume {
        match pick_session(&store, &collections).await {
            Ok(Some(collection)) => Some(collection),
            Ok(None) => None,
            Err(code) => return code,
        }
    } else {
        None
    };
    let collection = match selected {
        Some(collection) => collection,
        None => match pick_collection(&collections).await {
            Some(collection) => collection,
            None => {
                println!("👋 Goodbye!");
                return EXIT_OK;
            }
        },
    };

    println!("\n🚀 Starting cleanup of '{}'", collection.title);
    println!("📊 {} bookmarks to review", collection.count);
    if config.dry_run {
        println!("🧪 DRY-RUN MODE: No changes will be made");
    }
    if read_line("\nPress Enter to begin...").await.is_err() {
        return EXIT_OK;
    }

    let job = CollectionJob::new(collection.id, collection.title.clone())
        .with_batch_size(config.batch_size)
        .with_archive(archive_collection_id)
        .with_collections(collections.clone())
        .with_resume(true);

    let interrupt = Interrupt::new();
    let signal = interrupt.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Ctrl-C received");
            signal.trigger();
        }
    });

    let tui = TuiPresenter::default().with_interrupt(interrupt.clone());
    let presenter: &dyn DecisionPresenter = if config.text_mode {
        &TextPresenter
    } else if !std::io::stdin().is_terminal() {
        warn!("stdin is not a terminal, falling back to the text interface");
        &TextPresenter
    } else {
        &tui
    };
    let events = CompositeEventHandler::new()
        .with(LoggingHandler)
        .with(ConsoleHandler);

    let mut orchestrator = CleanupOrchestrator::new(
        &source,
        &engine,
        presenter,
        &ConsolePrompter,
        SessionState::new(store),
        config.orchestrator_config(),
    )
    .with_event_handler(&events)
    .with_interrupt(&interrupt);

    let result = orchestrator.process(&job).await;
    let state = orchestrator.into_state();
    // An interrupt can return while the review screen still owns the terminal.
    tui.closed().await;

    let code = match &result {
        Ok(RunOutcome::Completed { .. }) => EXIT_OK,
        Ok(RunOutcome::Paused { .. }) => {
            println!("💾 Progress saved! You can resume later with the same command.");
            EXIT_OK
        }
        Ok(RunOutcome::Stalled { .. }) => EXIT_FAILURE,
        Err(CleanupError::Cancelled) => {
            println!("\n⏹️  Cleanup interrupted by user");
            EXIT_INTERRUPTED
        }
        Err(e) => {
            eprintln!("❌ Error: {e}");
            EXIT_FAILURE
        }
    };

    let final_count = match source.list_collections().await {
        Ok(now) => now.iter().find(|c| c.id == collection.id).map(|c| c.count),
        Err(_) => None,
    };
    let report = Report {
        dry_run: config.dry_run,
        stats: state.stats(),
        total_processed: state.processed_count(),
        this_session: state.elapsed(),
        previous_sessions_secs: state.stats().session_time,
        initial_count: Some(collection.count),
        final_count,
    };
    print!("{}", report.render());
    code
}

/// `--clean-state`: list every record, confirm, delete.
async fn clean_state(store: &SessionStore) -> i32 {
    let files = match store.state_files() {
        Ok(files) => files,
        Err(e) => {
            eprintln!("Error: {e}");
            return EXIT_FAILURE;
        }
    };
    if files.is_empty() {
        println!("📝 No state files found to clean");
        return EXIT_OK;
    }

    println!("🧹 Found {} state files to clean:", files.len());
    for path in &files {
        if let Some(name) = path.file_name() {
            println!("   {}", name.to_string_lossy());
        }
    }
    let answer = read_line("Delete all? (y/N): ").await.unwrap_or_default();
    if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
        println!("❌ Cancelled");
        return EXIT_OK;
    }
    match store.clean_all() {
        Ok(n) => {
            println!("✅ {n} state files cleaned!");
            EXIT_OK
        }
        Err(e) => {
            eprintln!("Error: {e}");
            EXIT_FAILURE
        }
    }
}

/// `--resume`: pick a saved session. `Ok(None)` means "start a new one".
async fn pick_session(
    store: &SessionStore,
    collections: &[Collection],
) -> Result<Option<Collection>, i32> {
    let sessions = store.list_resumable();
    if sessions.is_empty() {
        println!("📝 No resumable sessions found.");
        println!("Starting a new session instead...");
        return Ok(None);
    }

    println!("\n📚 Resumable Sessions ({} found):", sessions.len());
    println!("{}", "=".repeat(70));
    for (i, session) in sessions.iter().enumerate() {
        println!("{}\n", session_listing(i + 1, session));
    }
    println!("🔄 Choose a session to resume:");
    println!("Enter number, or 'new' for a fresh session:");

    loop {
        let Ok(input) = read_line("📝 Your choice: ").await else {
            return Err(EXIT_OK);
        };
        match parse_session_choice(&input, sessions.len()) {
            SessionChoice::New => return Ok(None),
            SessionChoice::Resume(i) => {
                let session = &sessions[i];
                return match collections.iter().find(|c| c.id == session.collection_id) {
                    Some(collection) => {
                        println!("\n🔄 Resuming '{}'...", collection.title);
                        Ok(Some(collection.clone()))
                    }
                    None => {
                        println!("❌ Collection no longer exists");
                        Err(EXIT_FAILURE)
                    }
                };
            }
            SessionChoice::Invalid => {
                println!("❌ Invalid choice. Try a number, or 'new' for fresh session.")
            }
        }
    }
}

/// Interactive collection picker. `None` when the user quits.
async fn pick_collection(collections: &[Collection]) -> Option<Collection> {
    println!("\n📚 Available collections:");
    for (i, collection) in collections.iter().enumerate() {
        println!("  {:2}. {} ({} items)", i + 1, collection.title, collection.count);
    }
    println!("\n🎯 Which collection would you like to process?");
    println!("Enter number, name, or 'quit' to exit:");

    loop {
        let input = read_line("📝 Your choice: ").await.ok()?;
        match parse_collection_choice(&input, collections) {
            CollectionChoice::Selected(i) => return collections.get(i).cloned(),
            CollectionChoice::Quit => return None,
            CollectionChoice::NotFound => {
                println!("❌ Collection not found. Try again or 'quit' to exit.")
            }
        }
    }
}
