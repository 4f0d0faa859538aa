//! recepcion-bot entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Init logger (CLI `-v` flags > `RUST_LOG` > config)
//!   4. Open the package store, optionally importing legacy rows
//!   5. Build dispatcher, language model and assistant
//!   6. Spawn Ctrl-C → shutdown watcher
//!   7. Run comms channels until shutdown

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use recepcion_bot::assistant::Assistant;
use recepcion_bot::assistant::catalog::Catalog;
use recepcion_bot::assistant::session::SessionBook;
use recepcion_bot::comms::{self, CommsState};
use recepcion_bot::desk::Desk;
use recepcion_bot::error::AppError;
use recepcion_bot::notify::Dispatcher;
use recepcion_bot::package::fields::RawRecord;
use recepcion_bot::store::PackageStore;
use recepcion_bot::{config, llm, logger};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let _ = dotenvy::dotenv();

    let args = parse_cli_args();
    let mut config = config::load(args.config_path.as_deref())?;
    if args.interactive {
        config.comms.pty.enabled = true;
    }

    let effective_log_level = args.log_level.unwrap_or(config.log_level.as_str());
    logger::init(effective_log_level, args.log_level.is_some())?;

    info!(
        name = %config.name,
        data_dir = %config.data_dir.display(),
        db = %config.db_path.display(),
        llm = %config.llm.provider,
        dispatcher = %config.notify.dispatcher,
        "config loaded"
    );

    let store = PackageStore::open(&config.db_path)?;
    if let Some(path) = &args.import_path {
        let text = std::fs::read_to_string(path)?;
        let rows: Vec<RawRecord> = serde_json::from_str(&text)
            .map_err(|e| AppError::Validation(format!("{path} is not a JSON array of objects: {e}")))?;
        let imported = store.import_raw(&rows)?;
        info!(%path, imported, "legacy import finished");
    }

    let dispatcher = Dispatcher::build(&config.notify)?;
    let llm = llm::providers::build(&config.llm, config.llm_api_key.clone())
        .map_err(|e| AppError::Config(e.to_string()))?;
    let assistant = Assistant::new(
        store.clone(),
        dispatcher.clone(),
        llm,
        Catalog::from(&config.assistant),
        config.assistant.prompts_dir.clone(),
        config.assistant.context_limit,
    );
    let state = Arc::new(CommsState::new(
        config.name.clone(),
        Desk::new(store, dispatcher),
        assistant,
        SessionBook::new(config.assistant.transcript_cap, config.assistant.max_sessions),
    ));

    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, shutting down");
            ctrlc_token.cancel();
        }
    });

    let result = comms::start(&config, state, shutdown.clone()).join().await;
    shutdown.cancel();
    info!("stopped");
    result
}

struct CliArgs {
    log_level: Option<&'static str>,
    interactive: bool,
    config_path: Option<String>,
    import_path: Option<String>,
}

fn parse_cli_args() -> CliArgs {
    let mut verbosity = 0u8;
    let mut interactive = false;
    let mut config_path = None;
    let mut import_path = None;

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: recepcion-bot [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help                 Print help");
                println!("  -i, --interactive          Enable the console channel");
                println!("  -f, --config <PATH>        Configuration file (default: config/default.toml)");
                println!("      --import <PATH>        Import legacy records from a JSON array before starting");
                println!("  -v, -vv, -vvv, -vvvv       Increase logging verbosity");
                std::process::exit(0);
            }
            "-i" | "--interactive" => interactive = true,
            "-f" | "--config" | "--import" => {
                let Some(path) = iter.next() else {
                    eprintln!("error: {arg} requires a path argument");
                    std::process::exit(1);
                };
                if arg == "--import" {
                    import_path = Some(path);
                } else {
                    config_path = Some(path);
                }
            }
            "--verbose" => verbosity = verbosity.saturating_add(1),
            a if a.starts_with('-') && a.len() > 1 && a.chars().skip(1).all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add((a.len() - 1) as u8);
            }
            _ => {}
        }
    }

    let log_level = match verbosity {
        0 => None,
        1 => Some("warn"),
        2 => Some("info"),
        3 => Some("debug"),
        _ => Some("trace"),
    };

    CliArgs { log_level, interactive, config_path, import_path }
}
