use clap::{Parser, Subcommand};
use cpubench::app::{App, Tui};
use cpubench::config::persistence::{app_data_dir, ResultsStorage};
use cpubench::config::RunConfig;
use cpubench::error::user_friendly_message;
use cpubench::util::parse_duration;
use cpubench::{console, logging, Result, LOG_FILE};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::warn;

/// Multi-core CPU throughput benchmark
#[derive(Parser, Debug)]
#[command(name = "cpubench")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to the per-user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the terminal UI (default)
    Tui,

    /// Run one benchmark in the console and print the result
    Run {
        /// Test duration, e.g. "30s" or "1m"
        #[arg(short, long, value_parser = parse_duration)]
        duration: Option<Duration>,

        /// Number of workers (defaults to one per logical processor)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Do not append the result to the history
        #[arg(long)]
        no_save: bool,
    },

    /// Print saved results
    History {
        /// Number of most recent results to show
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,

        /// Delete every saved result instead of printing them
        #[arg(long)]
        clear: bool,
    },

    /// Print the effective configuration
    Config {
        /// Write the configuration file if it does not exist yet
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", user_friendly_message(&e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = match cli.config {
        Some(path) => path,
        None => RunConfig::config_file_path()?,
    };

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => run_tui(RunConfig::load_from(&config_path)?, cli.verbose).await,
        Commands::Run {
            duration,
            workers,
            no_save,
        } => {
            logging::init_console(cli.verbose);
            let mut config = RunConfig::load_from(&config_path)?;
            if let Some(duration) = duration {
                config = config.with_duration(duration);
            }
            if let Some(workers) = workers {
                config = config.with_workers(workers);
            }
            config.validate()?;

            let storage = if no_save {
                None
            } else {
                open_storage()
            };
            let result = console::run_benchmark(config, storage.as_ref()).await?;
            console::print_result_details(&result);
            Ok(())
        }
        Commands::History { limit, clear } => {
            logging::init_console(cli.verbose);
            let storage = ResultsStorage::new()?;
            if clear {
                let removed = storage.count_results().unwrap_or(0);
                storage.clear_results()?;
                println!("Removed {} saved results.", removed);
                return Ok(());
            }
            let results = storage.get_recent_results(limit)?;
            if results.is_empty() {
                println!("No results recorded yet.");
            } else {
                console::print_results(&results);
            }
            Ok(())
        }
        Commands::Config { init } => {
            logging::init_console(cli.verbose);
            let config = RunConfig::load_from(&config_path)?;
            if init && !config_path.exists() {
                config.save_to(&config_path)?;
                println!("Wrote {}", config_path.display());
            }
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

async fn run_tui(config: RunConfig, verbose: bool) -> Result<()> {
    match app_data_dir() {
        Ok(dir) => {
            if let Err(e) = logging::init_file(&dir.join(LOG_FILE), verbose) {
                eprintln!("Warning: logging disabled: {}", e);
            }
        }
        Err(e) => eprintln!("Warning: logging disabled: {}", e),
    }

    let mut app = App::with_system_probe(config, open_storage())?;
    let mut tui = Tui::new()?;
    tui.init()?;
    let outcome = app.run(&mut tui).await;
    tui.restore()?;
    outcome
}

fn open_storage() -> Option<ResultsStorage> {
    match ResultsStorage::new() {
        Ok(storage) => Some(storage),
        Err(e) => {
            warn!(error = %e, "results will not be saved");
            None
        }
    }
}
