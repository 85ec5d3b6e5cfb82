use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use log::{Level, info};
use std::fs;
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use queuelooper::action::{CommandInstrument, Instrument, NullInstrument};
use queuelooper::engine::{RunController, RunReport, StartOutcome};
use queuelooper::queue::{Queue, QueueFile};
use queuelooper::trigger::TriggerRegistry;

mod cli;
mod config;

use cli::Cli;
use cli::commands::Commands;
use config::Config;

/// Runs report their progress on the console; other commands log to a
/// file unless verbose
fn logs_to_console(cli: &Cli) -> bool {
    cli.is_verbose() || matches!(cli.command, Commands::Run { .. })
}

/// Console log line: failures in red, warnings such as loop overruns in yellow
fn console_line(level: Level, message: &str) -> String {
    let stamp = chrono::Local::now().format("%H:%M:%S");
    match level {
        Level::Error => format!("{} {}", stamp, message.red()),
        Level::Warn => format!("{} {}", stamp, message.yellow()),
        _ => format!("{} {}", stamp, message),
    }
}

/// Log to stderr when `console`, otherwise to a file under the local data dir
fn setup_logging(config: &Config, console: bool) -> Result<()> {
    let level = config.log_level.as_deref().unwrap_or("info");
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level));

    if console {
        builder
            .format(|buf, record| writeln!(buf, "{}", console_line(record.level(), &record.args().to_string())))
            .target(env_logger::Target::Stderr)
            .init();
        return Ok(());
    }

    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("queuelooper")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("queuelooper.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    builder.target(env_logger::Target::Pipe(target)).init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn build_instrument(config: &Config) -> Arc<dyn Instrument> {
    let settings = &config.instrument;
    if settings.is_configured() {
        Arc::new(CommandInstrument::new(
            settings.protocol_command.clone(),
            settings.progress_command.clone(),
            settings.stop_command.clone(),
        ))
    } else {
        Arc::new(NullInstrument)
    }
}

fn load_queue(path: &Path, config: &Config, instrument: Arc<dyn Instrument>) -> Result<(QueueFile, Queue)> {
    let file = QueueFile::load(path).context(format!("Failed to read queue file {}", path.display()))?;
    let registry = TriggerRegistry::from_commands(&config.triggers);
    let queue = file
        .build(&registry, instrument)
        .context(format!("Failed to build queue from {}", path.display()))?;
    Ok((file, queue))
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Run { file, repeats, interval } => handle_run_command(file, *repeats, *interval, config).await,
        Commands::Show { file } => handle_show_command(file, config),
        Commands::Check { file } => handle_check_command(file, config),
        Commands::Triggers => handle_triggers_command(config),
    }
}

async fn handle_run_command(path: &Path, repeats: Option<u32>, interval: Option<f64>, config: &Config) -> Result<()> {
    let instrument = build_instrument(config);
    let (file, queue) = load_queue(path, config, instrument.clone())?;

    let top_count = repeats.or(file.repeats).unwrap_or(config.run.repeats);
    let top_interval = match interval {
        Some(secs) => Duration::try_from_secs_f64(secs).context(format!("Invalid --interval: {}", secs))?,
        None => match file.interval()? {
            Some(duration) => duration,
            None => config.run.interval()?,
        },
    };

    println!("{}", queue);
    println!(
        "{} {} repetition(s), interval {:.2} s",
        "Running:".cyan(),
        top_count,
        top_interval.as_secs_f64()
    );

    let controller = Arc::new(RunController::new(instrument));
    match controller.start(&queue, top_count, top_interval).await? {
        StartOutcome::Started => {}
        StartOutcome::EmptyQueue => {
            println!("{}", "Queue is empty, nothing to run".yellow());
            return Ok(());
        }
        StartOutcome::AlreadyActive => return Err(eyre!("A run is already active")),
    }

    let mut watcher = tokio::spawn(watch_interrupts(controller.clone(), tokio::signal::ctrl_c));

    let report = tokio::select! {
        report = controller.wait() => report,
        Ok(Interrupt::Forced) = &mut watcher => {
            return Err(eyre!("Interrupted twice, abandoning the action in progress"));
        }
    };
    watcher.abort();

    match report {
        Some(report) => print_report(&report),
        None => return Err(eyre!("Run worker ended without a report")),
    }
    Ok(())
}

/// How the interrupt watcher of a run finished
#[derive(Debug, PartialEq, Eq)]
enum Interrupt {
    /// The signal source went away before a second interrupt
    SignalsClosed,
    /// Interrupted again after the stop request
    Forced,
}

/// First interrupt stops the run cooperatively, a second one forces exit
async fn watch_interrupts<S, F>(controller: Arc<RunController>, mut next_signal: S) -> Interrupt
where
    S: FnMut() -> F,
    F: Future<Output = std::io::Result<()>>,
{
    if next_signal().await.is_err() {
        return Interrupt::SignalsClosed;
    }
    println!(
        "{}",
        "Stopping after the current action, press Ctrl-C again to exit now".yellow()
    );
    controller.stop().await;

    if next_signal().await.is_err() {
        return Interrupt::SignalsClosed;
    }
    Interrupt::Forced
}

fn print_report(report: &RunReport) {
    let headline = if report.cancelled {
        "Main loop stopped.".yellow()
    } else {
        "Main loop completed.".green()
    };
    println!("{}", headline);
    println!(
        "  Started {}, took {:.2} s, {} repetition(s)",
        report.started_at.with_timezone(&chrono::Local).format("%a %H:%M:%S"),
        report.elapsed.as_secs_f64(),
        report.repetitions
    );

    let stats = &report.stats;
    println!("  Actions run: {}", stats.actions_run);
    if stats.action_failures > 0 {
        println!("  {}", format!("Action failures: {}", stats.action_failures).red());
    }
    println!("  Triggers met: {}", stats.triggers_met);
    if stats.trigger_failures > 0 {
        println!("  {}", format!("Trigger failures: {}", stats.trigger_failures).red());
    }
    if stats.overruns > 0 {
        println!("  {}", format!("Loop overruns: {}", stats.overruns).yellow());
    }
}

fn handle_show_command(path: &Path, config: &Config) -> Result<()> {
    info!("Showing queue: {}", path.display());
    let (file, queue) = load_queue(path, config, build_instrument(config))?;
    if let Some(repeats) = file.repeats {
        println!("{} {}", "Repeats:".cyan(), repeats);
    }
    if let Some(interval) = file.interval()? {
        println!("{} {:.2} s", "Interval:".cyan(), interval.as_secs_f64());
    }
    print!("{}", queue);
    Ok(())
}

fn handle_check_command(path: &Path, config: &Config) -> Result<()> {
    info!("Checking queue: {}", path.display());
    let (file, queue) = load_queue(path, config, build_instrument(config))?;
    file.interval()?;
    match describe_check(&queue) {
        Ok(summary) => {
            println!("{} {}", "OK".green(), summary);
            Ok(())
        }
        Err(problem) => {
            println!("{} {}", "Invalid:".red(), problem);
            Err(eyre!("Queue {} is malformed", path.display()))
        }
    }
}

fn describe_check(queue: &Queue) -> std::result::Result<String, String> {
    match queue.compile() {
        Ok(program) => Ok(format!("{} item(s), {} action(s)", queue.len(), program.action_count())),
        Err(e) => match queue.open_blocks() {
            0 => Err(e.to_string()),
            open => Err(format!("{} ({} block(s) left open)", e, open)),
        },
    }
}

fn handle_triggers_command(config: &Config) -> Result<()> {
    let registry = TriggerRegistry::from_commands(&config.triggers);
    if registry.is_empty() {
        println!("{}", "No triggers configured".yellow());
        return Ok(());
    }
    for name in registry.names() {
        let command = config.triggers.get(name).map(String::as_str).unwrap_or_default();
        println!("{} {}", name.green(), command);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(&config, logs_to_console(&cli)).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
