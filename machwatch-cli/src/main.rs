use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use machwatch_adapters::http::HttpStatsFetcher;
use machwatch_adapters::{FileFetcher, MonitoringToggle, SnapshotFetcher};
use machwatch_cli::{view, Command, Overrides, Settings};
use machwatch_engine::MonitoringController;

#[derive(Parser, Debug)]
#[command(name = "machwatch")]
#[command(about = "Live CPU, memory, load, disk and network series for a monitored machine")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dashboard API prefix (e.g. http://localhost:8000)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Backend id of the machine
    #[arg(short, long)]
    backend: Option<String>,

    /// Machine id
    #[arg(short, long)]
    machine: Option<String>,

    /// Read snapshots from a JSON file instead of the API
    #[arg(short, long, conflicts_with_all = ["endpoint", "backend", "machine"])]
    file: Option<PathBuf>,

    /// Refresh step in milliseconds
    #[arg(long)]
    step_ms: Option<u64>,

    /// Samples per window
    #[arg(long)]
    window_points: Option<u64>,

    /// Request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Log filter used when RUST_LOG is unset (e.g. "debug", "machwatch_engine=debug")
    #[arg(long)]
    log_level: Option<String>,

    /// Start with monitoring disabled when the backend status is unknown
    #[arg(long)]
    disabled: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            endpoint: self.endpoint.clone(),
            backend_id: self.backend.clone(),
            machine_id: self.machine.clone(),
            step_ms: self.step_ms,
            window_points: self.window_points,
            timeout_ms: self.timeout_ms,
            log_level: self.log_level.clone(),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref(), args.overrides())?;
    init_logging(&settings.log_level);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    rt.block_on(run(args, settings))
}

/// Logs go to stderr; stdout carries the series.
fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

type Source = (Arc<dyn SnapshotFetcher>, Option<Arc<dyn MonitoringToggle>>);

fn build_source(args: &Args, settings: &Settings) -> Result<Source> {
    if let Some(path) = &args.file {
        let fetcher: Arc<dyn SnapshotFetcher> = Arc::new(FileFetcher::new(path));
        return Ok((fetcher, None));
    }

    let mut builder = HttpStatsFetcher::builder()
        .endpoint(&settings.endpoint)
        .timeout(settings.timeout());
    if let Some(backend) = &settings.backend_id {
        builder = builder.backend(backend);
    }
    if let Some(machine) = &settings.machine_id {
        builder = builder.machine(machine);
    }
    let http = Arc::new(
        builder
            .build()
            .context("Set backend_id and machine_id, or pass --file")?,
    );
    let fetcher: Arc<dyn SnapshotFetcher> = http.clone();
    let toggle: Arc<dyn MonitoringToggle> = http;
    Ok((fetcher, Some(toggle)))
}

async fn run(args: Args, settings: Settings) -> Result<()> {
    let (fetcher, toggle) = build_source(&args, &settings)?;
    info!(source = fetcher.description(), step_ms = settings.step_ms, "machwatch starting");

    let controller = MonitoringController::new(settings.scheduler_config(), fetcher)?;
    let mut events = controller.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    println!("{}", Command::HELP);
    match toggle.as_deref() {
        Some(toggle) => {
            if let Err(e) = controller.sync_enabled(toggle).await {
                warn!(error = %e, "cannot read monitoring status, using --disabled");
                controller.set_enabled(!args.disabled);
            }
        }
        None => controller.set_enabled(!args.disabled),
    }

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    if let Some(line) = view::render_event(&event) {
                        println!("{line}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "display fell behind"),
                Err(RecvError::Closed) => break,
            },
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(command) => apply(&controller, toggle.as_deref(), command).await,
                    Err(e) => eprintln!("{e}"),
                },
                None => stdin_open = false,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    controller.set_enabled(false);
    info!("machwatch stopped");
    Ok(())
}

async fn apply(
    controller: &MonitoringController,
    toggle: Option<&dyn MonitoringToggle>,
    command: Command,
) {
    match command {
        Command::Pause => controller.set_visible(false),
        Command::Resume => controller.set_visible(true),
        Command::Enable | Command::Disable => {
            let enabled = command == Command::Enable;
            match toggle {
                Some(toggle) => {
                    if let Err(e) = controller.request_enabled(toggle, enabled).await {
                        eprintln!("{e}");
                    }
                }
                None => controller.set_enabled(enabled),
            }
        }
        Command::Status => println!(
            "{}",
            view::render_status(
                &controller.state(),
                controller.is_visible(),
                &controller.current_series()
            )
        ),
        Command::Help => println!("{}", Command::HELP),
        Command::Quit => {}
    }
}
