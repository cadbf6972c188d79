//! Sync mode CLI logic
//!
//! Contains the core logic for a single sync run from the command line.

use crate::{
    AggregationPipeline, ChromiumLauncher, Credentials, FileSink, Identity, Result, Settings,
    config::{ConfigLoader, LoggingSettings},
    utils::version,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Arguments for sync mode
#[derive(Debug, Clone, Default)]
pub struct SyncArgs {
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub headful: bool,
    pub verbose: bool,
}

/// What a successful run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub path: PathBuf,
    pub records: usize,
}

/// Apply command line flags on top of loaded settings
pub fn apply_overrides(settings: &mut Settings, args: &SyncArgs) {
    if let Some(ref output) = args.output {
        settings.output.path = output.clone();
    }
    if args.headful {
        settings.browser.headless = false;
    }
    if args.verbose {
        settings.logging.verbose = true;
    }
}

/// Load file and environment settings, then the command line on top
pub fn load_settings(args: &SyncArgs) -> Result<Settings> {
    let mut settings = ConfigLoader::new().load(args.config.as_deref())?;
    apply_overrides(&mut settings, args);
    settings.validate()?;
    Ok(settings)
}

/// Filter used when `RUST_LOG` is not set
pub fn default_log_directive(logging: &LoggingSettings) -> String {
    if logging.verbose {
        "debug".to_string()
    } else {
        logging.level.clone()
    }
}

/// Install the stderr subscriber; later calls are no-ops
pub fn init_logging(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_directive(logging)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Run one sync with the given arguments
pub async fn run_sync_mode(args: SyncArgs) -> Result<SyncOutcome> {
    let settings = load_settings(&args)?;
    init_logging(&settings.logging);

    tracing::info!("sunvoy-sync v{}", version::get_version());

    let credentials = Credentials::from_env()?;
    let identity = Identity::from_env()?;

    let pipeline = AggregationPipeline::new(
        &settings,
        Arc::new(ChromiumLauncher::new(settings.browser.clone())),
        identity,
        Arc::new(FileSink::new(&settings.output.path)),
    )?;

    let snapshot = pipeline.run(&credentials).await?;

    Ok(SyncOutcome {
        path: settings.output.path,
        records: snapshot.len(),
    })
}
