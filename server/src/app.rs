//! Application lifecycle: startup, logging, HTTP server, system commands

use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api::ApiServer;
use crate::core::cli::{self, CliConfig, Commands, SystemCommands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME, APP_NAME_LOWER, ENV_LOG};
use crate::core::shutdown::ShutdownService;
use crate::core::storage::AppStorage;
use crate::data::SqliteService;
use crate::domain::MetricStore;

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub storage: AppStorage,
    pub database: Arc<SqliteService>,
    pub store: MetricStore,
}

impl CoreApp {
    /// Parse the command line and run the selected command
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        init_logging();

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        match command {
            Some(Commands::System { command }) => run_system_command(command),
            Some(Commands::Start) | None => {
                let app = Self::init(&cli_config).await?;
                app.serve().await
            }
        }
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        let storage = AppStorage::init(&config).await?;

        let database = Arc::new(
            SqliteService::init(&storage)
                .await
                .with_context(|| {
                    format!("Failed to open database {}", storage.database_path().display())
                })?,
        );
        let store = MetricStore::new(database.repository(), config.store_config());
        let shutdown = ShutdownService::new(database.clone());

        Ok(Self {
            shutdown,
            config,
            storage,
            database,
            store,
        })
    }

    async fn serve(self) -> Result<()> {
        // Before anything that can block, so Ctrl+C always works
        self.shutdown.install_signal_handlers();
        self.start_background_tasks().await;

        tracing::info!(
            version = env!("CARGO_PKG_VERSION"),
            database = %self.storage.database_path().display(),
            series_limit = self.config.series.limit,
            "{} starting",
            APP_NAME
        );

        let app = ApiServer::new(self).start().await?;
        let outcome = app.shutdown.shutdown().await;
        tracing::info!(
            tasks_finished = outcome.finished,
            tasks_aborted = outcome.aborted,
            "Stopped"
        );
        Ok(())
    }

    pub async fn start_background_tasks(&self) {
        let checkpoint = self
            .database
            .start_checkpoint_task(self.shutdown.subscribe());
        self.shutdown.register(checkpoint).await;
        tracing::debug!("Background tasks started");
    }
}

fn run_system_command(cmd: SystemCommands) -> Result<()> {
    match cmd {
        SystemCommands::Prune { yes } => {
            let stdin = std::io::stdin();
            prune_data_dir(
                &AppStorage::resolve_data_dir(),
                yes,
                &mut stdin.lock(),
                &mut std::io::stdout(),
            )
        }
    }
}

/// Delete the data directory after an interactive `y/N` confirmation
fn prune_data_dir(
    data_dir: &Path,
    skip_confirm: bool,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    if !data_dir.exists() {
        writeln!(
            out,
            "Nothing to prune. Data directory does not exist: {}",
            data_dir.display()
        )?;
        return Ok(());
    }
    let data_dir = data_dir
        .canonicalize()
        .unwrap_or_else(|_| data_dir.to_path_buf());

    writeln!(out, "This will permanently delete all stored metrics in:")?;
    writeln!(out, "  {}\n", data_dir.display())?;
    writeln!(out, "Stop the server first; pruning a live database corrupts it.")?;

    if !skip_confirm {
        write!(out, "\nContinue? [y/N] ")?;
        out.flush()?;

        let mut answer = String::new();
        input.read_line(&mut answer)?;
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            writeln!(out, "Aborted.")?;
            return Ok(());
        }
    }

    std::fs::remove_dir_all(&data_dir)
        .with_context(|| format!("Failed to delete data directory: {}", data_dir.display()))?;
    writeln!(out, "Pruned: {}", data_dir.display())?;
    Ok(())
}

/// `STATLINE_LOG`, then `RUST_LOG`, then `info,statline=info`
fn log_filter(explicit: Option<String>, rust_log: Option<String>) -> String {
    explicit
        .or(rust_log)
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| format!("info,{}=info", APP_NAME_LOWER))
}

fn init_logging() {
    let filter = log_filter(std::env::var(ENV_LOG).ok(), std::env::var("RUST_LOG").ok());

    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .with_ansi(true)
        .compact()
        .with_env_filter(filter)
        .init();
}
