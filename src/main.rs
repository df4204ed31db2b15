mod app;
mod bisect;
mod graph;
mod model;
mod msg;
mod oracle;
mod plugin;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use app::App;
use model::config::AppConfig;

#[derive(Parser)]
#[command(author, version, about = "Find the mod behind a bug by bisecting your mods folder")]
struct Cli {
    /// Config file to use instead of the per-user one.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bisect interactively, asking after each trial whether the bug is still there.
    Run(PathArgs),
    /// Show how the mods group into components, without moving anything.
    List(PathArgs),
    /// Move every parked mod back into the mods folder.
    Restore(PathArgs),
}

#[derive(Args)]
struct PathArgs {
    /// Game data folder holding the mods and parked folders.
    data_path: PathBuf,
    /// Mods folder, relative to the data path unless absolute.
    #[arg(long)]
    mods_dir: Option<PathBuf>,
    /// Parked folder, relative to the data path unless absolute.
    #[arg(long)]
    parked_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging()?;

    tracing::info!("modbisect starting");

    let config = AppConfig::load(cli.config.as_deref())?;
    let (Commands::Run(args) | Commands::List(args) | Commands::Restore(args)) = &cli.command;
    let paths = config.mod_paths(
        &args.data_path,
        args.mods_dir.as_deref(),
        args.parked_dir.as_deref(),
    );
    let app = App::new(config, paths);

    match cli.command {
        Commands::Run(_) => app.run()?,
        Commands::List(_) => app.list(&mut io::stdout())?,
        Commands::Restore(_) => {
            app.restore(&mut io::stdout())?;
        }
    }

    Ok(())
}

/// Log to a daily file in the data dir (never stdout, which carries the
/// trial prompts). The returned guard flushes the writer on drop.
fn init_logging() -> Result<WorkerGuard> {
    let log_dir = directories::ProjectDirs::from("", "", "modbisect")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(std::env::temp_dir);
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "modbisect.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("modbisect=info")),
        )
        .init();

    Ok(guard)
}
