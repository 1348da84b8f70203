use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use dialoguer::Confirm;
use jsonsweep::config::{Settings, validate_range};
use jsonsweep::core::namer::validate_base_name;
use jsonsweep::history::{self, HistoryRecord};
use jsonsweep::{
    Reporter, RunOptions, ScanOptions, ScanOrder, dedup_by_range, dedup_exact, rename_batch,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "jsonsweep",
    version,
    about = "Rename and deduplicate per-object JSON placement files"
)]
struct Cli {
    /// Settings file (default: `<config dir>/jsonsweep/settings.json`)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Order files are visited in; decides which duplicate is kept
    #[arg(long, global = true, value_enum)]
    order: Option<ScanOrder>,

    /// Do not append to `<dir>/.history.jsonl`
    #[arg(long, global = true)]
    no_history: bool,

    /// Hide the scan spinner
    #[arg(long, global = true)]
    no_progress: bool,

    /// More diagnostics on stderr (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Give every JSON file not yet named `<base>_<N>.json` the next free name
    Rename {
        /// Directory holding the JSON files
        #[arg(value_name = "DIR")]
        path: PathBuf,
        /// Prefix for generated names (default: `base_name` from settings)
        #[arg(value_name = "BASE_NAME")]
        base_name: Option<String>,
        /// Only show what would be renamed
        #[arg(long)]
        dry_run: bool,
    },

    /// Delete files positioned within RANGE of an earlier file (X/Z only)
    DedupRange {
        /// Directory holding the JSON files
        #[arg(value_name = "DIR")]
        path: PathBuf,
        /// Distance threshold (default: `range` from settings, 40)
        #[arg(value_name = "RANGE")]
        range: Option<f64>,
        /// Only show what would be deleted
        #[arg(long)]
        dry_run: bool,
        /// Ask before deleting anything
        #[arg(long)]
        confirm: bool,
    },

    /// Delete files whose position matches an earlier file to 2 decimals
    DedupExact {
        /// Directory holding the JSON files
        #[arg(value_name = "DIR")]
        path: PathBuf,
        /// Only show what would be deleted
        #[arg(long)]
        dry_run: bool,
        /// Ask before deleting anything
        #[arg(long)]
        confirm: bool,
    },

    /// List the change history recorded in a directory
    History {
        /// Directory holding the JSON files
        #[arg(value_name = "DIR")]
        path: PathBuf,
    },

    /// Inspect or create the settings file
    Config {
        #[command(subcommand)]
        command: ConfigCmd,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCmd {
    /// Print the effective settings
    Show,
    /// Write default settings to the settings file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Prints operation lines to stdout; optionally asks before deleting.
struct CliReporter {
    confirm: bool,
}

impl Reporter for CliReporter {
    fn line(&mut self, message: String) {
        println!("{}", message);
    }

    fn approve_deletions(&mut self, planned: &[PathBuf]) -> bool {
        if !self.confirm {
            return true;
        }
        println!("About to delete {} file(s):", planned.len());
        for path in planned {
            println!("   🗑️  {}", path.display());
        }
        Confirm::new()
            .with_prompt("Delete these files?")
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.config.clone().or_else(Settings::default_path);
    let settings = match &config_path {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    let scan = ScanOptions {
        order: cli.order.unwrap_or(settings.scan_order),
        show_progress: settings.progress && !cli.no_progress,
    };
    let record_history = settings.history && !cli.no_history;

    match cli.command {
        Commands::Rename {
            path,
            base_name,
            dry_run,
        } => {
            let Some(base_name) = base_name.or_else(|| settings.base_name.clone()) else {
                bail!("No base name given and none set in settings");
            };
            validate_base_name(&base_name).map_err(anyhow::Error::msg)?;

            println!("▶ Renaming JSON files in: {}", path.display());
            let options = RunOptions { scan, dry_run };
            let mut reporter = CliReporter { confirm: false };
            let summary = benchmark("rename", || {
                rename_batch(&path, &base_name, &options, &mut reporter)
            })?;

            if record_history && summary.changed_anything() {
                record(&path, &HistoryRecord::from_rename(&summary));
            }
        }

        Commands::DedupRange {
            path,
            range,
            dry_run,
            confirm,
        } => {
            let range = range.unwrap_or(settings.range);
            validate_range(range)?;

            println!("▶ Checking position ranges in: {}", path.display());
            let options = RunOptions { scan, dry_run };
            let mut reporter = CliReporter { confirm };
            let summary = benchmark("range check", || {
                dedup_by_range(&path, range, &options, &mut reporter)
            })?;

            if record_history && summary.changed_anything() {
                record(&path, &HistoryRecord::from_dedup("dedup-range", &summary));
            }
            if dry_run {
                println!("\n⚠️  Dry-run only; no files were changed.");
            }
        }

        Commands::DedupExact {
            path,
            dry_run,
            confirm,
        } => {
            println!("▶ Checking duplicate positions in: {}", path.display());
            let options = RunOptions { scan, dry_run };
            let mut reporter = CliReporter { confirm };
            let summary = benchmark("duplicate check", || {
                dedup_exact(&path, &options, &mut reporter)
            })?;

            if record_history && summary.changed_anything() {
                record(&path, &HistoryRecord::from_dedup("dedup-exact", &summary));
            }
            if dry_run {
                println!("\n⚠️  Dry-run only; no files were changed.");
            }
        }

        Commands::History { path } => {
            let records = history::read(&path).with_context(|| {
                format!(
                    "Could not open history file {:?}",
                    history::history_path(&path)
                )
            })?;

            println!("🗂️  History:");
            for (i, rec) in records.into_iter().enumerate() {
                match rec {
                    Ok(rec) => {
                        println!("[{}] {} {}", i, rec.timestamp, rec.operation);
                        if !rec.kept.is_empty() {
                            println!("     kept: {:?}", rec.kept);
                        }
                        if !rec.removed.is_empty() {
                            println!("     removed: {:?}", rec.removed);
                        }
                        for (from, to) in &rec.renamed {
                            println!("     renamed: {} → {}", from, to);
                        }
                    }
                    Err(err) => eprintln!("⚠️  Skipping malformed entry {}: {}", i, err),
                }
            }
        }

        Commands::Config { command } => match command {
            ConfigCmd::Show => {
                match &config_path {
                    Some(path) => println!("# {}", path.display()),
                    None => println!("# no config directory on this platform"),
                }
                println!("{}", serde_json::to_string_pretty(&settings)?);
            }
            ConfigCmd::Init { force } => {
                let Some(path) = config_path else {
                    bail!("No config directory on this platform; pass --config");
                };
                if path.exists() && !force {
                    bail!("{} already exists (use --force to overwrite)", path.display());
                }
                Settings::default().save(&path)?;
                println!("✅ Wrote default settings to {}", path.display());
            }
        },
    }

    Ok(())
}

/// Append to the directory's history; a failure here does not fail the run.
fn record(dir: &Path, rec: &HistoryRecord) {
    match history::append(dir, rec) {
        Ok(()) => println!(
            "\n✅ Recorded history in {}",
            history::history_path(dir).display()
        ),
        Err(err) => log::warn!("Failed to record history in {}: {}", dir.display(), err),
    }
}

/// Run `f()`, log how long it took (with `label`), and return its result.
fn benchmark<T, F: FnOnce() -> T>(label: &str, f: F) -> T {
    let start = Instant::now();
    let result = f();
    log::info!("⏱ {} took {:.2?}", label, start.elapsed());
    result
}
