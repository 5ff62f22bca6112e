use clap::{Parser, Subcommand};
use cursor_composer_export::hooks::{self, InstallOutcome, RemoveOutcome};
use cursor_composer_export::locator::{Platform, resolve_workspace_root};
use cursor_composer_export::prompt::Prompter;
use cursor_composer_export::sequential::{self, ExportOutcome};
use cursor_composer_export::utils::ExportConfig;
use eyre::{Context, Result, eyre};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_OUTPUT_DIR: &str = ".composer-logs";

/// Export Cursor composer chat history to Markdown transcripts.
#[derive(Parser)]
#[command(author, version, about, long_about = None, args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Directory to write the transcript to.
    /// Defaults to ./.composer-logs if not set in config.
    #[arg(value_name = "OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Skip all prompts: export the most recent conversation of the current
    /// (or most recent) project and print only the written path.
    #[arg(long)]
    default: bool,

    /// Directory holding one subdirectory per Cursor workspace.
    /// Auto-detected if omitted.
    #[arg(long, env = "WORKSPACE_PATH", value_name = "PATH")]
    workspace_path: Option<PathBuf>,

    /// Path to a specific configuration file.
    /// Defaults to $XDG_CONFIG_HOME/cursor-composer-export/config.toml
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Log debug details to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Manage the pre-commit hook that exports on every commit.
    Hook {
        #[command(subcommand)]
        action: HookAction,
    },
}

#[derive(Subcommand)]
enum HookAction {
    /// Add the export block to the pre-commit hook.
    Install {
        /// Directory the hook exports into.
        #[arg(value_name = "OUTPUT_DIR")]
        output_dir: Option<String>,

        /// Hook script to edit. Defaults to .husky/pre-commit
        #[arg(long, value_name = "PATH")]
        hook_file: Option<PathBuf>,
    },
    /// Remove the export block from the pre-commit hook.
    Remove {
        /// Hook script to edit. Defaults to .husky/pre-commit
        #[arg(long, value_name = "PATH")]
        hook_file: Option<PathBuf>,
    },
}

#[derive(Deserialize, Default)]
struct FileConfig {
    output_dir: Option<PathBuf>,
    workspace_path: Option<PathBuf>,
    hook_file: Option<PathBuf>,
}

fn load_file_config(explicit_path: Option<&Path>) -> Result<FileConfig> {
    let path = if let Some(p) = explicit_path {
        if !p.exists() {
            return Err(eyre!("Config file not found: {}", p.display()));
        }
        Some(p.to_path_buf())
    } else {
        dirs::config_dir()
            .map(|d| d.join("cursor-composer-export/config.toml"))
            .filter(|p| p.exists())
    };

    match path {
        None => Ok(FileConfig::default()),
        Some(p) => {
            let content = fs::read_to_string(&p)
                .wrap_err_with(|| format!("Failed to read config: {}", p.display()))?;
            toml::from_str(&content)
                .wrap_err_with(|| format!("Failed to parse config: {}", p.display()))
        }
    }
}

/// Logs go to stderr; stdout carries prompts and, with `--default`, the result path.
fn init_tracing(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run_hook(action: HookAction, file_cfg: FileConfig) -> Result<()> {
    match action {
        HookAction::Install {
            output_dir,
            hook_file,
        } => {
            let hook_file = hook_file
                .or(file_cfg.hook_file)
                .unwrap_or_else(|| PathBuf::from(hooks::DEFAULT_HOOK_FILE));
            let output_dir = output_dir
                .or_else(|| file_cfg.output_dir.map(|p| p.to_string_lossy().into_owned()))
                .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string());
            match hooks::install_hook(&hook_file, &output_dir)
                .wrap_err("Error installing Git hook")?
            {
                InstallOutcome::Installed => info!(
                    "Composer export commands added to {} successfully",
                    hook_file.display()
                ),
                InstallOutcome::AlreadyInstalled => info!(
                    "{} already contains composer export commands",
                    hook_file.display()
                ),
            }
        }
        HookAction::Remove { hook_file } => {
            let hook_file = hook_file
                .or(file_cfg.hook_file)
                .unwrap_or_else(|| PathBuf::from(hooks::DEFAULT_HOOK_FILE));
            match hooks::remove_hook(&hook_file).wrap_err("Error removing Git hook")? {
                RemoveOutcome::Removed => info!(
                    "Composer export commands removed from {}",
                    hook_file.display()
                ),
                RemoveOutcome::HookNotFound => {
                    info!("No existing hook file found at {}", hook_file.display())
                }
                RemoveOutcome::SentinelNotFound => info!(
                    "Composer export section not found in {}",
                    hook_file.display()
                ),
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.default);

    // 1. Load config file (CLI path > default path)
    let file_cfg = load_file_config(cli.config.as_deref())?;

    if let Some(Command::Hook { action }) = cli.command {
        return run_hook(action, file_cfg);
    }

    // 2. Resolve the workspace root (CLI/env > Config > platform default)
    let platform = Platform::current();
    let workspace_root =
        resolve_workspace_root(cli.workspace_path.or(file_cfg.workspace_path), &platform)?;
    debug!("Workspace root: {}", workspace_root.display());

    // 3. Resolve output_dir (CLI > Config > Default)
    let output_dir = cli
        .output_dir
        .or(file_cfg.output_dir)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

    let current_dir_name = std::env::current_dir()
        .ok()
        .and_then(|d| d.file_name().map(|n| n.to_string_lossy().into_owned()));

    let config = ExportConfig {
        output_dir,
        workspace_root,
        use_defaults: cli.default,
        current_dir_name,
    };

    // 4. Run the export
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut prompter = Prompter::new(stdin.lock(), stdout.lock());
    match sequential::execute(&config, &mut prompter)? {
        ExportOutcome::Written(path) => debug!("Export complete: {}", path.display()),
        ExportOutcome::Cancelled => debug!("Export cancelled"),
        ExportOutcome::NothingToExport => {}
    }
    Ok(())
}
