use anyhow::{anyhow, Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use dvln_codebase::{compact, decode, Loader, Locator, WorkspaceConfig};
use serde_json::json;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "dvln-codebase")]
#[command(about = "Inspect dvln codebase definitions", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Directory holding <name>.codebase files (overrides DVLN_CFG_DIR)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Workspace root used for relative selectors (overrides DVLN_WKSPC_ROOT)
    #[arg(long, global = true)]
    workspace_root: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Find, decode and expand a codebase, printing it as JSON
    Load(SelectorArgs),

    /// Report where a codebase lives without reading it
    Locate(SelectorArgs),

    /// Fold variable values back into {{.var}} placeholders
    Compact(CompactArgs),

    /// Evaluate the pathing rules for one package
    Pathing(PathingArgs),
}

#[derive(Args)]
struct SelectorArgs {
    /// Codebase name, file path or URL
    #[arg(default_value = "")]
    selector: String,
}

#[derive(Args)]
struct CompactArgs {
    /// Codebase file to compact
    file: PathBuf,
}

#[derive(Args)]
struct PathingArgs {
    /// Codebase name, file path or URL
    selector: String,

    /// Package name as written in the codebase
    package: String,
}

pub fn main_entry() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = workspace_config(&cli);

    match cli.command {
        Commands::Load(args) => run_load(&config, &args.selector),
        Commands::Locate(args) => run_locate(&config, &args.selector),
        Commands::Compact(args) => run_compact(&args.file),
        Commands::Pathing(args) => run_pathing(&config, &args.selector, &args.package),
    }
}

fn workspace_config(cli: &Cli) -> WorkspaceConfig {
    let mut config = WorkspaceConfig::from_env();
    if let Some(dir) = &cli.config_dir {
        config = config.with_config_dir(dir);
    }
    if let Some(root) = &cli.workspace_root {
        config = config.with_workspace_root(root);
    }
    config
}

fn run_load(config: &WorkspaceConfig, selector: &str) -> Result<()> {
    let loaded = Loader::new(config.clone())
        .find_and_load(selector)
        .with_context(|| format!("Failed to load codebase {selector:?}"))?;
    print_stdout(&serde_json::to_string_pretty(&loaded.definition)?)
}

fn run_locate(config: &WorkspaceConfig, selector: &str) -> Result<()> {
    let loader = Loader::new(config.clone());
    let located = loader
        .resolve_selector(selector)
        .and_then(|resolved| Locator::new(config).locate(&resolved))
        .with_context(|| format!("Failed to locate codebase {selector:?}"))?;
    let body = json!({
        "selector": selector,
        "reference": located.reference,
        "locality": located.locality.to_string(),
    });
    print_stdout(&serde_json::to_string_pretty(&body)?)
}

fn run_compact(file: &Path) -> Result<()> {
    let bytes =
        fs::read(file).with_context(|| format!("Cannot read codebase {}", file.display()))?;
    let definition =
        decode(&bytes).with_context(|| format!("Invalid codebase {}", file.display()))?;
    let out = compact(&definition)?;
    print_stdout(String::from_utf8_lossy(&out).trim_end())
}

fn run_pathing(config: &WorkspaceConfig, selector: &str, package: &str) -> Result<()> {
    let loaded = Loader::new(config.clone())
        .find_and_load(selector)
        .with_context(|| format!("Failed to load codebase {selector:?}"))?;
    let definition = &loaded.definition;
    let pkg = definition
        .package(package)
        .ok_or_else(|| anyhow!("package {package:?} not found in codebase {}", definition.name))?;
    let pathing = definition.package_pathing(pkg)?;
    print_stdout(&serde_json::to_string_pretty(&pathing)?)
}
