//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};

use untex_ast::Event;
use untex_core::{CompileSummary, Compiler, Metadata, OsFileSystem, Settings, TEMPLATE_KEY};

/// Settings files looked up in the working directory when `--config` is absent
const CONFIG_CANDIDATES: [&str; 2] = ["untex.toml", ".untex.toml"];

#[derive(Parser, Debug)]
#[command(name = "untex")]
#[command(author, version, about = "Lightweight markup to LaTeX", long_about = None)]
pub struct Cli {
    /// Root source file
    pub input: PathBuf,

    /// Output .tex file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Template to use when the document names none (path or URL, relative
    /// paths are taken from the working directory)
    #[arg(short, long)]
    pub template: Option<String>,

    /// Seed a metadata entry; may be repeated
    #[arg(short, long = "meta", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub meta: Vec<(String, String)>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the parsed event stream of the input as JSON instead of compiling
    #[arg(long)]
    pub events: bool,

    /// Log compilation progress to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments, sets up logging and runs the requested action.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.events {
        return events_command(&cli.input, cli.output.as_deref());
    }

    let summary = compile_command(
        &cli.input,
        cli.output.as_deref(),
        cli.template.as_deref(),
        &cli.meta,
        cli.config.as_deref(),
    )?;
    info!(
        "Compiled {} file(s), {} bytes",
        summary.files.len(),
        summary.bytes_written
    );

    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Execute the compile command
///
/// Metadata is seeded from the settings file, then `meta`, then `template`;
/// the document itself may still override any of them. A relative `template`
/// path is taken from the working directory. With an output file,
/// template assets are written next to it and a failed compilation leaves no
/// partial file behind.
pub fn compile_command(
    input: &Path,
    output: Option<&Path>,
    template: Option<&str>,
    meta: &[(String, String)],
    config: Option<&Path>,
) -> Result<CompileSummary> {
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    let settings = load_settings(config)?;
    let template = template
        .map(|name| anchor_template(name, Path::new("")))
        .transpose()?;
    let metadata = seed_metadata(&settings, meta, template.as_deref());
    let compiler = Compiler::new(OsFileSystem).with_metadata(metadata);

    match output {
        None => {
            let stdout = io::stdout();
            let summary = compiler
                .compile(input, BufWriter::new(stdout.lock()))
                .with_context(|| format!("Failed to compile {}", input.display()))?;
            if !summary.assets.is_empty() {
                warn!(
                    "Template ships {} asset(s); they are only written with --output",
                    summary.assets.len()
                );
            }
            Ok(summary)
        }
        Some(path) => {
            let summary = compile_to_file(&compiler, input, path)?;
            write_assets(&summary, path)?;
            Ok(summary)
        }
    }
}

fn compile_to_file(
    compiler: &Compiler<OsFileSystem>,
    input: &Path,
    output: &Path,
) -> Result<CompileSummary> {
    let file = File::create(output)
        .with_context(|| format!("Failed to create output file: {}", output.display()))?;

    match compiler.compile(input, BufWriter::new(file)) {
        Ok(summary) => Ok(summary),
        Err(e) => {
            debug!("Removing partial output {}", output.display());
            if let Err(remove) = fs::remove_file(output) {
                warn!("Failed to remove {}: {}", output.display(), remove);
            }
            Err(e).with_context(|| format!("Failed to compile {}", input.display()))
        }
    }
}

/// Decode template assets into the output file's directory
fn write_assets(summary: &CompileSummary, output: &Path) -> Result<()> {
    let dir = output.parent().unwrap_or_else(|| Path::new(""));

    for asset in &summary.assets {
        let relative = Path::new(&asset.path);
        if !is_contained(relative) {
            anyhow::bail!("Asset path escapes the output directory: {}", asset.path);
        }

        let target = dir.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let bytes = asset.decode()?;
        fs::write(&target, bytes)
            .with_context(|| format!("Failed to write asset: {}", target.display()))?;
        info!("Wrote asset {}", target.display());
    }

    Ok(())
}

/// Whether `path` is relative and never climbs above its base
fn is_contained(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Execute the events command
pub fn events_command(input: &Path, output: Option<&Path>) -> Result<()> {
    let content = fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;
    let events: Vec<Event> = untex_core::parse(&content)
        .with_context(|| format!("Failed to parse {}", input.display()))?;
    let json =
        serde_json::to_string_pretty(&events).context("Failed to serialize events to JSON")?;

    match output {
        Some(path) => fs::write(path, json + "\n")
            .with_context(|| format!("Failed to write output file: {}", path.display()))?,
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", json).context("Failed to write to stdout")?;
        }
    }

    Ok(())
}

/// Load settings from a config file or use defaults
///
/// A relative `[template] name` is anchored to the directory of the file it
/// was read from.
pub fn load_settings(config_path: Option<&Path>) -> Result<Settings> {
    match config_path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let settings = Settings::from_toml_str(&content)
                .with_context(|| format!("Failed to parse config: {}", path.display()))?;
            anchor_settings(settings, path)
        }
        None => {
            for candidate in CONFIG_CANDIDATES {
                if Path::new(candidate).exists() {
                    let content = fs::read_to_string(candidate)?;
                    match Settings::from_toml_str(&content) {
                        Ok(settings) => return anchor_settings(settings, Path::new(candidate)),
                        Err(e) => warn!("Ignoring {}: {}", candidate, e),
                    }
                }
            }
            Ok(Settings::default())
        }
    }
}

fn anchor_settings(mut settings: Settings, config_path: &Path) -> Result<Settings> {
    if let Some(name) = &settings.template.name {
        let base = config_path.parent().unwrap_or_else(|| Path::new(""));
        settings.template.name = Some(anchor_template(name, base)?);
    }
    Ok(settings)
}

/// Join a relative local template path onto `base`, itself taken from the
/// working directory when relative. URLs, absolute paths and the empty
/// (built-in) name are returned unchanged.
fn anchor_template(name: &str, base: &Path) -> Result<String> {
    let name = name.trim();
    let is_url = name.starts_with("http://") || name.starts_with("https://");
    if name.is_empty() || is_url || Path::new(name).is_absolute() {
        return Ok(name.to_string());
    }

    let base = if base.is_absolute() {
        base.to_path_buf()
    } else {
        std::env::current_dir()
            .context("Failed to read the working directory")?
            .join(base)
    };
    let anchored = base.join(name);
    debug!("Template {} resolved to {}", name, anchored.display());
    Ok(anchored.to_string_lossy().into_owned())
}

/// Parse a `KEY=VALUE` argument
fn parse_key_value(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", arg)),
    }
}

/// Metadata seeded by `compile_command` for the given inputs
pub fn seed_metadata(
    settings: &Settings,
    meta: &[(String, String)],
    template: Option<&str>,
) -> Metadata {
    let mut metadata = settings.seed_metadata();
    metadata.extend(meta.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    if let Some(template) = template {
        metadata.set(TEMPLATE_KEY, template);
    }
    metadata
}
