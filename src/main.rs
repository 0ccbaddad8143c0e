//! pydox: dump the documentation model extracted from Python sources.
//!
//! Two modes:
//!
//! - **stdin mode**: `pydox < module.py` prints the unit to stdout
//! - **file mode**: `pydox -o out/ src/*.py pkg/` writes one file per unit,
//!   or prints them all when `-o` is omitted

use anyhow::{Context, Result};
use clap::Parser;
use pydox::batch;
use pydox::dump::{self, Dumper};
use pydox::parser::PYTHON_EXTENSIONS;
use pydox::{ScanOptions, SourceUnit};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pydox",
    about = "Extract Doxygen-style comments and docstrings from Python source files"
)]
struct Cli {
    /// Input files, directories or glob patterns. If omitted, reads from stdin.
    files: Vec<String>,

    /// Output directory; one file per input. Prints to stdout when omitted.
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Output format: outline (default), json
    #[arg(short = 'f', long, default_value = "outline")]
    format: String,

    /// Unit name used in stdin mode
    #[arg(long, default_value = "stdin")]
    name: String,

    /// Keep a leading copyright/license block as module documentation
    #[arg(long)]
    keep_license: bool,

    /// Do not parse @commands inside docstrings
    #[arg(long)]
    verbatim_docstrings: bool,

    /// Columns a tab advances to
    #[arg(long, default_value_t = 8)]
    tab_width: usize,

    /// Exit with an error when any unit produced diagnostics
    #[arg(long)]
    deny_diagnostics: bool,

    /// Debug logging on stderr (overridden by PYDOX_LOG)
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl Cli {
    fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            skip_license_header: !self.keep_license,
            tab_width: self.tab_width.max(1),
            verbatim_docstrings: self.verbatim_docstrings,
            ..Default::default()
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let dumper = dump::create_dumper(&cli.format)?;
    let options = cli.scan_options();

    let units = if cli.files.is_empty() {
        stdin_mode(&cli, &options)?
    } else {
        file_mode(&cli, &options)?
    };

    let mut total = 0;
    for (source, unit) in &units {
        for diag in unit.diagnostics() {
            warn!("{}: {}", source, diag);
        }
        total += unit.diagnostics().len();
        emit(&cli, dumper.as_ref(), source, unit)?;
    }
    info!(units = units.len(), diagnostics = total, "done");

    if cli.deny_diagnostics && total > 0 {
        anyhow::bail!("{} diagnostic(s) reported", total);
    }
    Ok(())
}

/// Log to stderr. `PYDOX_LOG` takes the usual `EnvFilter` directives.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("PYDOX_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// stdin mode: read one unit from stdin.
fn stdin_mode(cli: &Cli, options: &ScanOptions) -> Result<Vec<(String, SourceUnit)>> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;

    let unit = pydox::parse_source(&cli.name, &input, options);
    Ok(vec![(cli.name.clone(), unit)])
}

/// file mode: expand patterns, then parse every file on the batch pool.
fn file_mode(cli: &Cli, options: &ScanOptions) -> Result<Vec<(String, SourceUnit)>> {
    if let Some(dir) = &cli.output {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory: {}", dir.display()))?;
    }

    let input_files = expand_globs(&cli.files)?;
    let parsed = batch::parse_paths(&input_files, options);
    Ok(parsed
        .into_iter()
        .map(|(path, unit)| (path.display().to_string(), unit))
        .collect())
}

fn emit(cli: &Cli, dumper: &dyn Dumper, source: &str, unit: &SourceUnit) -> Result<()> {
    let text = dumper.dump(unit)?;
    match &cli.output {
        Some(dir) => {
            let out_path = dir.join(format!("{}.{}", derive_output_name(source), dumper.file_extension()));
            fs::write(&out_path, &text)
                .with_context(|| format!("failed to write {}", out_path.display()))?;
        }
        None => print!("{}", text),
    }
    Ok(())
}

/// Expand glob patterns into a list of real file paths.
/// Bare directories are scanned (non-recursively) for Python sources.
fn expand_globs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let path = Path::new(pattern);
        if path.is_file() {
            files.push(path.to_path_buf());
            continue;
        }
        if path.is_dir() {
            let entries = fs::read_dir(path)
                .with_context(|| format!("failed to read directory: {}", path.display()))?;
            for entry in entries.flatten() {
                let p = entry.path();
                if p.is_file() && is_python(&p) {
                    files.push(p);
                }
            }
            continue;
        }
        let matches: Vec<_> = glob::glob(pattern)
            .with_context(|| format!("invalid glob pattern: {}", pattern))?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();
        if matches.is_empty() {
            warn!("no files matched: {}", pattern);
        }
        files.extend(matches);
    }
    // Deterministic output
    files.sort();
    files.dedup();
    Ok(files)
}

fn is_python(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| PYTHON_EXTENSIONS.contains(&e))
}

/// "pkg/py_doxy.py" → "py_doxy"
fn derive_output_name(source: &str) -> String {
    let filename = source.rsplit(['/', '\\']).next().unwrap_or(source);
    PYTHON_EXTENSIONS
        .iter()
        .find_map(|ext| filename.strip_suffix(&format!(".{}", ext)))
        .unwrap_or(filename)
        .to_string()
}
