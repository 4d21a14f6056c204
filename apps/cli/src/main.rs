//! ts-catalog: inspect, check, merge and convert Qt Linguist translation catalogues

use anyhow::{bail, Context as _, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use ts_catalog_core::{
    load_catalogue, merge, save_catalogue, validate_catalogue, CatalogConfig, Catalogue,
    CatalogueStats, FileMetadata, Translator,
};

#[derive(Parser)]
#[command(name = "ts-catalog")]
#[command(version)]
#[command(about = "Inspect, check, merge and convert Qt Linguist translation catalogues")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file (JSON, or YAML for .yaml/.yml)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show translation progress
    Stats {
        #[arg(value_name = "CATALOGUE")]
        file: PathBuf,
    },

    /// Check translations against their source text
    Check {
        #[arg(value_name = "CATALOGUE")]
        file: PathBuf,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },

    /// Look up one message the way the application would
    Lookup {
        #[arg(value_name = "CATALOGUE")]
        file: PathBuf,

        /// Context name
        #[arg(value_name = "CONTEXT")]
        context: String,

        /// Source text
        #[arg(value_name = "SOURCE")]
        source: String,

        /// Disambiguation comment
        #[arg(short = 'm', long)]
        comment: Option<String>,

        /// Quantity for plural messages
        #[arg(short = 'n', long, allow_negative_numbers = true)]
        count: Option<i64>,

        /// Ignore translations still marked unfinished
        #[arg(long)]
        finished_only: bool,
    },

    /// Merge a fresh extraction into a catalogue
    Merge {
        /// Catalogue holding the translations (created when missing)
        #[arg(value_name = "CATALOGUE")]
        existing: PathBuf,

        /// Catalogue produced by the string extractor
        #[arg(value_name = "EXTRACTED")]
        extracted: PathBuf,

        /// Write here instead of overwriting CATALOGUE
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Remove messages that are gone upstream
        #[arg(long)]
        drop_obsolete: bool,

        /// Do not keep a backup of the previous file
        #[arg(long)]
        no_backup: bool,
    },

    /// Convert between .ts and .json
    Convert {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
    },
}

fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_config(path: Option<&Path>) -> Result<CatalogConfig> {
    match path {
        Some(path) => CatalogConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(CatalogConfig::default()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn stats(file: &Path, json: bool) -> Result<()> {
    let loaded = load_catalogue(file)?;
    let stats = CatalogueStats::from_catalogue(&loaded.catalogue);
    if json {
        print_json(&stats)
    } else {
        println!("{stats}");
        Ok(())
    }
}

fn check(file: &Path, config: &CatalogConfig, json: bool) -> Result<()> {
    let loaded = load_catalogue(file)?;
    let report = validate_catalogue(&loaded.catalogue, &config.validator);

    if json {
        print_json(&report)?;
    } else {
        for issue in &report.issues {
            println!("{issue}");
        }
        println!(
            "{}: {} message(s) checked, {} error(s), {} warning(s)",
            file.display(),
            report.checked,
            report.error_count(),
            report.warning_count()
        );
    }

    if report.has_errors() {
        bail!("{} error(s) found in {}", report.error_count(), file.display());
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupOutput<'a> {
    context: &'a str,
    source: &'a str,
    translation: String,
    found: bool,
}

fn lookup(
    file: &Path,
    context: &str,
    source: &str,
    comment: Option<&str>,
    count: Option<i64>,
    config: &CatalogConfig,
    json: bool,
) -> Result<()> {
    let loaded = load_catalogue(file)?;
    let translator = Translator::from_catalogue(&loaded.catalogue, &config.lookup);
    let translation = match count {
        Some(n) => translator.translate_plural(context, source, comment, n),
        None => translator.translate(context, source, comment).to_string(),
    };

    if json {
        print_json(&LookupOutput {
            context,
            source,
            found: translator.contains(context, source, comment),
            translation,
        })
    } else {
        println!("{translation}");
        Ok(())
    }
}

fn merge_files(
    existing: &Path,
    extracted: &Path,
    output: Option<&Path>,
    config: &CatalogConfig,
    json: bool,
) -> Result<()> {
    let fresh = load_catalogue(extracted)?;
    let (current, metadata) = if existing.exists() {
        let loaded = load_catalogue(existing)?;
        (loaded.catalogue, loaded.metadata)
    } else {
        log::info!("{} does not exist, starting a new catalogue", existing.display());
        let catalogue = Catalogue::new(
            fresh.catalogue.language.clone(),
            fresh.catalogue.source_language.clone(),
        );
        (catalogue, FileMetadata::default())
    };

    let (merged, report) = merge(&current, &fresh.catalogue, &config.merge);
    let target = output.unwrap_or(existing);
    let outcome = save_catalogue(target, &merged, &metadata, config.output.backup)
        .with_context(|| format!("Failed to write {}", target.display()))?;

    if json {
        print_json(&report)?;
    } else {
        println!("{report}");
        if let Some(backup) = &outcome.backup_path {
            println!("Backup: {}", backup.display());
        }
    }
    Ok(())
}

fn convert(input: &Path, output: &Path, config: &CatalogConfig) -> Result<()> {
    let loaded = load_catalogue(input)?;
    save_catalogue(output, &loaded.catalogue, &loaded.metadata, config.output.backup)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!(
        "Converted {} message(s): {} -> {}",
        loaded.catalogue.message_count(),
        input.display(),
        output.display()
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Stats { file } => stats(&file, cli.json),
        Commands::Check { file, strict } => {
            if strict {
                config.validator.warnings_as_errors = true;
            }
            check(&file, &config, cli.json)
        }
        Commands::Lookup {
            file,
            context,
            source,
            comment,
            count,
            finished_only,
        } => {
            if finished_only {
                config.lookup.include_unfinished = false;
            }
            lookup(
                &file,
                &context,
                &source,
                comment.as_deref(),
                count,
                &config,
                cli.json,
            )
        }
        Commands::Merge {
            existing,
            extracted,
            output,
            drop_obsolete,
            no_backup,
        } => {
            if drop_obsolete {
                config.merge.drop_obsolete = true;
            }
            if no_backup {
                config.output.backup = false;
            }
            merge_files(&existing, &extracted, output.as_deref(), &config, cli.json)
        }
        Commands::Convert { input, output } => convert(&input, &output, &config),
    }
}
