//! Moji CLI - Character-level translation of HTML pages
//!
//! # Main Commands
//!
//! ```bash
//! moji batch                         # original/*.html -> translated/ using taiouhyou.csv
//! moji batch in out table.csv        # explicit directories and table
//! moji file page.html table.csv      # translate one page next to itself
//! moji index translated              # build link_list.html from page titles
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! moji mapping taiouhyou.csv         # show the loaded mapping as JSON
//! ```

use clap::{Parser, Subcommand};
use moji::logs::{log_info, log_info_indent, log_success, log_warning, LOG_BROADCASTER};
use moji::{
    build_link_list, load_mapping, render_link_list, translate_directory, translate_file,
    translate_file_in_place, BatchOptions, Config, IndexOptions, LoadedMapping,
    TranslateOptions,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "moji")]
#[command(about = "Translate the visible text of HTML pages with a character mapping table", long_about = None)]
struct Cli {
    /// Suppress progress output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate every page of a directory
    Batch {
        /// Directory holding the source pages
        #[arg(default_value = "original")]
        input: PathBuf,

        /// Directory receiving the translated pages
        #[arg(default_value = "translated")]
        output: PathBuf,

        /// Mapping table (CSV)
        #[arg(default_value = "taiouhyou.csv")]
        mapping: PathBuf,

        /// Write a JSON report of the run
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Documents processed at once
        #[arg(short, long, value_parser = parse_workers)]
        concurrency: Option<usize>,

        /// Suffix appended to output file stems
        #[arg(long)]
        suffix: Option<String>,

        /// Prefix inserted before `{stem}_files/` references
        #[arg(long)]
        asset_prefix: Option<String>,
    },

    /// Translate a single page
    File {
        /// Source page
        input: PathBuf,

        /// Mapping table (CSV)
        #[arg(default_value = "taiouhyou.csv")]
        mapping: PathBuf,

        /// Output directory (default: next to the input)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Suffix appended to the output file stem
        #[arg(long)]
        suffix: Option<String>,

        /// Also rewrite `{stem}_files/` references with this prefix
        #[arg(long)]
        asset_prefix: Option<String>,
    },

    /// Build a link list from the titles of translated pages
    Index {
        /// Directory holding the translated pages
        #[arg(default_value = "translated")]
        dir: PathBuf,

        /// Output file
        #[arg(short, long, default_value = "link_list.html")]
        output: PathBuf,

        /// Prefix of each link target
        #[arg(long, default_value = moji::index::DEFAULT_HREF_PREFIX)]
        href_prefix: String,
    },

    /// Load a mapping table and print it as JSON
    Mapping {
        /// Mapping table (CSV)
        #[arg(default_value = "taiouhyou.csv")]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    LOG_BROADCASTER.set_quiet(cli.quiet);

    let result = match Config::from_env() {
        Ok(config) => run(cli.command, config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Batch {
            input,
            output,
            mapping,
            report,
            concurrency,
            suffix,
            asset_prefix,
        } => {
            let mut options = BatchOptions::from_config(input, output, &config);
            if let Some(n) = concurrency {
                options.concurrency = n;
            }
            if let Some(s) = suffix {
                options.translate.output_suffix = s;
            }
            if let Some(p) = asset_prefix {
                options.translate.asset_prefix = Some(p);
            }
            cmd_batch(&options, &mapping, report.as_deref(), &config).await
        }

        Commands::File {
            input,
            mapping,
            output_dir,
            suffix,
            asset_prefix,
        } => {
            let options = TranslateOptions {
                output_suffix: suffix.unwrap_or_else(|| config.output_suffix.clone()),
                asset_prefix,
            };
            cmd_file(&input, &mapping, output_dir.as_deref(), &options, &config).await
        }

        Commands::Index {
            dir,
            output,
            href_prefix,
        } => cmd_index(&dir, &output, &href_prefix, &config).await,

        Commands::Mapping { input } => cmd_mapping(&input, &config),
    }
}

fn load_table(path: &Path, config: &Config) -> Result<LoadedMapping, Box<dyn std::error::Error>> {
    log_info(format!("📄 Loading mapping table: {}", path.display()));

    let loaded = load_mapping(path, &config.columns)?;

    log_info_indent(format!("Encoding: {}", loaded.encoding), 1);
    log_info_indent(format!("Delimiter: '{}'", format_delimiter(loaded.delimiter)), 1);
    log_info_indent(format!("Columns: {}", loaded.headers.join(", ")), 1);
    log_success(format!("Loaded {} mapping entries", loaded.mapping.len()));

    if loaded.skipped_rows > 0 {
        log_info(format!("{} row(s) skipped (blank source or target)", loaded.skipped_rows));
    }
    let multi = loaded.mapping.multi_char_keys();
    if multi > 0 {
        log_warning(format!(
            "{} entr{} with a multi-character source will never match",
            multi,
            if multi == 1 { "y" } else { "ies" }
        ));
    }

    Ok(loaded)
}

async fn cmd_batch(
    options: &BatchOptions,
    mapping_path: &Path,
    report_path: Option<&Path>,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = load_table(mapping_path, config)?;

    let report = translate_directory(options, Arc::new(loaded.mapping)).await?;

    if let Some(path) = report_path {
        fs::write(path, report.to_json()?)?;
        log_info(format!("💾 Report written to: {}", path.display()));
    }

    if !report.is_complete() {
        return Err(format!("{} document(s) failed", report.failure_count()).into());
    }

    log_success("✨ Done!");
    Ok(())
}

async fn cmd_file(
    input: &Path,
    mapping_path: &Path,
    output_dir: Option<&Path>,
    options: &TranslateOptions,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = load_table(mapping_path, config)?;

    log_info(format!("📄 Translating: {}", input.display()));
    let outcome = match output_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            translate_file(input, dir, &loaded.mapping, options).await?
        }
        None => translate_file_in_place(input, &loaded.mapping, options).await?,
    };

    log_info_indent(
        format!(
            "{} characters replaced in {} text node(s)",
            outcome.stats.replaced_chars, outcome.stats.substituted_nodes
        ),
        1,
    );
    log_success(format!("💾 Output written to: {}", outcome.output.display()));
    Ok(())
}

async fn cmd_index(
    dir: &Path,
    output: &Path,
    href_prefix: &str,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let entries = build_link_list(dir, &IndexOptions::from(config)).await?;
    let html = render_link_list(&entries, href_prefix);

    fs::write(output, &html)?;
    log_success(format!("📋 {} link(s) written to: {}", entries.len(), output.display()));
    Ok(())
}

fn cmd_mapping(input: &Path, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = load_table(input, config)?;

    let sorted: BTreeMap<&str, &str> = loaded.mapping.iter().collect();
    println!("{}", serde_json::to_string_pretty(&sorted)?);
    Ok(())
}

fn parse_workers(value: &str) -> Result<usize, String> {
    moji::config::parse_concurrency("--concurrency", value).map_err(|e| e.to_string())
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}
