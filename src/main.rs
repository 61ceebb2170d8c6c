//! shpkit CLI - Command-line tool for inspecting shapefile bundles.
//!
//! This is the main entry point for the shpkit command-line application.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use shpkit::dbf::codepage;
use shpkit::prelude::*;

/// shpkit - ESRI shapefile inspection tool
#[derive(Parser)]
#[command(name = "shpkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    read: ReadArgs,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ReadArgs {
    /// Charset for DBF text (code page number or encoding name)
    #[arg(long, global = true, env = "SHPKIT_CHARSET")]
    charset: Option<String>,

    /// Keep records flagged as deleted in the DBF
    #[arg(long, global = true)]
    include_deleted: bool,

    /// Ignore the .shx index and scan the .shp sequentially
    #[arg(long, global = true)]
    no_index: bool,
}

impl ReadArgs {
    fn options(&self) -> ReadOptions {
        let mut options = ReadOptions::new()
            .include_deleted(self.include_deleted)
            .use_index(!self.no_index);
        if let Some(charset) = &self.charset {
            options = options.with_charset(charset.clone());
        }
        options
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show headers, record counts and the attribute schema of a bundle
    Info {
        /// Path to a .shp file or a .zip archive
        #[arg(short, long, env = "SHPKIT_INPUT")]
        input: PathBuf,
    },

    /// Dump features as JSON
    Dump {
        /// Path to a .shp file or a .zip archive
        #[arg(short, long, env = "SHPKIT_INPUT")]
        input: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum number of features to write
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Resolve a code page string to a charset name
    Codepage {
        /// Raw code page, e.g. "1252" or "8859-1"
        raw: String,
    },

    /// Load every bundle under a directory and report failures
    Scan {
        /// Directory to search
        #[arg(short, long)]
        dir: PathBuf,

        /// File pattern (glob-style), relative to the directory
        #[arg(short, long, default_value = "**/*.shp")]
        pattern: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = cli.read.options();
    match cli.command {
        Commands::Info { input } => {
            cmd_info(&input, &options)?;
        }
        Commands::Dump {
            input,
            output,
            limit,
        } => {
            cmd_dump(&input, output.as_deref(), limit, &options)?;
        }
        Commands::Codepage { raw } => {
            println!("{}", codepage::resolve(&raw));
        }
        Commands::Scan { dir, pattern } => {
            cmd_scan(&dir, &pattern, &options)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn cmd_info(input: &Path, options: &ReadOptions) -> Result<()> {
    let start = Instant::now();
    let bundle = ShapefileBundle::open(input, options)
        .with_context(|| format!("Failed to load {}", input.display()))?;
    let header = bundle.header();

    println!("Bundle:      {}", bundle.name());
    println!("Shape type:  {}", header.shape_type);
    println!(
        "Extent:      [{}, {}] - [{}, {}]",
        header.bbox.min_x, header.bbox.min_y, header.bbox.max_x, header.bbox.max_y
    );
    if header.shape_type.has_z() {
        println!("Z range:     [{}, {}]", header.z_range.0, header.z_range.1);
    }
    println!(
        "Shapes:      {} ({})",
        bundle.shape_count(),
        if bundle.is_indexed() { "indexed" } else { "sequential" }
    );
    match bundle.dbf_header() {
        Some(dbf) => {
            println!("DBF records: {}", dbf.record_count);
            if let Some(date) = dbf.last_update {
                println!("Updated:     {date}");
            }
            println!("Charset:     {}", bundle.charset().name());
        }
        None => println!("DBF records: none"),
    }
    println!("Features:    {}", bundle.collection().len());

    println!("\nSchema:");
    for (i, attribute) in bundle.collection().schema().attributes().iter().enumerate() {
        println!("  {:>3} {:<12} {}", i, attribute.name, attribute.attribute_type);
    }
    println!("\nLoaded in {:?}", start.elapsed());

    Ok(())
}

fn cmd_dump(
    input: &Path,
    output: Option<&Path>,
    limit: Option<usize>,
    options: &ReadOptions,
) -> Result<()> {
    let collection = read_shapefile_bundle_with(input, options)
        .with_context(|| format!("Failed to load {}", input.display()))?;

    let count = limit.unwrap_or(collection.len()).min(collection.len());
    let document = serde_json::json!({
        "schema": collection.schema(),
        "features": &collection.features()[..count],
    });

    match output {
        Some(path) => {
            let json = serde_json::to_string_pretty(&document)?;
            fs::write(path, json).context("Failed to write output file")?;
            eprintln!("Wrote {} features to {}", count, path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &document)?;
            writeln!(stdout)?;
        }
    }

    Ok(())
}

fn cmd_scan(dir: &Path, pattern: &str, options: &ReadOptions) -> Result<()> {
    let full_pattern = dir.join(pattern);
    let paths: Vec<PathBuf> = glob::glob(&full_pattern.to_string_lossy())
        .context("Invalid file pattern")?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                eprintln!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .collect();

    println!("Scanning {} bundles under {}...", paths.len(), dir.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message("loading");
    pb.enable_steady_tick(Duration::from_millis(100));

    let start = Instant::now();
    let results = shpkit::read_bundles_parallel(&paths, options);
    pb.finish_and_clear();

    let mut features = 0;
    let mut errors = 0;
    for (path, result) in paths.iter().zip(results) {
        match result {
            Ok(bundle) => {
                features += bundle.collection().len();
                println!(
                    "{:>8} {:<14} {}",
                    bundle.collection().len(),
                    bundle.header().shape_type.name(),
                    path.display()
                );
            }
            Err(e) => {
                eprintln!("Error loading {}: {}", path.display(), e);
                errors += 1;
            }
        }
    }

    println!(
        "\nLoaded {} features from {} bundles in {:?} ({} errors)",
        features,
        paths.len() - errors,
        start.elapsed(),
        errors
    );

    Ok(())
}
