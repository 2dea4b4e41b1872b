mod batch;
mod dataset;
mod error;
mod import;
mod normalize;
mod paths;
mod unique;
mod validate;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

use dataset::ColumnMapping;
use paths::Layout;

#[derive(Parser)]
#[command(name = "sitesync", about = "Reconcile websites.csv against candidate lists")]
struct Cli {
    /// Repository root that data/ and output/ live under
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a candidate list into already-live, missing and invalid rows
    Import {
        /// Candidate CSV (default: data/candidates.csv)
        #[arg(long)]
        candidates: Option<PathBuf>,
        /// Column mapping version for the candidate headers (default: latest)
        #[arg(long)]
        mapping: Option<u32>,
    },
    /// Give missing rows unique names and append them to websites.csv
    Append {
        /// Rows to append (default: output/missing.csv)
        #[arg(long)]
        source: Option<PathBuf>,
        /// Append even if some rows are already in websites.csv
        #[arg(long)]
        force: bool,
    },
    /// Write slugs of appended rows as fixed-size batch files
    Batch {
        /// CSV whose names are batched (default: output/missing_adjusted.csv)
        #[arg(long)]
        source: Option<PathBuf>,
        /// Slugs per batch file
        #[arg(short = 'n', long, default_value_t = paths::DEFAULT_BATCH_SIZE)]
        size: usize,
    },
    /// Show dataset statistics
    Stats,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let layout = Layout::new(cli.root);

    let result = match cli.command {
        Commands::Import {
            candidates,
            mapping,
        } => {
            let mapping = match mapping {
                Some(v) => ColumnMapping::by_version(v)?,
                None => ColumnMapping::latest(),
            };
            let candidates = candidates.unwrap_or_else(|| layout.candidates());
            let report = import::run(&layout, &candidates, mapping)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Commands::Append { source, force } => {
            let source = source.unwrap_or_else(|| layout.missing_csv());
            let stats = unique::run(&layout, &source, force)?;
            println!(
                "Appended {} rows to {} ({} renamed)",
                stats.appended,
                layout.canonical().display(),
                stats.renamed
            );
            println!("Wrote adjusted CSV: {}", layout.adjusted_csv().display());
            println!("Wrote slug map: {}", layout.slug_map_csv().display());
            Ok(())
        }
        Commands::Batch { source, size } => {
            let source = source.unwrap_or_else(|| layout.adjusted_csv());
            let stats = batch::run(&layout, &source, size)?;
            println!(
                "Batches: {} total_slugs={} ({})",
                stats.batches,
                stats.total_slugs,
                stats.dir.display()
            );
            Ok(())
        }
        Commands::Stats => {
            let path = layout.canonical();
            paths::require(&path)?;
            let s = dataset::get_stats(&dataset::load_entries(&path)?);
            println!("Total:   {}", s.total);
            println!("Hidden:  {}", s.hidden);
            println!("Visible: {} ({:.2}%)", s.visible, s.visible_pct());
            println!("Live:    {}", s.live);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
