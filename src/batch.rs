use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::dataset;
use crate::error::SyncError;
use crate::normalize::create_slug;
use crate::paths::{self, Layout};

/// Slugs of `names`, dropping names that slugify to nothing. Order and
/// duplicates are kept.
pub fn collect_slugs<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    names
        .into_iter()
        .map(create_slug)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Split into chunks of `size`; the last one may be short.
pub fn split_batches(slugs: &[String], size: usize) -> Result<Vec<&[String]>, SyncError> {
    if size == 0 {
        return Err(SyncError::InvalidBatchSize);
    }
    Ok(slugs.chunks(size).collect())
}

pub fn batch_file_name(index: usize) -> String {
    format!("batch_{:04}.txt", index)
}

fn clear_stale_batches(dir: &Path) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_batch = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("batch_") && n.ends_with(".txt"));
        if is_batch {
            debug!("Removing stale {}", path.display());
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

#[derive(Debug)]
pub struct BatchStats {
    pub batches: usize,
    pub total_slugs: usize,
    pub dir: PathBuf,
}

/// Write the slugs of `source`'s names as numbered batch files.
pub fn run(layout: &Layout, source: &Path, size: usize) -> Result<BatchStats> {
    paths::require(source)?;

    let entries = dataset::load_entries(source)?;
    let slugs = collect_slugs(entries.iter().map(|e| e.name.as_str()));
    let batches = split_batches(&slugs, size)?;

    let dir = layout.batch_dir();
    fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    clear_stale_batches(&dir)?;

    for (i, batch) in batches.iter().enumerate() {
        dataset::write_lines(&dir.join(batch_file_name(i + 1)), batch)?;
    }
    info!("Wrote {} batches of up to {} slugs", batches.len(), size);

    Ok(BatchStats {
        batches: batches.len(),
        total_slugs: slugs.len(),
        dir,
    })
}

// ── Tests ──
