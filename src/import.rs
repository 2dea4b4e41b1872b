//! Classify an external candidate list against the live dataset.
//!
//! Each candidate ends up in exactly one bucket: already live (matched by URL
//! key or slug), missing (new to the site), or invalid with a reason tag.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressIterator, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info};

use crate::dataset::{self, CandidateRow, ColumnMapping, WebsiteEntry, CANONICAL_COLUMNS};
use crate::normalize::{
    create_slug, fallback_name_from_url, has_specific_category,
    is_placeholder_name, normalize_url_key,
};
use crate::paths::{self, Layout};
use crate::validate::is_valid_official_url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    MissingName,
    MissingOrInvalidUrl,
    NonSpecificCategory,
    InvalidOfficialUrl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Existing { slug: String, url_key: String },
    Missing { slug: String },
    Invalid(InvalidReason),
}

/// Slugs and URL keys of every live canonical row.
#[derive(Debug, Default)]
pub struct LiveIndex {
    slugs: HashSet<String>,
    url_keys: HashSet<String>,
    count: usize,
}

impl LiveIndex {
    pub fn build(entries: &[WebsiteEntry]) -> Self {
        let mut index = LiveIndex::default();
        for entry in entries.iter().filter(|e| e.is_live()) {
            index.count += 1;
            let slug = create_slug(&entry.name);
            if !slug.is_empty() {
                index.slugs.insert(slug);
            }
            let key = normalize_url_key(&entry.url);
            if !key.is_empty() {
                index.url_keys.insert(key);
            }
        }
        index
    }

    /// Number of live rows the index was built from.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn contains(&self, slug: &str, url_key: &str) -> bool {
        (!url_key.is_empty() && self.url_keys.contains(url_key))
            || (!slug.is_empty() && self.slugs.contains(slug))
    }

    /// Classify one candidate. A name that slugifies to nothing is replaced
    /// in place by the URL host.
    pub fn classify(&self, row: &mut CandidateRow) -> Classification {
        if is_placeholder_name(&row.name) {
            return Classification::Invalid(InvalidReason::MissingName);
        }
        if !(row.url.starts_with("http://") || row.url.starts_with("https://")) {
            return Classification::Invalid(InvalidReason::MissingOrInvalidUrl);
        }
        if !has_specific_category(&row.category) {
            return Classification::Invalid(InvalidReason::NonSpecificCategory);
        }
        if !is_valid_official_url(&row.url, &row.name) {
            return Classification::Invalid(InvalidReason::InvalidOfficialUrl);
        }

        let url_key = normalize_url_key(&row.url);
        let mut slug = create_slug(&row.name);
        if slug.is_empty() {
            let fallback = fallback_name_from_url(&row.url);
            slug = create_slug(&fallback);
            debug!("{:?} has no slug, using {:?}", row.name, fallback);
            row.name = fallback;
        }

        if self.contains(&slug, &url_key) {
            Classification::Existing { slug, url_key }
        } else {
            Classification::Missing { slug }
        }
    }
}

// ── Output rows ──

#[derive(Debug, Clone, Serialize)]
pub struct ExistingRow {
    pub name: String,
    pub url: String,
    pub category: String,
    pub description: String,
    pub hidden: bool,
    pub slug: String,
    pub url_key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvalidRow {
    pub name: String,
    pub url: String,
    pub category: String,
    pub description: String,
    pub hidden: bool,
    pub reason: InvalidReason,
}

#[derive(Debug, Clone)]
pub struct MissingRow {
    pub entry: WebsiteEntry,
    pub slug: String,
}

const EXISTING_COLUMNS: &[&str] = &["name", "url", "category", "description", "hidden", "slug", "url_key"];
const INVALID_COLUMNS: &[&str] = &["name", "url", "category", "description", "hidden", "reason"];

#[derive(Debug, Default)]
pub struct ImportOutcome {
    pub existing: Vec<ExistingRow>,
    pub missing: Vec<MissingRow>,
    pub invalid: Vec<InvalidRow>,
}

impl ImportOutcome {
    pub fn record(&mut self, row: CandidateRow, class: Classification) {
        match class {
            Classification::Existing { slug, url_key } => self.existing.push(ExistingRow {
                name: row.name,
                url: row.url,
                category: row.category,
                description: row.description,
                hidden: row.hidden,
                slug,
                url_key,
            }),
            Classification::Missing { slug } => self.missing.push(MissingRow {
                entry: WebsiteEntry {
                    name: row.name,
                    url: row.url,
                    category: row.category,
                    description: row.description,
                    featured: false,
                    hidden: row.hidden,
                },
                slug,
            }),
            Classification::Invalid(reason) => self.invalid.push(InvalidRow {
                name: row.name,
                url: row.url,
                category: row.category,
                description: row.description,
                hidden: row.hidden,
                reason,
            }),
        }
    }

    pub fn total(&self) -> usize {
        self.existing.len() + self.missing.len() + self.invalid.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub new_total: usize,
    pub current_visible_total: usize,
    pub already_live_count: usize,
    pub missing_count: usize,
    pub invalid_count: usize,
}

/// Classify every candidate in input order.
pub fn classify_all(
    index: &LiveIndex,
    candidates: impl IntoIterator<Item = CandidateRow>,
) -> ImportOutcome {
    let mut outcome = ImportOutcome::default();
    for mut row in candidates {
        let class = index.classify(&mut row);
        outcome.record(row, class);
    }
    outcome
}

pub fn build_report(index: &LiveIndex, outcome: &ImportOutcome) -> ImportReport {
    ImportReport {
        new_total: outcome.total(),
        current_visible_total: index.len(),
        already_live_count: outcome.existing.len(),
        missing_count: outcome.missing.len(),
        invalid_count: outcome.invalid.len(),
    }
}

/// Load both datasets, classify, and write the partitions and report.
pub fn run(layout: &Layout, candidates_path: &Path, mapping: &ColumnMapping) -> Result<ImportReport> {
    let canonical_path = layout.canonical();
    paths::require(candidates_path)?;
    paths::require(&canonical_path)?;

    let index = LiveIndex::build(&dataset::load_entries(&canonical_path)?);
    info!("Live index: {} visible rows", index.len());
    let candidates = dataset::load_candidates(candidates_path, mapping)?;

    let pb = ProgressBar::new(candidates.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec})")?
            .progress_chars("=> "),
    );
    let outcome = classify_all(&index, candidates.into_iter().progress_with(pb.clone()));
    pb.finish_and_clear();

    let report = build_report(&index, &outcome);

    let out = layout.output_dir();
    fs::create_dir_all(&out).with_context(|| format!("Failed to create {}", out.display()))?;

    dataset::write_rows(&layout.existing_csv(), EXISTING_COLUMNS, &outcome.existing)?;
    let missing_entries: Vec<&WebsiteEntry> = outcome.missing.iter().map(|m| &m.entry).collect();
    dataset::write_rows(&layout.missing_csv(), CANONICAL_COLUMNS, &missing_entries)?;
    dataset::write_rows(&layout.invalid_csv(), INVALID_COLUMNS, &outcome.invalid)?;

    let json = serde_json::to_string_pretty(&report)?;
    fs::write(layout.report_json(), &json)
        .with_context(|| format!("Failed to write {}", layout.report_json().display()))?;

    let slugs: Vec<String> = outcome
        .missing
        .iter()
        .filter(|m| !m.slug.is_empty())
        .map(|m| m.slug.clone())
        .collect();
    dataset::write_lines(&layout.missing_slugs_txt(), &slugs)?;

    info!(
        "Import: {} live, {} missing, {} invalid",
        report.already_live_count, report.missing_count, report.invalid_count
    );
    Ok(report)
}

// ── Tests ──
