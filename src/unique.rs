//! Rename new rows so their slugs never collide, then append them to the
//! canonical dataset.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::dataset::{self, WebsiteEntry, CANONICAL_COLUMNS};
use crate::error::SyncError;
use crate::normalize::{create_slug, normalize_url_key, slug_or_fallback};
use crate::paths::{self, Layout};

/// Audit trail from a candidate's original name to the one it was appended as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlugMapping {
    pub original_name: String,
    pub original_slug: String,
    pub final_name: String,
    pub final_slug: String,
    pub url: String,
}

const SLUG_MAP_COLUMNS: &[&str] = &["original_name", "original_slug", "final_name", "final_slug", "url"];

#[derive(Debug, Default)]
pub struct Assignment {
    pub adjusted: Vec<WebsiteEntry>,
    pub slug_map: Vec<SlugMapping>,
}

/// Slug of every canonical row, hidden or not.
pub fn used_slugs(entries: &[WebsiteEntry]) -> HashSet<String> {
    entries
        .iter()
        .map(|e| create_slug(&e.name))
        .filter(|s| !s.is_empty())
        .collect()
}

/// Pick a name for `base_name` whose slug is not in `used`, and claim it.
///
/// Tries the name itself, then "name 2", "name 3", and so on.
pub fn make_unique_name(base_name: &str, url: &str, used: &mut HashSet<String>) -> String {
    let (base_name, base_slug) = slug_or_fallback(base_name, url);
    if used.insert(base_slug) {
        return base_name;
    }

    let mut counter = 2u32;
    loop {
        let candidate = format!("{} {}", base_name, counter);
        let slug = create_slug(&candidate);
        if !slug.is_empty() && used.insert(slug) {
            debug!("{:?} renamed to {:?}", base_name, candidate);
            return candidate;
        }
        counter += 1;
    }
}

/// Assign unique names in input order. Not idempotent: feeding the same rows
/// through again against the grown `used` set renames every one of them.
pub fn assign_unique_names(candidates: Vec<WebsiteEntry>, used: &mut HashSet<String>) -> Assignment {
    let mut assignment = Assignment::default();
    for mut entry in candidates {
        let original_name = entry.name.clone();
        let original_slug = create_slug(&original_name);
        let final_name = make_unique_name(&original_name, &entry.url, used);
        let final_slug = create_slug(&final_name);

        assignment.slug_map.push(SlugMapping {
            original_name,
            original_slug,
            final_name: final_name.clone(),
            final_slug,
            url: entry.url.clone(),
        });
        entry.name = final_name;
        assignment.adjusted.push(entry);
    }
    assignment
}

/// `slug` itself, or `slug` with a numeric suffix ("acme", "acme-2", ...).
fn is_same_or_suffixed(slug: &str, base: &str) -> bool {
    match slug.strip_prefix(base) {
        Some("") => true,
        Some(rest) => rest
            .strip_prefix('-')
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit())),
        None => false,
    }
}

/// Candidates already in the canonical dataset: same URL key, under their
/// own name or a numbered rename of it.
pub fn already_appended<'a>(
    canonical: &[WebsiteEntry],
    candidates: &'a [WebsiteEntry],
) -> Vec<&'a WebsiteEntry> {
    let mut present: HashMap<String, Vec<String>> = HashMap::new();
    for e in canonical {
        let key = normalize_url_key(&e.url);
        let slug = create_slug(&e.name);
        if !key.is_empty() && !slug.is_empty() {
            present.entry(key).or_default().push(slug);
        }
    }
    candidates
        .iter()
        .filter(|c| {
            let (_, base) = slug_or_fallback(&c.name, &c.url);
            present
                .get(&normalize_url_key(&c.url))
                .is_some_and(|slugs| slugs.iter().any(|s| is_same_or_suffixed(s, &base)))
        })
        .collect()
}

#[derive(Debug)]
pub struct AppendStats {
    pub appended: usize,
    pub renamed: usize,
}

/// Uniquify `source` against the canonical dataset and append the result.
///
/// Refuses with `DuplicateAppend` when rows from `source` are already in the
/// dataset, unless `force` is set.
pub fn run(layout: &Layout, source: &Path, force: bool) -> Result<AppendStats> {
    let canonical_path = layout.canonical();
    paths::require(source)?;
    paths::require(&canonical_path)?;

    let canonical = dataset::load_entries(&canonical_path)?;
    let candidates = dataset::load_entries(source)?;

    let dupes = already_appended(&canonical, &candidates);
    if !dupes.is_empty() {
        if !force {
            return Err(SyncError::DuplicateAppend {
                path: canonical_path,
                count: dupes.len(),
                sample: format!("{} <{}>", dupes[0].name, dupes[0].url),
            }
            .into());
        }
        warn!("Appending {} row(s) that are already present (--force)", dupes.len());
    }

    let mut used = used_slugs(&canonical);
    info!("{} slugs already in use", used.len());
    let assignment = assign_unique_names(candidates, &mut used);

    let out = layout.output_dir();
    fs::create_dir_all(&out).with_context(|| format!("Failed to create {}", out.display()))?;
    dataset::write_rows(&layout.adjusted_csv(), CANONICAL_COLUMNS, &assignment.adjusted)?;
    dataset::write_rows(&layout.slug_map_csv(), SLUG_MAP_COLUMNS, &assignment.slug_map)?;
    dataset::append_entries(&canonical_path, &assignment.adjusted)?;

    let renamed = assignment
        .slug_map
        .iter()
        .filter(|m| m.original_name != m.final_name)
        .count();
    Ok(AppendStats {
        appended: assignment.adjusted.len(),
        renamed,
    })
}

// ── Tests ──
