use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use crate::error::SyncError;
use crate::normalize::{has_specific_category, is_placeholder_name, parse_bool};
use crate::validate::is_valid_official_url;

pub const CANONICAL_COLUMNS: &[&str] = &["name", "url", "category", "description", "featured", "hidden"];

/// One row of `websites.csv`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebsiteEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub featured: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub hidden: bool,
}

impl WebsiteEntry {
    /// Shown on the site: named, not hidden, specific category, official URL.
    pub fn is_live(&self) -> bool {
        !self.hidden
            && !is_placeholder_name(&self.name)
            && has_specific_category(&self.category)
            && is_valid_official_url(&self.url, &self.name)
    }
}

fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    let raw = String::deserialize(d)?;
    Ok(parse_bool(&raw))
}

/// One row of an import candidate list, after column mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateRow {
    pub name: String,
    pub url: String,
    pub category: String,
    pub description: String,
    pub hidden: bool,
}

// ── Column mapping ──

/// Header renames for one external source schema.
///
/// Headers not listed keep their own name, so a file that already uses the
/// canonical column names loads under any version.
#[derive(Debug)]
pub struct ColumnMapping {
    pub version: u32,
    pub source: &'static str,
    pub columns: &'static [(&'static str, &'static str)],
}

pub const COLUMN_MAPPINGS: &[ColumnMapping] = &[ColumnMapping {
    version: 1,
    source: "SEO directory export",
    columns: &[
        ("Website Name", "name"),
        ("Official Website", "url"),
        ("Category", "category"),
        ("Description", "description"),
        ("Hidden", "hidden"),
    ],
}];

impl ColumnMapping {
    pub fn latest() -> &'static ColumnMapping {
        &COLUMN_MAPPINGS[COLUMN_MAPPINGS.len() - 1]
    }

    pub fn by_version(version: u32) -> Result<&'static ColumnMapping, SyncError> {
        COLUMN_MAPPINGS
            .iter()
            .find(|m| m.version == version)
            .ok_or(SyncError::UnknownMapping(version))
    }

    pub fn rename<'a>(&self, header: &'a str) -> &'a str {
        for (from, to) in self.columns {
            if *from == header {
                return to;
            }
        }
        header
    }
}

// ── Loading ──

fn reader_for(path: &Path) -> Result<csv::Reader<fs::File>> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))
}

/// Load the canonical dataset. Short rows read their missing cells as `""`;
/// undecodable rows are logged and skipped.
pub fn load_entries(path: &Path) -> Result<Vec<WebsiteEntry>> {
    let mut reader = reader_for(path)?;
    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?
        .clone();
    let mut entries = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let mut record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping malformed row {} in {}: {}", i + 2, path.display(), e);
                continue;
            }
        };
        record.truncate(headers.len());
        while record.len() < headers.len() {
            record.push_field("");
        }
        match record.deserialize::<WebsiteEntry>(Some(&headers)) {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!("Skipping malformed row {} in {}: {}", i + 2, path.display(), e),
        }
    }
    info!("Loaded {} rows from {}", entries.len(), path.display());
    Ok(entries)
}

/// Load a candidate list, renaming its headers through `mapping`.
pub fn load_candidates(path: &Path, mapping: &ColumnMapping) -> Result<Vec<CandidateRow>> {
    let mut reader = reader_for(path)?;
    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?
        .iter()
        .map(|h| mapping.rename(h).to_string())
        .collect();
    let col = |name: &str| headers.iter().position(|h| h == name);
    let (name_i, url_i, cat_i, desc_i, hidden_i) = (
        col("name"),
        col("url"),
        col("category"),
        col("description"),
        col("hidden"),
    );
    if name_i.is_none() || url_i.is_none() {
        warn!(
            "{} has no name/url column under mapping v{} ({})",
            path.display(),
            mapping.version,
            mapping.source
        );
    }

    let mut rows = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping malformed row {} in {}: {}", i + 2, path.display(), e);
                continue;
            }
        };
        let get = |idx: Option<usize>| idx.and_then(|i| record.get(i)).unwrap_or("").to_string();
        rows.push(CandidateRow {
            name: get(name_i),
            url: get(url_i),
            category: get(cat_i),
            description: get(desc_i),
            hidden: parse_bool(&get(hidden_i)),
        });
    }
    info!("Loaded {} candidates from {}", rows.len(), path.display());
    Ok(rows)
}

// ── Writing ──

/// Write `rows` under an explicit header, so empty partitions still get one.
pub fn write_rows<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Append headerless rows to an existing CSV, fixing a missing final newline first.
pub fn append_entries(path: &Path, rows: &[WebsiteEntry]) -> Result<()> {
    let mut file = OpenOptions::new()
        .read(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {} for appending", path.display()))?;

    let len = file.metadata()?.len();
    if len > 0 {
        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1))?;
        file.read_exact(&mut last)?;
        if last[0] != b'\n' {
            file.write_all(b"\n")?;
        }
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// One item per line, no trailing newline.
pub fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    fs::write(path, lines.join("\n"))
        .with_context(|| format!("Failed to write {}", path.display()))
}

// ── Stats ──

#[derive(Debug, Default, PartialEq, Eq)]
pub struct DatasetStats {
    pub total: usize,
    pub hidden: usize,
    pub visible: usize,
    pub live: usize,
}

impl DatasetStats {
    pub fn visible_pct(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.visible as f64 * 100.0 / self.total as f64
        }
    }
}

/// Rows without a name are not counted at all.
pub fn get_stats(entries: &[WebsiteEntry]) -> DatasetStats {
    let mut stats = DatasetStats::default();
    for entry in entries.iter().filter(|e| !e.name.is_empty()) {
        stats.total += 1;
        if entry.hidden {
            stats.hidden += 1;
        } else {
            stats.visible += 1;
        }
        if entry.is_live() {
            stats.live += 1;
        }
    }
    stats
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn write_file(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn loads_canonical_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "websites.csv",
            "name,url,category,description,featured,hidden\n\
             Acme,https://acme.io, SaaS ,Tools,TRUE,false\n\
             Hidden Co,https://hidden.co,Retail,,false,true\n\
             Sparse,https://sparse.dev\n",
        );
        let entries = load_entries(&path).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].category, "SaaS");
        assert!(entries[0].featured);
        assert!(!entries[0].hidden);
        assert!(entries[1].hidden);
        assert_eq!(entries[2].category, "");
        assert!(!entries[2].hidden);
    }

    #[test]
    fn short_rows_keep_their_slug() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "websites.csv",
            "name,url,category,description,featured,hidden\n\
             NoFlags,https://nf.dev,SaaS,desc\n\
             Long,https://long.dev,SaaS,,false,true,extra\n",
        );
        let entries = load_entries(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].description, "desc");
        assert!(!entries[0].featured && !entries[0].hidden);
        assert!(entries[0].is_live());
        assert!(entries[1].hidden);
    }

    #[test]
    fn mapping_renames_source_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "candidates.csv",
            "Website Name,Official Website,Category,Description,Extra\n\
             Acme,https://acme.io,SaaS,Tools,x\n\
             Bolt,,,,\n",
        );
        let rows = load_candidates(&path, ColumnMapping::latest()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Acme");
        assert_eq!(rows[0].url, "https://acme.io");
        assert_eq!(rows[0].description, "Tools");
        assert!(!rows[0].hidden);
        assert_eq!(rows[1].url, "");
    }

    #[test]
    fn canonical_headers_pass_through_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "candidates.csv",
            "name,url,category,hidden\nAcme,https://acme.io,SaaS,true\n",
        );
        let rows = load_candidates(&path, ColumnMapping::latest()).unwrap();
        assert_eq!(rows[0].name, "Acme");
        assert!(rows[0].hidden);
        assert_eq!(rows[0].description, "");
    }

    #[test]
    fn unknown_mapping_version() {
        assert!(ColumnMapping::by_version(1).is_ok());
        assert!(matches!(
            ColumnMapping::by_version(99),
            Err(SyncError::UnknownMapping(99))
        ));
    }

    #[test]
    fn empty_partition_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_rows::<WebsiteEntry>(&path, CANONICAL_COLUMNS, &[]).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "name,url,category,description,featured,hidden\n"
        );
    }

    #[test]
    fn append_adds_missing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "websites.csv",
            "name,url,category,description,featured,hidden\nAcme,https://acme.io,SaaS,,false,false",
        );
        let row = WebsiteEntry {
            name: "Bolt".into(),
            url: "https://bolt.dev".into(),
            category: "Dev".into(),
            ..Default::default()
        };
        append_entries(&path, &[row]).unwrap();
        let body = fs::read_to_string(&path).unwrap();
        assert!(body.ends_with("Acme,https://acme.io,SaaS,,false,false\nBolt,https://bolt.dev,Dev,,false,false\n"));
        assert_eq!(load_entries(&path).unwrap().len(), 2);
    }

    #[test]
    fn stats_count_hidden_and_live() {
        let entries = vec![
            WebsiteEntry {
                name: "Acme".into(),
                url: "https://acme.io".into(),
                category: "SaaS".into(),
                ..Default::default()
            },
            WebsiteEntry {
                name: "Shy".into(),
                url: "https://shy.io".into(),
                category: "SaaS".into(),
                hidden: true,
                ..Default::default()
            },
            WebsiteEntry {
                name: "Vague".into(),
                url: "https://vague.io".into(),
                category: "Other".into(),
                ..Default::default()
            },
            WebsiteEntry::default(),
        ];
        let stats = get_stats(&entries);
        assert_eq!(
            stats,
            DatasetStats {
                total: 3,
                hidden: 1,
                visible: 2,
                live: 1
            }
        );
        assert!((stats.visible_pct() - 66.666).abs() < 0.01);
    }
}
