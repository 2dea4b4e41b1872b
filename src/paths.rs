use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::error::SyncError;

const CANONICAL_CSV: &str = "data/websites.csv";
const CANDIDATES_CSV: &str = "data/candidates.csv";
const OUTPUT_DIR: &str = "output";
const BATCH_DIR: &str = "slug_batches";

pub const DEFAULT_BATCH_SIZE: usize = 200;

/// Fixed file layout, rooted at the repository directory.
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn canonical(&self) -> PathBuf {
        self.root.join(CANONICAL_CSV)
    }

    pub fn candidates(&self) -> PathBuf {
        self.root.join(CANDIDATES_CSV)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join(OUTPUT_DIR)
    }

    pub fn existing_csv(&self) -> PathBuf {
        self.output_dir().join("existing.csv")
    }

    pub fn missing_csv(&self) -> PathBuf {
        self.output_dir().join("missing.csv")
    }

    pub fn invalid_csv(&self) -> PathBuf {
        self.output_dir().join("invalid.csv")
    }

    pub fn report_json(&self) -> PathBuf {
        self.output_dir().join("import_report.json")
    }

    pub fn missing_slugs_txt(&self) -> PathBuf {
        self.output_dir().join("missing_slugs.txt")
    }

    pub fn adjusted_csv(&self) -> PathBuf {
        self.output_dir().join("missing_adjusted.csv")
    }

    pub fn slug_map_csv(&self) -> PathBuf {
        self.output_dir().join("missing_slug_map.csv")
    }

    pub fn batch_dir(&self) -> PathBuf {
        self.output_dir().join(BATCH_DIR)
    }
}

/// Fail with `MissingInput` unless `path` is an existing file.
pub fn require(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(SyncError::MissingInput(path.to_path_buf()).into())
    }
}
