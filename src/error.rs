use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Missing input file: {}", .0.display())]
    MissingInput(PathBuf),

    /// Rows about to be appended are already in the canonical dataset,
    /// most likely because `append` already ran against this input.
    #[error(
        "Refusing to append: {count} row(s) already present in {} (e.g. {sample}). Re-run with --force to append anyway.",
        .path.display()
    )]
    DuplicateAppend {
        path: PathBuf,
        count: usize,
        sample: String,
    },

    #[error("Batch size must be at least 1")]
    InvalidBatchSize,

    #[error("Unknown column mapping version: {0}")]
    UnknownMapping(u32),
}
