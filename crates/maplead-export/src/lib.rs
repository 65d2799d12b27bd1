//! maplead export - writes extracted listings to a spreadsheet.
//!
//! The [`Exporter`] trait is the seam the controller calls once a job ends;
//! [`XlsxExporter`] is the implementation used by the server.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod error;
pub mod xlsx;

pub use error::{ExportError, Result};
pub use xlsx::{columns, XlsxExporter};

use maplead_core::Record;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// What an export call did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ExportOutcome {
    /// A file was written
    Written {
        /// Destination file
        path: PathBuf,
        /// Data rows written, header excluded
        rows: usize,
    },
    /// There was nothing to export; no file was touched
    Skipped,
}

/// Writes a finished job's records to a tabular destination.
pub trait Exporter: Send + Sync {
    /// Export `records`, including the Website column only when asked.
    ///
    /// An empty slice is a silent no-op reported as [`ExportOutcome::Skipped`].
    fn export(&self, records: &[Record], include_website: bool) -> Result<ExportOutcome>;

    /// Where exported files land.
    fn output_path(&self) -> &Path;
}
