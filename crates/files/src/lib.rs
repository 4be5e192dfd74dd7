//! Casegen File Output
//!
//! This crate writes rendered case messages to disk using the naming conventions the
//! scheduling integration tests expect:
//!
//! ```text
//! <output root>/
//! └── 240601 - HL7 Output/
//!     ├── JaneSmith-00.hl7
//!     ├── JaneSmith-01.hl7
//!     └── JaneSmith-ADT.hl7
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use casegen_files::OutputWriter;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let writer = OutputWriter::new(Path::new("out"))?;
//! let date = chrono::NaiveDate::from_ymd_opt(2024, 6, 1).ok_or("bad date")?;
//! let written = writer.write_case(date, Some("Jane"), Some("Smith"), &[])?;
//! assert!(written.is_empty());
//! # Ok(())
//! # }
//! ```

mod constants;
mod writer;

pub use constants::{MESSAGE_EXTENSION, OUTPUT_DIR_SUFFIX};
pub use writer::{message_file_name, output_dir_name, OutputWriter};

/// Errors that can occur during file output
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Root directory does not exist or is not a directory
    #[error("Invalid root directory: {0}")]
    InvalidRootDirectory(String),

    /// A file name part would escape the output directory
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
