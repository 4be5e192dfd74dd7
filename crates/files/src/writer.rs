//! Output writer implementation
//!
//! Every case is written into a date-stamped directory below the output root, one file per
//! rendered message. File names combine the patient's name with the message's sequence tag,
//! so the scheduling message sorts first and event messages follow in table order.
//!
//! # Security Model
//!
//! - The root directory is validated and canonicalised at construction time
//! - Name parts containing path separators or `..` are rejected, never sanitised
//! - Existing files with the same name are overwritten; regenerating a case replaces it

use crate::constants::{
    FALLBACK_FIRST_NAME, FALLBACK_LAST_NAME, MESSAGE_EXTENSION, OUTPUT_DIR_DATE_FORMAT,
    OUTPUT_DIR_SUFFIX,
};
use crate::FilesError;
use casegen_core::RenderedMessage;
use casegen_types::SequenceTag;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the output directory for messages generated on `date`, e.g. `240601 - HL7 Output`.
pub fn output_dir_name(date: NaiveDate) -> String {
    format!("{}{OUTPUT_DIR_SUFFIX}", date.format(OUTPUT_DIR_DATE_FORMAT))
}

/// File name for one message: `{First}{Last}-{tag}.hl7`.
///
/// Missing, blank or still-unfilled (`{...}`) name parts fall back to `First` / `Last`.
///
/// # Errors
///
/// Returns [`FilesError::InvalidPath`] if a name part contains a path separator or `..`.
pub fn message_file_name(
    first_name: Option<&str>,
    last_name: Option<&str>,
    tag: &SequenceTag,
) -> Result<String, FilesError> {
    let first = name_part(first_name, FALLBACK_FIRST_NAME)?;
    let last = name_part(last_name, FALLBACK_LAST_NAME)?;
    Ok(format!("{first}{last}-{tag}.{MESSAGE_EXTENSION}"))
}

fn name_part<'a>(value: Option<&'a str>, fallback: &'a str) -> Result<&'a str, FilesError> {
    let value = match value.map(str::trim) {
        Some(v) if !v.is_empty() && !v.contains('{') => v,
        _ => return Ok(fallback),
    };

    if value.contains(['/', '\\']) || value.contains("..") {
        return Err(FilesError::InvalidPath(format!(
            "name part must not contain path components: {value}"
        )));
    }
    Ok(value)
}

/// Writes rendered case messages below a fixed output root.
#[derive(Debug)]
pub struct OutputWriter {
    /// Canonicalised output root
    root_directory: PathBuf,
}

impl OutputWriter {
    /// Creates a writer for an existing output root directory
    ///
    /// # Errors
    ///
    /// Returns `FilesError::InvalidRootDirectory` if the directory does not exist, is not a
    /// directory, or cannot be canonicalised.
    pub fn new(root_directory: &Path) -> Result<Self, FilesError> {
        if !root_directory.exists() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Directory does not exist: {}",
                root_directory.display()
            )));
        }

        if !root_directory.is_dir() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Path is not a directory: {}",
                root_directory.display()
            )));
        }

        let root_directory = root_directory.canonicalize().map_err(|e| {
            FilesError::InvalidRootDirectory(format!(
                "Cannot canonicalize path {}: {}",
                root_directory.display(),
                e
            ))
        })?;

        Ok(Self { root_directory })
    }

    #[must_use]
    pub fn root_directory(&self) -> &Path {
        &self.root_directory
    }

    /// Directory that messages generated on `date` are written to.
    #[must_use]
    pub fn case_directory(&self, date: NaiveDate) -> PathBuf {
        self.root_directory.join(output_dir_name(date))
    }

    /// Write every message of one case and return the written paths in message order.
    ///
    /// File names are validated before anything is written, so an invalid name part leaves
    /// the output directory untouched.
    pub fn write_case(
        &self,
        date: NaiveDate,
        first_name: Option<&str>,
        last_name: Option<&str>,
        messages: &[RenderedMessage],
    ) -> Result<Vec<PathBuf>, FilesError> {
        let directory = self.case_directory(date);
        let targets = messages
            .iter()
            .map(|message| {
                message_file_name(first_name, last_name, &message.tag)
                    .map(|name| (directory.join(name), message))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if targets.is_empty() {
            return Ok(Vec::new());
        }

        fs::create_dir_all(&directory).map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create output directory {}: {}",
                    directory.display(),
                    e
                ),
            ))
        })?;

        let mut written = Vec::with_capacity(targets.len());
        for (path, message) in targets {
            fs::write(&path, &message.text).map_err(|e| {
                FilesError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to write message to {}: {}", path.display(), e),
                ))
            })?;
            tracing::debug!(path = %path.display(), tag = %message.tag, "wrote message");
            written.push(path);
        }

        tracing::info!(
            directory = %directory.display(),
            files = written.len(),
            "wrote case messages"
        );
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn june_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn message(tag: SequenceTag, text: &str) -> RenderedMessage {
        RenderedMessage {
            text: text.to_owned(),
            tag,
        }
    }

    #[test]
    fn test_output_dir_name_uses_short_date() {
        assert_eq!(output_dir_name(june_first()), "240601 - HL7 Output");
    }

    #[test]
    fn test_message_file_name_combines_name_and_tag() {
        let name = message_file_name(Some("Jane"), Some("Smith"), &SequenceTag::event(3)).unwrap();
        assert_eq!(name, "JaneSmith-03.hl7");
    }

    #[test]
    fn test_message_file_name_falls_back_for_missing_or_placeholder_names() {
        let name = message_file_name(None, Some("{patientLastName}"), &SequenceTag::scheduling())
            .unwrap();
        assert_eq!(name, "FirstLast-00.hl7");

        let name = message_file_name(Some("  "), Some("Smith"), &SequenceTag::admission()).unwrap();
        assert_eq!(name, "FirstSmith-ADT.hl7");
    }

    #[test]
    fn test_message_file_name_rejects_path_components() {
        for bad in ["../etc", "a/b", "a\\b"] {
            let result = message_file_name(Some(bad), Some("Smith"), &SequenceTag::scheduling());
            assert!(matches!(result, Err(FilesError::InvalidPath(_))));
        }
    }

    #[test]
    fn test_output_writer_root_not_exists() {
        let temp = TempDir::new().unwrap();
        let result = OutputWriter::new(&temp.path().join("missing"));
        assert!(matches!(result, Err(FilesError::InvalidRootDirectory(_))));
    }

    #[test]
    fn test_output_writer_root_is_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        let result = OutputWriter::new(&file);
        assert!(matches!(result, Err(FilesError::InvalidRootDirectory(_))));
    }

    #[test]
    fn test_write_case_writes_one_file_per_message() {
        let temp = TempDir::new().unwrap();
        let writer = OutputWriter::new(temp.path()).unwrap();
        let messages = vec![
            message(SequenceTag::scheduling(), "MSH|S12"),
            message(SequenceTag::event(1), "MSH|S14"),
        ];

        let written = writer
            .write_case(june_first(), Some("Jane"), Some("Smith"), &messages)
            .unwrap();

        assert_eq!(written.len(), 2);
        let directory = writer.case_directory(june_first());
        assert!(directory.ends_with("240601 - HL7 Output"));
        assert_eq!(written[0], directory.join("JaneSmith-00.hl7"));
        assert_eq!(fs::read_to_string(&written[1]).unwrap(), "MSH|S14");
    }

    #[test]
    fn test_write_case_with_invalid_name_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let writer = OutputWriter::new(temp.path()).unwrap();
        let messages = vec![message(SequenceTag::scheduling(), "MSH|S12")];

        let result = writer.write_case(june_first(), Some("a/b"), None, &messages);

        assert!(matches!(result, Err(FilesError::InvalidPath(_))));
        assert!(!writer.case_directory(june_first()).exists());
    }
}
