#[derive(Debug, thiserror::Error)]
pub enum CaseGenError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid placeholder: {0}")]
    Placeholder(#[from] casegen_types::PlaceholderError),

    #[error("invalid event offset '{0}': expected minutes, duration-N or event±N")]
    InvalidOffset(String),
    #[error("invalid event table: {0}")]
    InvalidEventTable(String),
    #[error("unknown event profile: {0}")]
    UnknownProfile(String),

    #[error("template has no {block} block to repeat")]
    BlockNotFound { block: &'static str },
    #[error("too many {block} rows supplied: {supplied} (template has {available})")]
    TooManyRows {
        block: &'static str,
        supplied: usize,
        available: usize,
    },

    #[error("failed to read {what}: {source}")]
    FileRead {
        what: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{document} schema mismatch at {path}: {message}")]
    Schema {
        document: &'static str,
        path: String,
        message: String,
    },
}

pub type CaseGenResult<T> = std::result::Result<T, CaseGenError>;

/// Deserialize a YAML document, reporting the path of the first failing field.
///
/// `document` names the kind of file being read (for example `"config"` or `"case"`) and is
/// only used to make the error message readable.
pub(crate) fn from_yaml_with_path<T>(document: &'static str, yaml_text: &str) -> CaseGenResult<T>
where
    T: serde::de::DeserializeOwned,
{
    let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
    serde_path_to_error::deserialize::<_, T>(deserializer).map_err(|err| {
        let path = err.path().to_string();
        let path = if path.is_empty() || path == "." {
            "<root>".to_owned()
        } else {
            path
        };
        CaseGenError::Schema {
            document,
            path,
            message: err.into_inner().to_string(),
        }
    })
}
