use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Content root {0} does not exist")]
    RootNotFound(PathBuf),

    #[error("Content root {0} is not a directory")]
    RootNotDirectory(PathBuf),

    #[error("Invalid YAML in {path}: {message}")]
    InvalidYaml { path: PathBuf, message: String },

    #[error("Metadata in {0} is not a key/value mapping")]
    NotAMapping(PathBuf),

    #[error("Unterminated frontmatter block in {0}")]
    UnterminatedFrontmatter(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ContentError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ContentError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ContentError>;
