use std::path::PathBuf;
use thiserror::Error;

/// Failure while turning a module identifier into a [`crate::model::Module`].
#[derive(Error, Debug)]
pub enum CollectionError {
    #[error("could not find Nim file for identifier: {0}")]
    NotFound(String),

    #[error(
        "Nim compiler not found. Install from https://nim-lang.org/install.html\n\
         Then verify installation: nim --version"
    )]
    CompilerMissing,

    #[error("extractor `{0}` not found")]
    ExtractorMissing(String),

    #[error("failed to compile nimdocinfo:\n{0}")]
    Compile(String),

    #[error("nimdocinfo failed:\n{stderr}\n\nTo debug, run manually:\n  {command}")]
    Extractor { stderr: String, command: String },

    #[error("could not find JSON markers in nimdocinfo output for {}", path.display())]
    MissingMarkers { path: PathBuf },

    #[error("invalid JSON from nimdocinfo: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("module record missing required fields: {}", .0.join(", "))]
    MissingModuleFields(Vec<&'static str>),

    #[error("Entry {index} missing required fields: {}", fields.join(", "))]
    MissingEntryFields {
        index: usize,
        fields: Vec<&'static str>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure reported by the handler for a whole module.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("failed to collect `{identifier}`: {source}")]
    Collection {
        identifier: String,
        #[source]
        source: CollectionError,
    },
}

pub type Result<T> = std::result::Result<T, CollectionError>;
