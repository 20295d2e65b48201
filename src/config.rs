//! Configuration for nimdoc.
//!
//! Parses `nimdoc.toml` with serde and discovers it by walking up parent
//! directories. Handler options are layered:
//!
//! built-in defaults < `[options]` from the file < per-invocation options
//!
//! ```toml
//! paths = ["src"]
//!
//! [options]
//! docstring_style = "google"
//! source_url = "https://github.com/owner/repo"
//!
//! [extractor]
//! source = "tools/nimdocinfo.nim"
//! ```

use crate::docstring::DocstringStyle;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, warn};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "nimdoc.toml";

const DEFAULT_SOURCE_REF: &str = "main";

/// Configuration loading error.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Search paths for Nim sources, relative to the project directory.
    pub paths: Option<Vec<String>>,
    /// Handler options from the `[options]` table.
    pub options: LocalOptions,
    /// Extractor location.
    pub extractor: ExtractorConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from an explicit file, or discover `nimdoc.toml`
    /// starting at `cwd`. Returns defaults when nothing is found.
    pub fn load(explicit: Option<&Path>, cwd: &Path) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => discover(cwd),
        };

        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let mut config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        config.config_path = Some(path);
        Ok(config)
    }

    /// Search paths, defaulting to `["src"]`.
    pub fn paths(&self) -> Vec<String> {
        match self.paths {
            Some(ref paths) if !paths.is_empty() => paths.clone(),
            _ => vec!["src".to_string()],
        }
    }

    /// Project directory: the config file's directory, or `cwd`.
    pub fn base_dir(&self, cwd: &Path) -> PathBuf {
        self.config_path
            .as_deref()
            .and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cwd.to_path_buf())
    }
}

/// Walk up from `start` looking for `nimdoc.toml`.
pub fn discover(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILENAME))
        .find(|candidate| candidate.is_file())
}

/// Where the `nimdocinfo` extractor comes from.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Prebuilt extractor binary (default: `nimdocinfo` on `PATH`).
    pub command: Option<PathBuf>,
    /// Extractor source to compile and cache instead of `command`.
    pub source: Option<PathBuf>,
    /// Nim compiler (default: `nim`).
    pub nim: Option<String>,
    /// Cache directory for the compiled extractor.
    pub cache_dir: Option<PathBuf>,
}

impl ExtractorConfig {
    pub fn command(&self) -> PathBuf {
        self.command
            .clone()
            .unwrap_or_else(|| PathBuf::from("nimdocinfo"))
    }

    pub fn nim(&self) -> &str {
        self.nim.as_deref().unwrap_or("nim")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("nimdoc-cache"))
    }
}

/// One layer of handler options. Unset values fall through to lower layers.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LocalOptions {
    pub show_source: Option<bool>,
    pub show_signature: Option<bool>,
    pub show_pragmas: Option<bool>,
    pub show_private: Option<bool>,
    pub heading_level: Option<u8>,
    pub docstring_style: Option<String>,
    pub type_field_doc_style: Option<String>,
    pub source_url: Option<String>,
    pub source_ref: Option<String>,
}

impl LocalOptions {
    /// Overlay `over` on top of `self`; set values in `over` win.
    #[must_use]
    pub fn overlay(&self, over: &LocalOptions) -> LocalOptions {
        LocalOptions {
            show_source: over.show_source.or(self.show_source),
            show_signature: over.show_signature.or(self.show_signature),
            show_pragmas: over.show_pragmas.or(self.show_pragmas),
            show_private: over.show_private.or(self.show_private),
            heading_level: over.heading_level.or(self.heading_level),
            docstring_style: over
                .docstring_style
                .clone()
                .or_else(|| self.docstring_style.clone()),
            type_field_doc_style: over
                .type_field_doc_style
                .clone()
                .or_else(|| self.type_field_doc_style.clone()),
            source_url: over.source_url.clone().or_else(|| self.source_url.clone()),
            source_ref: over.source_ref.clone().or_else(|| self.source_ref.clone()),
        }
    }

    /// Normalize and sanity-check project-level options, logging problems.
    ///
    /// `source_url` loses any trailing slash; links into `/blob/` or `/tree/`
    /// are reported since source links append their own ref and path.
    #[must_use]
    pub fn validated(mut self) -> LocalOptions {
        if let Some(url) = self.source_url.take() {
            let url = url.trim_end_matches('/').to_string();
            if url.contains("/blob/") || url.contains("/tree/") {
                warn!(
                    source_url = %url,
                    "source_url should not contain '/blob/' or '/tree/'; use the repository root URL"
                );
            }
            self.source_url = Some(url);
        }

        if self.show_source == Some(true) && self.source_url.is_none() {
            info!("show_source is enabled but source_url is not set; source links are disabled");
        }

        self
    }
}

/// How field and enum-value documentation is sourced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TypeFieldDocStyle {
    /// Each field's own doc comment.
    #[default]
    Inline,
    /// The owning type's docstring parameter section.
    Docstring,
}

impl FromStr for TypeFieldDocStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inline" => Ok(TypeFieldDocStyle::Inline),
            "docstring" => Ok(TypeFieldDocStyle::Docstring),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for TypeFieldDocStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeFieldDocStyle::Inline => f.write_str("inline"),
            TypeFieldDocStyle::Docstring => f.write_str("docstring"),
        }
    }
}

/// Fully resolved handler options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerOptions {
    pub show_source: bool,
    pub show_signature: bool,
    pub show_pragmas: bool,
    /// Include non-exported entries and fields.
    pub show_private: bool,
    pub heading_level: u8,
    pub docstring_style: DocstringStyle,
    pub type_field_doc_style: TypeFieldDocStyle,
    /// Repository root URL for source links.
    pub source_url: Option<String>,
    /// Branch or tag used in source links.
    pub source_ref: String,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self {
            show_source: true,
            show_signature: true,
            show_pragmas: true,
            show_private: false,
            heading_level: 2,
            docstring_style: DocstringStyle::Rst,
            type_field_doc_style: TypeFieldDocStyle::Inline,
            source_url: None,
            source_ref: DEFAULT_SOURCE_REF.to_string(),
        }
    }
}

impl HandlerOptions {
    /// Apply a merged option layer over the defaults.
    ///
    /// `detected_ref` stands in for `source_ref` when none is configured.
    pub fn resolve(layer: &LocalOptions, detected_ref: Option<&str>) -> Self {
        let defaults = Self::default();
        Self {
            show_source: layer.show_source.unwrap_or(defaults.show_source),
            show_signature: layer.show_signature.unwrap_or(defaults.show_signature),
            show_pragmas: layer.show_pragmas.unwrap_or(defaults.show_pragmas),
            show_private: layer.show_private.unwrap_or(defaults.show_private),
            heading_level: layer.heading_level.unwrap_or(defaults.heading_level).clamp(1, 6),
            docstring_style: layer
                .docstring_style
                .as_deref()
                .map_or(defaults.docstring_style, resolve_docstring_style),
            type_field_doc_style: layer
                .type_field_doc_style
                .as_deref()
                .map_or(defaults.type_field_doc_style, resolve_type_field_doc_style),
            source_url: layer
                .source_url
                .as_deref()
                .map(|url| url.trim_end_matches('/').to_string()),
            source_ref: layer
                .source_ref
                .clone()
                .or_else(|| detected_ref.map(str::to_string))
                .unwrap_or(defaults.source_ref),
        }
    }
}

/// Map a style name to a grammar, falling back to RST with a warning.
pub fn resolve_docstring_style(name: &str) -> DocstringStyle {
    name.parse().unwrap_or_else(|_| {
        let valid: Vec<&str> = DocstringStyle::ALL.iter().map(|s| s.as_str()).collect();
        warn!(
            "Unknown docstring_style '{}', falling back to 'rst'. Valid options: {:?}",
            name, valid
        );
        DocstringStyle::Rst
    })
}

fn resolve_type_field_doc_style(name: &str) -> TypeFieldDocStyle {
    name.parse().unwrap_or_else(|_| {
        warn!(
            "Unknown type_field_doc_style '{}', falling back to 'inline'. Valid options: [\"inline\", \"docstring\"]",
            name
        );
        TypeFieldDocStyle::Inline
    })
}

/// Current git branch of `dir`, if it is inside a repository with a commit.
pub fn detect_git_branch(dir: &Path) -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--abbrev-ref", "HEAD"])
        .current_dir(dir)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let branch = String::from_utf8_lossy(&output.stdout).trim().to_string();
    // Detached HEAD reports the literal "HEAD"
    if branch.is_empty() || branch == "HEAD" {
        None
    } else {
        Some(branch)
    }
}
