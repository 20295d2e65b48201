//! Docstring parsing — structured model plus style dispatch.
//!
//! Four grammars are supported, one per [`DocstringStyle`]. Every parser is
//! total: any input yields a [`ParsedDocstring`], malformed directives are
//! either kept as prose or dropped, never reported as errors.

pub mod epydoc;
pub mod google;
pub mod numpy;
pub mod rst;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A documented parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamDoc {
    pub name: String,
    pub description: String,
    /// Type as written in the docstring, independent of the extractor's.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
}

impl ParamDoc {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ty: None,
        }
    }
}

/// Documented return value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReturnsDoc {
    pub description: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
}

/// A documented error/exception. Deserializable as part of a re-read
/// [`crate::model::Entry`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RaisesDoc {
    #[serde(rename = "type")]
    pub ty: String,
    pub description: String,
}

impl RaisesDoc {
    pub fn new(ty: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            description: description.into(),
        }
    }
}

/// Docstring split into prose and structured sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedDocstring {
    pub description: String,
    pub params: Vec<ParamDoc>,
    /// `None` means "not documented", distinct from an empty description.
    pub returns: Option<ReturnsDoc>,
    pub raises: Vec<RaisesDoc>,
    /// Reserved; no grammar fills it yet.
    pub examples: Vec<String>,
}

/// Supported docstring grammars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocstringStyle {
    #[default]
    Rst,
    Google,
    Numpy,
    Epydoc,
}

impl DocstringStyle {
    pub const ALL: [DocstringStyle; 4] = [
        DocstringStyle::Rst,
        DocstringStyle::Google,
        DocstringStyle::Numpy,
        DocstringStyle::Epydoc,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DocstringStyle::Rst => "rst",
            DocstringStyle::Google => "google",
            DocstringStyle::Numpy => "numpy",
            DocstringStyle::Epydoc => "epydoc",
        }
    }
}

impl fmt::Display for DocstringStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a style name is not one of the known grammars.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown docstring style: {0}")]
pub struct UnknownStyle(pub String);

impl FromStr for DocstringStyle {
    type Err = UnknownStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocstringStyle::ALL
            .into_iter()
            .find(|style| style.as_str() == s)
            .ok_or_else(|| UnknownStyle(s.to_string()))
    }
}

/// Parse a docstring with the given grammar.
pub fn parse_docstring(text: &str, style: DocstringStyle) -> ParsedDocstring {
    if text.is_empty() {
        return ParsedDocstring::default();
    }

    match style {
        DocstringStyle::Rst => rst::parse(text),
        DocstringStyle::Google => google::parse(text),
        DocstringStyle::Numpy => numpy::parse(text),
        DocstringStyle::Epydoc => epydoc::parse(text),
    }
}

/// Shared line-directive scanner for the RST and Epydoc grammars.
///
/// Prose is collected until the first directive; after that, lines that
/// are not directives are dropped.
pub(crate) struct DirectivePatterns<'a> {
    pub param: &'a regex::Regex,
    pub returns: &'a regex::Regex,
    pub raises: &'a regex::Regex,
}

pub(crate) fn parse_directives(doc: &str, patterns: DirectivePatterns<'_>) -> ParsedDocstring {
    let mut result = ParsedDocstring::default();
    let mut description: Vec<&str> = Vec::new();
    let mut in_description = true;

    for line in doc.trim().lines() {
        let line = line.trim();

        if let Some(caps) = patterns.param.captures(line) {
            in_description = false;
            result
                .params
                .push(ParamDoc::new(&caps[1], caps[2].trim()));
        } else if let Some(caps) = patterns.returns.captures(line) {
            in_description = false;
            result.returns = Some(ReturnsDoc {
                description: caps[1].trim().to_string(),
                ty: None,
            });
        } else if let Some(caps) = patterns.raises.captures(line) {
            in_description = false;
            result
                .raises
                .push(RaisesDoc::new(&caps[1], caps[2].trim()));
        } else if in_description && (!line.is_empty() || !description.is_empty()) {
            description.push(line);
        }
    }

    result.description = description.join("\n").trim().to_string();
    result
}

/// Leading whitespace width of a line, in characters.
pub(crate) fn indent_of(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}
