//! Google-style docstrings with `Args:` / `Returns:` / `Raises:` sections.

use super::{indent_of, ParamDoc, ParsedDocstring, RaisesDoc, ReturnsDoc};
use regex::Regex;
use std::sync::LazyLock;

// Any `Word:` line opens a section; unknown ones are swallowed. Inside
// Args/Raises, an unknown `Word:` indented past the section header is an
// entry with no text.
static RE_SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+):\s*$").unwrap());

// `  name: text` or `  name (type): text`, indentation required
static RE_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s+(\w+)(?:\s*\(([^)]*)\))?:\s*(.*)").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Description,
    Params,
    Returns,
    Raises,
    Inert,
}

impl Section {
    fn from_header(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "args" | "arguments" | "parameters" => Section::Params,
            "returns" => Section::Returns,
            "raises" => Section::Raises,
            _ => Section::Inert,
        }
    }
}

/// Parse a Google-style docstring.
pub fn parse(doc: &str) -> ParsedDocstring {
    let mut result = ParsedDocstring::default();
    let mut description: Vec<&str> = Vec::new();
    let mut section = Section::Description;
    let mut header_indent = 0;

    for line in doc.trim().lines() {
        if let Some(caps) = RE_SECTION.captures(line.trim()) {
            let next = Section::from_header(&caps[1]);
            let is_entry = matches!(section, Section::Params | Section::Raises)
                && next == Section::Inert
                && indent_of(line) > header_indent;
            if !is_entry {
                section = next;
                header_indent = indent_of(line);
                continue;
            }
        }

        match section {
            Section::Description => description.push(line),
            Section::Params => {
                if let Some(caps) = RE_ENTRY.captures(line) {
                    result.params.push(ParamDoc {
                        name: caps[1].to_string(),
                        description: caps[3].trim().to_string(),
                        ty: caps
                            .get(2)
                            .map(|m| m.as_str().trim().to_string())
                            .filter(|t| !t.is_empty()),
                    });
                }
            }
            Section::Returns => {
                let text = line.trim();
                if !text.is_empty() {
                    result.returns = Some(ReturnsDoc {
                        description: text.to_string(),
                        ty: None,
                    });
                    section = Section::Inert;
                }
            }
            Section::Raises => {
                if let Some(caps) = RE_ENTRY.captures(line) {
                    result
                        .raises
                        .push(RaisesDoc::new(&caps[1], caps[3].trim()));
                }
            }
            Section::Inert => {}
        }
    }

    result.description = description.join("\n").trim().to_string();
    result
}
