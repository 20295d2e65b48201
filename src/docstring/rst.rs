//! reStructuredText field-list docstrings (`:param x:`, `:returns:`, `:raises E:`).

use super::{parse_directives, DirectivePatterns, ParsedDocstring};
use regex::Regex;
use std::sync::LazyLock;

static RE_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:param\s+(\w+):\s*(.*)").unwrap());

static RE_RETURNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:returns?:\s*(.*)").unwrap());

static RE_RAISES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:raises?\s+(\w+):\s*(.*)").unwrap());

/// Parse an RST-style docstring.
pub fn parse(doc: &str) -> ParsedDocstring {
    parse_directives(
        doc,
        DirectivePatterns {
            param: &RE_PARAM,
            returns: &RE_RETURNS,
            raises: &RE_RAISES,
        },
    )
}
