//! Epydoc `@tag` docstrings (`@param x:`, `@return:`, `@raise E:`).
//!
//! Same line policy as the RST grammar with `@` in place of the colon sigil.

use super::{parse_directives, DirectivePatterns, ParsedDocstring};
use regex::Regex;
use std::sync::LazyLock;

static RE_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@param\s+(\w+):\s*(.*)").unwrap());

static RE_RETURNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@returns?:\s*(.*)").unwrap());

static RE_RAISES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@raises?\s+(\w+):\s*(.*)").unwrap());

/// Parse an Epydoc-style docstring.
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full() {
        let doc = parse(
            "Open a queue.\n\n@param cap: Capacity\n@param name: Queue name\n@return: The queue\n",
        );
        assert_eq!(doc.description, "Open a queue.");
        assert_eq!(doc.params.len(), 2);
        assert_eq!(doc.params[1].name, "name");
        assert_eq!(doc.params[1].description, "Queue name");
        assert_eq!(doc.returns.unwrap().description, "The queue");
    }

    #[test]
    fn raises_preserve_order() {
        let doc = parse("@raise ValueError: bad\n@raise IOError: missing\n");
        let types: Vec<&str> = doc.raises.iter().map(|r| r.ty.as_str()).collect();
        assert_eq!(types, ["ValueError", "IOError"]);
        assert_eq!(doc.raises[0].description, "bad");
    }

    #[test]
    fn returns_plural_and_raises_plural() {
        let doc = parse("@returns: value\n@raises KeyError: nope\n");
        assert_eq!(doc.returns.unwrap().description, "value");
        assert_eq!(doc.raises[0].ty, "KeyError");
    }

    #[test]
    fn rst_directives_are_prose() {
        let doc = parse("Intro.\n:param a: A\n");
        assert_eq!(doc.description, "Intro.\n:param a: A");
        assert!(doc.params.is_empty());
    }

    #[test]
    fn prose_stops_at_first_tag() {
        let doc = parse("Intro.\n@param a: A\ntrailing words\n");
        assert_eq!(doc.description, "Intro.");
    }
}
