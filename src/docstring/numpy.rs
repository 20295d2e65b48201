//! NumPy-style docstrings: underlined section labels, two-level entries.
//!
//! ```text
//! Parameters
//! ----------
//! cap : int
//!     Capacity of the queue.
//! ```

use super::{indent_of, ParamDoc, ParsedDocstring, RaisesDoc, ReturnsDoc};
use regex::Regex;
use std::sync::LazyLock;

static RE_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z ]*$").unwrap());

static RE_UNDERLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-{3,}$").unwrap());

// Entry header name, before the optional `: type`
static RE_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\w+$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Description,
    Params,
    Returns,
    Raises,
    Inert,
}

impl Section {
    fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "parameters" => Section::Params,
            "returns" => Section::Returns,
            "raises" => Section::Raises,
            _ => Section::Inert,
        }
    }
}

/// An entry header line and the continuation text under it.
#[derive(Debug, Default)]
struct Entry {
    name: String,
    ty: Option<String>,
    text: Vec<String>,
}

impl Entry {
    fn from_line(line: &str) -> Self {
        let (name, ty) = match line.split_once(':') {
            Some((name, ty)) => {
                let ty = ty.trim();
                (name.trim(), (!ty.is_empty()).then(|| ty.to_string()))
            }
            None => (line.trim(), None),
        };
        Entry {
            name: name.to_string(),
            ty,
            text: Vec::new(),
        }
    }

    fn description(&self) -> String {
        self.text.join(" ")
    }
}

/// Scanner state for the current section.
#[derive(Default)]
struct SectionState {
    /// Indentation of entry header lines, set by the first non-blank line.
    entry_indent: Option<usize>,
    current: Option<Entry>,
}

/// True when `lines[i]` is a section label underlined by `lines[i + 1]`.
fn is_header(lines: &[&str], i: usize) -> bool {
    let Some(next) = lines.get(i + 1) else {
        return false;
    };
    RE_LABEL.is_match(lines[i].trim()) && RE_UNDERLINE.is_match(next.trim())
}

/// Parse a NumPy-style docstring.
pub fn parse(doc: &str) -> ParsedDocstring {
    let mut result = ParsedDocstring::default();
    let mut description: Vec<&str> = Vec::new();
    let mut section = Section::Description;
    let mut state = SectionState::default();

    let lines: Vec<&str> = doc.trim().lines().collect();
    let mut i = 0;

    while i < lines.len() {
        if is_header(&lines, i) {
            flush(&mut result, section, &mut state);
            section = Section::from_label(lines[i].trim());
            state = SectionState::default();
            i += 2;
            continue;
        }

        let line = lines[i];
        i += 1;

        match section {
            Section::Description => description.push(line),
            Section::Inert => {}
            Section::Params | Section::Raises => {
                if line.trim().is_empty() {
                    continue;
                }
                let indent = indent_of(line);
                let entry_indent = *state.entry_indent.get_or_insert(indent);
                match state.current.as_mut() {
                    Some(entry) if indent > entry_indent => {
                        entry.text.push(line.trim().to_string());
                    }
                    _ if indent > entry_indent => {}
                    _ => {
                        flush(&mut result, section, &mut state);
                        let entry = Entry::from_line(line);
                        // Prose at entry level is not an entry
                        if RE_NAME.is_match(&entry.name) {
                            state.current = Some(entry);
                        }
                    }
                }
            }
            Section::Returns => {
                let text = line.trim();
                if text.is_empty() {
                    // The paragraph under the first entry ends at a blank line.
                    if state.current.as_ref().is_some_and(|e| !e.text.is_empty()) {
                        flush(&mut result, section, &mut state);
                        section = Section::Inert;
                    }
                    continue;
                }
                let indent = indent_of(line);
                match state.current.as_mut() {
                    None => {
                        state.entry_indent = Some(indent);
                        let mut entry = Entry::default();
                        if lines_below_are_deeper(&lines, i, indent) || is_type_token(text) {
                            // `type` or `name : type` header line
                            let parsed = Entry::from_line(text);
                            entry.ty = parsed.ty.or(Some(parsed.name));
                        } else {
                            entry.text.push(text.to_string());
                        }
                        state.current = Some(entry);
                    }
                    Some(entry) if state.entry_indent.is_some_and(|base| indent > base) => {
                        entry.text.push(text.to_string());
                    }
                    Some(_) => {
                        flush(&mut result, section, &mut state);
                        section = Section::Inert;
                    }
                }
            }
        }
    }

    flush(&mut result, section, &mut state);
    result.description = description.join("\n").trim().to_string();
    result
}

/// A lone `bool` or `seq[int]` under Returns, as opposed to a sentence.
fn is_type_token(text: &str) -> bool {
    !text.contains(char::is_whitespace) && !text.ends_with('.')
}

/// True when the next non-blank line after `from` is indented past `indent`.
fn lines_below_are_deeper(lines: &[&str], from: usize, indent: usize) -> bool {
    lines[from..]
        .iter()
        .find(|l| !l.trim().is_empty())
        .is_some_and(|l| indent_of(l) > indent)
}

/// Move the pending entry into the result.
fn flush(result: &mut ParsedDocstring, section: Section, state: &mut SectionState) {
    let Some(entry) = state.current.take() else {
        return;
    };
    match section {
        Section::Params => {
            if !entry.name.is_empty() {
                result.params.push(ParamDoc {
                    description: entry.description(),
                    name: entry.name,
                    ty: entry.ty,
                });
            }
        }
        Section::Raises => {
            if !entry.name.is_empty() {
                result.raises.push(RaisesDoc {
                    description: entry.description(),
                    ty: entry.name,
                });
            }
        }
        Section::Returns => {
            result.returns = Some(ReturnsDoc {
                description: entry.description(),
                ty: entry.ty,
            });
        }
        Section::Description | Section::Inert => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_with_bare_type() {
        let doc = parse("Returns\n-------\nint\n    The sum\n");
        let returns = doc.returns.unwrap();
        assert_eq!(returns.ty.as_deref(), Some("int"));
        assert!(returns.description.contains("sum"));
    }

    #[test]
    fn returns_without_type() {
        let doc = parse("Sum.\n\nReturns\n-------\nThe sum of both\n");
        let returns = doc.returns.unwrap();
        assert_eq!(returns.ty, None);
        assert_eq!(returns.description, "The sum of both");
    }

    #[test]
    fn returns_named_entry() {
        let doc = parse("Returns\n-------\ntotal : int\n    Sum of\n    both values\n\n    Ignored paragraph.\n");
        let returns = doc.returns.unwrap();
        assert_eq!(returns.ty.as_deref(), Some("int"));
        assert_eq!(returns.description, "Sum of both values");
    }

    #[test]
    fn parameters_with_types_and_continuations() {
        let doc = parse(
            "Create a queue.\n\nParameters\n----------\ncap : int\n    Maximum number\n    of items.\nname\n    Queue name.\n",
        );
        assert_eq!(doc.description, "Create a queue.");
        assert_eq!(doc.params.len(), 2);
        assert_eq!(doc.params[0].name, "cap");
        assert_eq!(doc.params[0].ty.as_deref(), Some("int"));
        assert_eq!(doc.params[0].description, "Maximum number of items.");
        assert_eq!(doc.params[1].name, "name");
        assert_eq!(doc.params[1].ty, None);
        assert_eq!(doc.params[1].description, "Queue name.");
    }

    #[test]
    fn indented_docstring_block() {
        let doc = parse(
            "Create.\n\n    Parameters\n    ----------\n    a : int\n        First.\n\n    b : int\n        Second.\n\n    Raises\n    ------\n    ValueError\n        If bad.\n    KeyError\n        If missing.\n",
        );
        assert_eq!(doc.params.len(), 2);
        assert_eq!(doc.params[1].description, "Second.");
        let types: Vec<&str> = doc.raises.iter().map(|r| r.ty.as_str()).collect();
        assert_eq!(types, ["ValueError", "KeyError"]);
        assert_eq!(doc.raises[0].description, "If bad.");
    }

    #[test]
    fn underline_length_is_tolerant() {
        let doc = parse("Parameters\n---\nx\n    The x.\n");
        assert_eq!(doc.params.len(), 1);
        let doc = parse("Raises\n------------------\nIOError\n    On read.\n");
        assert_eq!(doc.raises.len(), 1);
    }

    #[test]
    fn unknown_sections_swallowed() {
        let doc = parse("Intro.\n\nExamples\n--------\n>>> push(q, 1)\n\nParameters\n----------\nq\n    Queue.\n");
        assert_eq!(doc.description, "Intro.");
        assert_eq!(doc.params.len(), 1);
    }

    #[test]
    fn label_without_underline_is_prose() {
        let doc = parse("Parameters\nare described elsewhere.\n");
        assert_eq!(doc.description, "Parameters\nare described elsewhere.");
        assert!(doc.params.is_empty());
    }

    #[test]
    fn returns_bare_type_alone() {
        let returns = parse("Returns\n-------\nbool\n").returns.unwrap();
        assert_eq!(returns.ty.as_deref(), Some("bool"));
        assert_eq!(returns.description, "");

        let returns = parse("Returns\n-------\nNothing.\n").returns.unwrap();
        assert_eq!(returns.ty, None);
        assert_eq!(returns.description, "Nothing.");
    }

    #[test]
    fn trailing_prose_is_not_an_entry() {
        let doc = parse("Make.\n\nParameters\n----------\nx : int\n    The x.\n\nSee the guide for details.\n    Still not a param.\ny\n    The y.\n");
        let names: Vec<&str> = doc.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["x", "y"]);
        assert_eq!(doc.params[0].description, "The x.");
        assert_eq!(doc.params[1].description, "The y.");

        let doc = parse("Raises\n------\nValueError\n    Bad input.\nAlso raised on timeout.\n");
        assert_eq!(doc.raises.len(), 1);
        assert_eq!(doc.raises[0].ty, "ValueError");
    }

    #[test]
    fn param_without_description() {
        let doc = parse("Parameters\n----------\nflag : bool\n");
        assert_eq!(doc.params[0].name, "flag");
        assert_eq!(doc.params[0].description, "");
    }
}
