//! Enrichment — copy parsed docstring sections onto extracted entries.
//!
//! The extractor owns names and types; docstrings only contribute text.

use crate::config::TypeFieldDocStyle;
use crate::docstring::{parse_docstring, DocstringStyle, ParamDoc, ParsedDocstring};
use crate::model::{Entry, Field, Module, Param};

/// Copy parameter and return descriptions from `parsed` onto an entry.
///
/// Each declared parameter takes the description of the first documented
/// parameter with the same name. Declared order is kept; undocumented
/// parameters keep an empty description.
pub fn apply_docstring(params: &mut [Param], returns_doc: &mut String, parsed: &ParsedDocstring) {
    for param in params.iter_mut() {
        if let Some(doc) = find_param(&parsed.params, &param.name) {
            param.description = doc.description.clone();
        }
    }

    if let Some(ref returns) = parsed.returns {
        *returns_doc = returns.description.clone();
    }
}

/// Parse an entry's doc comment and merge it into the entry.
pub fn enrich_entry(entry: &mut Entry, style: DocstringStyle, field_style: TypeFieldDocStyle) {
    if entry.doc.is_empty() {
        return;
    }

    let parsed = parse_docstring(&entry.doc, style);
    apply_docstring(&mut entry.params, &mut entry.returns_doc, &parsed);
    entry.description = parsed.description.clone();
    entry.raises_doc = parsed.raises.clone();

    if field_style == TypeFieldDocStyle::Docstring {
        apply_field_docs(&mut entry.fields, &parsed.params);
        apply_field_docs(&mut entry.values, &parsed.params);
    }
}

/// Enrich every entry of a module.
pub fn enrich_module(module: &mut Module, style: DocstringStyle, field_style: TypeFieldDocStyle) {
    for entry in &mut module.entries {
        enrich_entry(entry, style, field_style);
    }
}

/// Drop non-exported entries, and non-exported fields/values of the rest.
pub fn retain_exported(module: &mut Module) {
    module.entries.retain(|entry| entry.exported);
    for entry in &mut module.entries {
        entry.fields.retain(|field| field.exported);
        entry.values.retain(|value| value.exported);
    }
}

/// Fields documented in the owning type's docstring take that text.
fn apply_field_docs(fields: &mut [Field], docs: &[ParamDoc]) {
    for field in fields.iter_mut() {
        if let Some(doc) = find_param(docs, &field.name) {
            field.doc = doc.description.clone();
        }
    }
}

fn find_param<'a>(docs: &'a [ParamDoc], name: &str) -> Option<&'a ParamDoc> {
    docs.iter().find(|doc| doc.name == name)
}
