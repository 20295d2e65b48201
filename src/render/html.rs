//! HTML renderer — standalone page with semantic markup per module.

use crate::config::HandlerOptions;
use crate::model::*;
use crate::render::Renderer;

pub struct HtmlRenderer;

impl Renderer for HtmlRenderer {
    fn render(&self, module: &Module, options: &HandlerOptions) -> String {
        let mut out = String::new();
        let level = options.heading_level;

        out.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
        out.push_str("<meta charset=\"utf-8\">\n");
        out.push_str(&format!("<title>{}</title>\n", html_escape(&module.module)));
        out.push_str("<style>\n");
        out.push_str("body { font-family: system-ui, sans-serif; max-width: 52em; margin: 2em auto; padding: 0 1em; }\n");
        out.push_str("code { background: #f4f4f4; padding: 0.15em 0.3em; border-radius: 3px; }\n");
        out.push_str("pre { background: #f4f4f4; padding: 1em; border-radius: 5px; overflow-x: auto; }\n");
        out.push_str("table { border-collapse: collapse; }\n");
        out.push_str("th, td { text-align: left; padding: 0.25em 0.75em; border-bottom: 1px solid #ddd; }\n");
        out.push_str(".doc-kind { font-size: 0.75em; padding: 0.1em 0.4em; border-radius: 3px; background: #ffe953; color: #1a1a1a; margin-right: 0.5em; }\n");
        out.push_str(".doc-pragma { font-size: 0.8em; color: #666; }\n");
        out.push_str("</style>\n");
        out.push_str("</head>\n<body>\n");

        out.push_str(&format!(
            "<div class=\"doc doc-module\">\n<h{level} id=\"{}\">{}</h{level}>\n",
            html_escape(&anchor(&module.module, None)),
            html_escape(&module.module)
        ));
        out.push_str(&paragraphs(&module.doc));

        // Index
        if !module.entries.is_empty() {
            out.push_str("<ul class=\"doc-index\">\n");
            for entry in &module.entries {
                out.push_str(&format!(
                    "  <li><a href=\"#{}\">{}</a></li>\n",
                    html_escape(&anchor(&module.module, Some(&entry.name))),
                    html_escape(&entry.name)
                ));
            }
            out.push_str("</ul>\n");
        }

        for entry in &module.entries {
            out.push_str(&render_entry_html(module, entry, options));
        }

        out.push_str("</div>\n</body>\n</html>\n");
        out
    }

    fn file_extension(&self) -> &str {
        "html"
    }
}

fn render_entry_html(module: &Module, entry: &Entry, options: &HandlerOptions) -> String {
    let mut out = String::new();
    let level = (options.heading_level + 1).min(6);
    let sub = (level + 1).min(6);

    out.push_str(&format!(
        "<div class=\"doc doc-entry doc-{}\">\n",
        html_escape(&entry.kind)
    ));
    out.push_str(&format!(
        "<h{level} id=\"{}\"><span class=\"doc-kind\">{}</span><code>{}</code></h{level}>\n",
        html_escape(&anchor(&module.module, Some(&entry.name))),
        html_escape(&entry.kind),
        html_escape(&entry.name)
    ));

    if options.show_signature && !entry.signature.is_empty() {
        out.push_str(&format!(
            "<pre class=\"doc-signature\"><code class=\"language-nim\">{}</code></pre>\n",
            html_escape(&entry.signature)
        ));
    }

    if options.show_pragmas && !entry.pragmas.is_empty() {
        let pragmas: Vec<String> = entry.pragmas.iter().map(|p| html_escape(p)).collect();
        out.push_str(&format!(
            "<p class=\"doc-pragma\">{{.{}.}}</p>\n",
            pragmas.join(", ")
        ));
    }

    // Parsed prose only; the raw comment may hold directive markup
    out.push_str(&paragraphs(&entry.description));

    // Parameters
    if !entry.params.is_empty() {
        out.push_str(&format!("<h{sub}>Parameters</h{sub}>\n"));
        out.push_str("<table class=\"doc-section-params\">\n");
        out.push_str("<thead><tr><th>Name</th><th>Type</th><th>Description</th></tr></thead>\n<tbody>\n");
        for param in &entry.params {
            out.push_str(&format!(
                "  <tr><td class=\"doc-param-name\"><code>{}</code></td><td><code>{}</code></td><td>{}</td></tr>\n",
                html_escape(&param.name),
                html_escape(&param.ty),
                html_escape(&param.description)
            ));
        }
        out.push_str("</tbody>\n</table>\n");
    }

    // Returns
    if !entry.returns.is_empty() || !entry.returns_doc.is_empty() {
        out.push_str(&format!("<h{sub}>Returns</h{sub}>\n<p class=\"doc-returns\">"));
        if !entry.returns.is_empty() {
            out.push_str(&format!("<code>{}</code>", html_escape(&entry.returns)));
            if !entry.returns_doc.is_empty() {
                out.push_str(" &ndash; ");
            }
        }
        out.push_str(&html_escape(&entry.returns_doc));
        out.push_str("</p>\n");
    }

    // Raises: documented errors first, then pragma-only ones
    let undocumented: Vec<&String> = entry
        .raises
        .iter()
        .filter(|ty| !entry.raises_doc.iter().any(|doc| &doc.ty == *ty))
        .collect();
    if !entry.raises_doc.is_empty() || !undocumented.is_empty() {
        out.push_str(&format!("<h{sub}>Raises</h{sub}>\n<ul class=\"doc-raises\">\n"));
        for doc in &entry.raises_doc {
            out.push_str(&format!(
                "  <li><code>{}</code>{}</li>\n",
                html_escape(&doc.ty),
                if doc.description.is_empty() {
                    String::new()
                } else {
                    format!(" &ndash; {}", html_escape(&doc.description))
                }
            ));
        }
        for ty in undocumented {
            out.push_str(&format!("  <li><code>{}</code></li>\n", html_escape(ty)));
        }
        out.push_str("</ul>\n");
    }

    if !entry.fields.is_empty() {
        out.push_str(&render_fields(&entry.fields, "Fields", "doc-section-fields", sub));
    }

    if !entry.values.is_empty() {
        out.push_str(&render_fields(&entry.values, "Values", "doc-section-values", sub));
    }

    if options.show_source {
        if let Some(ref url) = options.source_url {
            out.push_str(&format!(
                "<p class=\"doc-source\"><a href=\"{}\">Source</a></p>\n",
                html_escape(&source_link(url, &options.source_ref, &module.file, entry.line))
            ));
        }
    }

    out.push_str("</div>\n");
    out
}

fn render_fields(fields: &[Field], title: &str, class: &str, level: u8) -> String {
    let mut out = String::new();
    let with_branch = fields.iter().any(|f| !f.branch.is_empty());

    out.push_str(&format!("<h{level}>{title}</h{level}>\n<table class=\"{class}\">\n<tbody>\n"));
    for field in fields {
        out.push_str(&format!(
            "  <tr><td class=\"doc-field-name\"><code>{}</code></td><td><code>{}</code></td>",
            html_escape(&field.name),
            html_escape(&field.ty)
        ));
        if with_branch {
            out.push_str(&format!(
                "<td class=\"doc-field-branch\">{}</td>",
                html_escape(&field.branch)
            ));
        }
        out.push_str(&format!("<td>{}</td></tr>\n", html_escape(&field.doc)));
    }
    out.push_str("</tbody>\n</table>\n");
    out
}

/// `<url>/blob/<ref>/<file>#L<line>`, with `file` made repository-relative.
pub fn source_link(url: &str, git_ref: &str, file: &str, line: u32) -> String {
    let file = file.trim_start_matches("./").trim_start_matches('/');
    format!("{}/blob/{}/{}#L{}", url, git_ref, file, line)
}

/// Anchor id for a module or one of its entries.
fn anchor(module: &str, entry: Option<&str>) -> String {
    let raw = match entry {
        Some(name) => format!("{}.{}", module, name),
        None => module.to_string(),
    };
    raw.to_lowercase()
        .replace(|c: char| !c.is_alphanumeric() && c != '-' && c != '.' && c != '_', "")
}

/// Blank-line separated text to `<p>` blocks.
fn paragraphs(text: &str) -> String {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p>{}</p>\n", html_escape(p)))
        .collect()
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
