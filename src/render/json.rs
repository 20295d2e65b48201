//! JSON renderer — the enriched module, for custom rendering pipelines.

use crate::config::HandlerOptions;
use crate::model::Module;
use crate::render::Renderer;

pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, module: &Module, _options: &HandlerOptions) -> String {
        // Module holds only strings, numbers, and sequences, so this cannot fail.
        let mut out = serde_json::to_string_pretty(module).unwrap_or_default();
        out.push('\n');
        out
    }

    fn file_extension(&self) -> &str {
        "json"
    }
}
