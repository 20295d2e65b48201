//! Renderer module — trait-based format dispatch.

pub mod html;
pub mod json;

use crate::config::HandlerOptions;
use crate::model::Module;
use anyhow::{anyhow, Result};

/// Trait for rendering an enriched Module into a specific output format.
pub trait Renderer {
    fn render(&self, module: &Module, options: &HandlerOptions) -> String;
    fn file_extension(&self) -> &str;
}

/// Create a renderer for the given format name.
pub fn create_renderer(format: &str) -> Result<Box<dyn Renderer>> {
    match format {
        "html" => Ok(Box::new(html::HtmlRenderer)),
        "json" => Ok(Box::new(json::JsonRenderer)),
        _ => Err(anyhow!("unknown format: {}. Use html or json", format)),
    }
}
