//! Handler — collect, filter, enrich, render.

use crate::collector::Collector;
use crate::config::{detect_git_branch, Config, HandlerOptions, LocalOptions};
use crate::enrich::{enrich_module, retain_exported};
use crate::error::HandlerError;
use crate::model::Module;
use crate::render::Renderer;
use std::path::PathBuf;
use tracing::debug;

/// Turns module identifiers into rendered documentation.
pub struct Handler {
    collector: Collector,
    config_options: LocalOptions,
    detected_ref: Option<String>,
}

impl Handler {
    /// Build a handler for the project rooted at `base_dir`.
    pub fn new(config: Config, base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        let paths = config.paths();
        let config_options = config.options.validated();
        let detected_ref = match config_options.source_ref {
            Some(_) => None,
            None => detect_git_branch(&base_dir),
        };

        Self {
            collector: Collector::new(&paths, &base_dir, config.extractor),
            config_options,
            detected_ref,
        }
    }

    /// Merge defaults < config options < `local`.
    pub fn options(&self, local: &LocalOptions) -> HandlerOptions {
        HandlerOptions::resolve(
            &self.config_options.overlay(local),
            self.detected_ref.as_deref(),
        )
    }

    /// Collect a module and prepare it for rendering.
    pub fn collect(
        &mut self,
        identifier: &str,
        options: &HandlerOptions,
    ) -> Result<Module, HandlerError> {
        debug!(identifier, "collecting module");
        let module = self
            .collector
            .collect(identifier)
            .map_err(|source| HandlerError::Collection {
                identifier: identifier.to_string(),
                source,
            })?;

        Ok(prepare(module, options))
    }

    pub fn render(&self, module: &Module, options: &HandlerOptions, renderer: &dyn Renderer) -> String {
        renderer.render(module, options)
    }
}

/// Filter private items and merge docstrings, per `options`.
pub fn prepare(mut module: Module, options: &HandlerOptions) -> Module {
    if !options.show_private {
        retain_exported(&mut module);
    }
    enrich_module(&mut module, options.docstring_style, options.type_field_doc_style);
    module
}
