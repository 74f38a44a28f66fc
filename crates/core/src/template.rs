//! Prompt template rendering.
//!
//! Templates are registered once from trusted, compile-time strings. Values
//! supplied at render time are bound as data: user text is interpolated
//! verbatim and never parsed as template syntax.

use crate::error::{Error, Result};
use serde::Serialize;
use tera::{Context, Tera};

/// A set of named templates backed by Tera.
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Register the given `(name, source)` templates.
    ///
    /// Fails when a template does not parse.
    pub fn new<'a>(templates: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self> {
        let mut tera = Tera::default();
        // Prompts are plain text; HTML escaping would mangle quotes and ampersands.
        tera.autoescape_on(vec![]);
        tera.add_raw_templates(templates)
            .map_err(|e| Error::template(describe(&e)))?;
        Ok(Self { tera })
    }

    /// Render `name` with the fields of `vars` as the template context.
    pub fn render(&self, name: &str, vars: &impl Serialize) -> Result<String> {
        let context = Context::from_serialize(vars).map_err(|e| Error::template(describe(&e)))?;
        self.tera
            .render(name, &context)
            .map_err(|e| Error::template(describe(&e)))
    }
}

/// Tera nests the useful message in the error source chain.
fn describe(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = std::error::Error::source(cause);
    }
    message
}
