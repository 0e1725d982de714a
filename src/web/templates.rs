//! Template engine
//!
//! Tera rendering for the HTML views. Templates live in the `templates/`
//! directory; every page gets the current user and any pending flash
//! message injected through `render_page`.

use anyhow::{Context as AnyhowContext, Result};
use axum::response::Html;
use tera::{Context as TeraContext, Tera};

use crate::web::error::PageError;
use crate::web::session::SessionContext;
use crate::web::state::AppState;

/// Default template glob, relative to the working directory
pub const DEFAULT_TEMPLATE_GLOB: &str = "templates/**/*.html";

/// Template engine wrapper
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Load all templates matching the glob
    pub fn new(glob: &str) -> Result<Self> {
        let tera = Tera::new(glob).with_context(|| format!("Failed to load templates: {}", glob))?;
        Ok(Self { tera })
    }

    /// Render a template with the given context
    pub fn render(&self, template: &str, context: &TeraContext) -> Result<String> {
        self.tera
            .render(template, context)
            .with_context(|| format!("Failed to render template: {}", template))
    }
}

/// Render a page template with the shared layout context: the current user
/// and the consumed (one-shot) flash message.
pub async fn render_page(
    state: &AppState,
    ctx: &mut SessionContext,
    template: &str,
    mut context: TeraContext,
) -> Result<Html<String>, PageError> {
    let flash = state
        .sessions
        .take_flash(&mut ctx.session)
        .await
        .map_err(PageError::Internal)?;

    context.insert("user", &ctx.user);
    context.insert("flash", &flash);

    let html = state
        .templates
        .render(template, &context)
        .map_err(PageError::Internal)?;

    Ok(Html(html))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loads_repository_templates() {
        let engine =
            TemplateEngine::new(DEFAULT_TEMPLATE_GLOB).expect("Templates should load");

        let mut context = TeraContext::new();
        context.insert("user", &Option::<crate::models::User>::None);
        context.insert("flash", &Option::<String>::None);
        context.insert("categories", &Vec::<crate::models::Category>::new());
        context.insert("items", &Vec::<crate::models::Item>::new());

        let html = engine
            .render("categories.html", &context)
            .expect("Render should succeed");

        assert!(html.contains("<html"));
    }

    #[test]
    fn test_flash_is_rendered() {
        let engine = TemplateEngine::new(DEFAULT_TEMPLATE_GLOB).expect("Templates should load");

        let mut context = TeraContext::new();
        context.insert("user", &Option::<crate::models::User>::None);
        context.insert("flash", &Some("You were logged in".to_string()));
        context.insert("categories", &Vec::<crate::models::Category>::new());
        context.insert("items", &Vec::<crate::models::Item>::new());

        let html = engine.render("categories.html", &context).unwrap();

        assert!(html.contains("You were logged in"));
    }
}
