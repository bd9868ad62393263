//! Page rendering seam.

use crate::apps::App;
use crate::dispatch::error::RenderError;
use crate::dispatch::pages::escape_html;
use crate::http::{RequestContext, ResponseSink};

/// Turns a resolved app plus a request into response content.
pub trait Renderer: Send + Sync {
    fn render(
        &self,
        app: &App,
        request: &RequestContext,
        response: &mut ResponseSink,
    ) -> Result<(), RenderError>;
}

/// Minimal renderer that answers with a page naming the app and the in-app path.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainRenderer;

impl Renderer for PlainRenderer {
    fn render(
        &self,
        app: &App,
        request: &RequestContext,
        response: &mut ResponseSink,
    ) -> Result<(), RenderError> {
        let body = format!(
            "<!DOCTYPE html>\n<html><head><title>{name}</title></head>\
             <body><h1>{name}</h1><p>{path}</p></body></html>\n",
            name = escape_html(app.name()),
            path = escape_html(request.uri_without_context_path()),
        );
        response.set_content("text/html; charset=utf-8", body);
        Ok(())
    }
}
