//! Reference document renderer built on an HTML shell.

use async_trait::async_trait;
use futures::StreamExt;

use crate::{ChunkStream, DocumentOptions, DocumentRenderer, StreamProducer, TransportError};

/// Head content for the document shell.
#[derive(Debug, Clone, Default)]
pub struct HeadContent {
    /// Page title.
    pub title: Option<String>,
    /// Meta tags.
    pub meta: Vec<(String, String)>,
    /// Link tags (stylesheets, etc.).
    pub links: Vec<String>,
}

impl HeadContent {
    /// Create new head content with a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Add a meta tag.
    pub fn with_meta(mut self, name: &str, content: &str) -> Self {
        self.meta.push((name.to_string(), content.to_string()));
        self
    }

    /// Add a stylesheet link.
    pub fn with_stylesheet(mut self, href: &str) -> Self {
        self.links
            .push(format!(r#"<link rel="stylesheet" href="{}">"#, href));
        self
    }

    /// Render head content to HTML.
    pub fn render(&self) -> String {
        let mut html = String::new();
        if let Some(title) = &self.title {
            html.push_str(&format!("<title>{}</title>\n", title));
        }
        for (name, content) in &self.meta {
            html.push_str(&format!(r#"<meta name="{}" content="{}">"#, name, content));
            html.push('\n');
        }
        for link in &self.links {
            html.push_str(link);
            html.push('\n');
        }
        html
    }
}

/// Document shell wrapped around the embedded payload.
#[derive(Debug, Clone)]
pub struct Shell {
    /// Head content.
    pub head: HeadContent,
    /// HTML before the payload (opening body, wrapper divs).
    pub body_start: String,
    /// HTML after the payload (closing tags).
    pub body_end: String,
}

impl Shell {
    /// Create a new shell with basic structure.
    pub fn new(head: HeadContent) -> Self {
        Self {
            head,
            body_start: "<body>\n<div id=\"app\">\n".to_string(),
            body_end: "</div>\n</body>\n</html>".to_string(),
        }
    }

    /// Set custom body start HTML.
    pub fn with_body_start(mut self, html: impl Into<String>) -> Self {
        self.body_start = html.into();
        self
    }

    /// Set custom body end HTML.
    pub fn with_body_end(mut self, html: impl Into<String>) -> Self {
        self.body_end = html.into();
        self
    }

    /// Render the opening part of the shell (before the payload).
    pub fn render_opening(&self) -> String {
        let mut html = String::from("<!DOCTYPE html>\n<html>\n<head>\n");
        html.push_str(&self.head.render());
        html.push_str("</head>\n");
        html.push_str(&self.body_start);
        html
    }

    /// Render the closing part of the shell (after the payload).
    pub fn render_closing(&self) -> String {
        self.body_end.clone()
    }
}

/// Reference document renderer.
///
/// Streams the shell opening, embeds each payload chunk in an inline
/// `<script type="application/x-component">` block for client resumption,
/// embeds progressive form state when present, and closes the shell. With
/// `debug_noscript` set the bootstrap script is omitted, simulating a
/// client that never hydrates.
pub struct ShellDocumentRenderer {
    shell: Shell,
    bootstrap_src: Option<String>,
}

impl ShellDocumentRenderer {
    /// Create a renderer around a shell.
    pub fn new(shell: Shell) -> Self {
        Self {
            shell,
            bootstrap_src: None,
        }
    }

    /// Script loaded to hydrate the document on capable clients.
    pub fn with_bootstrap(mut self, src: impl Into<String>) -> Self {
        self.bootstrap_src = Some(src.into());
        self
    }
}

#[async_trait]
impl DocumentRenderer for ShellDocumentRenderer {
    async fn render_document(
        &self,
        mut payload: ChunkStream,
        opts: DocumentOptions,
        mut out: StreamProducer,
    ) -> Result<(), TransportError> {
        out.send_str(&self.shell.render_opening()).await?;

        while let Some(chunk) = payload.next().await {
            let text = String::from_utf8(chunk)
                .map_err(|_| TransportError::Render("payload chunk is not utf-8".into()))?;
            out.send_str(&format!(
                "<script type=\"application/x-component\">{}</script>\n",
                html_escape(&text)
            ))
            .await?;
        }

        if let Some(state) = &opts.form_state {
            out.send_str(&format!(
                "<template id=\"form-state\">{}</template>\n",
                html_escape(&state.0.to_string())
            ))
            .await?;
        }

        if !opts.debug_noscript {
            if let Some(src) = &self.bootstrap_src {
                out.send_str(&format!("<script src=\"{}\" async></script>\n", src))
                    .await?;
            }
        }

        out.send_str(&self.shell.render_closing()).await?;
        out.complete();
        Ok(())
    }
}

/// Escape text for embedding in HTML.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{chunk_channel, fused_body};
    use arbor_actions::FormState;
    use arbor_core::TimingContext;
    use futures::executor::block_on;

    fn render(payload_chunks: Vec<&str>, opts: DocumentOptions) -> String {
        let renderer = ShellDocumentRenderer::new(Shell::new(HeadContent::new("Demo")))
            .with_bootstrap("/assets/bootstrap.js");

        let (mut payload_tx, payload_rx) = chunk_channel(8, TimingContext::new());
        let (doc_tx, doc_rx) = chunk_channel(8, TimingContext::new());
        let chunks: Vec<String> = payload_chunks.iter().map(|s| s.to_string()).collect();

        let work = async move {
            for chunk in chunks {
                payload_tx.send_str(&chunk).await?;
            }
            payload_tx.complete();
            renderer.render_document(payload_rx, opts, doc_tx).await
        };
        let out: Vec<_> = block_on(fused_body(work, doc_rx).collect());
        out.into_iter()
            .map(|c| String::from_utf8(c.unwrap()).unwrap())
            .collect()
    }

    #[test]
    fn test_document_wraps_payload_in_shell() {
        let html = render(vec!["{\"root\":1}\n"], DocumentOptions::default());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Demo</title>"));
        assert!(html.contains("application/x-component"));
        assert!(html.contains("{&quot;root&quot;:1}"));
        assert!(html.ends_with("</html>"));
    }

    #[test]
    fn test_bootstrap_omitted_for_noscript() {
        let opts = DocumentOptions {
            form_state: None,
            debug_noscript: true,
        };
        let html = render(vec!["x"], opts);
        assert!(!html.contains("bootstrap.js"));
    }

    #[test]
    fn test_form_state_embedded() {
        let opts = DocumentOptions {
            form_state: Some(FormState(serde_json::json!({"value": 1}))),
            debug_noscript: false,
        };
        let html = render(vec!["x"], opts);
        assert!(html.contains("<template id=\"form-state\">"));
    }
}
