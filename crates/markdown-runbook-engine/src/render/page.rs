use std::fmt;

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use uuid::Uuid;

use super::highlight;

const STYLE: &str = include_str!("assets/preview.css");
const SCRIPT: &str = include_str!("assets/preview.js");

/// A complete preview document around a rendered body.
///
/// Inline style and script are allowed only through the per-session nonce;
/// everything else in the content security policy is locked down, so raw
/// HTML in a document cannot run script of its own.
#[derive(Debug, Clone)]
pub struct PreviewPage<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub nonce: Uuid,
    /// Scroll offset restored on load, in pixels.
    pub scroll: f64,
}

impl PreviewPage<'_> {
    pub fn content_security_policy(&self) -> String {
        let nonce = self.nonce.simple();
        format!(
            "default-src 'none'; img-src https: data: file:; style-src 'nonce-{nonce}'; script-src 'nonce-{nonce}';"
        )
    }
}

impl fmt::Display for PreviewPage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nonce = self.nonce.simple();
        writeln!(f, "<!DOCTYPE html>")?;
        writeln!(f, "<html lang=\"en\">")?;
        writeln!(f, "<head>")?;
        writeln!(f, "<meta charset=\"utf-8\">")?;
        writeln!(
            f,
            "<meta http-equiv=\"Content-Security-Policy\" content=\"{}\">",
            attr(&self.content_security_policy())
        )?;
        writeln!(
            f,
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">"
        )?;
        writeln!(f, "<title>{}</title>", text(self.title))?;
        writeln!(
            f,
            "<style nonce=\"{nonce}\">\n{STYLE}{}</style>",
            highlight::theme_css()
        )?;
        writeln!(f, "</head>")?;
        writeln!(f, "<body data-scroll=\"{}\">", self.scroll.max(0.0))?;
        writeln!(f, "<main class=\"runbook-preview\">\n{}</main>", self.body)?;
        writeln!(f, "<script nonce=\"{nonce}\">\n{SCRIPT}</script>")?;
        writeln!(f, "</body>")?;
        write!(f, "</html>")
    }
}
