use std::sync::OnceLock;

use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{ClassStyle, ClassedHTMLGenerator, css_for_theme_with_class_style};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

const THEME: &str = "InspiredGitHub";
/// Token classes carry this prefix so theme rules cannot hit page markup.
const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hl-" };

struct Highlighter {
    syntaxes: SyntaxSet,
    theme: Theme,
}

fn highlighter() -> &'static Highlighter {
    static HIGHLIGHTER: OnceLock<Highlighter> = OnceLock::new();
    HIGHLIGHTER.get_or_init(|| {
        let mut themes = ThemeSet::load_defaults();
        Highlighter {
            syntaxes: SyntaxSet::load_defaults_newlines(),
            theme: themes.themes.remove(THEME).unwrap_or_default(),
        }
    })
}

/// Stylesheet for the token classes [`highlight`] emits.
///
/// Highlighted blocks carry classes only, never `style` attributes, so the
/// preview's content security policy can keep inline styles disabled.
pub fn theme_css() -> &'static str {
    static CSS: OnceLock<String> = OnceLock::new();
    CSS.get_or_init(|| {
        css_for_theme_with_class_style(&highlighter().theme, CLASS_STYLE).unwrap_or_else(|e| {
            log::warn!("no stylesheet for theme {THEME}: {e}");
            String::new()
        })
    })
}

/// Highlights `code` as `language`, or returns `None` when the language is
/// unknown so the caller can fall back to a plain escaped block.
pub fn highlight(code: &str, language: &str) -> Option<String> {
    let hl = highlighter();
    let syntax = hl.syntaxes.find_syntax_by_token(language)?;
    let mut generator = ClassedHTMLGenerator::new_with_class_style(syntax, &hl.syntaxes, CLASS_STYLE);
    for line in LinesWithEndings::from(code) {
        if let Err(e) = generator.parse_html_for_line_which_includes_newline(line) {
            log::debug!("highlighting {language} failed: {e}");
            return None;
        }
    }
    Some(format!(
        "<pre class=\"hl-code\"><code class=\"language-{}\">{}</code></pre>\n",
        html_escape::encode_double_quoted_attribute(language),
        generator.finalize()
    ))
}

/// Highlighted HTML when possible, otherwise an escaped `<pre><code>`.
pub fn code_block(code: &str, language: Option<&str>) -> String {
    if let Some(html) = language.and_then(|lang| highlight(code, lang)) {
        return html;
    }
    let class = language
        .map(|lang| {
            format!(
                " class=\"language-{}\"",
                html_escape::encode_double_quoted_attribute(lang)
            )
        })
        .unwrap_or_default();
    format!(
        "<pre><code{class}>{}</code></pre>\n",
        html_escape::encode_text(code)
    )
}
