//! Delimiter constants owned by the syntax they belong to.
//!
//! The tokenizer refers to these; it never hardcodes `` ` `` or `{{`.

/// Backtick-delimited code span carrying the command text.
pub struct CodeSpan;

impl CodeSpan {
    /// The backtick character that delimits code spans.
    pub const TICK: u8 = b'`';
}

/// The `{{ ... }}` directive that follows a code span.
pub struct DirectiveDelims;

impl DirectiveDelims {
    pub const OPEN: &'static str = "{{";
    pub const CLOSE: &'static str = "}}";
}

/// Quotes accepted around directive arguments and attribute values.
pub const QUOTES: [u8; 2] = [b'\'', b'"'];

pub fn is_inline_space(b: u8) -> bool {
    b == b' ' || b == b'\t'
}
