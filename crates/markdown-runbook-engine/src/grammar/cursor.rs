/// Byte cursor over one line (or one directive body) of source text.
///
/// Every delimiter the tag grammar stops at is ASCII, so slicing at a
/// cursor position never splits a UTF-8 sequence.
#[derive(Clone)]
pub struct Cursor<'a> {
    pub s: &'a str,
    /// Bytes consumed so far.
    pub i: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    /// Byte offset of the next unread byte.
    pub fn pos(&self) -> usize {
        self.i
    }

    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.s.as_bytes().get(self.i).copied()
    }

    pub fn starts_with(&self, pat: &[u8]) -> bool {
        self.s.as_bytes()[self.i.min(self.s.len())..].starts_with(pat)
    }

    pub fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.i += 1;
        Some(b)
    }

    pub fn bump_n(&mut self, n: usize) {
        self.i += n;
    }

    /// Consumes bytes while `pred` holds and returns how many were taken.
    pub fn bump_while(&mut self, pred: impl Fn(u8) -> bool) -> usize {
        let start = self.i;
        while self.peek().is_some_and(&pred) {
            self.i += 1;
        }
        self.i - start
    }

    /// Text from offset `from` up to the cursor.
    pub fn since(&self, from: usize) -> &'a str {
        &self.s[from..self.i.min(self.s.len())]
    }

    pub fn rest(&self) -> &'a str {
        &self.s[self.i.min(self.s.len())..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_bytes_and_reports_offsets() {
        let mut cur = Cursor::new("`ls`");
        assert_eq!(cur.peek(), Some(b'`'));
        assert_eq!(cur.bump(), Some(b'`'));
        assert_eq!(cur.pos(), 1);
        cur.bump_n(3);
        assert!(cur.eof());
        assert_eq!(cur.bump(), None);
    }

    #[test]
    fn directive_open_is_detected() {
        let mut cur = Cursor::new("  {{ execute }}");
        cur.bump_while(|b| b == b' ');
        assert!(cur.starts_with(b"{{"));
        assert!(!cur.starts_with(b"}}"));
    }

    #[test]
    fn empty_input_is_eof() {
        let cur = Cursor::new("");
        assert!(cur.eof());
        assert_eq!(cur.peek(), None);
        assert!(cur.starts_with(b""));
        assert_eq!(cur.rest(), "");
    }

    #[test]
    fn bump_while_counts_consumed_bytes() {
        let mut cur = Cursor::new("```rust");
        assert_eq!(cur.bump_while(|b| b == b'`'), 3);
        assert_eq!(cur.rest(), "rust");
        assert_eq!(cur.since(0), "```");
    }

    #[test]
    fn slicing_past_end_is_clamped() {
        let mut cur = Cursor::new("ab");
        cur.bump_n(5);
        assert!(cur.eof());
        assert_eq!(cur.rest(), "");
        assert_eq!(cur.since(1), "b");
    }
}
