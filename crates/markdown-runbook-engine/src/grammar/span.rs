/// A byte range `[start, end)` into a single source line.
///
/// Tags store spans rather than copied text so callers can slice the original
/// line and convert to character columns only when they need editor positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Span {
    /// Inclusive start byte offset.
    pub start: usize,
    /// Exclusive end byte offset.
    pub end: usize,
}

impl Span {
    /// Returns the length in bytes. Uses saturating subtraction for safety.
    #[must_use]
    pub fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns true if the span is empty (start >= end).
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Converts the byte span into character columns within `line`.
    pub fn columns(self, line: &str) -> (usize, usize) {
        let start = line[..self.start].chars().count();
        let end = start + line[self.start..self.end].chars().count();
        (start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn len_and_empty() {
        let span = Span { start: 3, end: 7 };
        assert_eq!(span.len(), 4);
        assert!(!span.is_empty());
        assert!(Span { start: 5, end: 5 }.is_empty());
    }

    #[test]
    fn columns_count_characters_not_bytes() {
        let line = "é `ls` {{ copy }}";
        let start = line.find('`').unwrap();
        let span = Span {
            start,
            end: line.len(),
        };
        assert_eq!(span.columns(line), (2, 17));
    }
}
