/// Callout styles available to `` `text` {{ note }} `` style tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdmonitionKind {
    Note,
    Info,
    Tip,
    Warning,
    Danger,
    Hint,
}

impl AdmonitionKind {
    pub const ALL: [AdmonitionKind; 6] = [
        AdmonitionKind::Note,
        AdmonitionKind::Info,
        AdmonitionKind::Tip,
        AdmonitionKind::Warning,
        AdmonitionKind::Danger,
        AdmonitionKind::Hint,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            AdmonitionKind::Note => "note",
            AdmonitionKind::Info => "info",
            AdmonitionKind::Tip => "tip",
            AdmonitionKind::Warning => "warning",
            AdmonitionKind::Danger => "danger",
            AdmonitionKind::Hint => "hint",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.keyword() == word)
    }

    /// CSS modifier; hints share the tip styling.
    pub fn style(self) -> &'static str {
        match self {
            AdmonitionKind::Hint => AdmonitionKind::Tip.keyword(),
            other => other.keyword(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AdmonitionKind::Note => "Note",
            AdmonitionKind::Info => "Info",
            AdmonitionKind::Tip => "Tip",
            AdmonitionKind::Warning => "Warning",
            AdmonitionKind::Danger => "Danger",
            AdmonitionKind::Hint => "Hint",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            AdmonitionKind::Note => "📝",
            AdmonitionKind::Info => "ℹ️",
            AdmonitionKind::Tip | AdmonitionKind::Hint => "💡",
            AdmonitionKind::Warning => "⚠️",
            AdmonitionKind::Danger => "🛑",
        }
    }
}
