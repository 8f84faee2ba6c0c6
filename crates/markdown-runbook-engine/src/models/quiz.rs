/// One lettered choice of a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizOption {
    /// Single uppercase letter, e.g. `'B'`.
    pub label: char,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizKind {
    /// At least two options, in document order.
    MultipleChoice(Vec<QuizOption>),
    /// No options; answers are compared as strings.
    FreeText,
}

/// A parsed quiz question.
///
/// `id` is the author-supplied identifier. Questions without one receive
/// `quiz_<n>` at render time, counted in document order, so the assigned
/// id moves when quizzes are added or removed earlier in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    pub id: Option<String>,
    pub question: String,
    pub kind: QuizKind,
    /// Name of a non-default answer key file.
    pub answer_key: Option<String>,
}

impl QuizQuestion {
    pub fn options(&self) -> &[QuizOption] {
        match &self.kind {
            QuizKind::MultipleChoice(options) => options,
            QuizKind::FreeText => &[],
        }
    }
}
