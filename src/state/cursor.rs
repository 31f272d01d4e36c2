use std::sync::Arc;

use crate::state::question::Question;

/// Result of moving the cursor forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance<'a> {
    /// The cursor now points at this question.
    Question(&'a Question),
    /// No questions remain.
    SessionComplete,
}

/// Positional pointer over a session's immutable question list.
///
/// It only tracks which question is active; timing lives elsewhere.
#[derive(Debug, Clone)]
pub struct QuestionCursor {
    questions: Arc<[Question]>,
    position: Option<usize>,
}

impl QuestionCursor {
    /// Create a cursor positioned before the first question.
    pub fn new(questions: Arc<[Question]>) -> Self {
        Self {
            questions,
            position: None,
        }
    }

    /// Question the cursor points at, if the quiz has started and not run out.
    pub fn current(&self) -> Option<&Question> {
        self.position.and_then(|index| self.questions.get(index))
    }

    /// Move to the next question. Once exhausted it keeps reporting completion.
    pub fn advance(&mut self) -> Advance<'_> {
        let next = self.position.map_or(0, |index| index + 1);
        if next >= self.questions.len() {
            self.position = Some(self.questions.len());
            return Advance::SessionComplete;
        }

        self.position = Some(next);
        Advance::Question(&self.questions[next])
    }

    /// Number of questions in the quiz.
    pub fn count(&self) -> usize {
        self.questions.len()
    }
}
